use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::clock::TickClock;
use crate::packet::{PacketSource, SimulatedUplink};
use crate::report::NodeReport;
use crate::sensor::{SensorSource, SharedSensorRegister, SimulatedSensor};
use crate::tasks::{
    NetworkTask, NetworkTaskConfig, NetworkTaskStats, SensorTask, SensorTaskConfig,
    SensorTaskStats,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    pub sensor: SensorTaskConfig,
    pub network: NetworkTaskConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} task period must be non-zero")]
    ZeroPeriod(&'static str),
    #[error("{0} task deadline threshold must be non-zero")]
    ZeroDeadline(&'static str),
    #[error("sensor lock wait must be shorter than the sensor period")]
    LockWaitTooLong,
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor.period.is_zero() {
            return Err(ConfigError::ZeroPeriod("sensor"));
        }
        if self.network.period.is_zero() {
            return Err(ConfigError::ZeroPeriod("network"));
        }
        if self.sensor.deadline_ticks == 0 {
            return Err(ConfigError::ZeroDeadline("sensor"));
        }
        if self.network.deadline_ticks == 0 {
            return Err(ConfigError::ZeroDeadline("network"));
        }
        if self.sensor.lock_wait >= self.sensor.period {
            return Err(ConfigError::LockWaitTooLong);
        }
        Ok(())
    }
}

/// Node orchestrator.
///
/// Construction is the explicit initialization phase: the configuration is
/// validated and the shared register is created before any task is
/// scheduled, so no lazy-init check runs at cycle time. A setup failure here
/// spawns nothing.
#[derive(Debug)]
pub struct Node {
    config: NodeConfig,
    register: Arc<SharedSensorRegister>,
    clock: TickClock,
}

impl Node {
    pub fn new(config: NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            register: Arc::new(SharedSensorRegister::new()),
            clock: TickClock::start(),
        })
    }

    pub fn register(&self) -> Arc<SharedSensorRegister> {
        Arc::clone(&self.register)
    }

    pub fn clock(&self) -> TickClock {
        self.clock
    }

    /// Spawn both periodic tasks with the stub hardware sources.
    pub fn spawn(self) -> NodeHandle {
        self.spawn_with_sources(SimulatedSensor::new(), SimulatedUplink::new())
    }

    /// Spawn both periodic tasks with caller-provided sources.
    pub fn spawn_with_sources<S, P>(self, sensor_source: S, packet_source: P) -> NodeHandle
    where
        S: SensorSource + Send + 'static,
        P: PacketSource + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (sensor_task, sensor_stats) = SensorTask::new(
            self.config.sensor,
            sensor_source,
            Arc::clone(&self.register),
            self.clock,
            shutdown_rx.clone(),
        );
        let (network_task, network_stats) =
            NetworkTask::new(self.config.network, packet_source, self.clock, shutdown_rx);

        info!(
            sensor_period_ms = self.config.sensor.period.as_millis() as u64,
            network_period_ms = self.config.network.period.as_millis() as u64,
            "node tasks starting"
        );

        NodeHandle {
            sensor_stats,
            network_stats,
            sensor_join: tokio::spawn(sensor_task.run()),
            network_join: tokio::spawn(network_task.run()),
            shutdown_tx,
            register: self.register,
            clock: self.clock,
        }
    }
}

/// Handle over the two running tasks.
///
/// Dropping the handle without calling [`NodeHandle::shutdown`] also stops
/// both tasks: losing the shutdown sender ends their loops at the next
/// release point.
#[derive(Debug)]
pub struct NodeHandle {
    pub sensor_stats: watch::Receiver<SensorTaskStats>,
    pub network_stats: watch::Receiver<NetworkTaskStats>,
    sensor_join: JoinHandle<SensorTaskStats>,
    network_join: JoinHandle<NetworkTaskStats>,
    shutdown_tx: watch::Sender<bool>,
    register: Arc<SharedSensorRegister>,
    clock: TickClock,
}

impl NodeHandle {
    /// Snapshot of the latest published stats from both tasks.
    pub fn report(&self) -> NodeReport {
        NodeReport {
            uptime_ticks: self.clock.now_ticks(),
            sensor: self.sensor_stats.borrow().clone(),
            network: self.network_stats.borrow().clone(),
        }
    }

    pub fn register(&self) -> Arc<SharedSensorRegister> {
        Arc::clone(&self.register)
    }

    pub fn uptime_ticks(&self) -> u64 {
        self.clock.now_ticks()
    }

    /// Signal both tasks to stop and collect their final stats.
    ///
    /// A task that died early does not lose the sibling's result: its last
    /// published snapshot stands in for the final stats.
    pub async fn shutdown(self) -> NodeReport {
        let _ = self.shutdown_tx.send(true);

        let sensor = match self.sensor_join.await {
            Ok(stats) => stats,
            Err(_) => self.sensor_stats.borrow().clone(),
        };
        let network = match self.network_join.await {
            Ok(stats) => stats,
            Err(_) => self.network_stats.borrow().clone(),
        };

        NodeReport {
            uptime_ticks: self.clock.now_ticks(),
            sensor,
            network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = NodeConfig::default();
        config.network.period = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod("network")));
    }

    #[test]
    fn test_lock_wait_must_fit_in_period() {
        let mut config = NodeConfig::default();
        config.sensor.lock_wait = config.sensor.period;
        assert_eq!(config.validate(), Err(ConfigError::LockWaitTooLong));
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let mut config = NodeConfig::default();
        config.sensor.deadline_ticks = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDeadline("sensor")));
    }
}
