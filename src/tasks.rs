use std::sync::Arc;
use std::time::Duration;

use heapless::Vec as BoundedVec;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::TickClock;
use crate::deadline::{classify, CycleClass, CycleTiming};
use crate::jitter::{JitterConfig, JitterInjector};
use crate::packet::{PacketSource, RawFrame};
use crate::sensor::{SensorSource, SharedSensorRegister};
use crate::validator::{validate, Outcome};

pub const MAX_MISS_HISTORY: usize = 16;

/// Tick stamps of the most recent deadline misses, oldest dropped first.
pub type MissHistory = BoundedVec<u64, MAX_MISS_HISTORY>;

fn record_miss(history: &mut MissHistory, tick: u64) {
    if history.is_full() {
        history.remove(0);
    }
    let _ = history.push(tick);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorTaskConfig {
    pub period: Duration,
    pub deadline_ticks: u64,
    /// Bounded wait for the register mutex, half the period by default.
    pub lock_wait: Duration,
    pub jitter: JitterConfig,
}

impl Default for SensorTaskConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            deadline_ticks: 5,
            lock_wait: Duration::from_millis(50),
            jitter: JitterConfig {
                enabled: true,
                inverse_rate: 50,
                stall: Duration::from_millis(60),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkTaskConfig {
    pub period: Duration,
    pub deadline_ticks: u64,
    pub jitter: JitterConfig,
}

impl Default for NetworkTaskConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
            deadline_ticks: 5,
            jitter: JitterConfig {
                enabled: true,
                inverse_rate: 500,
                stall: Duration::from_millis(60),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SensorTaskStats {
    pub cycles: u64,
    pub updates: u64,
    pub updates_skipped: u64,
    pub deadline_misses: u64,
    pub last_value: u16,
    pub last_elapsed_ticks: u64,
    pub miss_ticks: MissHistory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkTaskStats {
    pub cycles: u64,
    pub idle_cycles: u64,
    pub frames_accepted: u64,
    pub mqtt_frames: u64,
    pub frames_rejected: u64,
    pub deadline_misses: u64,
    pub last_elapsed_ticks: u64,
    pub miss_ticks: MissHistory,
}

/// Periodic sensor sampling loop.
///
/// Each cycle: absolute drift-free release, bounded-wait lock of the shared
/// register, sample-and-store under the guard, then tick-delta deadline
/// classification. A lock timeout drops the update for this cycle; the next
/// cycle retries.
#[derive(Debug)]
pub struct SensorTask<S: SensorSource> {
    config: SensorTaskConfig,
    source: S,
    register: Arc<SharedSensorRegister>,
    clock: TickClock,
    jitter: JitterInjector,
    stats: SensorTaskStats,
    stats_tx: watch::Sender<SensorTaskStats>,
    shutdown: watch::Receiver<bool>,
}

impl<S: SensorSource> SensorTask<S> {
    pub fn new(
        config: SensorTaskConfig,
        source: S,
        register: Arc<SharedSensorRegister>,
        clock: TickClock,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, watch::Receiver<SensorTaskStats>) {
        let (stats_tx, stats_rx) = watch::channel(SensorTaskStats::default());
        let task = Self {
            jitter: JitterInjector::new(config.jitter),
            config,
            source,
            register,
            clock,
            stats: SensorTaskStats::default(),
            stats_tx,
            shutdown,
        };
        (task, stats_rx)
    }

    /// Run the periodic loop until shutdown; returns the final stats.
    pub async fn run(mut self) -> SensorTaskStats {
        let start = time::Instant::now() + self.config.period;
        let mut ticker = time::interval_at(start, self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.shutdown.changed() => {
                    match changed {
                        Ok(()) if !*self.shutdown.borrow() => continue,
                        _ => break,
                    }
                }
            }

            self.run_cycle().await;
            let _ = self.stats_tx.send(self.stats.clone());
        }

        info!(cycles = self.stats.cycles, "sensor task stopped");
        self.stats
    }

    async fn run_cycle(&mut self) {
        let mut timing = CycleTiming::start(&self.clock);

        let stored = match self.register.lock_timeout(self.config.lock_wait).await {
            Ok(mut slot) => {
                *slot = self.source.read();
                Some(*slot)
            }
            Err(_) => None,
        };

        match stored {
            Some(value) => {
                self.stats.updates += 1;
                self.stats.last_value = value;
                info!(value, "sensor register updated");
            }
            None => {
                // Skip-on-timeout policy: the update is dropped for this
                // cycle and the next cycle retries; no error-level signal.
                self.stats.updates_skipped += 1;
                debug!("sensor register contended; update skipped");
            }
        }

        if let Some(stall) = self.jitter.maybe_stall() {
            time::sleep(stall).await;
        }

        timing.stop(&self.clock);
        let elapsed = timing.elapsed_ticks();
        self.stats.last_elapsed_ticks = elapsed;
        match classify(elapsed, self.config.deadline_ticks) {
            CycleClass::OnTime => {
                debug!(elapsed_ticks = elapsed, "sensor cycle on time");
            }
            CycleClass::Missed => {
                self.stats.deadline_misses += 1;
                record_miss(&mut self.stats.miss_ticks, self.clock.now_ticks());
                warn!(elapsed_ticks = elapsed, "sensor task missed deadline");
            }
        }
        self.stats.cycles += 1;
    }
}

/// Periodic packet ingest and validation loop.
///
/// Runs at a shorter period than the sensor task. Each cycle polls the
/// packet source into the reusable frame, applies the terminator policy,
/// validates the received span, and classifies the cycle against its soft
/// deadline. Validation failures discard the frame and never escape the
/// cycle.
#[derive(Debug)]
pub struct NetworkTask<P: PacketSource> {
    config: NetworkTaskConfig,
    source: P,
    frame: RawFrame,
    clock: TickClock,
    jitter: JitterInjector,
    stats: NetworkTaskStats,
    stats_tx: watch::Sender<NetworkTaskStats>,
    shutdown: watch::Receiver<bool>,
}

impl<P: PacketSource> NetworkTask<P> {
    pub fn new(
        config: NetworkTaskConfig,
        source: P,
        clock: TickClock,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, watch::Receiver<NetworkTaskStats>) {
        let (stats_tx, stats_rx) = watch::channel(NetworkTaskStats::default());
        let task = Self {
            jitter: JitterInjector::new(config.jitter),
            config,
            source,
            frame: RawFrame::new(),
            clock,
            stats: NetworkTaskStats::default(),
            stats_tx,
            shutdown,
        };
        (task, stats_rx)
    }

    /// Run the periodic loop until shutdown; returns the final stats.
    pub async fn run(mut self) -> NetworkTaskStats {
        let start = time::Instant::now() + self.config.period;
        let mut ticker = time::interval_at(start, self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = self.shutdown.changed() => {
                    match changed {
                        Ok(()) if !*self.shutdown.borrow() => continue,
                        _ => break,
                    }
                }
            }

            self.run_cycle().await;
            let _ = self.stats_tx.send(self.stats.clone());
        }

        info!(cycles = self.stats.cycles, "network task stopped");
        self.stats
    }

    async fn run_cycle(&mut self) {
        let mut timing = CycleTiming::start(&self.clock);

        let bytes_read = self.source.poll(self.frame.payload_mut());
        if bytes_read == 0 {
            self.stats.idle_cycles += 1;
        } else {
            self.frame.seal(bytes_read);
            self.handle_frame();
        }

        if let Some(stall) = self.jitter.maybe_stall() {
            time::sleep(stall).await;
        }

        timing.stop(&self.clock);
        let elapsed = timing.elapsed_ticks();
        self.stats.last_elapsed_ticks = elapsed;
        match classify(elapsed, self.config.deadline_ticks) {
            CycleClass::OnTime => {
                debug!(elapsed_ticks = elapsed, "network cycle on time");
            }
            CycleClass::Missed => {
                self.stats.deadline_misses += 1;
                record_miss(&mut self.stats.miss_ticks, self.clock.now_ticks());
                warn!(elapsed_ticks = elapsed, "network task missed deadline");
            }
        }
        self.stats.cycles += 1;
    }

    fn handle_frame(&mut self) {
        match validate(self.frame.as_bytes()) {
            Outcome::AcceptedMqtt(header, mqtt) => {
                self.stats.frames_accepted += 1;
                self.stats.mqtt_frames += 1;
                info!(
                    packet_type = header.packet_type,
                    payload_len = header.payload_len,
                    control_type = mqtt.control_type,
                    remaining_length = mqtt.remaining_length,
                    header_size = mqtt.header_size,
                    "minimal valid MQTT packet accepted"
                );
            }
            Outcome::AcceptedGeneric(header, mqtt_reason) => {
                self.stats.frames_accepted += 1;
                info!(
                    packet_type = header.packet_type,
                    payload_len = header.payload_len,
                    "generic packet accepted"
                );
                debug!(%mqtt_reason, "frame is not an MQTT fixed header");
            }
            Outcome::Rejected(reason) => {
                self.stats.frames_rejected += 1;
                warn!(%reason, frame_len = self.frame.len(), "frame rejected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_history_drops_oldest_when_full() {
        let mut history = MissHistory::new();
        for tick in 0..(MAX_MISS_HISTORY as u64 + 4) {
            record_miss(&mut history, tick);
        }

        assert_eq!(history.len(), MAX_MISS_HISTORY);
        assert_eq!(history[0], 4);
        assert_eq!(history[MAX_MISS_HISTORY - 1], MAX_MISS_HISTORY as u64 + 3);
    }

    #[test]
    fn test_default_configs_match_demo_rates() {
        let sensor = SensorTaskConfig::default();
        assert_eq!(sensor.period, Duration::from_millis(100));
        assert_eq!(sensor.lock_wait, Duration::from_millis(50));
        assert_eq!(sensor.deadline_ticks, 5);

        let network = NetworkTaskConfig::default();
        assert_eq!(network.period, Duration::from_millis(10));
        assert_eq!(network.deadline_ticks, 5);
    }
}
