use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register lock wait timed out")]
    AccessTimeout,
}

/// Single mutable sensor reading guarded by a mutex.
///
/// All reads and writes go through the lock; there is no unguarded accessor.
/// The register is constructed once, before any task is spawned, and handed
/// to the writer task and any reader path by reference.
#[derive(Debug, Default)]
pub struct SharedSensorRegister {
    slot: Mutex<u16>,
}

impl SharedSensorRegister {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(0),
        }
    }

    /// Acquire the register with a bounded wait.
    ///
    /// The guard releases the lock on every exit path; the timeout path never
    /// holds (and therefore never releases) the lock.
    pub async fn lock_timeout(
        &self,
        wait: Duration,
    ) -> Result<MutexGuard<'_, u16>, RegisterError> {
        timeout(wait, self.slot.lock())
            .await
            .map_err(|_| RegisterError::AccessTimeout)
    }

    /// Acquire the register with an unbounded wait.
    pub async fn lock(&self) -> MutexGuard<'_, u16> {
        self.slot.lock().await
    }

    /// Read the current value under a bounded lock acquisition.
    pub async fn load(&self, wait: Duration) -> Result<u16, RegisterError> {
        let slot = self.lock_timeout(wait).await?;
        Ok(*slot)
    }
}

/// Source of sensor readings.
///
/// Production implementations replace this with real ADC access; the
/// simulated source below stands in for the hardware.
pub trait SensorSource {
    fn read(&mut self) -> u16;
}

/// Successive-value generator simulating a hardware read.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    next_value: u16,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self { next_value: 0 }
    }
}

impl SensorSource for SimulatedSensor {
    fn read(&mut self) -> u16 {
        let value = self.next_value;
        self.next_value = self.next_value.wrapping_add(1);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_sensor_counts_up() {
        let mut sensor = SimulatedSensor::new();
        assert_eq!(sensor.read(), 0);
        assert_eq!(sensor.read(), 1);
        assert_eq!(sensor.read(), 2);
    }

    #[test]
    fn test_simulated_sensor_wraps() {
        let mut sensor = SimulatedSensor {
            next_value: u16::MAX,
        };
        assert_eq!(sensor.read(), u16::MAX);
        assert_eq!(sensor.read(), 0);
    }

    #[tokio::test]
    async fn test_register_store_and_load() {
        let register = SharedSensorRegister::new();

        {
            let mut slot = register.lock().await;
            *slot = 1234;
        }

        let value = register.load(Duration::from_millis(10)).await.unwrap();
        assert_eq!(value, 1234);
    }
}
