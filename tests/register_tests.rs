use std::sync::Arc;
use std::time::Duration;

use rtnode::sensor::{RegisterError, SensorSource, SharedSensorRegister, SimulatedSensor};

#[tokio::test]
async fn test_bounded_wait_times_out_while_held() {
    let register = SharedSensorRegister::new();

    let guard = register.lock().await;
    match register.lock_timeout(Duration::from_millis(20)).await {
        Err(RegisterError::AccessTimeout) => {}
        Ok(_) => panic!("acquired a lock that was already held"),
    }
    drop(guard);

    // Released: the bounded wait succeeds again.
    assert!(register.lock_timeout(Duration::from_millis(20)).await.is_ok());
}

#[tokio::test]
async fn test_load_times_out_while_held() {
    let register = SharedSensorRegister::new();

    let guard = register.lock().await;
    assert_eq!(
        register.load(Duration::from_millis(20)).await,
        Err(RegisterError::AccessTimeout)
    );
    drop(guard);

    assert_eq!(register.load(Duration::from_millis(20)).await, Ok(0));
}

#[tokio::test]
async fn test_store_through_guard_is_visible_to_readers() {
    let register = SharedSensorRegister::new();
    let mut sensor = SimulatedSensor::new();

    for _ in 0..5 {
        let mut slot = register.lock().await;
        *slot = sensor.read();
    }

    assert_eq!(register.load(Duration::from_millis(10)).await, Ok(4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_only_observe_fully_written_values() {
    const WRITES: u16 = 500;
    const READERS: usize = 4;

    let register = Arc::new(SharedSensorRegister::new());

    let writer = {
        let register = Arc::clone(&register);
        tokio::spawn(async move {
            for value in 1..=WRITES {
                let mut slot = register.lock().await;
                *slot = value;
                drop(slot);
                tokio::task::yield_now().await;
            }
        })
    };

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let register = Arc::clone(&register);
            tokio::spawn(async move {
                // Every snapshot goes through the mutex; the sole writer only
                // moves forward, so snapshots must be in-range and never
                // regress.
                let mut last = 0u16;
                for _ in 0..200 {
                    let value = register.load(Duration::from_millis(100)).await.unwrap();
                    assert!(value <= WRITES, "observed value {} beyond writer range", value);
                    assert!(value >= last, "snapshot regressed from {} to {}", last, value);
                    last = value;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}
