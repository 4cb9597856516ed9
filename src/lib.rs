//! # Real-Time Node Simulator
//!
//! An embedded-style simulation of the application layer of a small
//! real-time node: two periodic tasks sharing one sensor register under
//! mutual exclusion, a bounded packet parser with a minimal MQTT
//! fixed-header decode, and per-cycle soft-deadline monitoring.
//!
//! ## Features
//!
//! - **Periodic tasks**: drift-free absolute scheduling for a sensor
//!   sampling loop and a faster network ingest loop
//! - **Mutex-guarded shared state**: bounded-wait acquisition with a
//!   skip-on-timeout policy, no access outside the lock
//! - **Packet validation**: structural bounds checks plus the standard MQTT
//!   fixed header (control type and base-128 remaining-length varint)
//! - **Deadline monitoring**: tick-delta measurement classified against
//!   per-task thresholds
//! - **Embedded-friendly**: fixed-capacity buffers, allocation-free
//!   steady-state cycles, bounded histories
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rtnode::node::{Node, NodeConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let node = Node::new(NodeConfig::default())?;
//! let handle = node.spawn();
//!
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!
//! let report = handle.shutdown().await;
//! println!("sensor cycles: {}", report.sensor.cycles);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`clock`] - monotonic tick counter
//! - [`sensor`] - shared sensor register and sensor source
//! - [`packet`] - reusable ingest frame and packet source
//! - [`validator`] - generic and MQTT fixed-header validation
//! - [`deadline`] - cycle timing and soft-deadline classification
//! - [`jitter`] - deterministic execution-jitter injection
//! - [`tasks`] - the two periodic control loops
//! - [`node`] - initialization phase and orchestration
//! - [`report`] - JSON status reporting

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]

pub mod clock;
pub mod deadline;
pub mod jitter;
pub mod node;
pub mod packet;
pub mod report;
pub mod sensor;
pub mod tasks;
pub mod validator;

// Re-export main public types for convenience
pub use deadline::{classify, CycleClass};
pub use node::{Node, NodeConfig, NodeHandle};
pub use packet::{PacketSource, RawFrame, SimulatedUplink, FRAME_CAPACITY};
pub use sensor::{SensorSource, SharedSensorRegister, SimulatedSensor};
pub use validator::{decode_mqtt_header, validate, MqttFixedHeader, Outcome, PacketHeader};
