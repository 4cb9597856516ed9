use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tasks::{NetworkTaskStats, SensorTaskStats};

pub const MAX_REPORT_SIZE: usize = 2048;

pub type ReportBuffer = ArrayString<MAX_REPORT_SIZE>;

/// Point-in-time status snapshot of both tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeReport {
    pub uptime_ticks: u64,
    pub sensor: SensorTaskStats,
    pub network: NetworkTaskStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("serialized report exceeds buffer size")]
    ReportTooLarge,
    #[error("report serialization failed")]
    SerializationError,
}

/// Renders status reports as JSON lines into a preallocated buffer.
#[derive(Debug, Default)]
pub struct ReportWriter {
    buffer: ReportBuffer,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            buffer: ArrayString::new(),
        }
    }

    /// Serialize one report, reusing the internal buffer.
    pub fn render_json(&mut self, report: &NodeReport) -> Result<&str, ReportError> {
        self.buffer.clear();

        let json =
            serde_json::to_string(report).map_err(|_| ReportError::SerializationError)?;
        if json.len() > MAX_REPORT_SIZE {
            return Err(ReportError::ReportTooLarge);
        }
        self.buffer.push_str(&json);

        Ok(&self.buffer)
    }
}
