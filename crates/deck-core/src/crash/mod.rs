//! Fault reports and their on-disk store.

mod store;

pub use store::{CrashLogStore, CRASH_LOGS_DIR};

use serde::{Deserialize, Serialize};

use crate::error::EngineState;

/// Display configuration at the time of a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    pub has_secondary_display: bool,
    pub secondary_display_id: Option<i32>,
    pub primary_width: u32,
    pub primary_height: u32,
    pub secondary_width: Option<u32>,
    pub secondary_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    pub error_type: String,
    pub message: String,
    pub stack_trace: String,
    pub engine_state: EngineState,
    pub display_state: Option<DisplayState>,
}

/// One stored crash log, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashRecord {
    pub id: String,
    pub timestamp: String,
    pub error_type: String,
    pub message: String,
    pub stack_trace: String,
    pub engine_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_state: Option<DisplayState>,
}

#[derive(Debug, thiserror::Error)]
pub enum CrashLogError {
    #[error("crash log I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("crash log encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid crash log id: {0}")]
    InvalidId(String),
    #[error("timestamp formatting: {0}")]
    Time(#[from] time::error::Format),
}

/// Sink for fault reports. Returns the stored record id, or `None` when the
/// report could not be persisted; reporting never fails the caller.
pub trait CrashReporter: Send {
    fn report(&mut self, fault: &FaultReport) -> Option<String>;
}

/// Surfaces a stored fault to the user, e.g. as a system notification.
pub trait CrashNotifier: Send + Sync {
    fn notify(&self, id: &str, error_type: &str);
}
