use std::fmt;

/// Failure raised by a platform call crossing the host boundary.
///
/// Carries enough context to build a fault report: the host's error class
/// name, its message and a rendered stack trace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    pub kind: String,
    pub message: String,
    pub trace: String,
}

impl PlatformError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: String::new(),
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    /// Trace for reporting; synthesised from kind and message when the host
    /// did not provide one.
    pub fn trace_or_summary(&self) -> String {
        if self.trace.trim().is_empty() {
            format!("{self}\n\tat <host boundary>")
        } else {
            self.trace.clone()
        }
    }
}

/// Engine liveness tag recorded in fault reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Stopped,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}
