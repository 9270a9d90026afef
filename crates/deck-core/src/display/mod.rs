//! Physical display model, hotplug debouncing and input-display detection.

mod classifier;
mod debounce;
mod watcher;

pub use classifier::{
    ClassifierChain, FocusContext, FocusProbe, InputDisplayClassifier, PackageAllowListClassifier,
    TaskInfo, TaskQueryClassifier, WindowAffinityClassifier,
};
pub use debounce::{DebounceTable, DisplayEventKind, PendingDisplayEvent, ScheduleOutcome};
pub use watcher::{DisplayEvent, DisplayWatcher};

use serde::Serialize;

use crate::PlatformError;

pub type DisplayId = i32;

/// Reserved identifier of the built-in display. Never treated as secondary.
pub const DEFAULT_DISPLAY: DisplayId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayCategory {
    /// The built-in panel.
    Builtin,
    /// A display advertised as suitable for presentation windows.
    Presentation,
    Other,
}

/// Immutable snapshot of a physical output, re-fetched from the platform on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHandle {
    pub id: DisplayId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub valid: bool,
    pub category: DisplayCategory,
}

impl DisplayHandle {
    pub fn is_primary(&self) -> bool {
        self.id == DEFAULT_DISPLAY
    }

    /// Eligible to host the keyboard as a secondary display.
    pub fn is_usable_secondary(&self) -> bool {
        !self.is_primary() && self.valid
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Platform display-enumeration service.
pub trait DisplayService: Send {
    fn displays(&self) -> Result<Vec<DisplayHandle>, PlatformError>;

    fn display(&self, id: DisplayId) -> Result<Option<DisplayHandle>, PlatformError>;

    /// Pixel size of the primary display as seen by the service's own resources.
    fn primary_metrics(&self) -> Result<(u32, u32), PlatformError>;

    /// Start forwarding raw hotplug notifications to the watcher.
    fn register_hotplug(&mut self) -> Result<(), PlatformError>;

    fn unregister_hotplug(&mut self);
}
