//! Platform services implemented by the Android host.
//!
//! Every method returns `Result<_, DeckError>`; a foreign exception that is
//! not a `DeckError` arrives as `DeckError::Platform` instead of panicking.

use super::types::{
    DeckDisplay, DeckError, DeckExtractedText, DeckKeyEvent, DeckSize, DeckSurfaceLayout,
    DeckSurfaceTarget, DeckTaskInfo, DeckVolumeAdjust,
};

#[uniffi::export(with_foreign)]
pub trait DeckDisplayService: Send + Sync {
    fn displays(&self) -> Result<Vec<DeckDisplay>, DeckError>;

    fn display(&self, id: i32) -> Result<Option<DeckDisplay>, DeckError>;

    fn primary_metrics(&self) -> Result<DeckSize, DeckError>;

    /// Start forwarding display added/removed callbacks to the service.
    fn register_hotplug(&self) -> Result<(), DeckError>;

    fn unregister_hotplug(&self) -> Result<(), DeckError>;
}

#[uniffi::export(with_foreign)]
pub trait DeckFocusProbe: Send + Sync {
    fn running_tasks(&self) -> Result<Vec<DeckTaskInfo>, DeckError>;

    fn ime_window_display(&self) -> Result<Option<i32>, DeckError>;
}

/// Owns the rendering engines and the windows they draw into. Engines are
/// referred to by the id returned from `create_engine`.
#[uniffi::export(with_foreign)]
pub trait DeckSurfaceHost: Send + Sync {
    fn create_engine(&self, target: DeckSurfaceTarget) -> Result<u64, DeckError>;

    fn execute_entrypoint(&self, engine: u64, entrypoint: String) -> Result<(), DeckError>;

    fn resume_engine(&self, engine: u64) -> Result<(), DeckError>;

    fn pause_engine(&self, engine: u64) -> Result<(), DeckError>;

    fn destroy_engine(&self, engine: u64) -> Result<(), DeckError>;

    fn attach(
        &self,
        target: DeckSurfaceTarget,
        engine: u64,
        layout: DeckSurfaceLayout,
    ) -> Result<(), DeckError>;

    fn detach(&self, target: DeckSurfaceTarget, engine: u64) -> Result<(), DeckError>;
}

#[uniffi::export(with_foreign)]
pub trait DeckSystemControls: Send + Sync {
    fn adjust_volume(&self, adjust: DeckVolumeAdjust) -> Result<(), DeckError>;

    fn dispatch_media_key(&self, key_code: u32) -> Result<(), DeckError>;

    fn microphone_muted(&self) -> Result<bool, DeckError>;

    fn set_microphone_muted(&self, muted: bool) -> Result<(), DeckError>;

    fn is_ime_enabled(&self) -> Result<bool, DeckError>;

    fn is_ime_selected(&self) -> Result<bool, DeckError>;

    fn open_ime_picker(&self) -> Result<(), DeckError>;

    fn open_ime_settings(&self) -> Result<(), DeckError>;

    fn request_show_self(&self) -> Result<(), DeckError>;

    fn request_hide_self(&self) -> Result<(), DeckError>;

    fn is_input_view_shown(&self) -> Result<bool, DeckError>;
}

/// Delivers a method call to the UI running in `engine`.
#[uniffi::export(with_foreign)]
pub trait DeckMessageSink: Send + Sync {
    fn send(
        &self,
        engine: u64,
        channel: String,
        method: String,
        payload_json: String,
    ) -> Result<(), DeckError>;
}

#[uniffi::export(with_foreign)]
pub trait DeckSettingsStore: Send + Sync {
    fn get_string(&self, key: String) -> Option<String>;
}

#[uniffi::export(with_foreign)]
pub trait DeckCrashNotifier: Send + Sync {
    fn notify(&self, id: String, error_type: String);
}

/// Text field of the focused application.
#[uniffi::export(with_foreign)]
pub trait DeckInputConnection: Send + Sync {
    fn commit_text(&self, text: String) -> Result<(), DeckError>;

    fn delete_surrounding_text(&self, before: u32, after: u32) -> Result<(), DeckError>;

    fn perform_editor_action(&self, action: u32) -> Result<(), DeckError>;

    fn extracted_text(&self) -> Result<Option<DeckExtractedText>, DeckError>;

    fn set_selection(&self, start: i32, end: i32) -> Result<(), DeckError>;

    fn send_key_event(&self, event: DeckKeyEvent) -> Result<(), DeckError>;
}

#[uniffi::export(with_foreign)]
pub trait DeckVirtualKeyboardDriver: Send + Sync {
    fn probe(&self) -> Result<(), DeckError>;

    fn open(&self, display: Option<i32>) -> Result<(), DeckError>;

    fn close(&self);

    fn send_key(&self, key_code: u32, down: bool) -> Result<(), DeckError>;
}

#[uniffi::export(with_foreign)]
pub trait DeckHidTransport: Send + Sync {
    fn is_supported(&self) -> bool;

    fn register(&self) -> Result<(), DeckError>;

    fn unregister(&self);

    fn connected_device(&self) -> Option<String>;

    fn send_report(&self, report: Vec<u8>) -> Result<(), DeckError>;
}
