//! UniFFI export layer: Kotlin bindings for the deck engine.
//!
//! Each public type here maps to a generated Kotlin class, interface, data
//! class or enum. Host services come in as `with_foreign` traits.

mod adapters;
mod platform;
mod service;
mod types;


pub use platform::{
    DeckCrashNotifier, DeckDisplayService, DeckFocusProbe, DeckHidTransport, DeckInputConnection,
    DeckMessageSink, DeckSettingsStore, DeckSurfaceHost, DeckSystemControls,
    DeckVirtualKeyboardDriver,
};
pub use service::{DeckPlatform, DeckService};
pub use types::{
    DeckBackendKind, DeckBackendStatus, DeckCrashRecord, DeckDisplay, DeckDisplayCategory,
    DeckDisplayState, DeckEditorInfo, DeckError, DeckExtractedText, DeckHardwareKey,
    DeckKeyEvent, DeckKeyboardType, DeckSize, DeckSurfaceLayout, DeckSurfaceTarget, DeckTaskInfo,
    DeckVolumeAdjust, DeckWindowConfig,
};

use std::path::Path;

use deck_core::crash::CrashLogStore;
use deck_core::settings;

// ---------------------------------------------------------------------------
// Top-level functions
// ---------------------------------------------------------------------------

#[uniffi::export]
fn engine_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[uniffi::export]
fn trace_init(log_dir: String) {
    crate::trace_init::init_tracing(Path::new(&log_dir));
}

/// Load a custom engine configuration. Must run before the first service is
/// created.
#[uniffi::export]
fn config_load(path: String) -> Result<(), DeckError> {
    let content = std::fs::read_to_string(&path).map_err(|e| DeckError::Io {
        msg: format!("{path}: {e}"),
    })?;
    settings::init_custom(content).map_err(|e| DeckError::InvalidData { msg: e.to_string() })?;
    Ok(())
}

#[uniffi::export]
fn config_default() -> String {
    settings::default_toml().to_string()
}

/// Keyboard type stored in the settings blob; absent or malformed is `Ime`.
#[uniffi::export]
fn keyboard_preference_from_blob(blob: Option<String>) -> DeckKeyboardType {
    settings::parse_settings_blob(blob.as_deref()).into()
}

fn crash_store(dir: &str) -> CrashLogStore {
    CrashLogStore::new(dir, settings::config().crash.retention())
}

/// Stored crash logs, newest first.
#[uniffi::export]
fn crash_logs_list(dir: String) -> Result<Vec<DeckCrashRecord>, DeckError> {
    Ok(crash_store(&dir)
        .list()?
        .into_iter()
        .map(Into::into)
        .collect())
}

#[uniffi::export]
fn crash_log_get(dir: String, id: String) -> Result<Option<DeckCrashRecord>, DeckError> {
    Ok(crash_store(&dir).get(&id)?.map(Into::into))
}

/// Delete every stored crash log. Returns how many were removed.
#[uniffi::export]
fn crash_logs_clear(dir: String) -> Result<u32, DeckError> {
    let removed = crash_store(&dir).clear()?;
    Ok(u32::try_from(removed).unwrap_or(u32::MAX))
}
