use deck_core::bridge::{BridgeError, EditorInfo, ExtractedText, KeyAction, KeyEvent, VolumeAdjust};
use deck_core::crash::{CrashLogError, CrashRecord, DisplayState};
use deck_core::display::{DisplayCategory, DisplayHandle, TaskInfo};
use deck_core::hardware::{BackendKind, BackendStatus};
use deck_core::settings::HardwareEmulationPreference;
use deck_core::surface::{SurfaceLayout, SurfaceTarget};
use deck_core::PlatformError;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DeckError {
    #[error("IO error: {msg}")]
    Io { msg: String },
    #[error("invalid data: {msg}")]
    InvalidData { msg: String },
    #[error("method not implemented: {method}")]
    NotImplemented { method: String },
    #[error("invalid arguments: {msg}")]
    InvalidArguments { msg: String },
    /// Raised by the host platform.
    #[error("{kind}: {message}")]
    Platform {
        kind: String,
        message: String,
        trace: String,
    },
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for DeckError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Platform {
            kind: "UnexpectedCallbackError".to_string(),
            message: e.reason,
            trace: String::new(),
        }
    }
}

impl From<DeckError> for PlatformError {
    fn from(e: DeckError) -> Self {
        match e {
            DeckError::Platform {
                kind,
                message,
                trace,
            } => PlatformError::new(kind, message).with_trace(trace),
            other => PlatformError::new("DeckError", other.to_string()),
        }
    }
}

impl From<BridgeError> for DeckError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::NotImplemented(method) => Self::NotImplemented { method },
            e @ BridgeError::InvalidArguments { .. } => Self::InvalidArguments { msg: e.to_string() },
        }
    }
}

impl From<CrashLogError> for DeckError {
    fn from(e: CrashLogError) -> Self {
        match e {
            CrashLogError::Io(e) => Self::Io { msg: e.to_string() },
            other => Self::InvalidData {
                msg: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Records (value types, copied across FFI boundary)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, uniffi::Record)]
pub struct DeckDisplay {
    pub id: i32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub valid: bool,
    pub category: DeckDisplayCategory,
}

#[derive(Clone, Copy, Debug, uniffi::Record)]
pub struct DeckSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct DeckTaskInfo {
    pub top_package: Option<String>,
    pub display_id: Option<i32>,
}

#[derive(Clone, Debug, Default, uniffi::Record)]
pub struct DeckEditorInfo {
    pub package_name: Option<String>,
    pub input_type: u32,
    pub ime_options: u32,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct DeckExtractedText {
    pub text: String,
    pub selection_start: i32,
    pub selection_end: i32,
}

#[derive(Clone, Copy, Debug, uniffi::Record)]
pub struct DeckKeyEvent {
    pub down: bool,
    pub key_code: u32,
    pub meta_state: u32,
}

#[derive(Clone, Copy, Debug, uniffi::Record)]
pub struct DeckWindowConfig {
    pub fullscreen: bool,
    pub focusable: bool,
    pub touch_modal: bool,
    pub keep_screen_on: bool,
    pub opaque: bool,
    pub hardware_accelerated: bool,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct DeckBackendStatus {
    pub backend: String,
    pub is_available: bool,
    pub is_initialized: bool,
    pub is_connected: bool,
    pub message: String,
    pub error: Option<String>,
}

/// One key sent through a hardware backend. `down = None` is a full press
/// with the modifiers held around it.
#[derive(Clone, Copy, Debug, uniffi::Record)]
pub struct DeckHardwareKey {
    pub key_code: u32,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub down: Option<bool>,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct DeckDisplayState {
    pub has_secondary_display: bool,
    pub secondary_display_id: Option<i32>,
    pub primary_width: u32,
    pub primary_height: u32,
    pub secondary_width: Option<u32>,
    pub secondary_height: Option<u32>,
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct DeckCrashRecord {
    pub id: String,
    pub timestamp: String,
    pub error_type: String,
    pub message: String,
    pub stack_trace: String,
    pub engine_state: String,
    pub display_state: Option<DeckDisplayState>,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum DeckDisplayCategory {
    Builtin,
    Presentation,
    Other,
}

#[derive(Clone, Debug, uniffi::Enum)]
pub enum DeckSurfaceTarget {
    PrimaryEmbedded,
    Presentation { display: DeckDisplay },
}

#[derive(Clone, Copy, Debug, uniffi::Enum)]
pub enum DeckSurfaceLayout {
    Embedded { max_height: u32 },
    Presentation { window: DeckWindowConfig },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum DeckVolumeAdjust {
    Raise,
    Lower,
    ToggleMute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum DeckBackendKind {
    VirtualDevice,
    Uinput,
    BluetoothHid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum DeckKeyboardType {
    Ime,
    Physical,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

impl From<DisplayCategory> for DeckDisplayCategory {
    fn from(c: DisplayCategory) -> Self {
        match c {
            DisplayCategory::Builtin => Self::Builtin,
            DisplayCategory::Presentation => Self::Presentation,
            DisplayCategory::Other => Self::Other,
        }
    }
}

impl From<DeckDisplayCategory> for DisplayCategory {
    fn from(c: DeckDisplayCategory) -> Self {
        match c {
            DeckDisplayCategory::Builtin => Self::Builtin,
            DeckDisplayCategory::Presentation => Self::Presentation,
            DeckDisplayCategory::Other => Self::Other,
        }
    }
}

impl From<DeckDisplay> for DisplayHandle {
    fn from(d: DeckDisplay) -> Self {
        Self {
            id: d.id,
            name: d.name,
            width: d.width,
            height: d.height,
            valid: d.valid,
            category: d.category.into(),
        }
    }
}

impl From<&DisplayHandle> for DeckDisplay {
    fn from(d: &DisplayHandle) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            width: d.width,
            height: d.height,
            valid: d.valid,
            category: d.category.into(),
        }
    }
}

impl From<DeckTaskInfo> for TaskInfo {
    fn from(t: DeckTaskInfo) -> Self {
        Self {
            top_package: t.top_package,
            display_id: t.display_id,
        }
    }
}

impl From<DeckEditorInfo> for EditorInfo {
    fn from(e: DeckEditorInfo) -> Self {
        Self {
            package_name: e.package_name,
            input_type: e.input_type,
            ime_options: e.ime_options,
        }
    }
}

impl From<DeckExtractedText> for ExtractedText {
    fn from(t: DeckExtractedText) -> Self {
        Self {
            text: t.text,
            selection_start: t.selection_start,
            selection_end: t.selection_end,
        }
    }
}

impl From<&KeyEvent> for DeckKeyEvent {
    fn from(e: &KeyEvent) -> Self {
        Self {
            down: e.action == KeyAction::Down,
            key_code: e.key_code,
            meta_state: e.meta_state,
        }
    }
}

impl From<&SurfaceTarget> for DeckSurfaceTarget {
    fn from(t: &SurfaceTarget) -> Self {
        match t {
            SurfaceTarget::PrimaryEmbedded => Self::PrimaryEmbedded,
            SurfaceTarget::Presentation(d) => Self::Presentation { display: d.into() },
        }
    }
}

impl From<&SurfaceLayout> for DeckSurfaceLayout {
    fn from(l: &SurfaceLayout) -> Self {
        match *l {
            SurfaceLayout::Embedded { max_height } => Self::Embedded { max_height },
            SurfaceLayout::Presentation(w) => Self::Presentation {
                window: DeckWindowConfig {
                    fullscreen: w.fullscreen,
                    focusable: w.focusable,
                    touch_modal: w.touch_modal,
                    keep_screen_on: w.keep_screen_on,
                    opaque: w.opaque,
                    hardware_accelerated: w.hardware_accelerated,
                },
            },
        }
    }
}

impl From<VolumeAdjust> for DeckVolumeAdjust {
    fn from(v: VolumeAdjust) -> Self {
        match v {
            VolumeAdjust::Raise => Self::Raise,
            VolumeAdjust::Lower => Self::Lower,
            VolumeAdjust::ToggleMute => Self::ToggleMute,
        }
    }
}

impl From<HardwareEmulationPreference> for DeckKeyboardType {
    fn from(p: HardwareEmulationPreference) -> Self {
        match p {
            HardwareEmulationPreference::Ime => Self::Ime,
            HardwareEmulationPreference::Physical => Self::Physical,
        }
    }
}

impl From<DeckBackendKind> for BackendKind {
    fn from(k: DeckBackendKind) -> Self {
        match k {
            DeckBackendKind::VirtualDevice => Self::VirtualDevice,
            DeckBackendKind::Uinput => Self::Uinput,
            DeckBackendKind::BluetoothHid => Self::BluetoothHid,
        }
    }
}

impl From<BackendStatus> for DeckBackendStatus {
    fn from(s: BackendStatus) -> Self {
        Self {
            backend: s.backend.name().to_string(),
            is_available: s.is_available,
            is_initialized: s.is_initialized,
            is_connected: s.is_connected,
            message: s.message,
            error: s.error,
        }
    }
}

impl From<DisplayState> for DeckDisplayState {
    fn from(s: DisplayState) -> Self {
        Self {
            has_secondary_display: s.has_secondary_display,
            secondary_display_id: s.secondary_display_id,
            primary_width: s.primary_width,
            primary_height: s.primary_height,
            secondary_width: s.secondary_width,
            secondary_height: s.secondary_height,
        }
    }
}

impl From<CrashRecord> for DeckCrashRecord {
    fn from(r: CrashRecord) -> Self {
        Self {
            id: r.id,
            timestamp: r.timestamp,
            error_type: r.error_type,
            message: r.message,
            stack_trace: r.stack_trace,
            engine_state: r.engine_state,
            display_state: r.display_state.map(Into::into),
        }
    }
}
