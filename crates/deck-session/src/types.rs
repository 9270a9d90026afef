use std::fmt;
use std::sync::Arc;

use deck_core::bridge::{EditorInfo, InputConnection, MessageSink, SystemControls, ToggleAction};
use deck_core::crash::CrashReporter;
use deck_core::display::{DisplayId, DisplayService, FocusProbe};
use deck_core::hardware::KeyEmulation;
use deck_core::settings::SettingsStore;
use deck_core::surface::{RenderEngine, SurfaceHost};
use deck_core::PlatformError;

/// Where the keyboard is rendered for the current input session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// No secondary display: inline input view on the primary display.
    PrimaryFallback,
    /// Presentation window on the secondary display.
    SecondaryDisplay,
    /// The focused app is on the secondary display, so the keyboard goes to
    /// the primary one.
    PrimaryForRemoteInput,
}

impl SessionMode {
    /// Tag reported to the keyboard UI in `displayModeChanged`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::PrimaryFallback => "primary_fallback",
            Self::SecondaryDisplay => "secondary",
            Self::PrimaryForRemoteInput => "primary_for_secondary_input",
        }
    }

    pub fn uses_presentation(self) -> bool {
        !matches!(self, Self::PrimaryFallback)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active(SessionMode),
    /// Input view finished but the session may resume on the same field.
    Ending(SessionMode),
}

impl SessionState {
    pub fn mode(self) -> Option<SessionMode> {
        match self {
            Self::Active(m) | Self::Ending(m) => Some(m),
            Self::Idle | Self::Starting => None,
        }
    }
}

/// Inputs that drive the controller.
pub enum ControllerEvent {
    SessionStart {
        editor: EditorInfo,
        connection: Option<Box<dyn InputConnection>>,
    },
    /// `finishing_input = false` is the transient "input view finished"
    /// signal; `true` ends the input session for good.
    SessionEnd { finishing_input: bool },
    /// Raw hotplug notifications; debounced before they act.
    DisplayAdded(DisplayId),
    DisplayRemoved(DisplayId),
    Toggle(ToggleAction),
    RenderFailure(PlatformError),
}

impl fmt::Debug for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStart { editor, connection } => f
                .debug_struct("SessionStart")
                .field("editor", editor)
                .field("connected", &connection.is_some())
                .finish(),
            Self::SessionEnd { finishing_input } => f
                .debug_struct("SessionEnd")
                .field("finishing_input", finishing_input)
                .finish(),
            Self::DisplayAdded(id) => f.debug_tuple("DisplayAdded").field(id).finish(),
            Self::DisplayRemoved(id) => f.debug_tuple("DisplayRemoved").field(id).finish(),
            Self::Toggle(a) => f.debug_tuple("Toggle").field(a).finish(),
            Self::RenderFailure(e) => f.debug_tuple("RenderFailure").field(e).finish(),
        }
    }
}

/// Platform collaborators handed to the controller at construction.
pub struct ControllerDeps {
    pub displays: Box<dyn DisplayService>,
    pub focus: Arc<dyn FocusProbe>,
    pub surfaces: Box<dyn SurfaceHost>,
    pub system: Box<dyn SystemControls>,
    pub sink: Box<dyn MessageSink>,
    pub settings: Box<dyn SettingsStore>,
    pub crash: Box<dyn CrashReporter>,
    pub keys: Box<dyn KeyEmulation>,
    /// Long-lived engine backing the inline input view. Owned by the caller's
    /// cache; the controller never destroys it.
    pub primary_engine: Box<dyn RenderEngine>,
    pub primary_entrypoint_executed: bool,
}
