//! Dual-display input-method session controller.
//!
//! `ImeSessionController` decides, on every input-session transition, which
//! display hosts the keyboard surface, owns the rendering sessions for the
//! primary input view and the secondary presentation, and migrates between
//! them when displays come and go. It is driven by [`ControllerEvent`]s on a
//! single thread; hotplug debouncing is advanced by [`ImeSessionController::poll`].

mod channels;
mod hotplug;
mod lifecycle;
mod surfaces;
mod toggle;
mod types;

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use deck_core::bridge::{EventBridge, SystemControls};
use deck_core::crash::CrashReporter;
use deck_core::display::{ClassifierChain, DisplayHandle, DisplayWatcher};
use deck_core::hardware::KeyEmulation;
use deck_core::settings::{self, DeckConfig, HardwareEmulationPreference, SettingsStore};
use deck_core::surface::{EngineId, RenderSurfaceSession, SurfaceHost};
use tracing::{debug, debug_span};

pub use types::{ControllerDeps, ControllerEvent, SessionMode, SessionState};

pub struct ImeSessionController {
    config: DeckConfig,
    watcher: DisplayWatcher,
    host: Box<dyn SurfaceHost>,
    system: Box<dyn SystemControls>,
    settings: Box<dyn SettingsStore>,
    crash: Box<dyn CrashReporter>,
    keys: Box<dyn KeyEmulation>,
    bridge: EventBridge,

    /// Inline input view; retained for the controller's whole lifetime.
    primary: RenderSurfaceSession,
    /// Presentation window, recreated on every show.
    presentation: Option<RenderSurfaceSession>,

    state: SessionState,
    /// Secondary display the current mode was decided against.
    secondary: Option<DisplayHandle>,
    preference: HardwareEmulationPreference,
    shut_down: bool,
}

impl ImeSessionController {
    pub fn new(deps: ControllerDeps, config: DeckConfig) -> Self {
        let classifiers = ClassifierChain::standard(deps.focus, config.display.secondary_packages.iter());
        let mut watcher = DisplayWatcher::new(deps.displays, classifiers, config.display.debounce());
        watcher.subscribe();

        let mut controller = Self {
            watcher,
            host: deps.surfaces,
            system: deps.system,
            settings: deps.settings,
            crash: deps.crash,
            keys: deps.keys,
            bridge: EventBridge::new(deps.sink),
            primary: RenderSurfaceSession::primary(deps.primary_engine, deps.primary_entrypoint_executed),
            presentation: None,
            state: SessionState::Idle,
            secondary: None,
            preference: HardwareEmulationPreference::Ime,
            shut_down: false,
            config,
        };
        controller.reload_preference();
        controller
    }

    /// Apply one event. `now` drives the hotplug debounce.
    pub fn handle(&mut self, event: ControllerEvent, now: Instant) {
        if self.shut_down {
            debug!(?event, "ignored after shutdown");
            return;
        }
        let _span = debug_span!("controller", state = ?self.state).entered();
        debug!(?event, "event");
        match event {
            ControllerEvent::SessionStart { editor, connection } => {
                self.start_session(editor, connection)
            }
            ControllerEvent::SessionEnd { finishing_input } => self.end_session(finishing_input),
            ControllerEvent::DisplayAdded(id) => {
                self.watcher.on_display_added(id, now);
            }
            ControllerEvent::DisplayRemoved(id) => {
                self.watcher.on_display_removed(id, now);
            }
            ControllerEvent::Toggle(action) => self.toggle(action),
            ControllerEvent::RenderFailure(err) => self.on_render_failure(err),
        }
    }

    /// Fire due hotplug events. Returns the time until the next pending
    /// deadline, if any.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        if self.shut_down {
            return None;
        }
        for event in self.watcher.poll(now) {
            self.on_display_event(event);
        }
        self.watcher
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// The host's preference store changed. Re-reads the keyboard preference
    /// when the relevant key is affected.
    pub fn on_settings_changed(&mut self, key: Option<&str>) {
        if self.shut_down {
            return;
        }
        if key.map_or(true, |k| k == settings::SETTINGS_KEY) {
            self.reload_preference();
        }
    }

    fn reload_preference(&mut self) {
        self.preference = settings::read_preference(self.settings.as_ref());
        let secondary = self.watcher.secondary_display();
        self.keys.apply_preference(self.preference, secondary.as_ref());
        debug!(preference = ?self.preference, "keyboard preference applied");
    }

    /// Tear everything down. Further events are ignored.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.watcher.unsubscribe();
        self.keys.cleanup();
        self.dismiss_presentation();
        self.primary.detach(self.host.as_mut());
        self.bridge.unbind();
        self.state = SessionState::Idle;
        self.secondary = None;
        self.shut_down = true;
        debug!("controller shut down");
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Option<SessionMode> {
        self.state.mode()
    }

    /// Tag of the current mode, `None` between sessions.
    pub fn mode_tag(&self) -> Option<&'static str> {
        self.mode().map(SessionMode::tag)
    }

    pub fn preference(&self) -> HardwareEmulationPreference {
        self.preference
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn is_presentation_showing(&self) -> bool {
        self.presentation.as_ref().is_some_and(RenderSurfaceSession::is_attached)
    }

    pub fn presentation_display(&self) -> Option<&DisplayHandle> {
        self.presentation.as_ref().and_then(RenderSurfaceSession::display)
    }

    pub fn presentation_engine(&self) -> Option<EngineId> {
        self.presentation.as_ref().map(RenderSurfaceSession::engine_id)
    }

    pub fn primary_session(&self) -> &RenderSurfaceSession {
        &self.primary
    }

    pub fn wired_engine(&self) -> Option<EngineId> {
        self.bridge.wired_engine()
    }

    pub fn has_connection(&self) -> bool {
        self.bridge.has_connection()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
