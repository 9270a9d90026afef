//! Reacting to debounced display hotplug.

use deck_core::display::DisplayEvent;
use tracing::{debug, info};

use super::{ImeSessionController, SessionMode, SessionState};

impl ImeSessionController {
    pub(crate) fn on_display_event(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::Added(handle) => {
                info!(display = handle.id, name = %handle.name, "secondary display connected");
                // A transient focus loss keeps the connection bound, so the
                // session still follows the new display.
                let ending = match self.state {
                    SessionState::Active(SessionMode::PrimaryFallback) => false,
                    SessionState::Ending(SessionMode::PrimaryFallback)
                        if self.bridge.has_connection() =>
                    {
                        true
                    }
                    _ => {
                        debug!(state = ?self.state, "no migration for added display");
                        return;
                    }
                };
                self.secondary = Some(handle);
                let mode = self.enter_mode(SessionMode::SecondaryDisplay);
                self.state = if ending {
                    SessionState::Ending(mode)
                } else {
                    SessionState::Active(mode)
                };
            }
            DisplayEvent::Removed(id) => {
                info!(display = id, "display disconnected");
                if self.secondary.as_ref().map(|d| d.id) != Some(id) {
                    return;
                }
                self.secondary = None;
                match self.state {
                    SessionState::Active(_) => {
                        let mode = self.enter_mode(SessionMode::PrimaryFallback);
                        self.state = SessionState::Active(mode);
                    }
                    SessionState::Ending(_) => {
                        self.dismiss_presentation();
                        self.state = SessionState::Ending(SessionMode::PrimaryFallback);
                    }
                    SessionState::Idle | SessionState::Starting => self.dismiss_presentation(),
                }
            }
        }
    }
}
