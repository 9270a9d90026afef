//! External show/hide/toggle requests.

use deck_core::bridge::ToggleAction;
use tracing::{debug, warn};

use super::{ImeSessionController, SessionMode, SessionState};

impl ImeSessionController {
    pub(crate) fn toggle(&mut self, action: ToggleAction) {
        match action {
            ToggleAction::Toggle => self.toggle_keyboard(),
            ToggleAction::Show => self.show_keyboard(),
            ToggleAction::Hide => self.hide_keyboard(),
        }
    }

    /// Flip keyboard visibility. With a secondary display this shows or
    /// dismisses the presentation; otherwise the host decides.
    pub fn toggle_keyboard(&mut self) {
        if self.shut_down {
            return;
        }
        if self.watcher.secondary_display().is_some() {
            if self.is_presentation_showing() {
                self.hide_keyboard();
            } else {
                self.show_keyboard();
            }
            return;
        }
        let shown = match self.system.is_input_view_shown() {
            Ok(shown) => shown,
            Err(e) => {
                warn!("input view query failed: {e}");
                false
            }
        };
        if shown {
            self.hide_keyboard();
        } else {
            self.show_keyboard();
        }
    }

    pub fn show_keyboard(&mut self) {
        if self.shut_down {
            return;
        }
        let Some(secondary) = self.watcher.secondary_display() else {
            if let Err(e) = self.system.request_show_self() {
                warn!("show request failed: {e}");
            }
            return;
        };
        let mode = match self.mode() {
            Some(SessionMode::PrimaryForRemoteInput) => SessionMode::PrimaryForRemoteInput,
            _ => SessionMode::SecondaryDisplay,
        };
        debug!(%mode, display = secondary.id, "showing keyboard");
        self.secondary = Some(secondary);
        let entered = self.enter_mode(mode);
        self.state = match self.state {
            SessionState::Active(_) => SessionState::Active(entered),
            SessionState::Ending(_) => SessionState::Ending(entered),
            other => other,
        };
    }

    pub fn hide_keyboard(&mut self) {
        if self.shut_down {
            return;
        }
        if self.watcher.secondary_display().is_some() {
            debug!("hiding presentation");
            self.dismiss_presentation();
            return;
        }
        if let Err(e) = self.system.request_hide_self() {
            warn!("hide request failed: {e}");
        }
    }
}
