//! Input-session start and end.

use deck_core::bridge::{EditorInfo, InputConnection};
use tracing::debug;

use super::{ImeSessionController, SessionMode, SessionState};

impl ImeSessionController {
    /// Decide the mode for a new (or resumed) input session and bring the
    /// matching surface up.
    pub(crate) fn start_session(
        &mut self,
        editor: EditorInfo,
        connection: Option<Box<dyn InputConnection>>,
    ) {
        self.state = SessionState::Starting;
        let package = editor.package_name.clone();
        self.bridge.bind(editor, connection);

        let secondary = self.watcher.secondary_display();
        let mode = match &secondary {
            None => SessionMode::PrimaryFallback,
            Some(sec) => {
                let input = self
                    .watcher
                    .detect_display_for_active_input(package.as_deref(), Some(sec));
                if input.id == sec.id {
                    SessionMode::PrimaryForRemoteInput
                } else {
                    SessionMode::SecondaryDisplay
                }
            }
        };
        debug!(%mode, package = ?package, "session starting");
        self.secondary = secondary;
        let mode = self.enter_mode(mode);
        self.state = SessionState::Active(mode);
    }

    /// `finishing_input = false`: the input view went away, possibly only
    /// for a moment. Nothing is dismissed; the inline engine is paused.
    ///
    /// `finishing_input = true`: the session is over. The connection is
    /// dropped but surfaces stay as they are until toggled, torn down or
    /// their display disappears.
    pub(crate) fn end_session(&mut self, finishing_input: bool) {
        let mode = match self.state {
            SessionState::Active(m) | SessionState::Ending(m) => Some(m),
            SessionState::Starting | SessionState::Idle => None,
        };
        if mode == Some(SessionMode::PrimaryFallback) {
            self.primary.pause();
        }
        if finishing_input {
            self.bridge.unbind();
            self.state = SessionState::Idle;
        } else if let Some(m) = mode {
            self.state = SessionState::Ending(m);
        }
        debug!(finishing_input, state = ?self.state, "session ended");
    }
}
