//! Bringing the inline view and the presentation window up and down.

use deck_core::crash::{DisplayState, FaultReport};
use deck_core::display::DisplayHandle;
use deck_core::error::EngineState;
use deck_core::surface::{RenderSurfaceSession, SurfaceLayout};
use deck_core::PlatformError;
use tracing::{debug, warn};

use super::{ImeSessionController, SessionMode, SessionState};

impl ImeSessionController {
    /// Show the surface for `mode`. Returns the mode actually entered, which
    /// is `PrimaryFallback` whenever a presentation cannot be shown.
    pub(crate) fn enter_mode(&mut self, mode: SessionMode) -> SessionMode {
        match mode {
            SessionMode::PrimaryFallback => self.enter_primary(),
            SessionMode::SecondaryDisplay => match self.secondary.clone() {
                Some(sec) => self.show_presentation(mode, sec),
                None => self.enter_primary(),
            },
            SessionMode::PrimaryForRemoteInput => {
                let primary = self.watcher.primary_handle();
                self.show_presentation(mode, primary)
            }
        }
    }

    fn enter_primary(&mut self) -> SessionMode {
        if !self.show_primary() {
            debug!("no keyboard surface until the next session start");
        }
        SessionMode::PrimaryFallback
    }

    /// Attach the inline view, dismiss any presentation and point the bridge
    /// at the primary engine.
    ///
    /// Returns `false` if the view could not be attached. The primary engine
    /// is then left detached, paused and unwired.
    pub(crate) fn show_primary(&mut self) -> bool {
        let (width, height) = self.watcher.primary_metrics();
        let layout = SurfaceLayout::embedded(height, self.config.surface.primary_max_height_ratio);
        let shown =
            self.primary
                .show_embedded(self.host.as_mut(), &layout, &self.config.surface.entrypoint);
        self.dismiss_presentation();
        if let Err(e) = shown {
            warn!("inline view failed: {e}");
            self.capture_fault(&e, EngineState::Running);
            self.primary.detach(self.host.as_mut());
            self.bridge.unwire(self.primary.engine_id());
            return false;
        }
        self.bridge.wire_for_mode(
            self.primary.engine_id(),
            SessionMode::PrimaryFallback.tag(),
            width,
            height,
        );
        self.primary.resume();
        true
    }

    fn show_presentation(&mut self, mode: SessionMode, target: DisplayHandle) -> SessionMode {
        let (width, height) = target.pixel_size();

        if let Some(existing) = self.presentation.as_mut() {
            if existing.is_attached() && existing.display().map(|d| d.id) == Some(target.id) {
                debug!(display = target.id, "reusing visible presentation");
                existing.resume();
                let engine = existing.engine_id();
                self.primary.detach(self.host.as_mut());
                self.bridge.wire_for_mode(engine, mode.tag(), width, height);
                return mode;
            }
        }
        self.dismiss_presentation();

        match RenderSurfaceSession::acquire_presentation(
            self.host.as_mut(),
            target,
            &self.config.surface.entrypoint,
        ) {
            Ok(mut session) => {
                self.primary.detach(self.host.as_mut());
                self.bridge
                    .wire_for_mode(session.engine_id(), mode.tag(), width, height);
                session.resume();
                self.presentation = Some(session);
                mode
            }
            Err(e) => {
                warn!(%mode, "presentation failed, falling back to primary: {e}");
                self.capture_fault(&e, EngineState::Stopped);
                self.enter_primary()
            }
        }
    }

    /// Dismiss the presentation window and destroy its engine.
    pub(crate) fn dismiss_presentation(&mut self) {
        if let Some(mut session) = self.presentation.take() {
            self.bridge.unwire(session.engine_id());
            session.release(self.host.as_mut());
            debug!("presentation dismissed");
        }
    }

    /// The host reported that a visible surface stopped rendering.
    pub(crate) fn on_render_failure(&mut self, err: PlatformError) {
        self.capture_fault(&err, EngineState::Running);
        if self.presentation.is_none() {
            return;
        }
        match self.state {
            SessionState::Active(_) => {
                self.show_primary();
                self.state = SessionState::Active(SessionMode::PrimaryFallback);
            }
            SessionState::Ending(_) => {
                self.show_primary();
                self.state = SessionState::Ending(SessionMode::PrimaryFallback);
            }
            SessionState::Idle | SessionState::Starting => self.dismiss_presentation(),
        }
    }

    pub(crate) fn capture_fault(&mut self, err: &PlatformError, engine_state: EngineState) {
        let report = FaultReport {
            error_type: err.kind.clone(),
            message: err.message.clone(),
            stack_trace: err.trace_or_summary(),
            engine_state,
            display_state: Some(self.display_snapshot()),
        };
        match self.crash.report(&report) {
            Some(id) => debug!(%id, "fault recorded"),
            None => warn!("fault could not be recorded"),
        }
    }

    fn display_snapshot(&self) -> DisplayState {
        let secondary = self.watcher.secondary_display();
        let (primary_width, primary_height) = self.watcher.primary_metrics();
        DisplayState {
            has_secondary_display: secondary.is_some(),
            secondary_display_id: secondary.as_ref().map(|d| d.id),
            primary_width,
            primary_height,
            secondary_width: secondary.as_ref().map(|d| d.width),
            secondary_height: secondary.as_ref().map(|d| d.height),
        }
    }
}
