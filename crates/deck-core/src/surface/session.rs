use tracing::{debug, warn};

use super::{EngineId, RenderEngine, SurfaceHost, SurfaceLayout, SurfaceTarget, WindowConfig};
use crate::display::DisplayHandle;
use crate::PlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Detached,
    Attached,
}

/// One rendering engine bound to one display context.
///
/// The embedded session wraps the long-lived primary engine handed in by the
/// owner; it is detached and reattached across input sessions but never
/// destroyed here. Presentation sessions own their engine and destroy it on
/// [`release`](Self::release).
pub struct RenderSurfaceSession {
    target: SurfaceTarget,
    engine: Box<dyn RenderEngine>,
    attachment: Attachment,
    entrypoint_executed: bool,
    owns_engine: bool,
    resumed: bool,
    attach_count: u32,
}

impl RenderSurfaceSession {
    /// Wrap the cached primary engine. `entrypoint_executed` tells whether the
    /// owner already ran its entry point.
    pub fn primary(engine: Box<dyn RenderEngine>, entrypoint_executed: bool) -> Self {
        Self {
            target: SurfaceTarget::PrimaryEmbedded,
            engine,
            attachment: Attachment::Detached,
            entrypoint_executed,
            owns_engine: false,
            resumed: false,
            attach_count: 0,
        }
    }

    /// Build a fresh engine for `display`, run its entry point and show it in
    /// a presentation window. The engine is left paused; call
    /// [`resume`](Self::resume) once the bridge is wired.
    ///
    /// On failure the half-built engine is destroyed before returning.
    pub fn acquire_presentation(
        host: &mut dyn SurfaceHost,
        display: DisplayHandle,
        entrypoint: &str,
    ) -> Result<Self, PlatformError> {
        let target = SurfaceTarget::Presentation(display);
        let engine = host.create_engine(&target)?;
        let mut session = Self {
            target,
            engine,
            attachment: Attachment::Detached,
            entrypoint_executed: false,
            owns_engine: true,
            resumed: false,
            attach_count: 0,
        };
        let layout = SurfaceLayout::Presentation(WindowConfig::keyboard_presentation());
        if let Err(e) = session.run_entrypoint(entrypoint) {
            session.engine.destroy();
            return Err(e);
        }
        if let Err(e) = session.attach(host, &layout) {
            session.engine.destroy();
            return Err(e);
        }
        debug!(
            engine = session.engine.id(),
            display = session.target.display_id(),
            "presentation session acquired"
        );
        Ok(session)
    }

    fn run_entrypoint(&mut self, entrypoint: &str) -> Result<(), PlatformError> {
        if self.entrypoint_executed {
            return Ok(());
        }
        self.engine.execute_entrypoint(entrypoint)?;
        self.entrypoint_executed = true;
        Ok(())
    }

    fn attach(&mut self, host: &mut dyn SurfaceHost, layout: &SurfaceLayout) -> Result<(), PlatformError> {
        if self.attachment == Attachment::Attached {
            return Ok(());
        }
        host.attach(&self.target, self.engine.id(), layout)?;
        self.attachment = Attachment::Attached;
        self.attach_count += 1;
        Ok(())
    }

    /// Attach the embedded view (no-op when already attached) and make sure
    /// the entry point has run.
    pub fn show_embedded(
        &mut self,
        host: &mut dyn SurfaceHost,
        layout: &SurfaceLayout,
        entrypoint: &str,
    ) -> Result<(), PlatformError> {
        self.attach(host, layout)?;
        self.run_entrypoint(entrypoint)
    }

    pub fn resume(&mut self) {
        if !self.resumed {
            self.engine.resume();
            self.resumed = true;
        }
    }

    pub fn pause(&mut self) {
        if self.resumed {
            self.engine.pause();
            self.resumed = false;
        }
    }

    /// Pause and take the view off screen. Host failures are logged; the
    /// session counts as detached either way.
    pub fn detach(&mut self, host: &mut dyn SurfaceHost) {
        if self.attachment == Attachment::Detached {
            return;
        }
        self.pause();
        if let Err(e) = host.detach(&self.target, self.engine.id()) {
            warn!(engine = self.engine.id(), "detach failed: {e}");
        }
        self.attachment = Attachment::Detached;
    }

    /// Detach, and for presentation sessions destroy the engine. Embedded
    /// sessions stay usable.
    pub fn release(&mut self, host: &mut dyn SurfaceHost) {
        self.detach(host);
        if self.owns_engine {
            debug!(engine = self.engine.id(), "destroying presentation engine");
            self.engine.destroy();
            self.owns_engine = false;
        }
    }

    pub fn target(&self) -> &SurfaceTarget {
        &self.target
    }

    /// Display this session renders on; `None` for the embedded view.
    pub fn display(&self) -> Option<&DisplayHandle> {
        match &self.target {
            SurfaceTarget::PrimaryEmbedded => None,
            SurfaceTarget::Presentation(d) => Some(d),
        }
    }

    pub fn engine_id(&self) -> EngineId {
        self.engine.id()
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn is_attached(&self) -> bool {
        self.attachment == Attachment::Attached
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    pub fn entrypoint_executed(&self) -> bool {
        self.entrypoint_executed
    }

    /// Number of times the view has gone from detached to attached.
    pub fn attach_count(&self) -> u32 {
        self.attach_count
    }
}
