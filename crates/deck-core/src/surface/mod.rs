//! Rendering-engine surfaces bound to one display context each.
//!
//! The engine itself is opaque: it is created by the host for a target,
//! runs its entry point once, and receives lifecycle signals. Where its view
//! ends up (the input-view slot on the primary display or a presentation
//! window) is the host's business, reached through [`SurfaceHost`].

mod session;
mod window;

pub use session::{Attachment, RenderSurfaceSession};
pub use window::{SurfaceLayout, WindowConfig};

use crate::display::{DisplayHandle, DisplayId, DEFAULT_DISPLAY};
use crate::PlatformError;

pub type EngineId = u64;

/// A rendering-engine instance. Rendering is bound to the graphics context of
/// the display it was created for, so instances are never moved between
/// targets.
pub trait RenderEngine: Send {
    fn id(&self) -> EngineId;

    fn execute_entrypoint(&mut self, entrypoint: &str) -> Result<(), PlatformError>;

    fn resume(&mut self);

    fn pause(&mut self);

    fn destroy(&mut self);
}

/// Where a surface is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceTarget {
    /// The host-managed input view on the primary display.
    PrimaryEmbedded,
    /// A presentation window covering the given display.
    Presentation(DisplayHandle),
}

impl SurfaceTarget {
    pub fn display_id(&self) -> DisplayId {
        match self {
            Self::PrimaryEmbedded => DEFAULT_DISPLAY,
            Self::Presentation(d) => d.id,
        }
    }

    pub fn is_presentation(&self) -> bool {
        matches!(self, Self::Presentation(_))
    }
}

pub trait SurfaceHost: Send {
    fn create_engine(&mut self, target: &SurfaceTarget) -> Result<Box<dyn RenderEngine>, PlatformError>;

    /// Put the engine's view on screen. For presentations this creates and
    /// shows the window.
    fn attach(
        &mut self,
        target: &SurfaceTarget,
        engine: EngineId,
        layout: &SurfaceLayout,
    ) -> Result<(), PlatformError>;

    /// Take the engine's view off screen. Detaching the embedded view swaps a
    /// placeholder into the input-view slot; detaching a presentation
    /// dismisses the window.
    fn detach(&mut self, target: &SurfaceTarget, engine: EngineId) -> Result<(), PlatformError>;
}
