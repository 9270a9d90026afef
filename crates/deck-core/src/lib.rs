//! Leaf components of the dual-display keyboard service.
//!
//! Everything here is host-agnostic: platform services (display enumeration,
//! rendering engines, input connections, system controls) are reached through
//! traits so the session controller can be driven and tested without Android.

pub mod bridge;
pub mod crash;
pub mod display;
pub mod error;
pub mod hardware;
pub mod settings;
pub mod surface;

pub use error::PlatformError;
