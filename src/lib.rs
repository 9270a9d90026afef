//! Dual-display input-method engine for handhelds with a second screen.
//!
//! The Android service hands its platform objects to [`api::DeckService`] and
//! forwards lifecycle, hotplug and channel calls; the service decides where
//! the keyboard is drawn and keeps the keyboard UI informed.

uniffi::setup_scaffolding!();

pub mod api;

mod async_worker;
mod trace_init;
