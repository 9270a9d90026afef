use tracing::{debug, info, warn};

use super::{BackendError, BackendKind, BackendStatus, HardwareBackend, KeyDirection, KeyEmulation};
use crate::bridge::Modifiers;
use crate::display::DisplayHandle;
use crate::settings::HardwareEmulationPreference;

/// Chooses the active emulation backend.
///
/// Backends are tried in the configured order; the first one that
/// initialises becomes active. Switching always cleans up the previous
/// backend before initialising the next.
pub struct HardwareEmulationRouter {
    backends: Vec<Box<dyn HardwareBackend>>,
    active: Option<usize>,
    preference: HardwareEmulationPreference,
    display: Option<DisplayHandle>,
}

impl HardwareEmulationRouter {
    /// `order` ranks backend kinds; backends whose kind is not listed are
    /// never selected automatically.
    pub fn new(mut backends: Vec<Box<dyn HardwareBackend>>, order: &[BackendKind]) -> Self {
        backends.retain(|b| order.contains(&b.kind()));
        backends.sort_by_key(|b| order.iter().position(|k| *k == b.kind()));
        Self {
            backends,
            active: None,
            preference: HardwareEmulationPreference::Ime,
            display: None,
        }
    }

    pub fn preference(&self) -> HardwareEmulationPreference {
        self.preference
    }

    pub fn active_kind(&self) -> Option<BackendKind> {
        self.active.map(|i| self.backends[i].kind())
    }

    pub fn statuses(&self) -> Vec<BackendStatus> {
        self.backends.iter().map(|b| b.status()).collect()
    }

    /// A backend of `kind` is present and not known to be unusable.
    pub fn is_available(&self, kind: BackendKind) -> bool {
        self.backends.iter().any(|b| b.kind() == kind && b.is_available())
    }

    /// Active backend is initialised and can take key events.
    pub fn is_ready(&self) -> bool {
        self.active.is_some_and(|i| self.backends[i].is_ready())
    }

    /// Record the preference without touching backends.
    pub fn set_preference(&mut self, preference: HardwareEmulationPreference, display: Option<&DisplayHandle>) {
        if preference != self.preference {
            info!(?preference, "hardware emulation preference changed");
        }
        self.preference = preference;
        self.display = display.cloned();
    }

    /// Initialise the first usable backend in order, keeping the current one
    /// if it is still initialised.
    pub fn ensure_initialized(&mut self) -> Result<BackendKind, BackendError> {
        if self.preference == HardwareEmulationPreference::Ime {
            return Err(BackendError::Disabled);
        }
        if let Some(i) = self.active {
            if self.backends[i].is_initialized() {
                return Ok(self.backends[i].kind());
            }
        }
        self.deactivate();
        let display = self.display.clone();
        for i in 0..self.backends.len() {
            let backend = &mut self.backends[i];
            if !backend.is_available() {
                continue;
            }
            match backend.initialize(display.as_ref()) {
                Ok(()) => {
                    info!(backend = %backend.kind(), "hardware backend active");
                    self.active = Some(i);
                    return Ok(backend.kind());
                }
                Err(e) => warn!(backend = %backend.kind(), "backend init failed: {e}"),
            }
        }
        Err(BackendError::NoBackend)
    }

    /// Switch to a specific backend.
    pub fn select(&mut self, kind: BackendKind) -> Result<(), BackendError> {
        let i = self
            .backends
            .iter()
            .position(|b| b.kind() == kind)
            .ok_or_else(|| BackendError::UnknownBackend(kind.name().to_string()))?;
        if self.active == Some(i) && self.backends[i].is_initialized() {
            return Ok(());
        }
        self.deactivate();
        let display = self.display.clone();
        self.backends[i].initialize(display.as_ref())?;
        self.active = Some(i);
        Ok(())
    }

    fn deactivate(&mut self) {
        if let Some(i) = self.active.take() {
            debug!(backend = %self.backends[i].kind(), "cleaning up backend");
            self.backends[i].cleanup();
        }
    }

    /// Send through the active backend without initialising anything.
    pub fn send_if_ready(
        &mut self,
        key_code: u32,
        modifiers: Modifiers,
        direction: Option<KeyDirection>,
    ) -> Result<(), BackendError> {
        if self.preference == HardwareEmulationPreference::Ime {
            return Err(BackendError::Disabled);
        }
        let i = self.active.ok_or(BackendError::NoBackend)?;
        self.backends[i].send_key_event(key_code, modifiers, direction)
    }

    /// Send through whichever backend is active, regardless of preference.
    /// Used for backends picked explicitly with [`select`](Self::select).
    pub fn send_on_active(
        &mut self,
        key_code: u32,
        modifiers: Modifiers,
        direction: Option<KeyDirection>,
    ) -> Result<(), BackendError> {
        let i = self.active.ok_or(BackendError::NoBackend)?;
        self.backends[i].send_key_event(key_code, modifiers, direction)
    }

    pub fn type_text(&mut self, text: &str) -> Result<usize, BackendError> {
        self.ensure_initialized()?;
        let i = self.active.ok_or(BackendError::NoBackend)?;
        self.backends[i].type_text(text)
    }
}

impl KeyEmulation for HardwareEmulationRouter {
    /// Initialises on demand, so this may block on a root prompt. Callers on
    /// the input path should go through a worker instead.
    fn send_key_event(
        &mut self,
        key_code: u32,
        modifiers: Modifiers,
        direction: Option<KeyDirection>,
    ) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.send_if_ready(key_code, modifiers, direction)
    }

    fn apply_preference(&mut self, preference: HardwareEmulationPreference, display: Option<&DisplayHandle>) {
        self.set_preference(preference, display);
        match preference {
            HardwareEmulationPreference::Ime => self.deactivate(),
            HardwareEmulationPreference::Physical => {
                if let Err(e) = self.ensure_initialized() {
                    warn!("no hardware backend: {e}");
                }
            }
        }
    }

    fn cleanup(&mut self) {
        self.deactivate();
    }
}
