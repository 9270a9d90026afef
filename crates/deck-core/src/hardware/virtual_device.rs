use tracing::{debug, warn};

use super::{is_permission_failure, BackendError, BackendKind, BackendState, HardwareBackend};
use crate::display::{DisplayHandle, DisplayId};
use crate::PlatformError;

/// Host access to the platform virtual-device keyboard API.
pub trait VirtualKeyboardDriver: Send {
    /// Capability check: fails when the API is missing on this platform
    /// version or the service is not reachable.
    fn probe(&self) -> Result<(), PlatformError>;

    /// Create the virtual device and its keyboard, associated with `display`.
    fn open(&mut self, display: Option<DisplayId>) -> Result<(), PlatformError>;

    fn close(&mut self);

    fn send_key(&mut self, key_code: u32, down: bool) -> Result<(), PlatformError>;
}

pub struct VirtualDeviceBackend {
    driver: Box<dyn VirtualKeyboardDriver>,
    available: bool,
    initialized: bool,
    message: String,
    error: Option<String>,
}

impl VirtualDeviceBackend {
    /// Probes the driver once; the result is cached for the backend's lifetime.
    pub fn new(driver: Box<dyn VirtualKeyboardDriver>) -> Self {
        let (available, message, error) = match driver.probe() {
            Ok(()) => (true, "Available".to_string(), None),
            Err(e) => {
                debug!("virtual device unavailable: {e}");
                (false, format!("Unavailable: {}", e.message), Some(e.to_string()))
            }
        };
        Self {
            driver,
            available,
            initialized: false,
            message,
            error,
        }
    }

    fn fail(&mut self, e: PlatformError) -> BackendError {
        self.error = Some(e.to_string());
        if is_permission_failure(&e.kind) {
            self.available = false;
            self.message = "Permission denied".to_string();
            BackendError::PermissionDenied {
                backend: BackendKind::VirtualDevice,
                reason: e.message,
            }
        } else {
            BackendError::Device {
                backend: BackendKind::VirtualDevice,
                message: e.to_string(),
            }
        }
    }
}

impl HardwareBackend for VirtualDeviceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::VirtualDevice
    }

    fn state(&self) -> BackendState {
        match (self.available, self.initialized) {
            (false, _) => BackendState::Unavailable,
            (true, false) => BackendState::Available,
            // The virtual keyboard is live as soon as it exists.
            (true, true) => BackendState::Connected,
        }
    }

    fn initialize(&mut self, display: Option<&DisplayHandle>) -> Result<(), BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable(BackendKind::VirtualDevice));
        }
        if self.initialized {
            return Ok(());
        }
        match self.driver.open(display.map(|d| d.id)) {
            Ok(()) => {
                self.initialized = true;
                self.message = "Initialized".to_string();
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("virtual device open failed: {e}");
                self.driver.close();
                Err(self.fail(e))
            }
        }
    }

    fn cleanup(&mut self) {
        if self.initialized {
            self.driver.close();
            self.initialized = false;
        }
        if self.available {
            self.message = "Available".to_string();
        }
    }

    fn send_raw(&mut self, key_code: u32, down: bool) -> Result<(), BackendError> {
        if !self.initialized {
            return Err(BackendError::NotInitialized(BackendKind::VirtualDevice));
        }
        self.driver.send_key(key_code, down).map_err(|e| {
            let err = self.fail(e);
            if !self.available {
                self.driver.close();
                self.initialized = false;
            }
            err
        })
    }

    fn status_message(&self) -> String {
        self.message.clone()
    }

    fn last_error(&self) -> Option<String> {
        self.error.clone()
    }
}
