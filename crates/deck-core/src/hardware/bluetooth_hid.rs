use tracing::{debug, warn};

use super::{is_permission_failure, keycodes, BackendError, BackendKind, BackendState, HardwareBackend};
use crate::display::DisplayHandle;
use crate::PlatformError;

/// Host side of the Bluetooth HID device profile.
pub trait HidTransport: Send {
    /// Bluetooth present and the HID device profile supported.
    fn is_supported(&self) -> bool;

    /// Register the keyboard descriptor with the HID device service.
    fn register(&mut self) -> Result<(), PlatformError>;

    fn unregister(&mut self);

    /// Name of the connected host, if any.
    fn connected_device(&self) -> Option<String>;

    fn send_report(&mut self, report: &[u8; 8]) -> Result<(), PlatformError>;
}

/// Boot-protocol keyboard report: modifier byte, reserved byte and six key
/// slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootReport {
    modifiers: u8,
    keys: [u8; 6],
}

impl BootReport {
    /// Apply one Android key transition. Returns `false` for keys with no
    /// HID usage.
    pub fn apply(&mut self, key_code: u32, down: bool) -> bool {
        if let Some(bit) = keycodes::hid_modifier_bit(key_code) {
            if down {
                self.modifiers |= bit;
            } else {
                self.modifiers &= !bit;
            }
            return true;
        }
        let Some(usage) = keycodes::android_to_hid(key_code) else {
            return false;
        };
        if down {
            if !self.keys.contains(&usage) {
                // A seventh simultaneous key is dropped.
                if let Some(slot) = self.keys.iter_mut().find(|k| **k == 0) {
                    *slot = usage;
                }
            }
        } else {
            for slot in self.keys.iter_mut().filter(|k| **k == usage) {
                *slot = 0;
            }
            // Keep occupied slots packed at the front.
            let mut packed = [0u8; 6];
            for (dst, src) in packed.iter_mut().zip(self.keys.iter().filter(|k| **k != 0)) {
                *dst = *src;
            }
            self.keys = packed;
        }
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn to_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0] = self.modifiers;
        out[2..].copy_from_slice(&self.keys);
        out
    }
}

pub struct BluetoothHidBackend {
    transport: Box<dyn HidTransport>,
    available: bool,
    registered: bool,
    report: BootReport,
    message: String,
    error: Option<String>,
}

impl BluetoothHidBackend {
    pub fn new(transport: Box<dyn HidTransport>) -> Self {
        let available = transport.is_supported();
        let message = if available {
            "Available (requires Bluetooth)"
        } else {
            "Bluetooth HID not supported"
        };
        Self {
            transport,
            available,
            registered: false,
            report: BootReport::default(),
            message: message.to_string(),
            error: None,
        }
    }

    fn fail(&mut self, e: PlatformError) -> BackendError {
        self.error = Some(e.to_string());
        if is_permission_failure(&e.kind) {
            self.available = false;
            self.message = "Bluetooth permission denied".to_string();
            BackendError::PermissionDenied {
                backend: BackendKind::BluetoothHid,
                reason: e.message,
            }
        } else {
            BackendError::Device {
                backend: BackendKind::BluetoothHid,
                message: e.to_string(),
            }
        }
    }
}

impl HardwareBackend for BluetoothHidBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::BluetoothHid
    }

    fn state(&self) -> BackendState {
        if !self.available {
            BackendState::Unavailable
        } else if !self.registered {
            BackendState::Available
        } else if self.transport.connected_device().is_some() {
            BackendState::Connected
        } else {
            BackendState::Initialized
        }
    }

    fn initialize(&mut self, _display: Option<&DisplayHandle>) -> Result<(), BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable(BackendKind::BluetoothHid));
        }
        if self.registered {
            return Ok(());
        }
        match self.transport.register() {
            Ok(()) => {
                self.registered = true;
                self.report.clear();
                self.message = "HID keyboard registered".to_string();
                debug!("bluetooth hid registered");
                Ok(())
            }
            Err(e) => {
                warn!("bluetooth hid registration failed: {e}");
                Err(self.fail(e))
            }
        }
    }

    fn cleanup(&mut self) {
        if self.registered {
            if self.transport.connected_device().is_some() && self.report != BootReport::default() {
                self.report.clear();
                let _ = self.transport.send_report(&self.report.to_bytes());
            }
            self.transport.unregister();
            self.registered = false;
        }
        if self.available {
            self.message = "Available (requires Bluetooth)".to_string();
        }
    }

    /// Reports only reach a connected host.
    fn is_ready(&self) -> bool {
        self.state() == BackendState::Connected
    }

    fn send_raw(&mut self, key_code: u32, down: bool) -> Result<(), BackendError> {
        if !self.is_ready() {
            return Err(BackendError::NotInitialized(BackendKind::BluetoothHid));
        }
        if !self.report.apply(key_code, down) {
            return Err(BackendError::UnmappedKey(key_code));
        }
        let bytes = self.report.to_bytes();
        self.transport.send_report(&bytes).map_err(|e| self.fail(e))
    }

    fn status_message(&self) -> String {
        match self.transport.connected_device() {
            Some(name) if self.registered => format!("Connected to {name}"),
            _ => self.message.clone(),
        }
    }

    fn last_error(&self) -> Option<String> {
        self.error.clone()
    }
}
