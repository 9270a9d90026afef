use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use tracing::{debug, warn};

use super::{keycodes, BackendError, BackendKind, BackendState, HardwareBackend};
use crate::display::DisplayHandle;

pub const UINPUT_NODES: [&str; 2] = ["/dev/uinput", "/dev/input/uinput"];

const DEVICE_NAME: &str = "TeleDeck Virtual Keyboard";

/// Returns whether the process can obtain root.
pub type RootProbe = fn() -> bool;

/// Runs `su -c id`; blocks until the su prompt is answered.
pub fn su_root_probe() -> bool {
    match Command::new("su").args(["-c", "id"]).status() {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("root check failed: {e}");
            false
        }
    }
}

/// Kernel uinput keyboard. Needs root.
pub struct UinputBackend {
    node: Option<PathBuf>,
    root_probe: RootProbe,
    has_root: Option<bool>,
    device: Option<VirtualDevice>,
    available: bool,
    message: String,
    error: Option<String>,
}

impl UinputBackend {
    pub fn new() -> Self {
        Self::with_nodes(&UINPUT_NODES, su_root_probe)
    }

    pub fn with_nodes<P: AsRef<Path>>(nodes: &[P], root_probe: RootProbe) -> Self {
        let node = nodes
            .iter()
            .map(|p| p.as_ref().to_path_buf())
            .find(|p| p.exists());
        let (available, message) = match &node {
            Some(_) => (true, "Available (requires root)"),
            None => (false, "uinput device not found"),
        };
        Self {
            node,
            root_probe,
            has_root: None,
            device: None,
            available,
            message: message.to_string(),
            error: None,
        }
    }

    pub fn node(&self) -> Option<&Path> {
        self.node.as_deref()
    }

    fn deny(&mut self, reason: impl Into<String>) -> BackendError {
        let reason = reason.into();
        self.available = false;
        self.message = "Permission denied".to_string();
        self.error = Some(reason.clone());
        BackendError::PermissionDenied {
            backend: BackendKind::Uinput,
            reason,
        }
    }

    fn build_device() -> io::Result<VirtualDevice> {
        let mut keys = AttributeSet::<Key>::new();
        for code in keycodes::linux_codes() {
            keys.insert(Key::new(code));
        }
        VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .with_keys(&keys)?
            .build()
    }
}

impl Default for UinputBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareBackend for UinputBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Uinput
    }

    fn state(&self) -> BackendState {
        match (self.available, self.device.is_some()) {
            (false, _) => BackendState::Unavailable,
            (true, false) => BackendState::Available,
            (true, true) => BackendState::Connected,
        }
    }

    fn initialize(&mut self, _display: Option<&DisplayHandle>) -> Result<(), BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable(BackendKind::Uinput));
        }
        if self.device.is_some() {
            return Ok(());
        }
        let has_root = *self.has_root.get_or_insert_with(self.root_probe);
        if !has_root {
            return Err(self.deny("Root access denied"));
        }
        match Self::build_device() {
            Ok(device) => {
                self.device = Some(device);
                self.message = "Initialized with root".to_string();
                self.error = None;
                debug!("uinput device created");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(self.deny(format!("cannot open uinput: {e}")))
            }
            Err(e) => {
                warn!("uinput device creation failed: {e}");
                self.error = Some(format!("Failed to create uinput device: {e}"));
                Err(BackendError::Io(e))
            }
        }
    }

    fn cleanup(&mut self) {
        if self.device.take().is_some() {
            debug!("uinput device destroyed");
        }
        if self.available {
            self.message = "Available (requires root)".to_string();
        }
    }

    fn send_raw(&mut self, key_code: u32, down: bool) -> Result<(), BackendError> {
        let linux = keycodes::android_to_linux(key_code).ok_or(BackendError::UnmappedKey(key_code))?;
        let device = self
            .device
            .as_mut()
            .ok_or(BackendError::NotInitialized(BackendKind::Uinput))?;
        let event = InputEvent::new(EventType::KEY, linux, i32::from(down));
        device.emit(&[event])?;
        Ok(())
    }

    fn status_message(&self) -> String {
        self.message.clone()
    }

    fn last_error(&self) -> Option<String> {
        self.error.clone()
    }
}
