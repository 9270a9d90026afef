//! Physical-keyboard emulation backends.
//!
//! Each backend presents itself to the system as a real keyboard. At most one
//! is active; [`HardwareEmulationRouter`] picks it according to the user's
//! preference and the configured order. Callers treat any error as "use the
//! input connection instead".

mod bluetooth_hid;
pub mod keycodes;
mod router;
#[cfg(any(target_os = "linux", target_os = "android"))]
mod uinput;
mod virtual_device;

pub use bluetooth_hid::{BluetoothHidBackend, BootReport, HidTransport};
pub use router::HardwareEmulationRouter;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use uinput::UinputBackend;
pub use virtual_device::{VirtualDeviceBackend, VirtualKeyboardDriver};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bridge::Modifiers;
use crate::display::DisplayHandle;
use crate::settings::HardwareEmulationPreference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    VirtualDevice,
    Uinput,
    BluetoothHid,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::VirtualDevice, Self::Uinput, Self::BluetoothHid];

    pub fn name(self) -> &'static str {
        match self {
            Self::VirtualDevice => "virtualDevice",
            Self::Uinput => "uinput",
            Self::BluetoothHid => "bluetoothHid",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| BackendError::UnknownBackend(s.to_string()))
    }
}

/// `Unavailable → Available → Initialized → Connected`; `cleanup` returns an
/// initialised backend to `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BackendState {
    Unavailable,
    Available,
    Initialized,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub backend: BackendKind,
    pub is_available: bool,
    pub is_initialized: bool,
    pub is_connected: bool,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("hardware emulation is disabled")]
    Disabled,
    #[error("no hardware backend is available")]
    NoBackend,
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("{0} backend is unavailable")]
    Unavailable(BackendKind),
    #[error("{0} backend is not initialized")]
    NotInitialized(BackendKind),
    #[error("backend is busy")]
    Busy,
    #[error("{backend} permission denied: {reason}")]
    PermissionDenied { backend: BackendKind, reason: String },
    #[error("{backend} device error: {message}")]
    Device { backend: BackendKind, message: String },
    #[error("unmapped key code {0}")]
    UnmappedKey(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Common contract of the emulation backends.
///
/// Implementations provide single key transitions through
/// [`send_raw`](Self::send_raw); full presses and text typing are built on top
/// of it.
pub trait HardwareBackend: Send {
    fn kind(&self) -> BackendKind;

    fn state(&self) -> BackendState;

    fn initialize(&mut self, display: Option<&DisplayHandle>) -> Result<(), BackendError>;

    fn cleanup(&mut self);

    /// Press (`down = true`) or release one Android key code.
    fn send_raw(&mut self, key_code: u32, down: bool) -> Result<(), BackendError>;

    fn status_message(&self) -> String;

    fn last_error(&self) -> Option<String> {
        None
    }

    fn is_available(&self) -> bool {
        self.state() != BackendState::Unavailable
    }

    fn is_initialized(&self) -> bool {
        self.state() >= BackendState::Initialized
    }

    /// Whether key events can be delivered right now.
    fn is_ready(&self) -> bool {
        self.is_initialized()
    }

    fn status(&self) -> BackendStatus {
        let state = self.state();
        BackendStatus {
            backend: self.kind(),
            is_available: state != BackendState::Unavailable,
            is_initialized: state >= BackendState::Initialized,
            is_connected: state == BackendState::Connected,
            message: self.status_message(),
            error: self.last_error(),
        }
    }

    /// Send one transition, or with `direction = None` a full press with
    /// modifiers wrapped around it: shift, ctrl, alt, meta go down before
    /// the key and come up in reverse order after it. Modifiers already
    /// pressed are released even if a later step fails.
    fn send_key_event(
        &mut self,
        key_code: u32,
        modifiers: Modifiers,
        direction: Option<KeyDirection>,
    ) -> Result<(), BackendError> {
        if !self.is_ready() {
            return Err(BackendError::NotInitialized(self.kind()));
        }
        match direction {
            Some(KeyDirection::Down) => self.send_raw(key_code, true),
            Some(KeyDirection::Up) => self.send_raw(key_code, false),
            None => {
                let wanted = [
                    (modifiers.shift, keycodes::KEYCODE_SHIFT_LEFT),
                    (modifiers.ctrl, keycodes::KEYCODE_CTRL_LEFT),
                    (modifiers.alt, keycodes::KEYCODE_ALT_LEFT),
                    (modifiers.meta, keycodes::KEYCODE_META_LEFT),
                ];
                let mut held = Vec::with_capacity(4);
                let mut result = Ok(());
                for (on, code) in wanted {
                    if !on {
                        continue;
                    }
                    if let Err(e) = self.send_raw(code, true) {
                        result = Err(e);
                        break;
                    }
                    held.push(code);
                }
                if result.is_ok() {
                    result = self
                        .send_raw(key_code, true)
                        .and_then(|()| self.send_raw(key_code, false));
                }
                for code in held.into_iter().rev() {
                    let released = self.send_raw(code, false);
                    if result.is_ok() {
                        result = released;
                    }
                }
                result
            }
        }
    }

    /// Type `text` as key presses. Characters without a key on a US layout
    /// are skipped. Returns how many characters were typed.
    fn type_text(&mut self, text: &str) -> Result<usize, BackendError> {
        let mut typed = 0;
        for c in text.chars() {
            let Some((code, shift)) = keycodes::char_to_key(c) else {
                continue;
            };
            let mods = if shift { Modifiers::shift() } else { Modifiers::NONE };
            self.send_key_event(code, mods, None)?;
            typed += 1;
        }
        Ok(typed)
    }
}

/// Key delivery seam used by the event bridge. Any error means the caller
/// falls back to the input connection.
pub trait KeyEmulation: Send {
    fn send_key_event(
        &mut self,
        key_code: u32,
        modifiers: Modifiers,
        direction: Option<KeyDirection>,
    ) -> Result<(), BackendError>;

    /// Re-apply the persisted preference; `display` is the secondary display
    /// backends may bind to.
    fn apply_preference(
        &mut self,
        preference: HardwareEmulationPreference,
        display: Option<&DisplayHandle>,
    );

    fn cleanup(&mut self);
}

/// Permission-style failures from the host that should take a backend out
/// of rotation.
pub(crate) fn is_permission_failure(kind: &str) -> bool {
    kind.contains("SecurityException") || kind.contains("ClassNotFound") || kind.contains("NoSuchMethod")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        state: BackendState,
        log: Vec<(u32, bool)>,
        fail_on: Option<u32>,
    }

    impl HardwareBackend for Recorder {
        fn kind(&self) -> BackendKind {
            BackendKind::VirtualDevice
        }

        fn state(&self) -> BackendState {
            self.state
        }

        fn initialize(&mut self, _display: Option<&DisplayHandle>) -> Result<(), BackendError> {
            self.state = BackendState::Initialized;
            Ok(())
        }

        fn cleanup(&mut self) {
            self.state = BackendState::Available;
        }

        fn send_raw(&mut self, key_code: u32, down: bool) -> Result<(), BackendError> {
            if self.fail_on == Some(key_code) {
                return Err(BackendError::Device {
                    backend: BackendKind::VirtualDevice,
                    message: "write failed".into(),
                });
            }
            self.log.push((key_code, down));
            Ok(())
        }

        fn status_message(&self) -> String {
            String::new()
        }
    }

    fn recorder() -> Recorder {
        Recorder {
            state: BackendState::Initialized,
            log: Vec::new(),
            fail_on: None,
        }
    }

    #[test]
    fn test_full_press_nesting() {
        use keycodes::*;
        let mut b = recorder();
        let mods = Modifiers {
            shift: true,
            ctrl: true,
            alt: true,
            meta: true,
        };
        b.send_key_event(KEYCODE_A, mods, None).unwrap();
        assert_eq!(
            b.log,
            vec![
                (KEYCODE_SHIFT_LEFT, true),
                (KEYCODE_CTRL_LEFT, true),
                (KEYCODE_ALT_LEFT, true),
                (KEYCODE_META_LEFT, true),
                (KEYCODE_A, true),
                (KEYCODE_A, false),
                (KEYCODE_META_LEFT, false),
                (KEYCODE_ALT_LEFT, false),
                (KEYCODE_CTRL_LEFT, false),
                (KEYCODE_SHIFT_LEFT, false),
            ]
        );
    }

    #[test]
    fn test_failed_key_still_releases_modifiers() {
        use keycodes::*;
        let mut b = recorder();
        b.fail_on = Some(KEYCODE_A);
        let mods = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(b.send_key_event(KEYCODE_A, mods, None).is_err());
        assert_eq!(b.log, vec![(KEYCODE_CTRL_LEFT, true), (KEYCODE_CTRL_LEFT, false)]);
    }

    #[test]
    fn test_not_initialized_rejected() {
        let mut b = recorder();
        b.state = BackendState::Available;
        assert!(matches!(
            b.send_key_event(keycodes::KEYCODE_A, Modifiers::NONE, None),
            Err(BackendError::NotInitialized(BackendKind::VirtualDevice))
        ));
        assert!(b.log.is_empty());
    }

    #[test]
    fn test_type_text_skips_unmapped() {
        let mut b = recorder();
        assert_eq!(b.type_text("Hé!").unwrap(), 2);
        // 'H' and '!' each wrapped in shift.
        assert_eq!(b.log.len(), 8);
    }

    #[test]
    fn test_backend_kind_names() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>().unwrap(), kind);
        }
        assert!("hid".parse::<BackendKind>().is_err());
    }
}
