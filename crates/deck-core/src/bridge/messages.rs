use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Modifiers;

/// Channel the keyboard UI and the service talk over.
pub const IME_CHANNEL: &str = "tele_deck/ime";
pub const SETTINGS_CHANNEL: &str = "app.gsmlg.tele_deck/settings";

pub const TOGGLE_ACTION_PREFIX: &str = "app.gsmlg.tele_deck.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("method not implemented: {0}")]
    NotImplemented(String),
    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyEventArgs {
    pub key_code: u32,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

/// Inbound call on the ime channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImeCommand {
    CommitText(String),
    Backspace,
    Delete,
    Enter,
    Tab,
    MoveCursor(i32),
    SendKeyEvent(KeyEventArgs),
    GetConnectionStatus,
    IsImeEnabled,
    IsImeActive,
    OpenImePicker,
    HideKeyboard,
    SendMediaKey(String),
}

impl ImeCommand {
    /// Decode a method call. Missing arguments fall back to empty values;
    /// arguments of the wrong shape are rejected.
    pub fn parse(method: &str, args: &Value) -> Result<Self, BridgeError> {
        let invalid = |reason: &str| BridgeError::InvalidArguments {
            method: method.to_string(),
            reason: reason.to_string(),
        };
        Ok(match method {
            "commitText" => Self::CommitText(match args {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                _ => return Err(invalid("expected a string")),
            }),
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            "enter" => Self::Enter,
            "tab" => Self::Tab,
            "moveCursor" => Self::MoveCursor(match args {
                Value::Null => 0,
                Value::Number(n) => n
                    .as_i64()
                    .map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
                    .ok_or_else(|| invalid("expected an integer"))?,
                _ => return Err(invalid("expected an integer")),
            }),
            "sendKeyEvent" => Self::SendKeyEvent(match args {
                Value::Null => KeyEventArgs::default(),
                v => KeyEventArgs::deserialize(v).map_err(|e| invalid(&e.to_string()))?,
            }),
            "getConnectionStatus" => Self::GetConnectionStatus,
            "isImeEnabled" => Self::IsImeEnabled,
            "isImeActive" => Self::IsImeActive,
            "openImePicker" => Self::OpenImePicker,
            "hideKeyboard" => Self::HideKeyboard,
            "sendMediaKey" => Self::SendMediaKey(args.as_str().unwrap_or_default().to_string()),
            other => return Err(BridgeError::NotImplemented(other.to_string())),
        })
    }
}

/// Inbound call on the settings channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCommand {
    IsEnabled,
    IsSelected,
    OpenSettings,
    OpenPicker,
    GetStatus,
}

impl SettingsCommand {
    pub fn parse(method: &str) -> Result<Self, BridgeError> {
        Ok(match method {
            "isEnabled" | "isIMEEnabled" => Self::IsEnabled,
            "isSelected" | "isActive" | "isIMESelected" => Self::IsSelected,
            "openSettings" | "openIMESettings" => Self::OpenSettings,
            "openPicker" | "openIMEPicker" => Self::OpenPicker,
            "getStatus" | "getIMEStatus" => Self::GetStatus,
            other => return Err(BridgeError::NotImplemented(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImeStatus {
    pub enabled: bool,
    pub selected: bool,
}

/// External keyboard-visibility trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Toggle,
    Show,
    Hide,
}

impl FromStr for ToggleAction {
    type Err = BridgeError;

    /// Accepts bare (`TOGGLE_KEYBOARD`), qualified
    /// (`app.gsmlg.tele_deck.TOGGLE_KEYBOARD`) and channel-method
    /// (`toggleKeyboard`) spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix(TOGGLE_ACTION_PREFIX).unwrap_or(s);
        match bare {
            "TOGGLE_KEYBOARD" | "toggleKeyboard" => Ok(Self::Toggle),
            "SHOW_KEYBOARD" | "showKeyboard" => Ok(Self::Show),
            "HIDE_KEYBOARD" | "hideKeyboard" => Ok(Self::Hide),
            _ => Err(BridgeError::NotImplemented(s.to_string())),
        }
    }
}

/// Host-to-UI notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    ConnectionStatus {
        connected: bool,
    },
    DisplayModeChanged {
        mode: &'static str,
        display_width: u32,
        display_height: u32,
    },
    StatusChanged(ImeStatus),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayModePayload<'a> {
    mode: &'a str,
    display_width: u32,
    display_height: u32,
}

impl Outbound {
    pub fn channel(&self) -> &'static str {
        match self {
            Self::StatusChanged(_) => SETTINGS_CHANNEL,
            _ => IME_CHANNEL,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::ConnectionStatus { .. } => "connectionStatus",
            Self::DisplayModeChanged { .. } => "displayModeChanged",
            Self::StatusChanged(_) => "onStatusChanged",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::ConnectionStatus { connected } => serde_json::json!({ "connected": connected }),
            Self::DisplayModeChanged {
                mode,
                display_width,
                display_height,
            } => serde_json::to_value(DisplayModePayload {
                mode,
                display_width: *display_width,
                display_height: *display_height,
            })
            .unwrap_or(Value::Null),
            Self::StatusChanged(status) => {
                serde_json::json!({ "enabled": status.enabled, "selected": status.selected })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_send_key_event() {
        let cmd = ImeCommand::parse(
            "sendKeyEvent",
            &json!({"keyCode": 29, "shift": true, "ctrl": true}),
        )
        .unwrap();
        let ImeCommand::SendKeyEvent(args) = cmd else {
            panic!("unexpected {cmd:?}");
        };
        assert_eq!(args.key_code, 29);
        assert!(args.modifiers.shift && args.modifiers.ctrl);
        assert!(!args.modifiers.alt && !args.modifiers.meta);
    }

    #[test]
    fn test_parse_lenient_missing_args() {
        assert_eq!(
            ImeCommand::parse("commitText", &Value::Null).unwrap(),
            ImeCommand::CommitText(String::new())
        );
        assert_eq!(
            ImeCommand::parse("moveCursor", &Value::Null).unwrap(),
            ImeCommand::MoveCursor(0)
        );
        assert_eq!(
            ImeCommand::parse("moveCursor", &json!(-5)).unwrap(),
            ImeCommand::MoveCursor(-5)
        );
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(matches!(
            ImeCommand::parse("moveCursor", &json!("left")),
            Err(BridgeError::InvalidArguments { .. })
        ));
        assert_eq!(
            ImeCommand::parse("selectAll", &Value::Null),
            Err(BridgeError::NotImplemented("selectAll".into()))
        );
    }

    #[test]
    fn test_settings_aliases() {
        assert_eq!(SettingsCommand::parse("isIMEEnabled").unwrap(), SettingsCommand::IsEnabled);
        assert_eq!(SettingsCommand::parse("isActive").unwrap(), SettingsCommand::IsSelected);
        assert_eq!(SettingsCommand::parse("getIMEStatus").unwrap(), SettingsCommand::GetStatus);
        assert!(SettingsCommand::parse("reboot").is_err());
    }

    #[test]
    fn test_toggle_spellings() {
        assert_eq!("TOGGLE_KEYBOARD".parse::<ToggleAction>().unwrap(), ToggleAction::Toggle);
        assert_eq!(
            "app.gsmlg.tele_deck.SHOW_KEYBOARD".parse::<ToggleAction>().unwrap(),
            ToggleAction::Show
        );
        assert_eq!("hideKeyboard".parse::<ToggleAction>().unwrap(), ToggleAction::Hide);
        assert!("com.other.HIDE".parse::<ToggleAction>().is_err());
    }

    #[test]
    fn test_display_mode_payload_keys() {
        let msg = Outbound::DisplayModeChanged {
            mode: "secondary",
            display_width: 1080,
            display_height: 1240,
        };
        assert_eq!(msg.method(), "displayModeChanged");
        assert_eq!(
            msg.payload(),
            json!({"mode": "secondary", "displayWidth": 1080, "displayHeight": 1240})
        );
    }
}
