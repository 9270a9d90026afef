//! Inbound calls from the keyboard UI and external triggers.

use deck_core::bridge::{
    query_or_false, BridgeError, Dispatch, ImeCommand, ImeStatus, Outbound, SettingsCommand,
    ToggleAction,
};
use deck_core::surface::EngineId;
use serde_json::Value;
use tracing::{debug, warn};

use super::ImeSessionController;

impl ImeSessionController {
    /// Apply a call on the ime channel and return its reply.
    pub fn handle_ime_call(&mut self, method: &str, args: &Value) -> Result<Value, BridgeError> {
        if self.shut_down {
            return Ok(Value::Null);
        }
        let command = ImeCommand::parse(method, args)?;
        match self
            .bridge
            .dispatch(command, self.system.as_mut(), self.keys.as_mut())
        {
            Dispatch::Reply(value) => Ok(value),
            Dispatch::HideKeyboard => {
                self.hide_keyboard();
                Ok(Value::Bool(true))
            }
        }
    }

    /// Apply a call on the settings channel and return its reply.
    pub fn handle_settings_call(&mut self, method: &str) -> Result<Value, BridgeError> {
        let command = SettingsCommand::parse(method)?;
        let reply = match command {
            SettingsCommand::IsEnabled => Value::Bool(query_or_false(self.system.is_ime_enabled())),
            SettingsCommand::IsSelected => {
                Value::Bool(query_or_false(self.system.is_ime_selected()))
            }
            SettingsCommand::OpenSettings => {
                if let Err(e) = self.system.open_ime_settings() {
                    warn!("open settings failed: {e}");
                }
                Value::Bool(true)
            }
            SettingsCommand::OpenPicker => {
                if let Err(e) = self.system.open_ime_picker() {
                    warn!("open picker failed: {e}");
                }
                Value::Bool(true)
            }
            SettingsCommand::GetStatus => {
                let status = self.ime_status();
                serde_json::json!({ "enabled": status.enabled, "selected": status.selected })
            }
        };
        Ok(reply)
    }

    /// Route a keyboard-toggle broadcast. Returns false for unknown actions.
    pub fn handle_toggle_action(&mut self, action: &str) -> bool {
        match action.parse::<ToggleAction>() {
            Ok(action) => {
                self.toggle(action);
                true
            }
            Err(e) => {
                debug!("ignored toggle action: {e}");
                false
            }
        }
    }

    /// Push the current enabled/selected status to the settings UI in `engine`.
    pub fn notify_settings_status(&mut self, engine: EngineId) {
        let status = self.ime_status();
        self.bridge.send_to(engine, &Outbound::StatusChanged(status));
    }

    fn ime_status(&self) -> ImeStatus {
        ImeStatus {
            enabled: query_or_false(self.system.is_ime_enabled()),
            selected: query_or_false(self.system.is_ime_selected()),
        }
    }
}
