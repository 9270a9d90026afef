//! Message plumbing between the keyboard UI and the focused application.
//!
//! Inbound calls from the UI are decoded into [`ImeCommand`]s and applied to
//! the current [`InputConnection`]; outbound notifications go through a
//! [`MessageSink`] to whichever engine is wired.

mod connection;
mod messages;
mod system;

pub use connection::{
    EditorInfo, ExtractedText, InputConnection, KeyAction, KeyEvent, Modifiers,
    IME_ACTION_NONE, IME_ACTION_UNSPECIFIED, IME_FLAG_NO_ENTER_ACTION, IME_MASK_ACTION,
    META_ALT_ON, META_CTRL_ON, META_META_ON, META_SHIFT_ON,
};
pub use messages::{
    BridgeError, ImeCommand, ImeStatus, KeyEventArgs, Outbound, SettingsCommand, ToggleAction,
    IME_CHANNEL, SETTINGS_CHANNEL, TOGGLE_ACTION_PREFIX,
};
pub use system::{MediaAction, SystemControls, UnknownMediaAction, VolumeAdjust};

use serde_json::Value;
use tracing::{debug, warn};

use crate::hardware::KeyEmulation;
use crate::surface::EngineId;
use crate::PlatformError;

/// Delivers a method call to the UI running in `engine`.
pub trait MessageSink: Send {
    fn send(
        &mut self,
        engine: EngineId,
        channel: &str,
        method: &str,
        payload: Value,
    ) -> Result<(), PlatformError>;
}

/// Result of an ime-channel call that the bridge could not finish alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Reply(Value),
    /// The UI asked to hide the keyboard; the caller owns visibility.
    HideKeyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModeNotice {
    mode: &'static str,
    width: u32,
    height: u32,
}

pub struct EventBridge {
    sink: Box<dyn MessageSink>,
    connection: Option<Box<dyn InputConnection>>,
    editor: Option<EditorInfo>,
    wired: Option<EngineId>,
    mode: Option<ModeNotice>,
}

impl EventBridge {
    pub fn new(sink: Box<dyn MessageSink>) -> Self {
        Self {
            sink,
            connection: None,
            editor: None,
            wired: None,
            mode: None,
        }
    }

    // -----------------------------------------------------------------
    // Binding
    // -----------------------------------------------------------------

    /// Bind the connection of a newly started input session.
    pub fn bind(&mut self, editor: EditorInfo, connection: Option<Box<dyn InputConnection>>) {
        self.editor = Some(editor);
        self.connection = connection;
        self.push_connection_status();
    }

    pub fn unbind(&mut self) {
        let had = self.connection.is_some();
        self.connection = None;
        self.editor = None;
        if had {
            self.push_connection_status();
        }
    }

    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub fn editor(&self) -> Option<&EditorInfo> {
        self.editor.as_ref()
    }

    /// Route notifications to `engine` and replay the current connection
    /// status and display mode to it.
    pub fn wire(&mut self, engine: EngineId) {
        self.wired = Some(engine);
        debug!(engine, "bridge wired");
        self.push_connection_status();
        self.push_mode();
    }

    /// Record the display mode, then wire `engine`. The engine receives the
    /// new mode only, never the one it replaces.
    pub fn wire_for_mode(&mut self, engine: EngineId, mode: &'static str, width: u32, height: u32) {
        self.mode = Some(ModeNotice {
            mode,
            width,
            height,
        });
        self.wire(engine);
    }

    /// Stop notifying `engine`; ignored if another engine is wired.
    pub fn unwire(&mut self, engine: EngineId) {
        if self.wired == Some(engine) {
            self.wired = None;
        }
    }

    pub fn wired_engine(&self) -> Option<EngineId> {
        self.wired
    }

    /// Send a notification to an arbitrary engine, e.g. the settings UI.
    pub fn send_to(&mut self, engine: EngineId, message: &Outbound) {
        if let Err(e) = self
            .sink
            .send(engine, message.channel(), message.method(), message.payload())
        {
            warn!(engine, method = message.method(), "notification failed: {e}");
        }
    }

    fn push(&mut self, message: Outbound) {
        if let Some(engine) = self.wired {
            self.send_to(engine, &message);
        }
    }

    fn push_connection_status(&mut self) {
        let connected = self.connection.is_some();
        self.push(Outbound::ConnectionStatus { connected });
    }

    fn push_mode(&mut self) {
        if let Some(notice) = self.mode {
            self.push(Outbound::DisplayModeChanged {
                mode: notice.mode,
                display_width: notice.width,
                display_height: notice.height,
            });
        }
    }

    // -----------------------------------------------------------------
    // Editing operations. All of them no-op without a connection.
    // -----------------------------------------------------------------

    fn with_connection<F>(&mut self, op: &str, f: F)
    where
        F: FnOnce(&mut dyn InputConnection, Option<&EditorInfo>) -> Result<(), PlatformError>,
    {
        let Some(conn) = self.connection.as_deref_mut() else {
            debug!(op, "no input connection");
            return;
        };
        if let Err(e) = f(conn, self.editor.as_ref()) {
            warn!(op, "input connection call failed: {e}");
        }
    }

    pub fn commit_text(&mut self, text: &str) {
        self.with_connection("commitText", |c, _| c.commit_text(text));
    }

    pub fn backspace(&mut self) {
        self.with_connection("backspace", |c, _| c.delete_surrounding_text(1, 0));
    }

    pub fn delete_forward(&mut self) {
        self.with_connection("delete", |c, _| c.delete_surrounding_text(0, 1));
    }

    /// Run the field's editor action, or insert a newline when it has none.
    pub fn send_enter(&mut self) {
        self.with_connection("enter", |c, editor| {
            match editor.and_then(EditorInfo::enter_action) {
                Some(action) => c.perform_editor_action(action),
                None => c.commit_text("\n"),
            }
        });
    }

    pub fn send_tab(&mut self) {
        self.with_connection("tab", |c, _| c.commit_text("\t"));
    }

    /// Collapse the selection to `selection_start + offset`, clamped to the
    /// text bounds.
    pub fn move_cursor(&mut self, offset: i32) {
        self.with_connection("moveCursor", |c, _| {
            let Some(extracted) = c.extracted_text()? else {
                return Ok(());
            };
            let pos = clamp_cursor(extracted.selection_start, offset, extracted.utf16_len());
            c.set_selection(pos, pos)
        });
    }

    /// Deliver a key press. Tries the hardware emulation path first; any
    /// failure there falls back to a down/up pair on the input connection.
    pub fn send_key(&mut self, key_code: u32, modifiers: Modifiers, keys: &mut dyn KeyEmulation) {
        match keys.send_key_event(key_code, modifiers, None) {
            Ok(()) => return,
            Err(e) => debug!(key_code, "hardware path unavailable, using connection: {e}"),
        }
        let meta_state = modifiers.meta_state();
        self.with_connection("sendKeyEvent", |c, _| {
            c.send_key_event(&KeyEvent {
                action: KeyAction::Down,
                key_code,
                meta_state,
            })?;
            c.send_key_event(&KeyEvent {
                action: KeyAction::Up,
                key_code,
                meta_state,
            })
        });
    }

    /// Apply one ime-channel call.
    pub fn dispatch(
        &mut self,
        command: ImeCommand,
        system: &mut dyn SystemControls,
        keys: &mut dyn KeyEmulation,
    ) -> Dispatch {
        let ok = Dispatch::Reply(Value::Bool(true));
        match command {
            ImeCommand::CommitText(text) => self.commit_text(&text),
            ImeCommand::Backspace => self.backspace(),
            ImeCommand::Delete => self.delete_forward(),
            ImeCommand::Enter => self.send_enter(),
            ImeCommand::Tab => self.send_tab(),
            ImeCommand::MoveCursor(offset) => self.move_cursor(offset),
            ImeCommand::SendKeyEvent(args) => self.send_key(args.key_code, args.modifiers, keys),
            ImeCommand::GetConnectionStatus => {
                return Dispatch::Reply(Value::Bool(self.has_connection()))
            }
            ImeCommand::IsImeEnabled => {
                return Dispatch::Reply(Value::Bool(query_or_false(system.is_ime_enabled())))
            }
            ImeCommand::IsImeActive => {
                return Dispatch::Reply(Value::Bool(query_or_false(system.is_ime_selected())))
            }
            ImeCommand::OpenImePicker => {
                if let Err(e) = system.open_ime_picker() {
                    warn!("open picker failed: {e}");
                }
            }
            ImeCommand::HideKeyboard => return Dispatch::HideKeyboard,
            ImeCommand::SendMediaKey(name) => match name.parse::<MediaAction>() {
                Ok(action) => {
                    if let Err(e) = action.perform(system) {
                        warn!(%action, "media action failed: {e}");
                    }
                }
                Err(e) => warn!("{e}"),
            },
        }
        ok
    }
}

/// Lookups that fail read as "not enabled"/"not active".
pub fn query_or_false(result: Result<bool, PlatformError>) -> bool {
    result.unwrap_or_else(|e| {
        debug!("status query failed: {e}");
        false
    })
}

pub fn clamp_cursor(selection_start: i32, offset: i32, text_len: i32) -> i32 {
    let target = i64::from(selection_start) + i64::from(offset);
    target.clamp(0, i64::from(text_len.max(0))) as i32
}
