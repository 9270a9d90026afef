use serde::Deserialize;

use crate::PlatformError;

// Android editor-info and key-event constants.
pub const IME_FLAG_NO_ENTER_ACTION: u32 = 0x4000_0000;
pub const IME_MASK_ACTION: u32 = 0xff;
pub const IME_ACTION_UNSPECIFIED: u32 = 0;
pub const IME_ACTION_NONE: u32 = 1;

pub const META_SHIFT_ON: u32 = 0x1;
pub const META_ALT_ON: u32 = 0x2;
pub const META_CTRL_ON: u32 = 0x1000;
pub const META_META_ON: u32 = 0x1_0000;

/// Attributes of the focused editable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorInfo {
    pub package_name: Option<String>,
    pub input_type: u32,
    pub ime_options: u32,
}

impl EditorInfo {
    /// Editor action the field wants on Enter, if it declares one and does
    /// not suppress it.
    pub fn enter_action(&self) -> Option<u32> {
        if self.ime_options & IME_FLAG_NO_ENTER_ACTION != 0 {
            return None;
        }
        match self.ime_options & IME_MASK_ACTION {
            IME_ACTION_UNSPECIFIED | IME_ACTION_NONE => None,
            action => Some(action),
        }
    }
}

/// Snapshot of the field's text and selection, in UTF-16 units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub selection_start: i32,
    pub selection_end: i32,
}

impl ExtractedText {
    pub fn utf16_len(&self) -> i32 {
        i32::try_from(self.text.encode_utf16().count()).unwrap_or(i32::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub key_code: u32,
    pub meta_state: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn meta_state(self) -> u32 {
        let mut state = 0;
        if self.shift {
            state |= META_SHIFT_ON;
        }
        if self.ctrl {
            state |= META_CTRL_ON;
        }
        if self.alt {
            state |= META_ALT_ON;
        }
        if self.meta {
            state |= META_META_ON;
        }
        state
    }

    pub fn from_meta_state(state: u32) -> Self {
        Self {
            shift: state & META_SHIFT_ON != 0,
            ctrl: state & META_CTRL_ON != 0,
            alt: state & META_ALT_ON != 0,
            meta: state & META_META_ON != 0,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

/// The editing channel into the focused field of the foreground app.
pub trait InputConnection: Send {
    fn commit_text(&mut self, text: &str) -> Result<(), PlatformError>;

    fn delete_surrounding_text(&mut self, before: u32, after: u32) -> Result<(), PlatformError>;

    fn perform_editor_action(&mut self, action: u32) -> Result<(), PlatformError>;

    fn extracted_text(&mut self) -> Result<Option<ExtractedText>, PlatformError>;

    fn set_selection(&mut self, start: i32, end: i32) -> Result<(), PlatformError>;

    fn send_key_event(&mut self, event: &KeyEvent) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_action_branches() {
        let search = EditorInfo {
            ime_options: 3,
            ..Default::default()
        };
        assert_eq!(search.enter_action(), Some(3));

        let suppressed = EditorInfo {
            ime_options: 3 | IME_FLAG_NO_ENTER_ACTION,
            ..Default::default()
        };
        assert_eq!(suppressed.enter_action(), None);

        let none = EditorInfo {
            ime_options: IME_ACTION_NONE,
            ..Default::default()
        };
        assert_eq!(none.enter_action(), None);
        assert_eq!(EditorInfo::default().enter_action(), None);
    }

    #[test]
    fn test_meta_state_round_trip() {
        let mods = Modifiers {
            shift: true,
            ctrl: true,
            alt: false,
            meta: true,
        };
        assert_eq!(mods.meta_state(), 0x1_1001);
        assert_eq!(Modifiers::from_meta_state(mods.meta_state()), mods);
        assert!(Modifiers::NONE.is_empty());
    }

    #[test]
    fn test_utf16_len_counts_surrogates() {
        let t = ExtractedText {
            text: "a\u{1F600}".into(),
            ..Default::default()
        };
        assert_eq!(t.utf16_len(), 3);
    }
}
