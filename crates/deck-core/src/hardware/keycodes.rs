//! Android key codes and their translations to Linux input codes and USB HID
//! usages.

pub const KEYCODE_0: u32 = 7;
pub const KEYCODE_1: u32 = 8;
pub const KEYCODE_9: u32 = 16;
pub const KEYCODE_DPAD_UP: u32 = 19;
pub const KEYCODE_DPAD_DOWN: u32 = 20;
pub const KEYCODE_DPAD_LEFT: u32 = 21;
pub const KEYCODE_DPAD_RIGHT: u32 = 22;
pub const KEYCODE_A: u32 = 29;
pub const KEYCODE_Z: u32 = 54;
pub const KEYCODE_COMMA: u32 = 55;
pub const KEYCODE_PERIOD: u32 = 56;
pub const KEYCODE_ALT_LEFT: u32 = 57;
pub const KEYCODE_ALT_RIGHT: u32 = 58;
pub const KEYCODE_SHIFT_LEFT: u32 = 59;
pub const KEYCODE_SHIFT_RIGHT: u32 = 60;
pub const KEYCODE_TAB: u32 = 61;
pub const KEYCODE_SPACE: u32 = 62;
pub const KEYCODE_ENTER: u32 = 66;
pub const KEYCODE_DEL: u32 = 67;
pub const KEYCODE_GRAVE: u32 = 68;
pub const KEYCODE_MINUS: u32 = 69;
pub const KEYCODE_EQUALS: u32 = 70;
pub const KEYCODE_LEFT_BRACKET: u32 = 71;
pub const KEYCODE_RIGHT_BRACKET: u32 = 72;
pub const KEYCODE_BACKSLASH: u32 = 73;
pub const KEYCODE_SEMICOLON: u32 = 74;
pub const KEYCODE_APOSTROPHE: u32 = 75;
pub const KEYCODE_SLASH: u32 = 76;
pub const KEYCODE_SEARCH: u32 = 84;
pub const KEYCODE_MEDIA_PLAY_PAUSE: u32 = 85;
pub const KEYCODE_MEDIA_NEXT: u32 = 87;
pub const KEYCODE_MEDIA_PREVIOUS: u32 = 88;
pub const KEYCODE_PAGE_UP: u32 = 92;
pub const KEYCODE_PAGE_DOWN: u32 = 93;
pub const KEYCODE_ESCAPE: u32 = 111;
pub const KEYCODE_FORWARD_DEL: u32 = 112;
pub const KEYCODE_CTRL_LEFT: u32 = 113;
pub const KEYCODE_CTRL_RIGHT: u32 = 114;
pub const KEYCODE_CAPS_LOCK: u32 = 115;
pub const KEYCODE_META_LEFT: u32 = 117;
pub const KEYCODE_META_RIGHT: u32 = 118;
pub const KEYCODE_MOVE_HOME: u32 = 122;
pub const KEYCODE_MOVE_END: u32 = 123;
pub const KEYCODE_INSERT: u32 = 124;
pub const KEYCODE_F1: u32 = 131;
pub const KEYCODE_F12: u32 = 142;
pub const KEYCODE_APP_SWITCH: u32 = 187;
pub const KEYCODE_BRIGHTNESS_DOWN: u32 = 220;
pub const KEYCODE_BRIGHTNESS_UP: u32 = 221;

// Linux input-event codes used for modifiers and text.
const LINUX_LEFTSHIFT: u16 = 42;
const LINUX_RIGHTSHIFT: u16 = 54;
const LINUX_LEFTCTRL: u16 = 29;
const LINUX_RIGHTCTRL: u16 = 97;
const LINUX_LEFTALT: u16 = 56;
const LINUX_RIGHTALT: u16 = 100;
const LINUX_LEFTMETA: u16 = 125;
const LINUX_RIGHTMETA: u16 = 126;

/// Linux codes of the letters in Android order (A..Z).
const LINUX_LETTERS: [u16; 26] = [
    30, 48, 46, 32, 18, 33, 34, 35, 23, 36, 37, 38, 50, 49, 24, 25, 16, 19, 31, 20, 22, 47, 17,
    45, 21, 44,
];

/// Linux codes of the digits 0..9.
const LINUX_DIGITS: [u16; 10] = [11, 2, 3, 4, 5, 6, 7, 8, 9, 10];

/// Linux codes of F1..F12.
const LINUX_FKEYS: [u16; 12] = [59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 87, 88];

pub fn android_to_linux(code: u32) -> Option<u16> {
    Some(match code {
        KEYCODE_A..=KEYCODE_Z => LINUX_LETTERS[(code - KEYCODE_A) as usize],
        KEYCODE_0..=KEYCODE_9 => LINUX_DIGITS[(code - KEYCODE_0) as usize],
        KEYCODE_F1..=KEYCODE_F12 => LINUX_FKEYS[(code - KEYCODE_F1) as usize],
        KEYCODE_SPACE => 57,
        KEYCODE_ENTER => 28,
        KEYCODE_TAB => 15,
        KEYCODE_ESCAPE => 1,
        KEYCODE_DEL => 14,
        KEYCODE_FORWARD_DEL => 111,
        KEYCODE_SHIFT_LEFT => LINUX_LEFTSHIFT,
        KEYCODE_SHIFT_RIGHT => LINUX_RIGHTSHIFT,
        KEYCODE_CTRL_LEFT => LINUX_LEFTCTRL,
        KEYCODE_CTRL_RIGHT => LINUX_RIGHTCTRL,
        KEYCODE_ALT_LEFT => LINUX_LEFTALT,
        KEYCODE_ALT_RIGHT => LINUX_RIGHTALT,
        KEYCODE_META_LEFT => LINUX_LEFTMETA,
        KEYCODE_META_RIGHT => LINUX_RIGHTMETA,
        KEYCODE_CAPS_LOCK => 58,
        KEYCODE_DPAD_UP => 103,
        KEYCODE_DPAD_DOWN => 108,
        KEYCODE_DPAD_LEFT => 105,
        KEYCODE_DPAD_RIGHT => 106,
        KEYCODE_MOVE_HOME => 102,
        KEYCODE_MOVE_END => 107,
        KEYCODE_INSERT => 110,
        KEYCODE_PAGE_UP => 104,
        KEYCODE_PAGE_DOWN => 109,
        KEYCODE_MINUS => 12,
        KEYCODE_EQUALS => 13,
        KEYCODE_LEFT_BRACKET => 26,
        KEYCODE_RIGHT_BRACKET => 27,
        KEYCODE_BACKSLASH => 43,
        KEYCODE_SEMICOLON => 39,
        KEYCODE_APOSTROPHE => 40,
        KEYCODE_GRAVE => 41,
        KEYCODE_COMMA => 51,
        KEYCODE_PERIOD => 52,
        KEYCODE_SLASH => 53,
        _ => return None,
    })
}

/// Every Linux code [`android_to_linux`] can produce.
pub fn linux_codes() -> impl Iterator<Item = u16> {
    (0..=KEYCODE_BRIGHTNESS_UP).filter_map(android_to_linux)
}

/// USB HID usage (keyboard page) for a non-modifier key.
pub fn android_to_hid(code: u32) -> Option<u8> {
    Some(match code {
        KEYCODE_A..=KEYCODE_Z => 0x04 + (code - KEYCODE_A) as u8,
        KEYCODE_1..=KEYCODE_9 => 0x1E + (code - KEYCODE_1) as u8,
        KEYCODE_0 => 0x27,
        KEYCODE_ENTER => 0x28,
        KEYCODE_ESCAPE => 0x29,
        KEYCODE_DEL => 0x2A,
        KEYCODE_TAB => 0x2B,
        KEYCODE_SPACE => 0x2C,
        KEYCODE_MINUS => 0x2D,
        KEYCODE_EQUALS => 0x2E,
        KEYCODE_LEFT_BRACKET => 0x2F,
        KEYCODE_RIGHT_BRACKET => 0x30,
        KEYCODE_BACKSLASH => 0x31,
        KEYCODE_SEMICOLON => 0x33,
        KEYCODE_APOSTROPHE => 0x34,
        KEYCODE_GRAVE => 0x35,
        KEYCODE_COMMA => 0x36,
        KEYCODE_PERIOD => 0x37,
        KEYCODE_SLASH => 0x38,
        KEYCODE_CAPS_LOCK => 0x39,
        KEYCODE_F1..=KEYCODE_F12 => 0x3A + (code - KEYCODE_F1) as u8,
        KEYCODE_INSERT => 0x49,
        KEYCODE_MOVE_HOME => 0x4A,
        KEYCODE_PAGE_UP => 0x4B,
        KEYCODE_FORWARD_DEL => 0x4C,
        KEYCODE_MOVE_END => 0x4D,
        KEYCODE_PAGE_DOWN => 0x4E,
        KEYCODE_DPAD_RIGHT => 0x4F,
        KEYCODE_DPAD_LEFT => 0x50,
        KEYCODE_DPAD_DOWN => 0x51,
        KEYCODE_DPAD_UP => 0x52,
        _ => return None,
    })
}

/// Bit in the HID boot-report modifier byte for a modifier key.
pub fn hid_modifier_bit(code: u32) -> Option<u8> {
    match code {
        KEYCODE_CTRL_LEFT => Some(0x01),
        KEYCODE_SHIFT_LEFT => Some(0x02),
        KEYCODE_ALT_LEFT => Some(0x04),
        KEYCODE_META_LEFT => Some(0x08),
        KEYCODE_CTRL_RIGHT => Some(0x10),
        KEYCODE_SHIFT_RIGHT => Some(0x20),
        KEYCODE_ALT_RIGHT => Some(0x40),
        KEYCODE_META_RIGHT => Some(0x80),
        _ => None,
    }
}

/// Key that types `c` on a US layout, and whether shift is needed.
pub fn char_to_key(c: char) -> Option<(u32, bool)> {
    let shifted = |code| Some((code, true));
    let plain = |code| Some((code, false));
    match c {
        'a'..='z' => plain(KEYCODE_A + (c as u32 - 'a' as u32)),
        'A'..='Z' => shifted(KEYCODE_A + (c as u32 - 'A' as u32)),
        '0'..='9' => plain(KEYCODE_0 + (c as u32 - '0' as u32)),
        ' ' => plain(KEYCODE_SPACE),
        '\n' => plain(KEYCODE_ENTER),
        '\t' => plain(KEYCODE_TAB),
        '!' => shifted(KEYCODE_1),
        '@' => shifted(KEYCODE_1 + 1),
        '#' => shifted(KEYCODE_1 + 2),
        '$' => shifted(KEYCODE_1 + 3),
        '%' => shifted(KEYCODE_1 + 4),
        '^' => shifted(KEYCODE_1 + 5),
        '&' => shifted(KEYCODE_1 + 6),
        '*' => shifted(KEYCODE_1 + 7),
        '(' => shifted(KEYCODE_9),
        ')' => shifted(KEYCODE_0),
        '-' => plain(KEYCODE_MINUS),
        '_' => shifted(KEYCODE_MINUS),
        '=' => plain(KEYCODE_EQUALS),
        '+' => shifted(KEYCODE_EQUALS),
        '[' => plain(KEYCODE_LEFT_BRACKET),
        '{' => shifted(KEYCODE_LEFT_BRACKET),
        ']' => plain(KEYCODE_RIGHT_BRACKET),
        '}' => shifted(KEYCODE_RIGHT_BRACKET),
        '\\' => plain(KEYCODE_BACKSLASH),
        '|' => shifted(KEYCODE_BACKSLASH),
        ';' => plain(KEYCODE_SEMICOLON),
        ':' => shifted(KEYCODE_SEMICOLON),
        '\'' => plain(KEYCODE_APOSTROPHE),
        '"' => shifted(KEYCODE_APOSTROPHE),
        ',' => plain(KEYCODE_COMMA),
        '<' => shifted(KEYCODE_COMMA),
        '.' => plain(KEYCODE_PERIOD),
        '>' => shifted(KEYCODE_PERIOD),
        '/' => plain(KEYCODE_SLASH),
        '?' => shifted(KEYCODE_SLASH),
        '`' => plain(KEYCODE_GRAVE),
        '~' => shifted(KEYCODE_GRAVE),
        _ => None,
    }
}
