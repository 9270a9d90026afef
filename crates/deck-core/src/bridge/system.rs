use std::fmt;
use std::str::FromStr;

use crate::hardware::keycodes;
use crate::PlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeAdjust {
    Raise,
    Lower,
    ToggleMute,
}

/// System-level services outside the text buffer: audio, media buttons and
/// the input-method manager.
pub trait SystemControls: Send {
    fn adjust_volume(&mut self, adjust: VolumeAdjust) -> Result<(), PlatformError>;

    /// Broadcast a media-button down/up pair for `key_code`.
    fn dispatch_media_key(&mut self, key_code: u32) -> Result<(), PlatformError>;

    fn microphone_muted(&self) -> Result<bool, PlatformError>;

    fn set_microphone_muted(&mut self, muted: bool) -> Result<(), PlatformError>;

    fn is_ime_enabled(&self) -> Result<bool, PlatformError>;

    fn is_ime_selected(&self) -> Result<bool, PlatformError>;

    fn open_ime_picker(&mut self) -> Result<(), PlatformError>;

    fn open_ime_settings(&mut self) -> Result<(), PlatformError>;

    /// Ask the host to show the embedded input view.
    fn request_show_self(&mut self) -> Result<(), PlatformError>;

    fn request_hide_self(&mut self) -> Result<(), PlatformError>;

    fn is_input_view_shown(&self) -> Result<bool, PlatformError>;
}

/// Named function-row action sent by the keyboard UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    VolumeUp,
    VolumeDown,
    VolumeMute,
    PlayPause,
    Previous,
    Next,
    BrightnessDown,
    BrightnessUp,
    AppSwitch,
    Search,
    MicMute,
    MicUnmute,
}

impl MediaAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::VolumeUp => "volumeUp",
            Self::VolumeDown => "volumeDown",
            Self::VolumeMute => "volumeMute",
            Self::PlayPause => "mediaPlayPause",
            Self::Previous => "mediaPrevious",
            Self::Next => "mediaNext",
            Self::BrightnessDown => "brightnessDown",
            Self::BrightnessUp => "brightnessUp",
            Self::AppSwitch => "appSwitch",
            Self::Search => "search",
            Self::MicMute => "micMute",
            Self::MicUnmute => "micUnmute",
        }
    }

    /// Key code broadcast as a media button, for actions delivered that way.
    pub fn media_key_code(self) -> Option<u32> {
        match self {
            Self::PlayPause => Some(keycodes::KEYCODE_MEDIA_PLAY_PAUSE),
            Self::Previous => Some(keycodes::KEYCODE_MEDIA_PREVIOUS),
            Self::Next => Some(keycodes::KEYCODE_MEDIA_NEXT),
            Self::BrightnessDown => Some(keycodes::KEYCODE_BRIGHTNESS_DOWN),
            Self::BrightnessUp => Some(keycodes::KEYCODE_BRIGHTNESS_UP),
            Self::AppSwitch => Some(keycodes::KEYCODE_APP_SWITCH),
            Self::Search => Some(keycodes::KEYCODE_SEARCH),
            _ => None,
        }
    }

    /// Carry out the action. Both mic actions flip the current mute state.
    pub fn perform(self, system: &mut dyn SystemControls) -> Result<(), PlatformError> {
        match self {
            Self::VolumeUp => system.adjust_volume(VolumeAdjust::Raise),
            Self::VolumeDown => system.adjust_volume(VolumeAdjust::Lower),
            Self::VolumeMute => system.adjust_volume(VolumeAdjust::ToggleMute),
            Self::MicMute | Self::MicUnmute => {
                let muted = system.microphone_muted()?;
                system.set_microphone_muted(!muted)
            }
            other => match other.media_key_code() {
                Some(code) => system.dispatch_media_key(code),
                None => Ok(()),
            },
        }
    }
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media action: {0}")]
pub struct UnknownMediaAction(pub String);

impl FromStr for MediaAction {
    type Err = UnknownMediaAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "volumeUp" => Self::VolumeUp,
            "volumeDown" => Self::VolumeDown,
            "volumeMute" => Self::VolumeMute,
            "mediaPlayPause" => Self::PlayPause,
            "mediaPrevious" => Self::Previous,
            "mediaNext" => Self::Next,
            "brightnessDown" => Self::BrightnessDown,
            "brightnessUp" => Self::BrightnessUp,
            "appSwitch" => Self::AppSwitch,
            "search" => Self::Search,
            "micMute" => Self::MicMute,
            "micUnmute" => Self::MicUnmute,
            other => return Err(UnknownMediaAction(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_names() {
        for name in [
            "volumeUp",
            "mediaNext",
            "brightnessUp",
            "appSwitch",
            "search",
            "micUnmute",
        ] {
            let action: MediaAction = name.parse().unwrap();
            assert_eq!(action.name(), name);
        }
        assert!("fooBar".parse::<MediaAction>().is_err());
    }

    #[test]
    fn test_media_key_codes() {
        assert_eq!(MediaAction::PlayPause.media_key_code(), Some(85));
        assert_eq!(MediaAction::Next.media_key_code(), Some(87));
        assert_eq!(MediaAction::Previous.media_key_code(), Some(88));
        assert_eq!(MediaAction::BrightnessDown.media_key_code(), Some(220));
        assert_eq!(MediaAction::BrightnessUp.media_key_code(), Some(221));
        assert_eq!(MediaAction::AppSwitch.media_key_code(), Some(187));
        assert_eq!(MediaAction::Search.media_key_code(), Some(84));
        assert_eq!(MediaAction::VolumeUp.media_key_code(), None);
    }
}
