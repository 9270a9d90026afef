/// Window flags for a presentation window hosting the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub fullscreen: bool,
    pub focusable: bool,
    pub touch_modal: bool,
    pub keep_screen_on: bool,
    pub opaque: bool,
    pub hardware_accelerated: bool,
}

impl WindowConfig {
    /// Full-display, opaque, never takes input focus away from the app on
    /// the other display.
    pub const fn keyboard_presentation() -> Self {
        Self {
            fullscreen: true,
            focusable: false,
            touch_modal: false,
            keep_screen_on: true,
            opaque: true,
            hardware_accelerated: true,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::keyboard_presentation()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLayout {
    /// Inline input view capped at `max_height` pixels.
    Embedded { max_height: u32 },
    Presentation(WindowConfig),
}

impl SurfaceLayout {
    pub fn embedded(primary_height: u32, max_height_ratio: f64) -> Self {
        let max_height = (f64::from(primary_height) * max_height_ratio).floor() as u32;
        Self::Embedded { max_height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_never_steals_focus() {
        let cfg = WindowConfig::keyboard_presentation();
        assert!(!cfg.focusable);
        assert!(!cfg.touch_modal);
        assert!(cfg.opaque);
        assert!(cfg.keep_screen_on);
        assert!(cfg.fullscreen);
    }

    #[test]
    fn test_embedded_height_capped() {
        assert_eq!(
            SurfaceLayout::embedded(1080, 0.5),
            SurfaceLayout::Embedded { max_height: 540 }
        );
        assert_eq!(
            SurfaceLayout::embedded(1241, 0.5),
            SurfaceLayout::Embedded { max_height: 620 }
        );
    }
}
