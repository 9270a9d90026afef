//! Engine configuration and the user's keyboard preference.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `config()` call
//! - `config()` returns `&'static DeckConfig` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_config.toml")`
//!
//! The keyboard preference lives in a JSON blob the settings UI writes to the
//! host's preference store; it is re-read on every change notification.

use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::hardware::BackendKind;

pub const DEFAULT_CONFIG_TOML: &str = include_str!("default_config.toml");

/// Preference-store key holding the settings blob.
pub const SETTINGS_KEY: &str = "flutter.teledeck_settings";

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `config()` call.
pub fn init_custom(toml_content: String) -> Result<(), ConfigError> {
    parse_config_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Get or initialize the global configuration. A custom TOML that stopped
/// parsing falls back to the embedded defaults.
pub fn config() -> &'static DeckConfig {
    static INSTANCE: OnceLock<DeckConfig> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        CUSTOM_TOML
            .get()
            .and_then(|s| parse_config_toml(s).ok())
            .unwrap_or_default()
    })
}

pub fn default_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("config already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeckConfig {
    pub display: DisplayConfig,
    pub surface: SurfaceConfig,
    pub hardware: HardwareConfig,
    pub crash: CrashConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisplayConfig {
    pub debounce_ms: u64,
    #[serde(default)]
    pub secondary_packages: Vec<String>,
}

impl DisplayConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurfaceConfig {
    pub entrypoint: String,
    pub primary_max_height_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HardwareConfig {
    pub backend_order: Vec<BackendKind>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrashConfig {
    pub retention_days: u32,
}

impl CrashConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * 24 * 60 * 60)
    }
}

impl Default for DeckConfig {
    fn default() -> Self {
        parse_config_toml(DEFAULT_CONFIG_TOML).expect("embedded config TOML must be valid")
    }
}

pub fn parse_config_toml(toml_str: &str) -> Result<DeckConfig, ConfigError> {
    let c: DeckConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&c)?;
    Ok(c)
}

fn validate(c: &DeckConfig) -> Result<(), ConfigError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if c.$section.$field == 0 {
                return Err(ConfigError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(display.debounce_ms);
    check_positive!(crash.retention_days);

    let ratio = c.surface.primary_max_height_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(ConfigError::InvalidValue {
            field: "surface.primary_max_height_ratio".to_string(),
            reason: "must be in (0, 1]".to_string(),
        });
    }
    if c.surface.entrypoint.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "surface.entrypoint".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    let order = &c.hardware.backend_order;
    if order.iter().enumerate().any(|(i, k)| order[..i].contains(k)) {
        return Err(ConfigError::InvalidValue {
            field: "hardware.backend_order".to_string(),
            reason: "backends must not repeat".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// User preference
// ---------------------------------------------------------------------------

/// How key events reach the focused app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareEmulationPreference {
    /// Through the input connection.
    #[default]
    Ime,
    /// Through an emulated physical keyboard.
    Physical,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsBlob {
    #[serde(default)]
    keyboard_type: Option<HardwareEmulationPreference>,
}

/// Read `keyboardType` from the settings blob. Absent or malformed input
/// yields [`HardwareEmulationPreference::Ime`].
pub fn parse_settings_blob(blob: Option<&str>) -> HardwareEmulationPreference {
    let Some(raw) = blob.filter(|b| !b.trim().is_empty()) else {
        return HardwareEmulationPreference::default();
    };
    match serde_json::from_str::<SettingsBlob>(raw) {
        Ok(s) => s.keyboard_type.unwrap_or_default(),
        Err(e) => {
            warn!("malformed keyboard settings, using ime: {e}");
            HardwareEmulationPreference::default()
        }
    }
}

/// Host key/value preference store.
pub trait SettingsStore: Send {
    fn get_string(&self, key: &str) -> Option<String>;
}

pub fn read_preference(store: &dyn SettingsStore) -> HardwareEmulationPreference {
    parse_settings_blob(store.get_string(SETTINGS_KEY).as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let c = parse_config_toml(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(c.display.debounce(), Duration::from_millis(500));
        assert_eq!(c.display.secondary_packages.len(), 3);
        assert_eq!(c.surface.entrypoint, "imeMain");
        assert_eq!(c.surface.primary_max_height_ratio, 0.5);
        assert_eq!(c.hardware.backend_order, BackendKind::ALL.to_vec());
        assert_eq!(c.crash.retention(), Duration::from_secs(7 * 86_400));
    }

    #[test]
    fn invalid_values_rejected() {
        let bad = DEFAULT_CONFIG_TOML.replace("debounce_ms = 500", "debounce_ms = 0");
        assert!(matches!(
            parse_config_toml(&bad),
            Err(ConfigError::InvalidValue { field, .. }) if field == "display.debounce_ms"
        ));

        let bad = DEFAULT_CONFIG_TOML.replace("primary_max_height_ratio = 0.5", "primary_max_height_ratio = 1.5");
        assert!(parse_config_toml(&bad).is_err());

        let bad = DEFAULT_CONFIG_TOML.replace(
            r#"["virtualDevice", "uinput", "bluetoothHid"]"#,
            r#"["uinput", "uinput"]"#,
        );
        assert!(parse_config_toml(&bad).is_err());

        let bad = DEFAULT_CONFIG_TOML.replace(r#""uinput""#, r#""serial""#);
        assert!(matches!(parse_config_toml(&bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn preference_blob() {
        use HardwareEmulationPreference::*;
        assert_eq!(parse_settings_blob(None), Ime);
        assert_eq!(parse_settings_blob(Some("")), Ime);
        assert_eq!(parse_settings_blob(Some("{not json")), Ime);
        assert_eq!(parse_settings_blob(Some(r#"{"keyboardType":"physical"}"#)), Physical);
        assert_eq!(parse_settings_blob(Some(r#"{"keyboardType":"ime","theme":"dark"}"#)), Ime);
        assert_eq!(parse_settings_blob(Some(r#"{"keyboardType":"hologram"}"#)), Ime);
        assert_eq!(parse_settings_blob(Some(r#"{"theme":"dark"}"#)), Ime);
    }
}
