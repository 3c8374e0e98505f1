use std::fmt::{Display, Formatter};
use std::str::FromStr;

use qrism::ECLevel;
use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult};
use crate::storage::{load_json, save_json, KeyValueStore, SETTINGS_KEY};

pub const MIN_SIZE: u32 = 128;
pub const MAX_SIZE: u32 = 512;
pub const DEFAULT_SIZE: u32 = 256;

// Error correction level
//------------------------------------------------------------------------------

/// Mirror of [`ECLevel`] that can be persisted.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl ErrorCorrection {
    pub fn label(self) -> &'static str {
        match self {
            Self::L => "Low (~7%)",
            Self::M => "Medium (~15%)",
            Self::Q => "Quartile (~25%)",
            Self::H => "High (~30%)",
        }
    }
}

impl From<ErrorCorrection> for ECLevel {
    fn from(value: ErrorCorrection) -> Self {
        match value {
            ErrorCorrection::L => ECLevel::L,
            ErrorCorrection::M => ECLevel::M,
            ErrorCorrection::Q => ECLevel::Q,
            ErrorCorrection::H => ECLevel::H,
        }
    }
}

impl From<ECLevel> for ErrorCorrection {
    fn from(value: ECLevel) -> Self {
        match value {
            ECLevel::L => Self::L,
            ECLevel::M => Self::M,
            ECLevel::Q => Self::Q,
            ECLevel::H => Self::H,
        }
    }
}

impl Display for ErrorCorrection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for ErrorCorrection {
    type Err = StudioError;

    fn from_str(s: &str) -> StudioResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "L" => Ok(Self::L),
            "M" => Ok(Self::M),
            "Q" => Ok(Self::Q),
            "H" => Ok(Self::H),
            _ => Err(invalid("defaultErrorCorrection", s)),
        }
    }
}

// Theme
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Resolves `System` against the host preference.
    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            Self::Light => false,
            Self::Dark => true,
            Self::System => system_prefers_dark,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        };
        f.write_str(s)
    }
}

impl FromStr for Theme {
    type Err = StudioError;

    fn from_str(s: &str) -> StudioResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            _ => Err(invalid("theme", s)),
        }
    }
}

// Settings
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub auto_save: bool,
    pub default_error_correction: ErrorCorrection,
    pub default_size: u32,
    pub theme: Theme,
    pub sound_enabled: bool,
    pub vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save: true,
            default_error_correction: ErrorCorrection::M,
            default_size: DEFAULT_SIZE,
            theme: Theme::System,
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 6] = [
        "autoSave",
        "defaultErrorCorrection",
        "defaultSize",
        "theme",
        "soundEnabled",
        "vibrationEnabled",
    ];

    /// Loads settings, falling back to defaults when nothing is stored or the
    /// stored document is unreadable. Store failures still propagate.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> StudioResult<Self> {
        let mut settings = match load_json::<Self, _>(store, SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::debug!("No stored settings, using defaults");
                return Ok(Self::default());
            }
            Err(StudioError::Json(e)) => {
                tracing::warn!(error = %e, "Stored settings are corrupt, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        let clamped = settings.default_size.clamp(MIN_SIZE, MAX_SIZE);
        if clamped != settings.default_size {
            tracing::warn!(stored = settings.default_size, clamped, "Stored default size out of range");
            settings.default_size = clamped;
        }
        Ok(settings)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StudioResult<()> {
        save_json(store, SETTINGS_KEY, self)?;
        tracing::info!("Settings saved");
        Ok(())
    }

    /// Applies a single `key=value` update by its JSON field name.
    pub fn apply(&mut self, key: &str, value: &str) -> StudioResult<()> {
        match key {
            "autoSave" => self.auto_save = parse_bool(key, value)?,
            "defaultErrorCorrection" => self.default_error_correction = value.parse()?,
            "defaultSize" => {
                let size = value.parse::<u32>().map_err(|_| invalid(key, value))?;
                self.default_size = validate_size(size)?;
            }
            "theme" => self.theme = value.parse()?,
            "soundEnabled" => self.sound_enabled = parse_bool(key, value)?,
            "vibrationEnabled" => self.vibration_enabled = parse_bool(key, value)?,
            _ => return Err(StudioError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    /// Current value of a setting by its JSON field name.
    pub fn value_of(&self, key: &str) -> StudioResult<String> {
        let val = match key {
            "autoSave" => self.auto_save.to_string(),
            "defaultErrorCorrection" => self.default_error_correction.to_string(),
            "defaultSize" => self.default_size.to_string(),
            "theme" => self.theme.to_string(),
            "soundEnabled" => self.sound_enabled.to_string(),
            "vibrationEnabled" => self.vibration_enabled.to_string(),
            _ => return Err(StudioError::UnknownSetting(key.to_string())),
        };
        Ok(val)
    }
}

pub fn validate_size(size: u32) -> StudioResult<u32> {
    if (MIN_SIZE..=MAX_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(StudioError::SizeOutOfRange { size, min: MIN_SIZE, max: MAX_SIZE })
    }
}

fn parse_bool(key: &str, value: &str) -> StudioResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> StudioError {
    StudioError::InvalidSetting { key: key.to_string(), value: value.to_string() }
}
