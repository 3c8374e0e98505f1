use std::path::PathBuf;

use qrism::QRError;
use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StudioError {
    // Storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("No data directory found")]
    NoDataDir,

    #[error("Failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },

    // Generator
    #[error("QR codec error: {0}")]
    Codec(#[from] QRError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Nothing to encode")]
    EmptyContent,

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Size {size}px is outside {min}..={max}px")]
    SizeOutOfRange { size: u32, min: u32, max: u32 },

    #[error("Unknown template: {0:?}")]
    UnknownTemplate(String),

    // Settings
    #[error("Unknown setting: {0:?}")]
    UnknownSetting(String),

    #[error("Invalid value {value:?} for setting {key}")]
    InvalidSetting { key: String, value: String },

    // History
    #[error("Unknown {kind} {value:?}")]
    InvalidFilter { kind: &'static str, value: String },

    #[error("No history entry with id {0}")]
    EntryNotFound(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Invalid backup file format: {0}")]
    InvalidBackupFormat(String),

    #[error("File is not valid {0} text")]
    InvalidEncoding(&'static str),

    // Scanner
    #[error("Could not find a valid QR code in the image")]
    NoCodeFound,

    #[error("The content is not a clickable link")]
    NotALink,
}

pub type StudioResult<T> = Result<T, StudioError>;
