use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::KeyValueStore;
use crate::error::{StudioError, StudioResult};
use crate::history::{History, HistoryEntry};
use crate::settings::Settings;

// Backup
//------------------------------------------------------------------------------

/// Everything the app persists, as one JSON document.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Backup {
    pub fn new(history: History, settings: Settings, now: DateTime<Utc>) -> Self {
        Self {
            history: Some(history.entries().to_vec()),
            settings: Some(settings),
            timestamp: Some(now),
        }
    }

    pub fn to_json(&self) -> StudioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a backup document. Both sections are optional but
    /// each one present must be well formed.
    pub fn parse(text: &str) -> StudioResult<Self> {
        let invalid = |e: serde_json::Error| StudioError::InvalidBackupFormat(e.to_string());
        let value: serde_json::Value = serde_json::from_str(text).map_err(invalid)?;
        if !value.is_object() {
            return Err(StudioError::InvalidBackupFormat("expected a JSON object".into()));
        }
        serde_json::from_value(value).map_err(invalid)
    }

    /// Writes each present section under its own key.
    pub fn restore<S: KeyValueStore + ?Sized>(self, store: &mut S) -> StudioResult<()> {
        if let Some(entries) = self.history {
            let history = History::from(entries);
            history.save(store)?;
            tracing::info!(entries = history.len(), "Restored history");
        }
        if let Some(settings) = self.settings {
            settings.save(store)?;
        }
        Ok(())
    }
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("qr-app-backup-{}.json", date.format("%Y-%m-%d"))
}
