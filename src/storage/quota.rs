use serde::Serialize;
use serde_json::Value;

use super::{KeyValueStore, HISTORY_KEY, SETTINGS_KEY};
use crate::error::StudioResult;

// Estimate
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Copy, Clone, Serialize)]
pub struct StorageEstimate {
    pub used: u64,
    pub quota: u64,
    pub percentage: f64,
}

impl StorageEstimate {
    pub fn new(used: u64, quota: u64) -> Self {
        let percentage = if quota > 0 { used as f64 / quota as f64 * 100.0 } else { 0.0 };
        Self { used, quota, percentage }
    }
}

// Details
//------------------------------------------------------------------------------

/// Item counts of the stored documents. A missing or unreadable document
/// counts as empty.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize)]
pub struct StorageDetails {
    pub history_items: usize,
    pub settings_keys: usize,
}

impl StorageDetails {
    pub fn read<S: KeyValueStore + ?Sized>(store: &S) -> StudioResult<Self> {
        let history_items = match raw_value(store, HISTORY_KEY)? {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        };
        let settings_keys = match raw_value(store, SETTINGS_KEY)? {
            Some(Value::Object(map)) => map.len(),
            _ => 0,
        };
        Ok(Self { history_items, settings_keys })
    }
}

fn raw_value<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> StudioResult<Option<Value>> {
    Ok(store.get(key)?.and_then(|raw| serde_json::from_str(&raw).ok()))
}

// Formatting
//------------------------------------------------------------------------------

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Formats a byte count with base 1024 units, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut val = bytes as f64;
    let mut i = 0;
    while val >= 1024.0 && i < UNITS.len() - 1 {
        val /= 1024.0;
        i += 1;
    }

    let num = format!("{val:.2}");
    let num = num.trim_end_matches('0').trim_end_matches('.');
    format!("{num} {}", UNITS[i])
}
