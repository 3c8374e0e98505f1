//! Generated and scanned payloads, newest first.
//!
//! The history is persisted as one JSON array under [`HISTORY_KEY`]. It holds at
//! most [`MAX_ENTRIES`] entries and never holds two entries with the same
//! `(content, origin)` pair.

use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::category::{self, Category};
use crate::error::{StudioError, StudioResult};
use crate::storage::{load_json, save_json, KeyValueStore, HISTORY_KEY};

pub const MAX_ENTRIES: usize = 100;

// Entry
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Generated,
    Scanned,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => f.write_str("generated"),
            Self::Scanned => f.write_str("scanned"),
        }
    }
}

impl FromStr for Origin {
    type Err = StudioError;

    fn from_str(s: &str) -> StudioResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generated" => Ok(Self::Generated),
            "scanned" => Ok(Self::Scanned),
            _ => Err(StudioError::InvalidFilter { kind: "origin", value: s.into() }),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
}

// Query
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Case-insensitive substring of the content. Empty matches everything.
    pub search: String,
    pub origin: Option<Origin>,
    pub category: Option<Category>,
    pub order: SortOrder,
}

impl Query {
    fn matches(&self, entry: &HistoryEntry, needle: &str) -> bool {
        entry.content.to_lowercase().contains(needle)
            && self.origin.is_none_or(|o| o == entry.origin)
            && self.category.is_none_or(|c| c == entry.category)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub generated: usize,
    pub scanned: usize,
    pub categories: BTreeMap<Category, usize>,
}

// History
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> StudioResult<Self> {
        let entries = load_json::<Vec<HistoryEntry>, _>(store, HISTORY_KEY)?.unwrap_or_default();
        Ok(Self { entries })
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> StudioResult<()> {
        save_json(store, HISTORY_KEY, &self.entries)
    }

    /// Drops the stored history entirely.
    pub fn remove_stored<S: KeyValueStore + ?Sized>(store: &mut S) -> StudioResult<()> {
        store.remove(HISTORY_KEY)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn contains_pair(&self, content: &str, origin: Origin) -> bool {
        self.entries.iter().any(|e| e.content == content && e.origin == origin)
    }

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut id = now.timestamp_millis();
        while self.entries.iter().any(|e| e.id == id.to_string()) {
            id += 1;
        }
        id.to_string()
    }

    /// Records a payload at the front of the history.
    ///
    /// Returns `None` without touching the history if the content is blank or
    /// the same content was already recorded with the same origin.
    pub fn record(&mut self, content: &str, origin: Origin, now: DateTime<Utc>) -> Option<&HistoryEntry> {
        if content.trim().is_empty() || self.contains_pair(content, origin) {
            return None;
        }

        let entry = HistoryEntry {
            id: self.next_id(now),
            content: content.to_string(),
            origin,
            timestamp: now,
            category: category::detect(content),
        };
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.entries.first()
    }

    pub fn delete(&mut self, id: &str) -> StudioResult<HistoryEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StudioError::EntryNotFound(id.to_string()))?;
        Ok(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn query(&self, query: &Query) -> Vec<&HistoryEntry> {
        let needle = query.search.to_lowercase();
        let mut res: Vec<_> = self.entries.iter().filter(|e| query.matches(e, &needle)).collect();
        match query.order {
            SortOrder::Newest => res.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::Oldest => res.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        }
        res
    }

    pub fn stats(&self) -> Statistics {
        let mut stats = Statistics { total: self.entries.len(), ..Default::default() };
        for e in self.entries.iter() {
            match e.origin {
                Origin::Generated => stats.generated += 1,
                Origin::Scanned => stats.scanned += 1,
            }
            *stats.categories.entry(e.category).or_default() += 1;
        }
        stats
    }

    pub fn export_json(&self) -> StudioResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Merges an exported history into this one and returns how many entries
    /// were added. Entries whose id or `(content, origin)` pair is already
    /// present are skipped. The history is left untouched on a parse error.
    pub fn import_json(&mut self, text: &str) -> StudioResult<usize> {
        let imported: Vec<HistoryEntry> =
            serde_json::from_str(text).map_err(|e| StudioError::InvalidFileFormat(e.to_string()))?;

        let mut ids: HashSet<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        let mut added = HashSet::new();
        for entry in imported {
            if ids.contains(&entry.id) || self.contains_pair(&entry.content, entry.origin) {
                continue;
            }
            ids.insert(entry.id.clone());
            added.insert(entry.id.clone());
            self.entries.push(entry);
        }

        self.normalize();
        let kept = self.entries.iter().filter(|e| added.contains(&e.id)).count();
        tracing::info!(added = kept, total = self.entries.len(), "Imported history");
        Ok(kept)
    }

    /// Sorts newest first and enforces the entry cap.
    pub(crate) fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.entries.truncate(MAX_ENTRIES);
    }
}

impl From<Vec<HistoryEntry>> for History {
    /// Builds a history from untrusted entries. Only the newest entry of each
    /// id and of each `(content, origin)` pair is kept.
    fn from(entries: Vec<HistoryEntry>) -> Self {
        let mut history = Self { entries };
        history.entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let mut ids = HashSet::new();
        let mut pairs = HashSet::new();
        history.entries.retain(|e| {
            let pair = (e.content.clone(), e.origin);
            if ids.contains(&e.id) || pairs.contains(&pair) {
                return false;
            }
            ids.insert(e.id.clone());
            pairs.insert(pair);
            true
        });

        history.normalize();
        history
    }
}

// Formatting
//------------------------------------------------------------------------------

pub fn export_file_name(date: NaiveDate) -> String {
    format!("qr-history-{}.json", date.format("%Y-%m-%d"))
}

/// Human readable age of `ts` relative to `now`.
pub fn format_relative<Tz>(ts: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    // Future timestamps (clock skew, imports) count as today
    let days = now.clone().signed_duration_since(ts.clone()).num_days().max(0);
    match days {
        0 => format!("Today at {}", ts.format("%H:%M")),
        1 => format!("Yesterday at {}", ts.format("%H:%M")),
        2..=6 => format!("{days} days ago"),
        _ => ts.format("%Y-%m-%d").to_string(),
    }
}

#[cfg(test)]
mod history_tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::storage::MemoryStore;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_record_front_insert() {
        let mut history = History::new();
        history.record("first", Origin::Generated, at(1_000));
        history.record("https://example.com", Origin::Scanned, at(2_000));

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "https://example.com");
        assert_eq!(entries[0].id, "2000");
        assert_eq!(entries[0].category, Category::Url);
        assert_eq!(entries[1].content, "first");
    }

    #[test]
    fn test_record_dedup_by_pair() {
        let mut history = History::new();
        assert!(history.record("hello", Origin::Generated, at(1)).is_some());
        assert!(history.record("hello", Origin::Generated, at(2)).is_none());
        assert!(history.record("hello", Origin::Scanned, at(3)).is_some());
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[1].timestamp, at(1));
    }

    #[test]
    fn test_record_blank_is_noop() {
        let mut history = History::new();
        assert!(history.record("", Origin::Generated, at(1)).is_none());
        assert!(history.record("  \n\t", Origin::Scanned, at(1)).is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_unique_ids_within_same_millisecond() {
        let mut history = History::new();
        history.record("a", Origin::Generated, at(5));
        history.record("b", Origin::Generated, at(5));
        history.record("c", Origin::Generated, at(5));
        let ids: Vec<_> = history.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "6", "5"]);
    }

    #[test]
    fn test_record_caps_at_max_entries() {
        let mut history = History::new();
        for i in 0..(MAX_ENTRIES + 5) {
            history.record(&format!("item {i}"), Origin::Generated, at(i as i64));
        }
        assert_eq!(history.len(), MAX_ENTRIES);
        assert_eq!(history.entries()[0].content, format!("item {}", MAX_ENTRIES + 4));
        assert_eq!(history.entries()[MAX_ENTRIES - 1].content, "item 5");
    }

    #[test]
    fn test_entry_json_shape() {
        let mut history = History::new();
        history.record("tel:+1234567890", Origin::Scanned, at(1_700_000_000_000));
        let json = serde_json::to_value(&history.entries()[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1700000000000",
                "content": "tel:+1234567890",
                "type": "scanned",
                "timestamp": "2023-11-14T22:13:20Z",
                "category": "phone",
            })
        );
    }

    #[test]
    fn test_reads_browser_style_timestamps() {
        let raw = r#"[{"id":"1","content":"x","type":"generated","timestamp":"2024-01-02T03:04:05.678Z","category":"other"}]"#;
        let entries: Vec<HistoryEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries[0].timestamp.timestamp_millis(), 1_704_164_645_678);
        assert_eq!(entries[0].category, Category::Other);
    }

    #[test]
    fn test_save_load_remove() {
        let mut store = MemoryStore::new();
        assert!(History::load(&store).unwrap().is_empty());

        let mut history = History::new();
        history.record("hello", Origin::Generated, at(1));
        history.save(&mut store).unwrap();
        assert_eq!(History::load(&store).unwrap(), history);

        History::remove_stored(&mut store).unwrap();
        assert!(store.get(HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let mut history = History::new();
        history.record("a", Origin::Generated, at(1));
        history.record("b", Origin::Generated, at(2));

        assert_eq!(history.delete("1").unwrap().content, "a");
        assert!(matches!(history.delete("1"), Err(StudioError::EntryNotFound(_))));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_query() {
        let mut history = History::new();
        history.record("https://Example.com", Origin::Generated, at(1));
        history.record("mailto:hi@example.com", Origin::Scanned, at(2));
        history.record("Hello", Origin::Scanned, at(3));

        let q = Query { search: "EXAMPLE".into(), ..Default::default() };
        let res: Vec<_> = history.query(&q).iter().map(|e| e.id.clone()).collect();
        assert_eq!(res, vec!["2", "1"]);

        let q = Query { order: SortOrder::Oldest, ..Default::default() };
        let res: Vec<_> = history.query(&q).iter().map(|e| e.id.clone()).collect();
        assert_eq!(res, vec!["1", "2", "3"]);

        let q = Query { origin: Some(Origin::Scanned), category: Some(Category::Text), ..Default::default() };
        let res = history.query(&q);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].content, "Hello");
    }

    #[test]
    fn test_stats() {
        let mut history = History::new();
        history.record("https://a.com", Origin::Generated, at(1));
        history.record("https://b.com", Origin::Scanned, at(2));
        history.record("plain", Origin::Scanned, at(3));

        let stats = history.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.categories.get(&Category::Url), Some(&2));
        assert_eq!(stats.categories.get(&Category::Text), Some(&1));
        assert_eq!(stats.categories.get(&Category::Phone), None);
    }

    #[test]
    fn test_import_merges_by_id() {
        let mut source = History::new();
        source.record("a", Origin::Generated, at(10));
        source.record("b", Origin::Scanned, at(20));
        let exported = source.export_json().unwrap();

        let mut target = History::new();
        target.record("a", Origin::Generated, at(10));
        target.record("c", Origin::Generated, at(30));

        assert_eq!(target.import_json(&exported).unwrap(), 1);
        let ids: Vec<_> = target.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["30", "20", "10"]);

        // Importing again adds nothing
        assert_eq!(target.import_json(&exported).unwrap(), 0);
    }

    #[test]
    fn test_import_invalid_leaves_history_untouched() {
        let mut history = History::new();
        history.record("a", Origin::Generated, at(1));
        let before = history.clone();

        assert!(matches!(history.import_json("{not json"), Err(StudioError::InvalidFileFormat(_))));
        assert!(matches!(history.import_json(r#"[{"id":"1"}]"#), Err(StudioError::InvalidFileFormat(_))));
        assert_eq!(history, before);
    }

    #[test]
    fn test_import_respects_cap() {
        let entries: Vec<_> = (0..MAX_ENTRIES as i64)
            .map(|i| HistoryEntry {
                id: format!("old{i}"),
                content: format!("old {i}"),
                origin: Origin::Generated,
                timestamp: at(i),
                category: Category::Text,
            })
            .collect();
        let mut history = History::from(entries);

        let incoming = serde_json::to_string(&vec![HistoryEntry {
            id: "new".into(),
            content: "new".into(),
            origin: Origin::Scanned,
            timestamp: at(1_000),
            category: Category::Text,
        }])
        .unwrap();

        assert_eq!(history.import_json(&incoming).unwrap(), 1);
        assert_eq!(history.len(), MAX_ENTRIES);
        assert_eq!(history.entries()[0].id, "new");
        assert!(history.get("old0").is_none());
    }

    #[test]
    fn test_from_keeps_newest_of_duplicates() {
        let entry = |id: &str, content: &str, ms| HistoryEntry {
            id: id.into(),
            content: content.into(),
            origin: Origin::Scanned,
            timestamp: at(ms),
            category: Category::Text,
        };
        let history = History::from(vec![
            entry("1", "same", 1),
            entry("2", "same", 2),
            entry("2", "same", 3),
            entry("3", "other", 4),
            entry("3", "third", 5),
        ]);

        let ids: Vec<_> = history.entries().iter().map(|e| (e.id.as_str(), e.content.as_str())).collect();
        assert_eq!(ids, vec![("3", "third"), ("2", "same")]);
        assert_eq!(history.entries()[1].timestamp, at(3));
    }

    #[test]
    fn test_parse_origin() {
        assert_eq!("Scanned".parse::<Origin>().unwrap(), Origin::Scanned);
        let err = "printed".parse::<Origin>().unwrap_err();
        assert!(matches!(err, StudioError::InvalidFilter { kind: "origin", .. }));
        assert_eq!(err.to_string(), "Unknown origin \"printed\"");
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "qr-history-2024-03-09.json");
    }

    #[test]
    fn test_format_relative() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 18, 0, 0).unwrap();
        let fmt = |d: Duration| format_relative(&(now - d), &now);

        assert_eq!(fmt(Duration::hours(2)), "Today at 16:00");
        assert_eq!(fmt(Duration::hours(30)), "Yesterday at 12:00");
        assert_eq!(fmt(Duration::days(3)), "3 days ago");
        assert_eq!(fmt(Duration::days(6)), "6 days ago");
        assert_eq!(fmt(Duration::days(7)), "2024-05-13");
        assert_eq!(fmt(Duration::hours(-5)), "Today at 23:00");
    }
}
