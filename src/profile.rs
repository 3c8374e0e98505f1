use chrono::{DateTime, Utc};

use crate::error::StudioResult;
use crate::history::{History, HistoryEntry, Origin};
use crate::settings::Settings;
use crate::storage::{Backup, KeyValueStore, StorageDetails, StorageEstimate};

// Profile
//------------------------------------------------------------------------------

/// The key-value store together with the settings read from it at startup.
///
/// Settings are cached for the lifetime of the profile and written back on
/// every change. History is read from the store on every access.
#[derive(Debug)]
pub struct Profile<S> {
    store: S,
    settings: Settings,
}

impl<S: KeyValueStore> Profile<S> {
    pub fn open(store: S) -> StudioResult<Self> {
        let settings = Settings::load(&store)?;
        Ok(Self { store, settings })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Updates one setting by its JSON name and persists the result. The
    /// cached settings are left unchanged if validation or the write fails.
    pub fn update_setting(&mut self, key: &str, value: &str) -> StudioResult<()> {
        let mut next = self.settings.clone();
        next.apply(key, value)?;
        next.save(&mut self.store)?;
        self.settings = next;
        Ok(())
    }

    pub fn reset_settings(&mut self) -> StudioResult<()> {
        let defaults = Settings::default();
        defaults.save(&mut self.store)?;
        self.settings = defaults;
        Ok(())
    }

    // History
    //--------------------------------------------------------------------------

    pub fn history(&self) -> StudioResult<History> {
        History::load(&self.store)
    }

    pub fn save_history(&mut self, history: &History) -> StudioResult<()> {
        history.save(&mut self.store)
    }

    pub fn clear_history(&mut self) -> StudioResult<()> {
        History::remove_stored(&mut self.store)
    }

    /// Records a payload if auto-save is on. Returns the new entry, or `None`
    /// when auto-save is off or the payload is blank or already recorded.
    pub fn record(&mut self, content: &str, origin: Origin) -> StudioResult<Option<HistoryEntry>> {
        self.record_at(content, origin, Utc::now())
    }

    pub fn record_at(
        &mut self,
        content: &str,
        origin: Origin,
        now: DateTime<Utc>,
    ) -> StudioResult<Option<HistoryEntry>> {
        if !self.settings.auto_save {
            tracing::debug!(%origin, "Auto-save disabled, not recording");
            return Ok(None);
        }

        let mut history = self.history()?;
        let Some(entry) = history.record(content, origin, now).cloned() else {
            return Ok(None);
        };
        history.save(&mut self.store)?;
        tracing::info!(id = %entry.id, %origin, category = %entry.category, "Recorded history entry");
        Ok(Some(entry))
    }

    // Storage
    //--------------------------------------------------------------------------

    pub fn estimate(&self) -> StudioResult<Option<StorageEstimate>> {
        self.store.estimate()
    }

    pub fn details(&self) -> StudioResult<StorageDetails> {
        StorageDetails::read(&self.store)
    }

    pub fn backup(&self, now: DateTime<Utc>) -> StudioResult<Backup> {
        Ok(Backup::new(self.history()?, self.settings.clone(), now))
    }

    /// Writes the sections present in `backup` and reloads the cached settings.
    pub fn restore(&mut self, backup: Backup) -> StudioResult<()> {
        backup.restore(&mut self.store)?;
        self.settings = Settings::load(&self.store)?;
        Ok(())
    }

    /// Removes every stored key. Cached settings fall back to their defaults,
    /// matching what the next startup would load.
    pub fn clear_all(&mut self) -> StudioResult<()> {
        self.store.clear()?;
        self.settings = Settings::default();
        tracing::info!("Cleared all stored data");
        Ok(())
    }
}
