//! Key-value persistence.
//!
//! History and settings are each stored as one JSON document under a single key.
//! [`FileStore`] keeps every key in its own file inside a data directory, while
//! [`MemoryStore`] is a throwaway store for tests and dry runs.

pub mod backup;
mod file;
mod memory;
pub mod quota;

pub use backup::Backup;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use quota::{format_bytes, StorageDetails, StorageEstimate};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{StudioError, StudioResult};

pub const HISTORY_KEY: &str = "qr-history";
pub const SETTINGS_KEY: &str = "qr-settings";

// Store
//------------------------------------------------------------------------------

pub trait KeyValueStore {
    fn get(&self, key: &str) -> StudioResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> StudioResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> StudioResult<()>;

    fn keys(&self) -> StudioResult<Vec<String>>;

    /// Removes every key owned by the store.
    fn clear(&mut self) -> StudioResult<()> {
        for k in self.keys()? {
            self.remove(&k)?;
        }
        Ok(())
    }

    /// Usage and quota, or `None` if the store cannot report them.
    fn estimate(&self) -> StudioResult<Option<StorageEstimate>>;
}

pub fn load_json<T, S>(store: &S, key: &str) -> StudioResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> StudioResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Keys double as file names, so they are restricted to a portable subset.
pub(crate) fn validate_key(key: &str) -> StudioResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StudioError::InvalidKey(key.to_string()))
    }
}

// Text decoding
//------------------------------------------------------------------------------

/// Decodes an imported document. A byte order mark selects the encoding,
/// otherwise the bytes must be valid UTF-8.
pub fn decode_document(bytes: &[u8]) -> StudioResult<String> {
    let (encoding, bom_len) = encoding_rs::Encoding::for_bom(bytes).unwrap_or((encoding_rs::UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if had_errors {
        return Err(StudioError::InvalidEncoding(encoding.name()));
    }
    Ok(text.into_owned())
}
