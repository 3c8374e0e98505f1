use std::error::Error;

use chrono::{Local, Utc};
use qrism_studio::history::{export_file_name, format_relative, History};
use qrism_studio::storage::{format_bytes, MemoryStore};
use qrism_studio::{Origin, Profile};

fn main() -> Result<(), Box<dyn Error>> {
    let mut profile = Profile::open(MemoryStore::with_quota(5 * 1024 * 1024))?;
    for content in ["https://example.com", "mailto:hello@example.com", "+1 555 0100", "Just some text"] {
        profile.record(content, Origin::Generated)?;
    }
    // Already recorded, so this one is skipped
    profile.record("https://example.com", Origin::Generated)?;

    let history = profile.history()?;
    let now = Local::now();
    for e in history.entries() {
        let when = format_relative(&e.timestamp.with_timezone(&Local), &now);
        println!("{:<6} {:<24} {}", e.category, when, e.content);
    }

    // Export and merge into a fresh history
    let json = history.export_json()?;
    println!("Export would be written to {}", export_file_name(now.date_naive()));

    let mut restored = History::new();
    let added = restored.import_json(&json)?;
    println!("Imported {added} entries");

    let backup = profile.backup(Utc::now())?.to_json()?;
    println!("Backup is {}", format_bytes(backup.len() as u64));
    if let Some(est) = profile.estimate()? {
        println!("Using {} of {}", format_bytes(est.used), format_bytes(est.quota));
    }
    Ok(())
}
