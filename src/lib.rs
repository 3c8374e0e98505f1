//! # qrism-studio
//!
//! Generate QR codes from text or URLs, scan them from images or a stream of
//! frames, and keep a local history of everything generated and scanned.
//!
//! ## Features
//!
//! - **Generation**: Custom colours, error correction level and output size, with quick templates
//! - **Scanning**: Frame-by-frame decoding with a centred scan region and one-shot file decoding
//! - **History**: Up to 100 entries, de-duplicated, searchable and exportable as JSON
//! - **Settings**: Persisted defaults for generation, feedback and theme
//! - **Storage**: Usage estimates, full backup and restore
//!
//! ## Quick Start
//!
//! ### Generating a QR Code
//!
//! ```rust,no_run
//! use qrism_studio::{Generator, Profile, storage::MemoryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut profile = Profile::open(MemoryStore::new())?;
//! let mut generator = Generator::new(profile.settings());
//!
//! // Editing the text records it in the history
//! generator.set_text("https://example.com", &mut profile)?;
//! generator.set_foreground("#1e3a8a", &mut profile)?;
//! generator.save("qrcode.png".as_ref())?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Scanning an Image
//!
//! ```rust,no_run
//! use qrism_studio::{Profile, Scanner, scanner::TerminalFeedback, storage::MemoryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut profile = Profile::open(MemoryStore::new())?;
//! let mut scanner = Scanner::default();
//!
//! let res = scanner.scan_file("qrcode.png".as_ref(), &mut profile, &mut TerminalFeedback)?;
//! println!("{} ({})", res.content, res.category);
//! # Ok(())
//! # }
//! ```
//!
//! ### Scanning Frames
//!
//! ```rust,no_run
//! use qrism_studio::{Profile, Scanner, scanner::{DirectorySource, Silent}, storage::FileStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut profile = Profile::open(FileStore::open("data", 5 * 1024 * 1024)?)?;
//! let mut scanner = Scanner::default();
//!
//! scanner.start(Box::new(DirectorySource::new("frames")))?;
//! if let Some(res) = scanner.run(&mut profile, &mut Silent)? {
//!     println!("Scanned: {}", res.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Persistence
//!
//! History and settings live in a [`KeyValueStore`] under the keys `qr-history`
//! and `qr-settings`, each holding one JSON document:
//!
//! ```json
//! [{ "id": "1700000000000", "content": "https://example.com", "type": "generated",
//!    "timestamp": "2023-11-14T22:13:20Z", "category": "url" }]
//! ```

pub mod app;
pub mod category;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod profile;
pub mod scanner;
pub mod settings;
pub mod storage;

pub use app::{App, Panel};
pub use category::Category;
pub use config::Config;
pub use error::{StudioError, StudioResult};
pub use generator::{GenerateOptions, Generator};
pub use history::{History, HistoryEntry, Origin};
pub use profile::Profile;
pub use scanner::{ScanResult, Scanner, ScannerConfig};
pub use settings::{ErrorCorrection, Settings, Theme};
pub use storage::KeyValueStore;
