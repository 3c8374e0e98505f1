//! `qrism` command line.
//!
//! The four app panels map onto the `generate`, `scan`, `history` and
//! `settings` command groups. `storage` covers the storage manager.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qrism_studio::config::{default_data_dir, DEFAULT_QUOTA};
use qrism_studio::generator::{download_file_name, format_color, TEMPLATES};
use qrism_studio::history::{export_file_name, format_relative, Query, SortOrder};
use qrism_studio::scanner::{DirectorySource, Facing, TerminalFeedback};
use qrism_studio::storage::{backup::backup_file_name, decode_document, format_bytes, Backup, FileStore};
use qrism_studio::{
    category, App, Category, Config, ErrorCorrection, Origin, Panel, ScanResult, ScannerConfig, Settings,
};

type StudioApp = App<FileStore, TerminalFeedback>;

/// Generate, scan and keep track of QR codes
#[derive(Parser, Debug)]
#[command(name = "qrism")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "QR code generator and scanner with a local history", long_about = None)]
struct Cli {
    /// Directory holding history and settings
    #[arg(long, global = true, env = "QRISM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage quota in bytes
    #[arg(long, global = true, env = "QRISM_QUOTA", default_value_t = DEFAULT_QUOTA)]
    quota: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a QR code
    Generate(GenerateArgs),
    /// Scan a QR code from an image or a directory of frames
    #[command(subcommand)]
    Scan(ScanCommand),
    /// Browse and manage the history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Storage usage, backup and restore
    #[command(subcommand)]
    Storage(StorageCommand),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Text or URL to encode
    #[arg(required_unless_present_any = ["template", "list_templates"])]
    text: Option<String>,

    /// Start from a quick template (wifi, email, phone, sms, website)
    #[arg(long, short, conflicts_with = "text")]
    template: Option<String>,

    /// List the quick templates and exit
    #[arg(long)]
    list_templates: bool,

    /// Foreground colour as #rrggbb
    #[arg(long)]
    fg: Option<String>,

    /// Background colour as #rrggbb
    #[arg(long)]
    bg: Option<String>,

    /// Error correction level (L, M, Q, H)
    #[arg(long)]
    ec: Option<String>,

    /// Image size in pixels (128 to 512)
    #[arg(long)]
    size: Option<u32>,

    /// Write a PNG. A directory gets the default file name.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Do not draw the code in the terminal
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum ScanCommand {
    /// Decode a single image file
    File { path: PathBuf },
    /// Scan frames read from a directory until a code is found
    Camera {
        /// Directory of frames, optionally split into front/ and back/
        dir: PathBuf,

        /// Camera facing (environment, user)
        #[arg(long, default_value = "environment")]
        facing: String,

        /// Frames per second, 0 to disable throttling
        #[arg(long, default_value_t = ScannerConfig::default().fps)]
        fps: u32,

        /// Side of the centred scan region in pixels, 0 for the full frame
        #[arg(long, default_value_t = 250)]
        region: u32,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List entries
    List {
        /// Case-insensitive search over the content
        #[arg(long, short)]
        search: Option<String>,

        /// Only generated or scanned entries
        #[arg(long)]
        origin: Option<String>,

        /// Only entries of this category
        #[arg(long)]
        category: Option<String>,

        /// Oldest first
        #[arg(long)]
        oldest: bool,
    },
    /// Show one entry
    Show { id: String },
    /// Delete one entry
    Delete { id: String },
    /// Delete every entry
    Clear,
    /// Open an entry's link with the default handler
    Open { id: String },
    /// Counts by origin and category
    Stats,
    /// Export to JSON
    Export { path: Option<PathBuf> },
    /// Merge entries from an exported JSON file
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Show all settings, or one by name
    Show { key: Option<String> },
    /// Change a setting, e.g. `set defaultSize 320`
    Set { key: String, value: String },
    /// Restore defaults
    Reset,
}

#[derive(Subcommand, Debug)]
enum StorageCommand {
    /// Show storage usage
    Usage,
    /// Export history and settings as one backup file
    Export { path: Option<PathBuf> },
    /// Restore a backup file
    Import { path: PathBuf },
    /// Delete all stored data
    Clear {
        /// Required to confirm
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir().context("No data directory, pass --data-dir")?,
    };
    let config = Config { quota: cli.quota, ..Config::with_data_dir(data_dir) };
    let store = config
        .open_store()
        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
    info!(dir = %config.data_dir.display(), "Using data directory");

    match cli.command {
        Command::Generate(args) => {
            let mut app = App::open(store, config.scanner, TerminalFeedback)?;
            generate(&mut app, args)
        }
        Command::Scan(cmd) => scan(store, config.scanner, cmd),
        Command::History(cmd) => {
            let mut app = App::open(store, config.scanner, TerminalFeedback)?;
            app.navigate(Panel::History);
            history(&mut app, cmd)
        }
        Command::Settings(cmd) => {
            let mut app = App::open(store, config.scanner, TerminalFeedback)?;
            app.navigate(Panel::Settings);
            settings(&mut app, cmd)
        }
        Command::Storage(cmd) => {
            let mut app = App::open(store, config.scanner, TerminalFeedback)?;
            app.navigate(Panel::Settings);
            storage(&mut app, cmd)
        }
    }
}

fn setup_logging(level: &str) {
    let log_level = level.parse::<Level>().unwrap_or(Level::WARN);

    let filter = EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy();

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();
}

// Generate
//------------------------------------------------------------------------------

fn generate(app: &mut StudioApp, args: GenerateArgs) -> Result<()> {
    if args.list_templates {
        for t in TEMPLATES.iter() {
            println!("{:<8} {:<13} {}", t.name, t.label, t.value);
        }
        return Ok(());
    }

    // Style first so the text is recorded once with its final look
    if let Some(size) = args.size {
        app.edit(|g, _| g.set_size(size))?;
    }
    if let Some(fg) = &args.fg {
        app.edit(|g, p| g.set_foreground(fg, p))?;
    }
    if let Some(bg) = &args.bg {
        app.edit(|g, p| g.set_background(bg, p))?;
    }
    if let Some(ec) = &args.ec {
        let ec: ErrorCorrection = ec.parse()?;
        app.edit(|g, p| g.set_ec_level(ec, p))?;
    }
    match (&args.template, &args.text) {
        (Some(name), _) => app.edit(|g, p| g.apply_template(name, p))?,
        (None, Some(text)) => app.edit(|g, p| g.set_text(text, p))?,
        (None, None) => bail!("Nothing to encode"),
    }

    let generator = app.generator();
    let encoded = generator.encode()?;
    if !args.quiet {
        print!("{}", encoded.to_terminal(app.is_dark(false)));
    }

    let summary = generator.summary();
    let opts = generator.options();
    println!(
        "{} | {} chars | version {} | EC {} | {} on {}",
        summary.category.as_str().to_uppercase(),
        summary.chars,
        encoded.version(),
        opts.ec_level.label(),
        format_color(opts.foreground),
        format_color(opts.background),
    );

    if let Some(out) = args.output {
        let path = if out.is_dir() { out.join(download_file_name(Utc::now())) } else { out };
        generator.save(&path).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

// Scan
//------------------------------------------------------------------------------

fn scan(store: FileStore, scanner: ScannerConfig, cmd: ScanCommand) -> Result<()> {
    let res = match cmd {
        ScanCommand::File { path } => {
            let mut app = App::open(store, scanner, TerminalFeedback)?;
            app.scan_file(&path).with_context(|| format!("Failed to scan {}", path.display()))?
        }
        ScanCommand::Camera { dir, facing, fps, region } => {
            let facing: Facing = facing.parse().map_err(anyhow::Error::msg)?;
            let config = ScannerConfig { fps, scan_region: (region > 0).then_some(region) };
            let mut app = App::open(store, config, TerminalFeedback)?;
            if facing != app.scanner().facing() {
                app.toggle_camera()?;
            }
            app.start_scan(Box::new(DirectorySource::new(&dir)))
                .with_context(|| format!("Failed to read frames from {}", dir.display()))?;
            match app.run_scan()? {
                Some(res) => res,
                None => bail!("No QR code found in {}", dir.display()),
            }
        }
    };
    print_scan(&res);
    Ok(())
}

fn print_scan(res: &ScanResult) {
    println!("{}", res.content);
    let ec = res.ec_level.map_or("-", |ec| ec.label());
    let saved = if res.entry.is_some() { "saved to history" } else { "not saved" };
    println!("{} | {} chars | EC {ec} | {saved}", res.category.as_str().to_uppercase(), res.content.chars().count());
}

// History
//------------------------------------------------------------------------------

fn history(app: &mut StudioApp, cmd: HistoryCommand) -> Result<()> {
    let profile = app.profile_mut();
    // Clear must work even when the stored history no longer parses
    let mut history = match cmd {
        HistoryCommand::Clear => {
            profile.clear_history()?;
            println!("History cleared");
            return Ok(());
        }
        _ => profile.history()?,
    };

    match cmd {
        HistoryCommand::Clear => {}
        HistoryCommand::List { search, origin, category, oldest } => {
            let query = Query {
                search: search.unwrap_or_default(),
                origin: origin.map(|o| o.parse::<Origin>()).transpose()?,
                category: category.map(|c| c.parse::<Category>()).transpose()?,
                order: if oldest { SortOrder::Oldest } else { SortOrder::Newest },
            };
            let now = Local::now();
            let entries = history.query(&query);
            if entries.is_empty() {
                println!("No entries");
            }
            for e in entries {
                let when = format_relative(&e.timestamp.with_timezone(&Local), &now);
                println!("{:<14} {:<9} {:<5} {:<22} {}", e.id, e.origin, e.category, when, preview(&e.content));
            }
        }
        HistoryCommand::Show { id } => {
            let e = history.get(&id).with_context(|| format!("No history entry with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(e)?);
        }
        HistoryCommand::Delete { id } => {
            let e = history.delete(&id)?;
            profile.save_history(&history)?;
            println!("Deleted {}", preview(&e.content));
        }
        HistoryCommand::Open { id } => {
            let e = history.get(&id).with_context(|| format!("No history entry with id {id}"))?;
            category::open_link(&e.content)?;
        }
        HistoryCommand::Stats => {
            let stats = history.stats();
            println!("Total:     {}", stats.total);
            println!("Generated: {}", stats.generated);
            println!("Scanned:   {}", stats.scanned);
            for (cat, n) in stats.categories.iter() {
                println!("  {:<8} {n}", cat.as_str());
            }
        }
        HistoryCommand::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(export_file_name(Local::now().date_naive())));
            write_file(&path, &history.export_json()?)?;
            println!("Exported {} entries to {}", history.len(), path.display());
        }
        HistoryCommand::Import { path } => {
            let text = read_document(&path)?;
            let added = history.import_json(&text)?;
            profile.save_history(&history)?;
            println!("Imported {added} entries");
        }
    }
    Ok(())
}

fn preview(content: &str) -> String {
    const MAX: usize = 60;
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > MAX || line.len() < content.len() {
        format!("{}...", line.chars().take(MAX).collect::<String>())
    } else {
        line.to_string()
    }
}

// Settings
//------------------------------------------------------------------------------

fn settings(app: &mut StudioApp, cmd: SettingsCommand) -> Result<()> {
    let profile = app.profile_mut();
    match cmd {
        SettingsCommand::Show { key: Some(key) } => println!("{}", profile.settings().value_of(&key)?),
        SettingsCommand::Show { key: None } => print_settings(profile.settings())?,
        SettingsCommand::Set { key, value } => {
            profile.update_setting(&key, &value)?;
            println!("{key} = {}", profile.settings().value_of(&key)?);
        }
        SettingsCommand::Reset => {
            profile.reset_settings()?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) -> Result<()> {
    for key in Settings::KEYS {
        println!("{key:<24} {}", settings.value_of(key)?);
    }
    Ok(())
}

// Storage
//------------------------------------------------------------------------------

fn storage(app: &mut StudioApp, cmd: StorageCommand) -> Result<()> {
    let profile = app.profile_mut();
    match cmd {
        StorageCommand::Usage => {
            match profile.estimate()? {
                Some(est) => println!(
                    "{} of {} used ({:.1}%)",
                    format_bytes(est.used),
                    format_bytes(est.quota),
                    est.percentage
                ),
                None => println!("Storage usage is not available"),
            }
            let details = profile.details()?;
            println!("QR History: {} items", details.history_items);
            println!("Settings:   {} keys", details.settings_keys);
        }
        StorageCommand::Export { path } => {
            let backup = profile.backup(Utc::now())?;
            let path = path.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
            write_file(&path, &backup.to_json()?)?;
            println!("Backup written to {}", path.display());
        }
        StorageCommand::Import { path } => {
            let backup = Backup::parse(&read_document(&path)?)?;
            profile.restore(backup)?;
            println!("Backup restored");
        }
        StorageCommand::Clear { yes } => {
            if !yes {
                bail!("This deletes all history and settings, pass --yes to confirm");
            }
            profile.clear_all()?;
            println!("All data cleared");
        }
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(decode_document(&bytes)?)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod main_tests {
    use super::*;
    use qrism_studio::storage::{HISTORY_KEY, SETTINGS_KEY};
    use qrism_studio::KeyValueStore;

    fn corrupt_app(dir: &Path) -> StudioApp {
        fs::write(dir.join(format!("{HISTORY_KEY}.json")), "[oops").unwrap();
        fs::write(dir.join(format!("{SETTINGS_KEY}.json")), "{not json").unwrap();
        let store = Config::with_data_dir(dir).open_store().unwrap();
        App::open(store, ScannerConfig::default(), TerminalFeedback).unwrap()
    }

    #[test]
    fn test_history_clear_with_corrupt_history() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = corrupt_app(tmp.path());
        assert!(history(&mut app, HistoryCommand::Stats).is_err());

        history(&mut app, HistoryCommand::Clear).unwrap();
        assert_eq!(app.profile().store().get(HISTORY_KEY).unwrap(), None);
        assert_eq!(app.profile().history().unwrap().len(), 0);
    }

    #[test]
    fn test_settings_reset_with_corrupt_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = corrupt_app(tmp.path());
        assert_eq!(app.profile().settings(), &Settings::default());

        settings(&mut app, SettingsCommand::Reset).unwrap();
        let stored = app.profile().store().get(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Settings>(&stored).unwrap(), Settings::default());
    }

    #[test]
    fn test_storage_clear_with_corrupt_data() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = corrupt_app(tmp.path());
        storage(&mut app, StorageCommand::Usage).unwrap();

        assert!(storage(&mut app, StorageCommand::Clear { yes: false }).is_err());
        storage(&mut app, StorageCommand::Clear { yes: true }).unwrap();
        assert!(app.profile().store().keys().unwrap().is_empty());
    }
}
