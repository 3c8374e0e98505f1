//! Navigation shell.
//!
//! [`App`] owns the profile, the generator and the scanner and tracks which
//! panel is active. Panels behave like mounted views: entering the generate
//! panel starts from the current default settings and leaving the scan panel
//! stops any scan in progress.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::StudioResult;
use crate::generator::Generator;
use crate::profile::Profile;
use crate::scanner::{Facing, Feedback, FrameSource, Poll, ScanResult, Scanner, ScannerConfig};
use crate::storage::KeyValueStore;

// Panel
//------------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum Panel {
    #[default]
    Generate,
    Scan,
    History,
    Settings,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Generate, Panel::Scan, Panel::History, Panel::Settings];

    pub fn label(self) -> &'static str {
        match self {
            Self::Generate => "Generate",
            Self::Scan => "Scan",
            Self::History => "History",
            Self::Settings => "Settings",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown panel {s:?}"))
    }
}

// App
//------------------------------------------------------------------------------

#[derive(Debug)]
pub struct App<S, F> {
    profile: Profile<S>,
    generator: Generator,
    scanner: Scanner,
    feedback: F,
    panel: Panel,
}

impl<S: KeyValueStore, F: Feedback> App<S, F> {
    pub fn open(store: S, scanner: ScannerConfig, feedback: F) -> StudioResult<Self> {
        let profile = Profile::open(store)?;
        let generator = Generator::new(profile.settings());
        Ok(Self { profile, generator, scanner: Scanner::new(scanner), feedback, panel: Panel::default() })
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn navigate(&mut self, to: Panel) {
        if to == self.panel {
            return;
        }
        if self.panel == Panel::Scan {
            self.scanner.reset();
        }
        if to == Panel::Generate {
            self.generator = Generator::new(self.profile.settings());
        }
        tracing::debug!(from = %self.panel, %to, "Navigate");
        self.panel = to;
    }

    pub fn profile(&self) -> &Profile<S> {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut Profile<S> {
        &mut self.profile
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Whether to draw with the dark palette given the OS preference.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        self.profile.settings().theme.is_dark(system_prefers_dark)
    }

    pub fn into_profile(self) -> Profile<S> {
        self.profile
    }

    // Generate
    //--------------------------------------------------------------------------

    /// Runs a generator edit against the profile it records into.
    pub fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut Generator, &mut Profile<S>) -> StudioResult<T>,
    ) -> StudioResult<T> {
        self.navigate(Panel::Generate);
        f(&mut self.generator, &mut self.profile)
    }

    // Scan
    //--------------------------------------------------------------------------

    pub fn start_scan(&mut self, source: Box<dyn FrameSource>) -> StudioResult<()> {
        self.navigate(Panel::Scan);
        self.scanner.start(source)
    }

    pub fn poll_scan(&mut self) -> StudioResult<Poll> {
        self.scanner.poll(&mut self.profile, &mut self.feedback)
    }

    pub fn run_scan(&mut self) -> StudioResult<Option<ScanResult>> {
        self.scanner.run(&mut self.profile, &mut self.feedback)
    }

    pub fn stop_scan(&mut self) {
        self.scanner.stop();
    }

    pub fn toggle_camera(&mut self) -> StudioResult<Facing> {
        self.scanner.toggle_facing()
    }

    pub fn scan_file(&mut self, path: &Path) -> StudioResult<ScanResult> {
        self.navigate(Panel::Scan);
        self.scanner.scan_file(path, &mut self.profile, &mut self.feedback)
    }
}
