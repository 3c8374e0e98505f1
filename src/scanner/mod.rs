//! Scanner lifecycle.
//!
//! A [`Scanner`] is idle until a [`FrameSource`] is attached with
//! [`Scanner::start`]. Frames are pulled and decoded one at a time. The first
//! successful decode detaches the source, records the payload as a scanned
//! history entry, plays the configured feedback and leaves the scanner idle
//! with the result available through [`Scanner::last_result`].

mod decode;
pub mod feedback;
pub mod source;

pub use decode::{decode_image, Decoded};
pub use feedback::{Feedback, Silent, TerminalFeedback, Tone, VIBRATION};
pub use source::{DirectorySource, Facing, FrameList, FrameSource};

use std::path::Path;
use std::time::Duration;

use image::DynamicImage;

use crate::category::{self, Category};
use crate::error::{StudioError, StudioResult};
use crate::history::{HistoryEntry, Origin};
use crate::profile::Profile;
use crate::settings::ErrorCorrection;
use crate::storage::KeyValueStore;

// Config
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct ScannerConfig {
    /// Frames per second. Zero disables throttling.
    pub fps: u32,
    /// Side of the centred square tried before the full frame.
    pub scan_region: Option<u32>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self { fps: 10, scan_region: Some(250) }
    }
}

impl ScannerConfig {
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.fps > 0).then(|| Duration::from_secs(1) / self.fps)
    }
}

// State
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ScanState {
    Idle,
    Scanning,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ScanResult {
    pub content: String,
    pub category: Category,
    /// The history entry written for this scan. `None` when auto-save is off
    /// or the payload was already recorded.
    pub entry: Option<HistoryEntry>,
    pub ec_level: Option<ErrorCorrection>,
}

/// Outcome of pulling one frame.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Poll {
    /// Nothing decoded yet, the source is still attached.
    Pending,
    Found(ScanResult),
    /// The source ran dry. The scanner is idle again.
    Exhausted,
    /// No source attached.
    Idle,
}

// Scanner
//------------------------------------------------------------------------------

pub struct Scanner {
    config: ScannerConfig,
    facing: Facing,
    source: Option<Box<dyn FrameSource>>,
    last_result: Option<ScanResult>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("facing", &self.facing)
            .field("state", &self.state())
            .field("last_result", &self.last_result)
            .finish()
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config, facing: Facing::default(), source: None, last_result: None }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn state(&self) -> ScanState {
        if self.source.is_some() {
            ScanState::Scanning
        } else {
            ScanState::Idle
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScanState::Scanning
    }

    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    /// Attaches `source` and starts scanning. Any active source is detached
    /// and the previous result cleared first. On attach failure the scanner
    /// stays idle.
    pub fn start(&mut self, mut source: Box<dyn FrameSource>) -> StudioResult<()> {
        self.stop();
        self.last_result = None;
        source.attach(self.facing)?;
        self.source = Some(source);
        tracing::debug!(facing = %self.facing, "Scanning started");
        Ok(())
    }

    /// Detaches the source, if any. Never fails.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.detach();
            tracing::debug!("Scanning stopped");
        }
    }

    pub fn reset(&mut self) {
        self.stop();
        self.last_result = None;
    }

    /// Switches between the rear and front camera. An active source is
    /// re-attached with the new facing. If that fails the scanner goes idle.
    pub fn toggle_facing(&mut self) -> StudioResult<Facing> {
        self.facing = self.facing.toggle();
        tracing::debug!(facing = %self.facing, "Camera facing toggled");

        if let Some(source) = self.source.as_mut() {
            source.detach();
            if let Err(e) = source.attach(self.facing) {
                self.source = None;
                return Err(e);
            }
        }
        Ok(self.facing)
    }

    /// Pulls and decodes one frame.
    pub fn poll<S: KeyValueStore>(
        &mut self,
        profile: &mut Profile<S>,
        feedback: &mut dyn Feedback,
    ) -> StudioResult<Poll> {
        let Some(source) = self.source.as_mut() else {
            return Ok(Poll::Idle);
        };

        let frame = match source.next_frame() {
            None => {
                tracing::debug!("Frame source exhausted");
                self.stop();
                return Ok(Poll::Exhausted);
            }
            Some(Err(e)) => {
                tracing::trace!(error = %e, "Skipping unreadable frame");
                return Ok(Poll::Pending);
            }
            Some(Ok(frame)) => frame,
        };

        match decode_image(&frame, self.config.scan_region) {
            Some(decoded) => self.complete(decoded, profile, feedback).map(Poll::Found),
            None => {
                tracing::trace!(width = frame.width(), height = frame.height(), "No QR code in frame");
                Ok(Poll::Pending)
            }
        }
    }

    /// Polls at the configured frame rate until a code is found or the source
    /// runs dry.
    pub fn run<S: KeyValueStore>(
        &mut self,
        profile: &mut Profile<S>,
        feedback: &mut dyn Feedback,
    ) -> StudioResult<Option<ScanResult>> {
        let interval = self.config.frame_interval();
        loop {
            match self.poll(profile, feedback)? {
                Poll::Found(result) => return Ok(Some(result)),
                Poll::Exhausted | Poll::Idle => return Ok(None),
                Poll::Pending => {
                    if let Some(interval) = interval {
                        std::thread::sleep(interval);
                    }
                }
            }
        }
    }

    /// Decodes a single image outside the frame loop. An active scan is
    /// stopped first.
    pub fn scan_image<S: KeyValueStore>(
        &mut self,
        img: &DynamicImage,
        profile: &mut Profile<S>,
        feedback: &mut dyn Feedback,
    ) -> StudioResult<ScanResult> {
        self.stop();
        let decoded = decode_image(img, None).ok_or(StudioError::NoCodeFound)?;
        self.complete(decoded, profile, feedback)
    }

    pub fn scan_file<S: KeyValueStore>(
        &mut self,
        path: &Path,
        profile: &mut Profile<S>,
        feedback: &mut dyn Feedback,
    ) -> StudioResult<ScanResult> {
        self.stop();
        let img = image::open(path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "Could not read image");
            StudioError::NoCodeFound
        })?;
        self.scan_image(&img, profile, feedback)
    }

    fn complete<S: KeyValueStore>(
        &mut self,
        decoded: Decoded,
        profile: &mut Profile<S>,
        feedback: &mut dyn Feedback,
    ) -> StudioResult<ScanResult> {
        self.stop();

        let entry = profile.record(&decoded.content, Origin::Scanned)?;
        let settings = profile.settings();
        if settings.sound_enabled {
            feedback.play_tone(&Tone::default());
        }
        if settings.vibration_enabled {
            feedback.vibrate(VIBRATION);
        }

        let result = ScanResult {
            category: category::detect(&decoded.content),
            content: decoded.content,
            entry,
            ec_level: decoded.ec_level,
        };
        tracing::debug!(category = %result.category, chars = result.content.chars().count(), "Scan complete");
        self.last_result = Some(result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod scanner_tests {
    use image::{GrayImage, Luma, Rgb};

    use super::*;
    use crate::generator::encode;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct Recorder {
        tones: Vec<Tone>,
        vibrations: Vec<Duration>,
    }

    impl Feedback for Recorder {
        fn play_tone(&mut self, tone: &Tone) {
            self.tones.push(*tone);
        }

        fn vibrate(&mut self, duration: Duration) {
            self.vibrations.push(duration);
        }
    }

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(320, 240, Luma([255])))
    }

    fn qr(content: &str) -> DynamicImage {
        let enc = encode(content, ErrorCorrection::M).unwrap();
        DynamicImage::ImageRgb8(enc.to_image(256, Rgb([0, 0, 0]), Rgb([255, 255, 255])))
    }

    fn unthrottled() -> Scanner {
        Scanner::new(ScannerConfig { fps: 0, ..Default::default() })
    }

    #[test]
    fn test_config_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.fps, 10);
        assert_eq!(config.scan_region, Some(250));
        assert_eq!(config.frame_interval(), Some(Duration::from_millis(100)));
        assert_eq!(ScannerConfig { fps: 0, scan_region: None }.frame_interval(), None);
    }

    #[test]
    fn test_poll_lifecycle() {
        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        let mut feedback = Recorder::default();
        let mut scanner = unthrottled();
        assert_eq!(scanner.poll(&mut profile, &mut feedback).unwrap(), Poll::Idle);

        scanner.start(Box::new(FrameList::new(vec![blank(), qr("tel:+15551234"), blank()]))).unwrap();
        assert_eq!(scanner.state(), ScanState::Scanning);
        assert_eq!(scanner.poll(&mut profile, &mut feedback).unwrap(), Poll::Pending);

        let Poll::Found(result) = scanner.poll(&mut profile, &mut feedback).unwrap() else {
            panic!("expected a result");
        };
        assert_eq!(result.content, "tel:+15551234");
        assert_eq!(result.category, Category::Phone);
        assert_eq!(result.ec_level, Some(ErrorCorrection::M));
        assert_eq!(scanner.state(), ScanState::Idle);
        assert_eq!(scanner.last_result(), Some(&result));

        let history = profile.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].origin, Origin::Scanned);
        assert_eq!(result.entry.as_ref(), history.entries().first());

        assert_eq!(feedback.tones, vec![Tone::default()]);
        assert_eq!(feedback.tones[0].samples(8_000).len(), 2_400);
        assert_eq!(feedback.vibrations, vec![VIBRATION]);
    }

    #[test]
    fn test_exhausted_source_returns_to_idle() {
        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        let mut scanner = unthrottled();
        scanner.start(Box::new(FrameList::new(vec![blank(), blank()]))).unwrap();

        assert_eq!(scanner.run(&mut profile, &mut Silent).unwrap(), None);
        assert_eq!(scanner.state(), ScanState::Idle);
        assert!(scanner.last_result().is_none());
        assert!(profile.history().unwrap().is_empty());
    }

    #[test]
    fn test_restart_clears_result() {
        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        let mut scanner = unthrottled();
        scanner.start(Box::new(FrameList::new(vec![qr("first")]))).unwrap();
        assert!(scanner.run(&mut profile, &mut Silent).unwrap().is_some());

        scanner.start(Box::new(FrameList::new(vec![blank()]))).unwrap();
        assert!(scanner.last_result().is_none());
        scanner.reset();
        assert_eq!(scanner.state(), ScanState::Idle);
    }

    #[test]
    fn test_feedback_follows_settings() {
        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        profile.update_setting("soundEnabled", "false").unwrap();
        let mut feedback = Recorder::default();
        let mut scanner = unthrottled();

        scanner.scan_image(&qr("quiet"), &mut profile, &mut feedback).unwrap();
        assert!(feedback.tones.is_empty());
        assert_eq!(feedback.vibrations.len(), 1);

        profile.update_setting("vibrationEnabled", "false").unwrap();
        scanner.scan_image(&qr("still"), &mut profile, &mut feedback).unwrap();
        assert_eq!(feedback.vibrations.len(), 1);
    }

    #[test]
    fn test_duplicate_scan_not_recorded_twice() {
        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        let mut scanner = unthrottled();
        let first = scanner.scan_image(&qr("again"), &mut profile, &mut Silent).unwrap();
        let second = scanner.scan_image(&qr("again"), &mut profile, &mut Silent).unwrap();

        assert!(first.entry.is_some());
        assert!(second.entry.is_none());
        assert_eq!(second.content, "again");
        assert_eq!(profile.history().unwrap().len(), 1);
    }

    #[test]
    fn test_scan_image_stops_active_scan() {
        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        let mut scanner = unthrottled();
        scanner.start(Box::new(FrameList::new(vec![blank()]))).unwrap();

        let err = scanner.scan_image(&blank(), &mut profile, &mut Silent).unwrap_err();
        assert!(matches!(err, StudioError::NoCodeFound));
        assert_eq!(scanner.state(), ScanState::Idle);
        assert!(profile.history().unwrap().is_empty());
    }

    #[test]
    fn test_scan_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("code.png");
        qr("https://example.com/file").save(&path).unwrap();
        std::fs::write(tmp.path().join("broken.png"), "not an image").unwrap();

        let mut profile = Profile::open(MemoryStore::new()).unwrap();
        let mut scanner = unthrottled();
        let result = scanner.scan_file(&path, &mut profile, &mut Silent).unwrap();
        assert_eq!(result.category, Category::Url);

        let err = scanner.scan_file(&tmp.path().join("broken.png"), &mut profile, &mut Silent).unwrap_err();
        assert!(matches!(err, StudioError::NoCodeFound));
    }

    #[test]
    fn test_toggle_facing_reattaches() {
        let mut scanner = unthrottled();
        assert_eq!(scanner.toggle_facing().unwrap(), Facing::User);
        assert_eq!(scanner.state(), ScanState::Idle);

        scanner.start(Box::new(FrameList::new(vec![blank()]))).unwrap();
        assert_eq!(scanner.toggle_facing().unwrap(), Facing::Environment);
        assert_eq!(scanner.state(), ScanState::Scanning);
    }
}
