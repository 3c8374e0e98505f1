//! QR generation.
//!
//! The [`Generator`] holds the text and style being edited. Every edit that
//! changes the symbol's content or look records the text in the history,
//! subject to the auto-save setting.

mod render;
pub mod template;

pub use render::{encode, format_color, parse_color, Encoded};
pub use template::{Template, TEMPLATES};

use std::path::Path;

use chrono::{DateTime, Utc};
use image::{Rgb, RgbImage};

use crate::category::{self, Category};
use crate::error::StudioResult;
use crate::history::Origin;
use crate::profile::Profile;
use crate::settings::{validate_size, ErrorCorrection, Settings};
use crate::storage::KeyValueStore;

pub const DEFAULT_FOREGROUND: Rgb<u8> = Rgb([0, 0, 0]);
pub const DEFAULT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

// Options
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct GenerateOptions {
    pub foreground: Rgb<u8>,
    pub background: Rgb<u8>,
    pub ec_level: ErrorCorrection,
    pub size: u32,
}

impl GenerateOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
            ec_level: settings.default_error_correction,
            size: settings.default_size,
        }
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Summary {
    pub category: Category,
    pub chars: usize,
}

// Generator
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Generator {
    text: String,
    options: GenerateOptions,
}

impl Generator {
    pub fn new(settings: &Settings) -> Self {
        Self { text: String::new(), options: GenerateOptions::from_settings(settings) }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn set_text<S: KeyValueStore>(&mut self, text: &str, profile: &mut Profile<S>) -> StudioResult<()> {
        self.text = text.to_string();
        self.autosave(profile)
    }

    pub fn apply_template<S: KeyValueStore>(&mut self, name: &str, profile: &mut Profile<S>) -> StudioResult<()> {
        let tpl = template::find(name)?;
        self.set_text(tpl.value, profile)
    }

    pub fn set_foreground<S: KeyValueStore>(&mut self, hex: &str, profile: &mut Profile<S>) -> StudioResult<()> {
        self.options.foreground = parse_color(hex)?;
        self.autosave(profile)
    }

    pub fn set_background<S: KeyValueStore>(&mut self, hex: &str, profile: &mut Profile<S>) -> StudioResult<()> {
        self.options.background = parse_color(hex)?;
        self.autosave(profile)
    }

    pub fn set_ec_level<S: KeyValueStore>(
        &mut self,
        ec_level: ErrorCorrection,
        profile: &mut Profile<S>,
    ) -> StudioResult<()> {
        self.options.ec_level = ec_level;
        self.autosave(profile)
    }

    /// Size only affects the output image, so it does not touch the history.
    pub fn set_size(&mut self, size: u32) -> StudioResult<()> {
        self.options.size = validate_size(size)?;
        Ok(())
    }

    fn autosave<S: KeyValueStore>(&self, profile: &mut Profile<S>) -> StudioResult<()> {
        if self.text.trim().is_empty() {
            return Ok(());
        }
        profile.record(&self.text, Origin::Generated)?;
        Ok(())
    }

    pub fn encode(&self) -> StudioResult<Encoded> {
        encode(&self.text, self.options.ec_level)
    }

    pub fn render(&self) -> StudioResult<RgbImage> {
        let opts = &self.options;
        Ok(self.encode()?.to_image(opts.size, opts.foreground, opts.background))
    }

    /// Renders and writes a PNG. The format follows the file extension when it
    /// has one.
    pub fn save(&self, path: &Path) -> StudioResult<()> {
        let img = self.render()?;
        if path.extension().is_some() {
            img.save(path)?;
        } else {
            img.save_with_format(path, image::ImageFormat::Png)?;
        }
        tracing::info!(path = %path.display(), size = img.width(), "Saved QR image");
        Ok(())
    }

    pub fn summary(&self) -> Summary {
        Summary { category: category::detect(&self.text), chars: self.text.chars().count() }
    }
}

pub fn download_file_name(now: DateTime<Utc>) -> String {
    format!("qrcode-{}.png", now.timestamp_millis())
}
