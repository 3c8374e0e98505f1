use image::{GrayImage, Rgb, RgbImage};
use qrism::QRBuilder;

use crate::error::{StudioError, StudioResult};
use crate::settings::ErrorCorrection;

// Encoded symbol
//------------------------------------------------------------------------------

/// A QR symbol as a grid of modules, quiet zone included.
#[derive(Debug, Clone)]
pub struct Encoded {
    modules: GrayImage,
    version: usize,
    ec_level: ErrorCorrection,
}

pub fn encode(content: &str, ec_level: ErrorCorrection) -> StudioResult<Encoded> {
    if content.is_empty() {
        return Err(StudioError::EmptyContent);
    }

    let qr = QRBuilder::new(content.as_bytes()).ec_level(ec_level.into()).build()?;
    let version = *qr.version();
    tracing::debug!(version, %ec_level, bytes = content.len(), "Encoded QR");

    // One pixel per module
    Ok(Encoded { modules: qr.to_gray_image(1), version, ec_level })
}

impl Encoded {
    /// Modules per side, quiet zone included.
    pub fn width(&self) -> u32 {
        self.modules.width()
    }

    pub fn version(&self) -> usize {
        self.version
    }

    pub fn ec_level(&self) -> ErrorCorrection {
        self.ec_level
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.modules.get_pixel_checked(x, y).is_some_and(|p| p.0[0] < 128)
    }

    /// Renders onto a `size` x `size` canvas using the largest whole module
    /// scale that fits. Symbols wider than `size` modules are rendered at one
    /// pixel per module and the canvas grows to fit.
    pub fn to_image(&self, size: u32, fg: Rgb<u8>, bg: Rgb<u8>) -> RgbImage {
        let w = self.width();
        let scale = (size / w).max(1);
        let side = size.max(w * scale);
        let offset = (side - w * scale) / 2;

        let mut canvas = RgbImage::from_pixel(side, side, bg);
        for (x, y, _) in self.modules.enumerate_pixels().filter(|(_, _, p)| p.0[0] < 128) {
            let (x0, y0) = (offset + x * scale, offset + y * scale);
            for dy in 0..scale {
                for dx in 0..scale {
                    canvas.put_pixel(x0 + dx, y0 + dy, fg);
                }
            }
        }
        canvas
    }

    /// Renders with half-block glyphs, two module rows per line. On a dark
    /// terminal the light modules are drawn instead so the symbol keeps its
    /// contrast.
    pub fn to_terminal(&self, dark_theme: bool) -> String {
        let w = self.width();
        let ink = |x, y| self.is_dark(x, y) != dark_theme;

        let mut out = String::with_capacity(((w + 1) * w.div_ceil(2)) as usize * 3);
        for y in (0..w).step_by(2) {
            for x in 0..w {
                let top = ink(x, y);
                let bottom = y + 1 < w && ink(x, y + 1);
                out.push(match (top, bottom) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}

// Colors
//------------------------------------------------------------------------------

/// Parses `#rrggbb` or `#rgb`. The leading `#` is optional.
pub fn parse_color(s: &str) -> StudioResult<Rgb<u8>> {
    let hex = s.trim().trim_start_matches('#');
    let err = || StudioError::InvalidColor(s.to_string());
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }

    let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16).map_err(|_| err());
    match hex.len() {
        6 => Ok(Rgb([channel(0, 2)?, channel(2, 2)?, channel(4, 2)?])),
        3 => {
            let [r, g, b] = [channel(0, 1)?, channel(1, 1)?, channel(2, 1)?];
            Ok(Rgb([r * 17, g * 17, b * 17]))
        }
        _ => Err(err()),
    }
}

pub fn format_color(c: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c.0[0], c.0[1], c.0[2])
}
