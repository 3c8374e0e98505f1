use image::DynamicImage;
use imageproc::contrast::equalize_histogram;
use qrism::reader::detect_qr;

use crate::settings::ErrorCorrection;

/// A payload read from a frame.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Decoded {
    pub content: String,
    pub ec_level: Option<ErrorCorrection>,
}

/// Looks for a QR symbol in `img`.
///
/// When `region` is set, a centred square of that side is tried first. The
/// full frame comes next, then a histogram equalized copy for low contrast
/// captures.
pub fn decode_image(img: &DynamicImage, region: Option<u32>) -> Option<Decoded> {
    if let Some(crop) = region.and_then(|side| centre_crop(img, side)) {
        if let Some(decoded) = decode_once(&crop) {
            return Some(decoded);
        }
        tracing::trace!("Scan region yielded nothing, trying full frame");
    }

    if let Some(decoded) = decode_once(img) {
        return Some(decoded);
    }

    let equalized = DynamicImage::ImageLuma8(equalize_histogram(&img.to_luma8()));
    decode_once(&equalized)
}

fn decode_once(img: &DynamicImage) -> Option<Decoded> {
    let mut res = detect_qr(img);
    res.symbols().iter_mut().find_map(|symbol| match symbol.decode() {
        Ok((meta, content)) => Some(Decoded { content, ec_level: meta.ec_level().map(ErrorCorrection::from) }),
        Err(e) => {
            tracing::trace!(error = %e, "Symbol failed to decode");
            None
        }
    })
}

/// Frames no larger than the region are scanned whole.
fn centre_crop(img: &DynamicImage, side: u32) -> Option<DynamicImage> {
    let (w, h) = (img.width(), img.height());
    if side == 0 || side >= w || side >= h {
        return None;
    }
    Some(img.crop_imm((w - side) / 2, (h - side) / 2, side, side))
}
