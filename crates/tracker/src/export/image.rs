use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, TrackerError};

/// Longest side a stored photo may have, in pixels.
pub const MAX_PHOTO_SIDE: u32 = 400;

/// JPEG quality used when re-encoding photos.
pub const PHOTO_QUALITY: f32 = 0.7;

/// A decoded picture as handed over by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// An encoded image ready for inline storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn from_data_url(url: &str) -> Result<(String, Vec<u8>)> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| TrackerError::Image("not a data URL".to_string()))?;
        let (mime, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| TrackerError::Image("data URL is not base64".to_string()))?;
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| TrackerError::Image(e.to_string()))?;
        Ok((mime.to_string(), bytes))
    }
}

/// Resizes and compresses pictures. Implemented by the platform layer.
pub trait ImageEncoder {
    fn encode(&self, image: &RawImage, width: u32, height: u32, quality: f32)
    -> Result<ImagePayload>;
}

/// Scale `(width, height)` to fit inside a `max` square, keeping the aspect
/// ratio. Images already inside the box keep their size.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let ratio = f64::min(
        f64::from(max) / f64::from(width),
        f64::from(max) / f64::from(height),
    );
    let scale = |side: u32| ((f64::from(side) * ratio).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Bound and re-encode a photo, returning the inline payload to store.
pub fn prepare_photo<E: ImageEncoder + ?Sized>(encoder: &E, image: &RawImage) -> Result<String> {
    if image.width == 0 || image.height == 0 {
        return Err(TrackerError::Image("image has no pixels".to_string()));
    }
    let (width, height) = fit_within(image.width, image.height, MAX_PHOTO_SIDE);
    let payload = encoder.encode(image, width, height, PHOTO_QUALITY)?;
    Ok(payload.data_url())
}
