//! Structural image validation.
//!
//! The bytes are borrowed, never consumed, so the caller can store exactly
//! what was validated.

use std::io::Cursor;

use image::{ImageFormat, ImageReader, Limits};

use crate::errors::InvalidImage;

/// Widest or tallest image accepted, in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Largest pixel buffer a decode may allocate. Small compressed uploads can
/// expand far beyond the request body limit.
pub const MAX_DECODE_ALLOC: u64 = 64 * 1024 * 1024;

/// Decoder limits applied to every upload.
pub fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Result of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ValidatedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

/// Checks that `data` is a complete, decodable image.
///
/// The format is sniffed from the content, not from any declared content type,
/// and the whole image is decoded so a valid signature followed by garbage or a
/// truncated body is rejected. Images over the [`decode_limits`] are rejected
/// before their pixel buffer is allocated.
pub fn validate_image(data: &[u8]) -> Result<ValidatedImage, InvalidImage> {
    validate_image_with_limits(data, decode_limits())
}

pub fn validate_image_with_limits(
    data: &[u8],
    limits: Limits,
) -> Result<ValidatedImage, InvalidImage> {
    if data.is_empty() {
        return Err(InvalidImage {
            reason: "empty file".to_string(),
        });
    }

    let mut reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| InvalidImage {
            reason: format!("unreadable data: {}", e),
        })?;

    let format = reader.format().ok_or_else(|| InvalidImage {
        reason: "unrecognized image format".to_string(),
    })?;
    reader.limits(limits);

    let decoded = reader.decode().map_err(|e| InvalidImage {
        reason: format!("failed to decode {:?}: {}", format, e),
    })?;

    Ok(ValidatedImage {
        format,
        width: decoded.width(),
        height: decoded.height(),
    })
}
