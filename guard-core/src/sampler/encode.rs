//! Still-image encoding for analysis frames and preview thumbnails.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{GuardError, Result};

const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Encode an image as baseline JPEG at the given quality (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG carries no alpha channel.
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| GuardError::Encoding(format!("JPEG encoding failed: {e}")))?;

    Ok(buffer.into_inner())
}

/// Scale `(width, height)` to `target_width`, preserving aspect ratio.
pub fn thumbnail_dimensions(width: u32, height: u32, target_width: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 || target_width == 0 {
        return Err(GuardError::Encoding(format!(
            "Cannot scale {width}x{height} to width {target_width}"
        )));
    }

    let scale = target_width as f64 / width as f64;
    let target_height = ((height as f64 * scale).round() as u32).max(1);
    Ok((target_width, target_height))
}

/// Produce the preview thumbnail as a JPEG data URI.
pub fn make_thumbnail(image: &DynamicImage, target_width: u32, quality: u8) -> Result<String> {
    let (width, height) = thumbnail_dimensions(image.width(), image.height(), target_width)?;
    let resized = image.resize_exact(width, height, FilterType::Triangle);
    let jpeg = encode_jpeg(&resized, quality)?;
    Ok(to_data_uri(&jpeg))
}

/// Wrap JPEG bytes in a `data:` URI.
pub fn to_data_uri(jpeg: &[u8]) -> String {
    format!("{JPEG_DATA_URI_PREFIX}{}", BASE64.encode(jpeg))
}

/// Extract the JPEG bytes from a `data:image/jpeg;base64,` URI.
pub fn from_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .ok_or_else(|| GuardError::Encoding("Not a JPEG data URI".into()))?;
    BASE64
        .decode(payload)
        .map_err(|e| GuardError::Encoding(format!("Invalid base64 payload: {e}")))
}
