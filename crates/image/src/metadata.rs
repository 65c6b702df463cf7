//! Header-only image metadata.
//!
//! Reads dimensions without decoding pixel data, so it also works for formats
//! the resizer cannot decode (WebP).

use crate::{detect_format, ImageFormat};
use serde::{Deserialize, Serialize};

/// Image metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// File size in bytes
    pub size_bytes: usize,
}

impl ImageMetadata {
    /// Calculate aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Check if image is landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Check if image is portrait orientation.
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    /// Whether the longest edge exceeds `max_dimension`.
    pub fn exceeds(&self, max_dimension: u32) -> bool {
        self.width.max(self.height) > max_dimension
    }
}

/// Extract metadata from image data.
///
/// Returns `None` for unknown formats, formats without a header parser
/// (BMP, TIFF, AVIF, HEIC, SVG) and truncated headers.
pub fn extract_metadata(data: &[u8]) -> Option<ImageMetadata> {
    let format = detect_format(data).ok()?;

    let (width, height) = match format {
        ImageFormat::Jpeg => extract_jpeg_dimensions(data)?,
        ImageFormat::Png => extract_png_dimensions(data)?,
        ImageFormat::Gif => extract_gif_dimensions(data)?,
        ImageFormat::WebP => extract_webp_dimensions(data)?,
        _ => return None,
    };

    Some(ImageMetadata {
        width,
        height,
        format,
        size_bytes: data.len(),
    })
}

/// Extract dimensions from JPEG data.
fn extract_jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // Skip SOI marker
    let mut i = 2;

    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOF markers contain dimensions
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            if i + 9 < data.len() {
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                return Some((width, height));
            }
            return None;
        }

        // Skip to next marker
        if marker == 0xD8 || marker == 0xD9 || marker == 0xFF || (0xD0..=0xD7).contains(&marker) {
            i += if marker == 0xFF { 1 } else { 2 };
        } else if i + 3 < data.len() {
            let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + length;
        } else {
            break;
        }
    }

    None
}

/// Extract dimensions from PNG data.
fn extract_png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // PNG header is 8 bytes, IHDR chunk starts at byte 8
    if data.len() < 24 {
        return None;
    }

    // IHDR chunk: 4 bytes length + 4 bytes "IHDR" + 4 bytes width + 4 bytes height
    if &data[12..16] != b"IHDR" {
        return None;
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);

    Some((width, height))
}

/// Extract dimensions from GIF data.
fn extract_gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // GIF header: 6 bytes signature + 2 bytes width + 2 bytes height
    if data.len() < 10 {
        return None;
    }

    let width = u16::from_le_bytes([data[6], data[7]]) as u32;
    let height = u16::from_le_bytes([data[8], data[9]]) as u32;

    Some((width, height))
}

/// Extract dimensions from the first WebP chunk (VP8, VP8L or VP8X).
fn extract_webp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let chunk = data.get(12..16)?;
    let payload = data.get(20..)?;

    match chunk {
        b"VP8 " => {
            // Frame tag (3 bytes) + start code 9D 01 2A + 14-bit width/height
            if payload.len() < 10 || payload[3..6] != [0x9D, 0x01, 0x2A] {
                return None;
            }
            let width = u16::from_le_bytes([payload[6], payload[7]]) & 0x3FFF;
            let height = u16::from_le_bytes([payload[8], payload[9]]) & 0x3FFF;
            Some((width as u32, height as u32))
        }
        b"VP8L" => {
            // Signature 0x2F followed by 14-bit (width - 1) and (height - 1)
            if payload.len() < 5 || payload[0] != 0x2F {
                return None;
            }
            let bits = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
            Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        b"VP8X" => {
            // Flags (4 bytes) + 24-bit (width - 1) + 24-bit (height - 1)
            if payload.len() < 10 {
                return None;
            }
            let width = u32::from_le_bytes([payload[4], payload[5], payload[6], 0]) + 1;
            let height = u32::from_le_bytes([payload[7], payload[8], payload[9], 0]) + 1;
            Some((width, height))
        }
        _ => None,
    }
}
