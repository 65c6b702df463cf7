//! Image format detection from magic bytes.
//!
//! The uploaded file name and any MIME type a client claims are never
//! consulted: the stored MIME type is always derived from the bytes.

use crate::{ImageError, Result};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// WebP image
    WebP,
    /// AVIF image
    Avif,
    /// BMP image
    Bmp,
    /// TIFF image
    Tiff,
    /// HEIC/HEIF image
    Heic,
    /// SVG document
    Svg,
}

impl ImageFormat {
    /// Short extension token identifying the format (`jpeg`, `png`, ...).
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            ImageFormat::Avif => "avif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Heic => "heic",
            ImageFormat::Svg => "svg",
        }
    }

    /// Get the MIME type for this format.
    ///
    /// This is `image/<extension>` for every raster format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Avif => "image/avif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Heic => "image/heic",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Get common file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
            ImageFormat::Gif => &["gif"],
            ImageFormat::WebP => &["webp"],
            ImageFormat::Avif => &["avif"],
            ImageFormat::Bmp => &["bmp"],
            ImageFormat::Tiff => &["tiff", "tif"],
            ImageFormat::Heic => &["heic", "heif"],
            ImageFormat::Svg => &["svg"],
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Detect image format from magic bytes.
///
/// Never panics on arbitrary input. Anything without a recognizable
/// signature, including buffers shorter than four bytes, is
/// [`ImageError::UnknownFormat`].
///
/// # Example
/// ```
/// use notepix_image::{detect_format, ImageFormat};
///
/// // JPEG magic bytes
/// let jpeg_data = [0xFF, 0xD8, 0xFF, 0xE0];
/// assert!(matches!(detect_format(&jpeg_data), Ok(ImageFormat::Jpeg)));
///
/// // PNG magic bytes
/// let png_data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// assert!(matches!(detect_format(&png_data), Ok(ImageFormat::Png)));
/// ```
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(ImageError::UnknownFormat);
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(ImageFormat::Jpeg);
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(ImageFormat::Png);
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(ImageFormat::Gif);
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(ImageFormat::WebP);
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Ok(ImageFormat::Bmp);
    }

    // TIFF: II or MM (little/big endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Ok(ImageFormat::Tiff);
    }

    // ISO-BMFF: ....ftyp<brand>
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        match &data[8..12] {
            b"avif" | b"avis" => return Ok(ImageFormat::Avif),
            b"heic" | b"heix" | b"hevc" | b"hevx" | b"mif1" | b"msf1" => {
                return Ok(ImageFormat::Heic);
            }
            _ => {}
        }
    }

    if is_svg(data) {
        return Ok(ImageFormat::Svg);
    }

    Err(ImageError::UnknownFormat)
}

/// How far into a text document the `<svg` root element is looked for.
const SVG_SCAN_LIMIT: usize = 4096;

/// Check whether the buffer is an SVG document.
///
/// Skips a UTF-8 BOM, whitespace, the XML declaration, comments and a
/// doctype, then requires the first element to be `<svg`.
fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_SCAN_LIMIT)];
    let head = head.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(head);
    let Ok(text) = std::str::from_utf8(head) else {
        // The scan window may cut a multi-byte character in half.
        return match std::str::from_utf8(&head[..head.len().saturating_sub(3)]) {
            Ok(text) => root_element_is_svg(text),
            Err(_) => false,
        };
    };
    root_element_is_svg(text)
}

fn root_element_is_svg(text: &str) -> bool {
    let mut rest = text.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("<?") {
            match after.find("?>") {
                Some(end) => rest = after[end + 2..].trim_start(),
                None => return false,
            }
        } else if let Some(after) = rest.strip_prefix("<!--") {
            match after.find("-->") {
                Some(end) => rest = after[end + 3..].trim_start(),
                None => return false,
            }
        } else if let Some(after) = rest.strip_prefix("<!") {
            match after.find('>') {
                Some(end) => rest = after[end + 1..].trim_start(),
                None => return false,
            }
        } else {
            break;
        }
    }

    rest.strip_prefix("<svg")
        .and_then(|after| after.chars().next())
        .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_jpeg() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
        assert_eq!(detect_format(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];
        assert_eq!(detect_format(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_gif() {
        let data = b"GIF89a\x00\x00\x00\x00";
        assert_eq!(detect_format(data).unwrap(), ImageFormat::Gif);
    }

    #[test]
    fn test_detect_webp() {
        let data = b"RIFF\x00\x00\x00\x00WEBP";
        assert_eq!(detect_format(data).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn test_detect_avif_and_heic_brands_are_distinct() {
        assert_eq!(detect_format(b"\x00\x00\x00\x1cftypavif").unwrap(), ImageFormat::Avif);
        assert_eq!(detect_format(b"\x00\x00\x00\x1cftypheic").unwrap(), ImageFormat::Heic);
        assert_eq!(detect_format(b"\x00\x00\x00\x1cftypmif1").unwrap(), ImageFormat::Heic);
    }

    #[test]
    fn test_detect_svg() {
        let plain = br#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        assert_eq!(detect_format(plain).unwrap(), ImageFormat::Svg);

        let with_prolog = b"\xEF\xBB\xBF<?xml version=\"1.0\"?>\n<!-- drawn -->\n<!DOCTYPE svg>\n<svg>";
        assert_eq!(detect_format(with_prolog).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn test_svg_lookalikes_rejected() {
        assert!(detect_format(b"<svgfoo></svgfoo>").is_err());
        assert!(detect_format(b"<html><svg></svg></html>").is_err());
        assert!(detect_format(b"<?xml never closed").is_err());
    }

    #[test]
    fn test_unknown_format() {
        let data = [0x00, 0x00, 0x00, 0x00];
        assert!(matches!(detect_format(&data), Err(ImageError::UnknownFormat)));
    }

    #[test]
    fn test_short_input_is_unknown() {
        assert!(matches!(detect_format(&[]), Err(ImageError::UnknownFormat)));
        assert!(matches!(detect_format(&[0xFF, 0xD8]), Err(ImageError::UnknownFormat)));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::WebP.mime_type(), "image/webp");
        assert_eq!(ImageFormat::Svg.mime_type(), "image/svg+xml");
    }

    #[test]
    fn test_raster_mime_is_image_slash_extension() {
        for format in [
            ImageFormat::Jpeg,
            ImageFormat::Png,
            ImageFormat::Gif,
            ImageFormat::WebP,
            ImageFormat::Avif,
            ImageFormat::Bmp,
            ImageFormat::Tiff,
            ImageFormat::Heic,
        ] {
            assert_eq!(format.mime_type(), format!("image/{}", format.extension()));
        }
    }
}
