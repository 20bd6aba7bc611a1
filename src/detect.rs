//! Binary format detection from magic bytes.
//!
//! Used to pick the MIME type of raw image assets before wrapping them in a
//! data URI, and to check that a page-raster source really is a PDF.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Binary formats the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat {
    /// PDF document
    Pdf,
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
    /// GIF image
    Gif,
    /// BMP image
    Bmp,
    /// WEBP image
    Webp,
    /// TIFF image
    Tiff,
}

impl BinaryFormat {
    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            BinaryFormat::Pdf => "application/pdf",
            BinaryFormat::Png => "image/png",
            BinaryFormat::Jpeg => "image/jpeg",
            BinaryFormat::Gif => "image/gif",
            BinaryFormat::Bmp => "image/bmp",
            BinaryFormat::Webp => "image/webp",
            BinaryFormat::Tiff => "image/tiff",
        }
    }

    /// Whether this is a raster image format.
    pub fn is_image(&self) -> bool {
        !matches!(self, BinaryFormat::Pdf)
    }
}

impl std::fmt::Display for BinaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const HEADER_LEN: usize = 16;

/// Detect the format of a file from its first bytes.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<BinaryFormat> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.by_ref()
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the format of a byte buffer.
///
/// # Returns
/// * `Ok(BinaryFormat)` when the magic bytes are recognized
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<BinaryFormat> {
    if data.len() < 4 {
        return Err(Error::UnknownFormat);
    }

    if data.starts_with(PDF_MAGIC) {
        return Ok(BinaryFormat::Pdf);
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(BinaryFormat::Png);
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(BinaryFormat::Jpeg);
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Ok(BinaryFormat::Gif);
    }

    // TIFF: little-endian or big-endian byte order marks
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Ok(BinaryFormat::Tiff);
    }

    // WEBP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(BinaryFormat::Webp);
    }

    if data.starts_with(b"BM") {
        return Ok(BinaryFormat::Bmp);
    }

    Err(Error::UnknownFormat)
}

/// MIME type of an image buffer, defaulting to PNG when unrecognized.
pub fn image_mime_type(data: &[u8]) -> &'static str {
    match detect_format_from_bytes(data) {
        Ok(format) if format.is_image() => format.mime_type(),
        _ => BinaryFormat::Png.mime_type(),
    }
}

/// Check if a file is a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format_from_path(path), Ok(BinaryFormat::Pdf))
}

/// Check if bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(BinaryFormat::Pdf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        assert_eq!(detect_format_from_bytes(data).unwrap(), BinaryFormat::Pdf);
        assert!(is_pdf_bytes(data));
    }

    #[test]
    fn test_detect_images() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_format_from_bytes(&png).unwrap(), BinaryFormat::Png);

        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_format_from_bytes(&jpeg).unwrap(), BinaryFormat::Jpeg);
        assert_eq!(image_mime_type(&jpeg), "image/jpeg");
    }

    #[test]
    fn test_detect_unknown() {
        let result = detect_format_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }

    #[test]
    fn test_detect_too_short() {
        assert!(matches!(
            detect_format_from_bytes(b"%P"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_unknown_image_defaults_to_png() {
        assert_eq!(image_mime_type(b"\x00\x01\x02\x03\x04"), "image/png");
        // A PDF is not an image asset
        assert_eq!(image_mime_type(b"%PDF-1.4\n"), "image/png");
    }
}
