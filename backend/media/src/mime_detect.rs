//! Image format detection for captured frames and still files.
//!
//! Content sniffing wins; the file extension is only a fallback.

use aqualabel_core::ImageFormat;
use std::path::Path;

/// Detect the format from the leading magic bytes.
pub fn sniff_format(data: &[u8]) -> ImageFormat {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        Ok(image::ImageFormat::Png) => ImageFormat::Png,
        Ok(image::ImageFormat::WebP) => ImageFormat::Webp,
        Ok(image::ImageFormat::Bmp) => ImageFormat::Bmp,
        _ => ImageFormat::Unknown,
    }
}

/// Detect the format by file extension.
pub fn format_from_path(path: &Path) -> ImageFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        "png"          => ImageFormat::Png,
        "webp"         => ImageFormat::Webp,
        "bmp"          => ImageFormat::Bmp,
        _              => ImageFormat::Unknown,
    }
}

/// Sniff first, then fall back to the extension.
pub fn detect_format(data: &[u8], path: &Path) -> ImageFormat {
    match sniff_format(data) {
        ImageFormat::Unknown => format_from_path(path),
        known => known,
    }
}

/// Whether the buffer holds a fully written frame.
///
/// Camera programs rewrite the frame file in place, so a read can catch it
/// half-written. JPEG and PNG carry an end marker; other formats are trusted
/// once their header is recognised.
pub fn is_complete_frame(data: &[u8]) -> bool {
    match sniff_format(data) {
        ImageFormat::Jpeg => data.len() >= 4 && data.ends_with(&[0xFF, 0xD9]),
        ImageFormat::Png => data.ends_with(&[0xAE, 0x42, 0x60, 0x82]),
        ImageFormat::Unknown => false,
        _ => true,
    }
}

/// Pixel dimensions from the image header, when the format is decodable.
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];
    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn sniffs_jpeg_and_png() {
        assert_eq!(sniff_format(JPEG), ImageFormat::Jpeg);
        assert_eq!(sniff_format(PNG_HEADER), ImageFormat::Png);
        assert_eq!(sniff_format(b"not an image"), ImageFormat::Unknown);
    }

    #[test]
    fn content_beats_extension() {
        assert_eq!(detect_format(JPEG, &PathBuf::from("label.png")), ImageFormat::Jpeg);
        assert_eq!(detect_format(b"??", &PathBuf::from("label.PNG")), ImageFormat::Png);
    }

    #[test]
    fn truncated_jpeg_is_incomplete() {
        assert!(is_complete_frame(JPEG));
        assert!(!is_complete_frame(&JPEG[..6]));
        assert!(!is_complete_frame(&[]));
    }

    #[test]
    fn dimensions_need_a_real_header() {
        assert_eq!(image_dimensions(JPEG), None);
        assert_eq!(image_dimensions(b"plain text"), None);
    }
}
