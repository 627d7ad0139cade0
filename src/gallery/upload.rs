//! Basic file-type filtering for uploads.

use std::path::Path;

use image::ImageFormat;

/// Whether the file extension names an image format we can decode.
pub fn is_supported_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|format| format.reading_enabled())
}
