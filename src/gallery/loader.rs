//! Decoding gallery images for display.

use image::RgbaImage;

use crate::core::{Error, Result};
use super::ImageRef;

/// Decode an image to RGBA8.
///
/// Remote references are not fetched and yield [`Error::Unsupported`].
pub fn load_rgba(image: &ImageRef) -> Result<RgbaImage> {
    match image {
        ImageRef::Local(path) => {
            let decoded = image::open(path)?;
            log::debug!("Decoded {} ({}x{})", path.display(), decoded.width(), decoded.height());
            Ok(decoded.to_rgba8())
        }
        ImageRef::Remote(url) => Err(Error::Unsupported(format!("remote image {url}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_is_unsupported() {
        let result = load_rgba(&ImageRef::Remote("https://example.com/a.jpg".into()));
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255])).save(&path).unwrap();

        let loaded = load_rgba(&ImageRef::Local(path)).unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_rgba(&ImageRef::Local(dir.path().join("gone.png")));
        assert!(result.is_err());
    }
}
