//! Photo gallery shown over the scene.
//!
//! Holds image references most recent first. Uploads prepend; nothing is
//! ever removed.

pub mod loader;
pub mod upload;
pub mod viewer;

pub use loader::load_rgba;
pub use upload::is_supported_image;
pub use viewer::{ImageViewer, ViewerHit};

use std::fmt;
use std::path::{Path, PathBuf};

/// An image the gallery can show.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageRef {
    /// Remote URL; listed but never fetched
    Remote(String),
    /// File chosen by the user
    Local(PathBuf),
}

impl ImageRef {
    /// `http(s)://` strings become `Remote`, anything else a local path
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ImageRef::Remote(value.to_string())
        } else {
            ImageRef::Local(PathBuf::from(value))
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            ImageRef::Local(path) => Some(path),
            ImageRef::Remote(_) => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Remote(url) => f.write_str(url),
            ImageRef::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Ordered image list, most recent first.
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    images: Vec<ImageRef>,
    /// Next image a tree click opens
    cursor: usize,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with initial references, kept in the given order.
    pub fn with_defaults<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            images: refs.into_iter().map(|s| ImageRef::parse(s.as_ref())).collect(),
            cursor: 0,
        }
    }

    /// Prepend every supported image file in selection order.
    ///
    /// Returns how many were added. Unsupported files are logged and skipped;
    /// an empty selection changes nothing.
    pub fn upload<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        let accepted: Vec<ImageRef> = paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| {
                let ok = is_supported_image(path);
                if !ok {
                    log::warn!("Skipping {}: not a supported image", path.display());
                }
                ok
            })
            .map(|path| ImageRef::Local(path.to_path_buf()))
            .collect();

        if accepted.is_empty() {
            return 0;
        }

        let added = accepted.len();
        self.images.splice(0..0, accepted);
        self.cursor = 0;
        log::info!("Uploaded {} image(s), gallery now holds {}", added, self.images.len());
        added
    }

    /// Image a tree click should open, advancing the cursor with wrap-around
    pub fn next_for_display(&mut self) -> Option<ImageRef> {
        if self.images.is_empty() {
            return None;
        }
        let image = self.images[self.cursor % self.images.len()].clone();
        self.cursor = (self.cursor + 1) % self.images.len();
        Some(image)
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&ImageRef> {
        self.images.get(index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DEFAULT_IMAGES;

    #[test]
    fn test_upload_prepends_in_order() {
        let mut gallery = Gallery::with_defaults(DEFAULT_IMAGES);
        assert_eq!(gallery.len(), 5);

        let added = gallery.upload(&["a.png", "b.jpg"]);

        assert_eq!(added, 2);
        assert_eq!(gallery.len(), 7);
        assert_eq!(gallery.get(0), Some(&ImageRef::Local("a.png".into())));
        assert_eq!(gallery.get(1), Some(&ImageRef::Local("b.jpg".into())));
        assert_eq!(gallery.get(2), Some(&ImageRef::parse(DEFAULT_IMAGES[0])));
    }

    #[test]
    fn test_latest_upload_comes_first() {
        let mut gallery = Gallery::new();
        gallery.upload(&["first.png"]);
        gallery.upload(&["second.png"]);
        assert_eq!(gallery.get(0).unwrap().to_string(), "second.png");
    }

    #[test]
    fn test_empty_and_unsupported_uploads() {
        let mut gallery = Gallery::with_defaults(DEFAULT_IMAGES);
        assert_eq!(gallery.upload::<&str>(&[]), 0);
        assert_eq!(gallery.upload(&["notes.txt", "archive"]), 0);
        assert_eq!(gallery.len(), 5);

        assert_eq!(gallery.upload(&["notes.txt", "photo.webp"]), 1);
        assert_eq!(gallery.len(), 6);
    }

    #[test]
    fn test_cursor_wraps_and_resets() {
        let mut gallery = Gallery::with_defaults(["https://x/1", "https://x/2"]);
        assert_eq!(gallery.next_for_display(), Some(ImageRef::Remote("https://x/1".into())));
        assert_eq!(gallery.next_for_display(), Some(ImageRef::Remote("https://x/2".into())));
        assert_eq!(gallery.next_for_display(), Some(ImageRef::Remote("https://x/1".into())));

        gallery.upload(&["new.png"]);
        assert_eq!(gallery.next_for_display(), Some(ImageRef::Local("new.png".into())));
        assert!(Gallery::new().next_for_display().is_none());
    }

    #[test]
    fn test_parse() {
        assert!(matches!(ImageRef::parse("https://a/b.jpg"), ImageRef::Remote(_)));
        assert!(matches!(ImageRef::parse("/tmp/b.jpg"), ImageRef::Local(_)));
    }
}
