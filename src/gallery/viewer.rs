//! Modal image viewer.

use super::ImageRef;

/// Parts of the open viewer a click can land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerHit {
    Backdrop,
    CloseButton,
    Image,
}

/// Shows at most one image over the scene.
#[derive(Clone, Debug, Default)]
pub struct ImageViewer {
    selected: Option<ImageRef>,
}

impl ImageViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, image: ImageRef) {
        log::info!("Viewing {}", image);
        self.selected = Some(image);
    }

    /// Close the viewer. Returns `false` if it was already closed.
    pub fn dismiss(&mut self) -> bool {
        let was_open = self.selected.take().is_some();
        if was_open {
            log::info!("Viewer closed");
        }
        was_open
    }

    /// Any click on the open viewer dismisses it.
    pub fn click(&mut self, _hit: ViewerHit) -> bool {
        self.dismiss()
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn selected(&self) -> Option<&ImageRef> {
        self.selected.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_hit_dismisses() {
        for hit in [ViewerHit::Backdrop, ViewerHit::CloseButton, ViewerHit::Image] {
            let mut viewer = ImageViewer::new();
            viewer.open(ImageRef::parse("a.png"));
            assert!(viewer.is_open());
            assert!(viewer.click(hit));
            assert!(!viewer.is_open());
            assert!(viewer.selected().is_none());
        }
    }

    #[test]
    fn test_dismiss_closed_is_noop() {
        let mut viewer = ImageViewer::new();
        assert!(!viewer.dismiss());
    }
}
