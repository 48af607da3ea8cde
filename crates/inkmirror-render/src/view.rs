//! Raster display state for the mirror surface.

use crate::raster::{RasterImage, decode_png, export_png};
use crate::svg::SvgExporter;
use inkmirror_core::StrokeStore;

/// Shown before anything has been drawn.
pub const WAITING_PLACEHOLDER: &str = "Waiting for drawing...";
/// Shown when the last image could not be decoded.
pub const UNAVAILABLE_PLACEHOLDER: &str = "Image unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Waiting,
    Showing,
    Unavailable,
}

/// Holds the image currently displayed by a viewer.
#[derive(Debug, Clone, Default)]
pub struct RasterView {
    image: Option<RasterImage>,
    state: ViewState,
}

impl RasterView {
    /// Empty view showing the waiting placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current display state.
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Image being shown, if any.
    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    /// Text to show instead of an image, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self.state {
            ViewState::Waiting => Some(WAITING_PLACEHOLDER),
            ViewState::Showing => None,
            ViewState::Unavailable => Some(UNAVAILABLE_PLACEHOLDER),
        }
    }

    /// Display an already decoded image.
    pub fn show(&mut self, image: RasterImage) {
        self.image = Some(image);
        self.state = ViewState::Showing;
    }

    /// Decode and display PNG bytes. A decode failure clears the view.
    pub fn show_png(&mut self, bytes: &[u8]) -> bool {
        match decode_png(bytes) {
            Ok(image) => {
                self.show(image);
                true
            }
            Err(e) => {
                log::warn!("Failed to display image: {}", e);
                self.image = None;
                self.state = ViewState::Unavailable;
                false
            }
        }
    }

    /// Back to the waiting placeholder.
    pub fn clear(&mut self) {
        self.image = None;
        self.state = ViewState::Waiting;
    }

    /// Redraw from a mirrored store. An empty store shows the waiting
    /// placeholder.
    pub fn refresh(&mut self, exporter: &SvgExporter, store: &StrokeStore, scale: f64) -> bool {
        if store.is_empty() {
            self.clear();
            return true;
        }
        match export_png(exporter, store.strokes(), store.bounds(), scale) {
            Ok(png) => self.show_png(&png),
            Err(e) => {
                log::warn!("Failed to render mirrored drawing: {}", e);
                self.image = None;
                self.state = ViewState::Unavailable;
                false
            }
        }
    }
}
