//! Geocrop Core - Interactive raster crop editing library
//!
//! This crate provides the core functionality for Geocrop: the
//! coordinate-mapping engine between image, display and geospatial
//! space, and the interaction state machine for selecting, moving and
//! resizing a crop rectangle over a zoomable, pannable raster view.
//!
//! Raster file I/O is an external collaborator behind the
//! [`raster::RasterSource`] trait; the hosting UI forwards input events
//! to [`editor::CropEditor`] and blits the buffers the renderer hands
//! back.

pub mod editor;
pub mod geo;
pub mod raster;
pub mod region;
pub mod render;
pub mod viewport;

pub use editor::{
    CropEditor, CursorShape, CursorStatus, EditorError, FieldValues, InteractionState, Outcome,
    UnitMode,
};
pub use geo::{GeoBounds, GeoTransform, TransformError};
pub use raster::{
    CropOutput, DisplayBuffer, MemoryRaster, RasterError, RasterInfo, RasterSource, ResampleFilter,
};
pub use region::{CropRegion, Handle};
pub use render::{visible_placement, Placement, RenderedView};
pub use viewport::Viewport;

/// An axis-aligned read/crop window in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelWindow {
    /// Column of the window's left edge.
    pub x: u32,
    /// Row of the window's top edge.
    pub y: u32,
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
}

impl PixelWindow {
    /// Create a new window.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the window covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Interaction and styling constants for one editor instance.
///
/// Injected at construction so multiple editors can coexist with
/// independent settings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditorConfig {
    /// Zoom factor applied per wheel notch or toolbar click.
    pub zoom_step: f64,
    /// Lower bound for the viewport scale.
    pub min_zoom: f64,
    /// Upper bound for the viewport scale.
    pub max_zoom: f64,
    /// Fraction of the canvas used by fit-to-canvas (leaves a border).
    pub fit_margin: f64,
    /// Half-extent of a drawn corner handle, in display pixels.
    pub handle_size: f64,
    /// Extra grab distance around a handle, in display pixels.
    pub handle_slack: f64,
    /// Smallest crop dimension a resize may produce, in image pixels.
    pub min_crop_size: u32,
    /// Arrow-key nudge step in image pixels.
    pub nudge_step: i64,
    /// Shift-modified nudge step in image pixels.
    pub nudge_step_large: i64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom_step: 1.2,
            min_zoom: 0.1,
            max_zoom: 50.0,
            fit_margin: 0.95,
            handle_size: 8.0,
            handle_slack: 4.0,
            min_crop_size: 10,
            nudge_step: 1,
            nudge_step_large: 10,
        }
    }
}

impl EditorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_window_emptiness() {
        assert!(PixelWindow::new(10, 10, 0, 5).is_empty());
        assert!(PixelWindow::new(10, 10, 5, 0).is_empty());
        assert!(!PixelWindow::new(10, 10, 1, 1).is_empty());
    }

    #[test]
    fn test_pixel_window_area() {
        assert_eq!(PixelWindow::new(0, 0, 200, 150).area(), 30_000);
        assert_eq!(PixelWindow::new(5, 5, 0, 10).area(), 0);
    }

    #[test]
    fn test_config_defaults() {
        let config = EditorConfig::new();
        assert_eq!(config.zoom_step, 1.2);
        assert_eq!(config.min_zoom, 0.1);
        assert_eq!(config.max_zoom, 50.0);
        assert_eq!(config.min_crop_size, 10);
    }
}
