//! WASM-compatible wrapper types for pixel data.
//!
//! This module provides JavaScript-friendly types that wrap the core
//! Geocrop buffers, handling the conversion between Rust and JavaScript
//! data representations.

use geocrop_core::{CropOutput, GeoTransform, RenderedView};
use wasm_bindgen::prelude::*;

/// A resampled view ready to blit onto the host canvas.
///
/// # Memory Management
///
/// The pixel data lives in WASM memory. `pixels()` returns a
/// `Uint8Array` copy into JavaScript memory; wasm-bindgen's finalizer
/// releases the WASM side automatically.
#[wasm_bindgen]
pub struct JsRenderedView {
    display_x: f64,
    display_y: f64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRenderedView {
    /// Display-space X where the buffer's top-left corner goes.
    #[wasm_bindgen(getter)]
    pub fn display_x(&self) -> f64 {
        self.display_x
    }

    /// Display-space Y where the buffer's top-left corner goes.
    #[wasm_bindgen(getter)]
    pub fn display_y(&self) -> f64 {
        self.display_y
    }

    /// Buffer width in display pixels.
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in display pixels.
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB pixel data (3 bytes per pixel, row-major order).
    pub fn pixels(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.pixels.as_slice())
    }
}

impl JsRenderedView {
    pub(crate) fn from_view(view: RenderedView) -> Self {
        Self {
            display_x: view.placement.display_x,
            display_y: view.placement.display_y,
            width: view.buffer.width,
            height: view.buffer.height,
            pixels: view.buffer.pixels,
        }
    }
}

/// A committed crop: the extracted pixels plus the recomputed
/// georeference.
#[wasm_bindgen]
pub struct JsCropResult {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    geotransform: Option<GeoTransform>,
    projection: Option<String>,
}

#[wasm_bindgen]
impl JsCropResult {
    /// Crop width in pixels.
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Crop height in pixels.
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB pixel data of the crop (3 bytes per pixel, row-major order).
    pub fn pixels(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.pixels.as_slice())
    }

    /// The crop's geotransform as a 6-element array, or `null` for a
    /// raster with no georeference.
    pub fn geotransform(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.geotransform.map(|gt| gt.to_gdal()))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Projection description carried over from the source.
    #[wasm_bindgen(getter)]
    pub fn projection(&self) -> Option<String> {
        self.projection.clone()
    }
}

impl JsCropResult {
    pub(crate) fn from_output(output: CropOutput) -> Self {
        Self {
            width: output.buffer.width,
            height: output.buffer.height,
            pixels: output.buffer.pixels,
            geotransform: output.geotransform,
            projection: output.projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocrop_core::{DisplayBuffer, Placement, PixelWindow};

    #[test]
    fn test_rendered_view_from_core() {
        let view = RenderedView {
            placement: Placement {
                window: PixelWindow::new(10, 20, 30, 40),
                target_width: 60,
                target_height: 80,
                display_x: 12.5,
                display_y: -3.0,
            },
            buffer: DisplayBuffer::new(60, 80, vec![0u8; 60 * 80 * 3]),
        };
        let js_view = JsRenderedView::from_view(view);

        assert_eq!(js_view.width(), 60);
        assert_eq!(js_view.height(), 80);
        assert_eq!(js_view.display_x(), 12.5);
        assert_eq!(js_view.display_y(), -3.0);
    }

    #[test]
    fn test_crop_result_from_core() {
        let output = CropOutput {
            buffer: DisplayBuffer::new(4, 2, vec![7u8; 4 * 2 * 3]),
            geotransform: Some(GeoTransform::from_gdal([
                116.1, 0.001, 0.0, 39.95, 0.0, -0.001,
            ])),
            projection: Some("EPSG:4326".to_string()),
        };
        let result = JsCropResult::from_output(output);

        assert_eq!(result.width(), 4);
        assert_eq!(result.height(), 2);
        assert_eq!(result.projection(), Some("EPSG:4326".to_string()));
    }
}
