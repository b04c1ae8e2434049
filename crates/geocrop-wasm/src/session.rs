//! The editor session binding: one raster, one viewport, one crop
//! rectangle, driven by host events.

use geocrop_core::{
    CropEditor, EditorConfig, GeoTransform, MemoryRaster, Outcome, RasterSource, UnitMode,
};
use wasm_bindgen::prelude::*;

use crate::types::{JsCropResult, JsRenderedView};

/// Outcome of an event as seen from JavaScript.
///
/// Values:
/// - 0 = nothing changed
/// - 1 = re-render the canvas
/// - 2 = re-render and refresh the numeric fields
fn outcome_to_u8(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Unchanged => 0,
        Outcome::Redraw => 1,
        Outcome::Committed => 2,
    }
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// An interactive crop editing session over an in-memory RGB raster.
#[wasm_bindgen]
pub struct JsCropEditor {
    source: MemoryRaster,
    editor: CropEditor,
}

#[wasm_bindgen]
impl JsCropEditor {
    /// Create a session from decoded RGB pixels.
    ///
    /// # Arguments
    /// * `width`/`height` - Raster dimensions in pixels
    /// * `pixels` - RGB data, 3 bytes per pixel, row-major order
    /// * `geotransform` - A 6-element `[x0, pw, xr, y0, yr, ph]` array,
    ///   or `null`/`undefined` for a plain image
    /// * `canvas_w`/`canvas_h` - Canvas size; the view starts fitted
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        geotransform: JsValue,
        canvas_w: f64,
        canvas_h: f64,
    ) -> Result<JsCropEditor, JsValue> {
        let geotransform: Option<[f64; 6]> =
            serde_wasm_bindgen::from_value(geotransform).map_err(js_err)?;
        let source = MemoryRaster::new(
            width,
            height,
            pixels,
            geotransform.map(GeoTransform::from_gdal),
            None,
        )
        .map_err(js_err)?;
        let editor = CropEditor::new(
            source.info().clone(),
            EditorConfig::default(),
            canvas_w,
            canvas_h,
        );

        Ok(JsCropEditor { source, editor })
    }

    // --- primary-button drags ------------------------------------------

    /// Primary button pressed at a canvas position.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> u8 {
        outcome_to_u8(self.editor.pointer_down(x, y))
    }

    /// Primary-button pointer moved while pressed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> u8 {
        outcome_to_u8(self.editor.pointer_move(x, y))
    }

    /// Primary button released.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> u8 {
        outcome_to_u8(self.editor.pointer_up(x, y))
    }

    // --- panning and zooming -------------------------------------------

    /// Secondary button pressed: start panning.
    pub fn secondary_down(&mut self, x: f64, y: f64) -> u8 {
        outcome_to_u8(self.editor.secondary_down(x, y))
    }

    /// Secondary-button pointer moved while pressed.
    pub fn secondary_move(&mut self, x: f64, y: f64) -> u8 {
        outcome_to_u8(self.editor.secondary_move(x, y))
    }

    /// Secondary button released.
    pub fn secondary_up(&mut self) -> u8 {
        outcome_to_u8(self.editor.secondary_up())
    }

    /// Wheel scrolled at a canvas position; positive delta zooms in.
    pub fn wheel(&mut self, x: f64, y: f64, delta: f64) -> u8 {
        outcome_to_u8(self.editor.wheel(x, y, delta))
    }

    /// Toolbar zoom in, anchored at the canvas center.
    pub fn zoom_in(&mut self) -> u8 {
        outcome_to_u8(self.editor.zoom_in())
    }

    /// Toolbar zoom out, anchored at the canvas center.
    pub fn zoom_out(&mut self) -> u8 {
        outcome_to_u8(self.editor.zoom_out())
    }

    /// Refit the image into the canvas.
    pub fn fit_to_canvas(&mut self) -> u8 {
        outcome_to_u8(self.editor.fit_to_canvas())
    }

    /// Show the image at native resolution.
    pub fn actual_size(&mut self) -> u8 {
        outcome_to_u8(self.editor.actual_size())
    }

    /// The canvas was laid out or resized.
    pub fn set_canvas_size(&mut self, canvas_w: f64, canvas_h: f64) -> u8 {
        outcome_to_u8(self.editor.set_canvas_size(canvas_w, canvas_h))
    }

    /// Current zoom percentage for the UI readout.
    pub fn zoom_percent(&self) -> f64 {
        self.editor.zoom_percent()
    }

    // --- keyboard ------------------------------------------------------

    /// Arrow-key nudge; `dx`/`dy` in {-1, 0, 1}, `large` for the
    /// shift-modified step.
    pub fn nudge(&mut self, dx: i32, dy: i32, large: bool) -> u8 {
        outcome_to_u8(self.editor.nudge(i64::from(dx), i64::from(dy), large))
    }

    /// Clear the selection and the numeric fields.
    pub fn reset(&mut self) -> u8 {
        outcome_to_u8(self.editor.reset())
    }

    // --- numeric side panel --------------------------------------------

    /// Whether geospatial mode can be offered for this raster.
    pub fn geo_mode_available(&self) -> bool {
        self.editor.geo_mode_available()
    }

    /// True when the panel is in geospatial units.
    pub fn is_geo_mode(&self) -> bool {
        self.editor.unit_mode() == UnitMode::Geo
    }

    /// Switch the panel between pixel and geospatial units, converting
    /// the displayed values.
    pub fn set_geo_mode(&mut self, geo: bool) -> Result<u8, JsValue> {
        let mode = if geo { UnitMode::Geo } else { UnitMode::Pixel };
        self.editor
            .set_unit_mode(mode)
            .map(outcome_to_u8)
            .map_err(js_err)
    }

    /// Replace the selection from the panel's text fields.
    pub fn commit_entries(
        &mut self,
        x: &str,
        y: &str,
        width: &str,
        height: &str,
    ) -> Result<u8, JsValue> {
        self.editor
            .commit_entries(x, y, width, height)
            .map(outcome_to_u8)
            .map_err(js_err)
    }

    /// Field display strings `[x, y, width, height]`, or `null` when
    /// the panel is empty.
    pub fn field_texts(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.editor.field_texts()).map_err(js_err)
    }

    /// The selection in pixel coordinates as `{x, y, width, height}`,
    /// or `null`.
    pub fn region(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.editor.region()).map_err(js_err)
    }

    /// The selection's geospatial bounds, or `null`.
    pub fn region_geo_bounds(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.editor.region_geo_bounds()).map_err(js_err)
    }

    // --- readouts and actions ------------------------------------------

    /// Hover readout for a canvas position: pixel, geospatial
    /// coordinate, band sample and cursor shape.
    pub fn cursor_status(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.editor.cursor_status(x, y, &self.source))
            .map_err(js_err)
    }

    /// Resample the visible window; `null` when the image is fully
    /// off-canvas and the display should be cleared.
    pub fn render(&self) -> Result<Option<JsRenderedView>, JsValue> {
        Ok(self
            .editor
            .render(&self.source)
            .map_err(js_err)?
            .map(JsRenderedView::from_view))
    }

    /// Crop the raster to the current selection; `null` without one.
    pub fn commit_crop(&self) -> Result<Option<JsCropResult>, JsValue> {
        let Some(output) = self.editor.commit_crop(&self.source).map_err(js_err)? else {
            return Ok(None);
        };
        web_sys::console::info_1(
            &format!(
                "geocrop: committed {}x{} crop",
                output.buffer.width, output.buffer.height
            )
            .into(),
        );
        Ok(Some(JsCropResult::from_output(output)))
    }
}
