//! The interaction controller: pointer, wheel and keyboard events
//! driving the viewport and the crop rectangle.
//!
//! # Event model
//!
//! The host forwards raw input events and receives an [`Outcome`]
//! telling it what to do next: nothing, re-render, or re-render and
//! re-sync the numeric side panel. All drag deltas are measured in
//! display pixels and divided by the current scale exactly once, so
//! moving or resizing the rectangle behaves identically at every zoom
//! level.
//!
//! # State machine
//!
//! The primary pointer button runs Idle -> Drawing | Moving | Resizing
//! and back to Idle on release. A pointer-down on a handle resizes, a
//! pointer-down inside the rectangle moves it, and a pointer-down
//! anywhere else discards the old selection and starts drawing a new
//! one. The secondary button pans independently of all of that, and
//! wheel zooming works in any state without disturbing it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{trunc_toward_zero, GeoBounds, TransformError};
use crate::raster::{CropOutput, RasterError, RasterInfo, RasterSource};
use crate::region::{CropRegion, Handle};
use crate::render::{self, RenderedView};
use crate::viewport::Viewport;
use crate::EditorConfig;

/// Error types for editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A coordinate field could not be parsed as a number. The previous
    /// field contents and the crop rectangle are left untouched.
    #[error("coordinate fields contain a non-numeric value")]
    InvalidNumericEntry,

    /// Geospatial mode was requested for a raster with no georeference.
    #[error("the raster has no georeference; geospatial mode is unavailable")]
    NoGeoreference,

    /// Coordinate conversion failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The raster collaborator rejected a request.
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// What the host should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing visible changed.
    Unchanged,
    /// The viewport or live geometry changed; re-render the canvas.
    Redraw,
    /// The crop rectangle reached a resting state; re-render and
    /// refresh the numeric fields.
    Committed,
}

/// Unit system for the numeric side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitMode {
    /// Integer image pixels.
    #[default]
    Pixel,
    /// Geospatial units with six decimal digits.
    Geo,
}

/// The numeric panel's x / y / width / height values in the active
/// unit system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FieldValues {
    /// Render the values the way the panel displays them: whole numbers
    /// in pixel mode, six decimals in geospatial mode.
    pub fn formatted(&self, mode: UnitMode) -> [String; 4] {
        let fmt = |v: f64| match mode {
            UnitMode::Pixel => format!("{v:.0}"),
            UnitMode::Geo => format!("{v:.6}"),
        };
        [fmt(self.x), fmt(self.y), fmt(self.width), fmt(self.height)]
    }
}

/// Pointer shape hint for the hosting UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorShape {
    /// Over the image, free to draw a new selection.
    Crosshair,
    /// Inside the crop rectangle.
    Move,
    /// Over the north-west or south-east handle.
    ResizeNwSe,
    /// Over the north-east or south-west handle.
    ResizeNeSw,
    /// Outside the image.
    OutOfImage,
}

/// Everything the hover readout needs for one cursor position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorStatus {
    /// Image pixel under the cursor, `None` outside the image.
    pub pixel: Option<(i64, i64)>,
    /// Geospatial coordinate of that pixel, when georeferenced.
    pub geo: Option<(f64, f64)>,
    /// Band values at that pixel.
    pub sample: Option<Vec<u8>>,
    /// Suggested pointer shape.
    pub shape: CursorShape,
}

/// Primary-button interaction state, for the host's benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionState {
    Idle,
    Drawing,
    Moving,
    Resizing,
}

/// Transient per-drag state. Exists only between pointer-down and
/// pointer-up; a new drag replaces it wholesale.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    Idle,
    /// Rubber-band selection. The anchor is kept in image space so the
    /// rectangle stays put if the view zooms mid-drag.
    Drawing { anchor: (f64, f64) },
    /// Translating the rectangle from a snapshot of its bounds.
    Moving {
        start: (f64, f64),
        origin: CropRegion,
    },
    /// Dragging one handle from a snapshot of the bounds.
    Resizing {
        handle: Handle,
        start: (f64, f64),
        origin: CropRegion,
    },
}

/// The interactive crop editing session for one raster.
///
/// Owns all mutable session state (viewport, selection, drag) and is
/// built for a single-threaded event loop: each event runs to
/// completion before the next one is processed. A host that dispatches
/// events from multiple threads must serialize them before they reach
/// the editor.
#[derive(Debug, Clone)]
pub struct CropEditor {
    config: EditorConfig,
    info: RasterInfo,
    viewport: Viewport,
    region: Option<CropRegion>,
    drag: DragMode,
    panning: Option<(f64, f64)>,
    unit_mode: UnitMode,
    fields: Option<FieldValues>,
    canvas_w: f64,
    canvas_h: f64,
}

impl CropEditor {
    /// Start a session for a raster, fitted to the canvas.
    pub fn new(info: RasterInfo, config: EditorConfig, canvas_w: f64, canvas_h: f64) -> Self {
        let mut viewport = Viewport::new();
        viewport.fit_to_canvas(canvas_w, canvas_h, info.width, info.height, config.fit_margin);

        Self {
            config,
            info,
            viewport,
            region: None,
            drag: DragMode::Idle,
            panning: None,
            unit_mode: UnitMode::Pixel,
            fields: None,
            canvas_w,
            canvas_h,
        }
    }

    // ------------------------------------------------------------------
    // Primary-button drags
    // ------------------------------------------------------------------

    /// Primary button pressed at a display-space position.
    pub fn pointer_down(&mut self, display_x: f64, display_y: f64) -> Outcome {
        if let Some(region) = self.region {
            if let Some(handle) =
                region.handle_at(display_x, display_y, &self.viewport, &self.config)
            {
                tracing::debug!(?handle, ?region, "begin resize drag");
                self.drag = DragMode::Resizing {
                    handle,
                    start: (display_x, display_y),
                    origin: region,
                };
                return Outcome::Unchanged;
            }

            if region.contains(display_x, display_y, &self.viewport) {
                tracing::debug!(?region, "begin move drag");
                self.drag = DragMode::Moving {
                    start: (display_x, display_y),
                    origin: region,
                };
                return Outcome::Unchanged;
            }
        }

        // A fresh drag always replaces the old selection immediately.
        let anchor = self.viewport.display_to_image(display_x, display_y);
        self.drag = DragMode::Drawing { anchor };
        if self.region.take().is_some() {
            Outcome::Redraw
        } else {
            Outcome::Unchanged
        }
    }

    /// Primary-button pointer moved while pressed.
    pub fn pointer_move(&mut self, display_x: f64, display_y: f64) -> Outcome {
        match self.drag {
            DragMode::Idle => Outcome::Unchanged,
            DragMode::Drawing { anchor } => {
                let (ix, iy) = self.viewport.display_to_image(display_x, display_y);
                self.region = CropRegion::from_drag(
                    anchor.0,
                    anchor.1,
                    ix,
                    iy,
                    self.info.width,
                    self.info.height,
                );
                Outcome::Redraw
            }
            DragMode::Moving { start, origin } => {
                let dx = (display_x - start.0) / self.viewport.scale;
                let dy = (display_y - start.1) / self.viewport.scale;
                self.region = Some(origin.moved(dx, dy, self.info.width, self.info.height));
                Outcome::Redraw
            }
            DragMode::Resizing {
                handle,
                start,
                origin,
            } => {
                let dx = (display_x - start.0) / self.viewport.scale;
                let dy = (display_y - start.1) / self.viewport.scale;
                self.region = Some(origin.resized(
                    handle,
                    dx,
                    dy,
                    self.config.min_crop_size,
                    self.info.width,
                    self.info.height,
                ));
                Outcome::Redraw
            }
        }
    }

    /// Primary button released; commits the drag.
    pub fn pointer_up(&mut self, display_x: f64, display_y: f64) -> Outcome {
        match std::mem::replace(&mut self.drag, DragMode::Idle) {
            DragMode::Idle => Outcome::Unchanged,
            DragMode::Drawing { anchor } => {
                let (ix, iy) = self.viewport.display_to_image(display_x, display_y);
                self.region = CropRegion::from_drag(
                    anchor.0,
                    anchor.1,
                    ix,
                    iy,
                    self.info.width,
                    self.info.height,
                );
                tracing::debug!(region = ?self.region, "selection drag finished");
                self.sync_fields();
                Outcome::Committed
            }
            DragMode::Moving { .. } | DragMode::Resizing { .. } => {
                self.sync_fields();
                Outcome::Committed
            }
        }
    }

    // ------------------------------------------------------------------
    // Panning and zooming
    // ------------------------------------------------------------------

    /// Secondary button pressed: start panning. Independent of any
    /// primary-button drag in flight.
    pub fn secondary_down(&mut self, display_x: f64, display_y: f64) -> Outcome {
        self.panning = Some((display_x, display_y));
        Outcome::Unchanged
    }

    /// Secondary-button pointer moved while pressed.
    pub fn secondary_move(&mut self, display_x: f64, display_y: f64) -> Outcome {
        let Some((last_x, last_y)) = self.panning else {
            return Outcome::Unchanged;
        };
        self.viewport.pan(display_x - last_x, display_y - last_y);
        self.panning = Some((display_x, display_y));
        Outcome::Redraw
    }

    /// Secondary button released: stop panning.
    pub fn secondary_up(&mut self) -> Outcome {
        self.panning = None;
        Outcome::Unchanged
    }

    /// Wheel scrolled at a display-space anchor. Positive `delta` zooms
    /// in. Works in every interaction state without changing it.
    pub fn wheel(&mut self, anchor_x: f64, anchor_y: f64, delta: f64) -> Outcome {
        let factor = if delta > 0.0 {
            self.config.zoom_step
        } else {
            1.0 / self.config.zoom_step
        };
        self.viewport.zoom_at(
            anchor_x,
            anchor_y,
            factor,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        Outcome::Redraw
    }

    /// Toolbar zoom in, anchored at the canvas center.
    pub fn zoom_in(&mut self) -> Outcome {
        self.zoom_centered(self.config.zoom_step)
    }

    /// Toolbar zoom out, anchored at the canvas center.
    pub fn zoom_out(&mut self) -> Outcome {
        self.zoom_centered(1.0 / self.config.zoom_step)
    }

    fn zoom_centered(&mut self, factor: f64) -> Outcome {
        self.viewport.zoom_at(
            self.canvas_w / 2.0,
            self.canvas_h / 2.0,
            factor,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        Outcome::Redraw
    }

    /// Refit the whole image into the canvas.
    pub fn fit_to_canvas(&mut self) -> Outcome {
        self.viewport.fit_to_canvas(
            self.canvas_w,
            self.canvas_h,
            self.info.width,
            self.info.height,
            self.config.fit_margin,
        );
        Outcome::Redraw
    }

    /// Show the image at native resolution, centered.
    pub fn actual_size(&mut self) -> Outcome {
        self.viewport
            .actual_size(self.canvas_w, self.canvas_h, self.info.width, self.info.height);
        Outcome::Redraw
    }

    /// The canvas was laid out or resized.
    pub fn set_canvas_size(&mut self, canvas_w: f64, canvas_h: f64) -> Outcome {
        self.canvas_w = canvas_w;
        self.canvas_h = canvas_h;
        Outcome::Redraw
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    /// Arrow-key nudge. `dx`/`dy` are directions in {-1, 0, 1}; `large`
    /// selects the shift-modified step.
    pub fn nudge(&mut self, dx: i64, dy: i64, large: bool) -> Outcome {
        let Some(region) = self.region else {
            return Outcome::Unchanged;
        };
        let step = if large {
            self.config.nudge_step_large
        } else {
            self.config.nudge_step
        };
        self.region = Some(region.nudged(dx * step, dy * step, self.info.width, self.info.height));
        self.sync_fields();
        Outcome::Committed
    }

    /// Clear the selection and the numeric fields.
    pub fn reset(&mut self) -> Outcome {
        self.region = None;
        self.fields = None;
        self.drag = DragMode::Idle;
        Outcome::Committed
    }

    // ------------------------------------------------------------------
    // Numeric side panel
    // ------------------------------------------------------------------

    /// Whether the geospatial unit mode can be offered at all.
    pub fn geo_mode_available(&self) -> bool {
        self.info
            .geotransform
            .as_ref()
            .is_some_and(|gt| gt.is_invertible())
    }

    /// Switch the panel's unit system, converting the currently
    /// displayed numbers.
    ///
    /// With a selection present the fields are re-derived from the
    /// pixel rectangle (the single source of truth). Without one, the
    /// displayed numbers themselves are converted, which lets typed
    /// values be pre-converted before any drag has happened.
    ///
    /// # Errors
    ///
    /// Refuses to enter geospatial mode when the raster has no
    /// invertible georeference. Nothing is modified on error.
    pub fn set_unit_mode(&mut self, mode: UnitMode) -> Result<Outcome, EditorError> {
        if mode == self.unit_mode {
            return Ok(Outcome::Unchanged);
        }
        if mode == UnitMode::Geo {
            let transform = self.info.geotransform.ok_or(EditorError::NoGeoreference)?;
            if !transform.is_invertible() {
                return Err(TransformError::SingularTransform.into());
            }
        }

        let converted = match (self.region, self.fields) {
            // Canonical pixel rect present: re-derive below.
            (Some(_), _) | (None, None) => None,
            (None, Some(values)) => Some(self.convert_fields(values, self.unit_mode)?),
        };

        self.unit_mode = mode;
        match converted {
            Some(values) => self.fields = Some(values),
            None => self.sync_fields(),
        }
        Ok(Outcome::Committed)
    }

    /// Replace the selection from the numeric fields, regardless of the
    /// current interaction state.
    ///
    /// Values are interpreted in the active unit mode. Entries that
    /// clamp to nothing clear the selection but keep the typed numbers
    /// in the fields.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidNumericEntry`] when a value does not
    /// parse; the selection and fields are left untouched.
    pub fn commit_entries(
        &mut self,
        x: &str,
        y: &str,
        width: &str,
        height: &str,
    ) -> Result<Outcome, EditorError> {
        let parse = |text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|_| EditorError::InvalidNumericEntry)
        };
        let x = parse(x)?;
        let y = parse(y)?;
        let width = parse(width)?;
        let height = parse(height)?;

        let region = match self.unit_mode {
            UnitMode::Pixel => {
                CropRegion::from_drag(x, y, x + width, y + height, self.info.width, self.info.height)
            }
            UnitMode::Geo => {
                let transform = self.info.geotransform.ok_or(EditorError::NoGeoreference)?;
                CropRegion::from_geo_bounds(
                    GeoBounds::from_corners(x, y, x + width, y + height),
                    &transform,
                    self.info.width,
                    self.info.height,
                )?
            }
        };

        tracing::debug!(?region, mode = ?self.unit_mode, "numeric entry committed");
        self.drag = DragMode::Idle;
        self.region = region;
        match region {
            Some(_) => self.sync_fields(),
            None => {
                self.fields = Some(FieldValues {
                    x,
                    y,
                    width,
                    height,
                })
            }
        }
        Ok(Outcome::Committed)
    }

    /// Current field values in the active unit mode.
    pub fn field_values(&self) -> Option<FieldValues> {
        self.fields
    }

    /// Current field values formatted for display.
    pub fn field_texts(&self) -> Option<[String; 4]> {
        self.fields.map(|values| values.formatted(self.unit_mode))
    }

    fn sync_fields(&mut self) {
        let fields = self.region.map(|region| self.fields_for(region));
        self.fields = fields;
    }

    fn fields_for(&self, region: CropRegion) -> FieldValues {
        match (self.unit_mode, self.info.geotransform) {
            (UnitMode::Geo, Some(transform)) => {
                let bounds = region.geo_bounds(&transform);
                FieldValues {
                    x: bounds.min_x,
                    y: bounds.min_y,
                    width: bounds.width(),
                    height: bounds.height(),
                }
            }
            _ => FieldValues {
                x: f64::from(region.x),
                y: f64::from(region.y),
                width: f64::from(region.width),
                height: f64::from(region.height),
            },
        }
    }

    fn convert_fields(
        &self,
        values: FieldValues,
        from: UnitMode,
    ) -> Result<FieldValues, EditorError> {
        let transform = self.info.geotransform.ok_or(EditorError::NoGeoreference)?;
        let (x1, y1, x2, y2) = match from {
            UnitMode::Pixel => {
                let (gx1, gy1) = transform.pixel_to_geo(values.x, values.y);
                let (gx2, gy2) =
                    transform.pixel_to_geo(values.x + values.width, values.y + values.height);
                (gx1, gy1, gx2, gy2)
            }
            UnitMode::Geo => {
                // Continuous conversion; truncation only happens when a
                // rectangle is actually committed.
                let (px1, py1) = transform.geo_to_pixel(values.x, values.y)?;
                let (px2, py2) =
                    transform.geo_to_pixel(values.x + values.width, values.y + values.height)?;
                (px1, py1, px2, py2)
            }
        };

        Ok(FieldValues {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        })
    }

    // ------------------------------------------------------------------
    // Readouts and actions
    // ------------------------------------------------------------------

    /// Hover readout for a display-space cursor position.
    pub fn cursor_status(
        &self,
        display_x: f64,
        display_y: f64,
        source: &dyn RasterSource,
    ) -> CursorStatus {
        let (ix, iy) = self.viewport.display_to_image(display_x, display_y);
        let inside =
            ix >= 0.0 && iy >= 0.0 && ix < f64::from(self.info.width) && iy < f64::from(self.info.height);
        if !inside {
            return CursorStatus {
                pixel: None,
                geo: None,
                sample: None,
                shape: CursorShape::OutOfImage,
            };
        }

        let px = trunc_toward_zero(ix);
        let py = trunc_toward_zero(iy);
        let shape = match self.region {
            Some(region) => {
                match region.handle_at(display_x, display_y, &self.viewport, &self.config) {
                    Some(Handle::NorthWest) | Some(Handle::SouthEast) => CursorShape::ResizeNwSe,
                    Some(_) => CursorShape::ResizeNeSw,
                    None if region.contains(display_x, display_y, &self.viewport) => {
                        CursorShape::Move
                    }
                    None => CursorShape::Crosshair,
                }
            }
            None => CursorShape::Crosshair,
        };

        CursorStatus {
            pixel: Some((px, py)),
            geo: self
                .info
                .geotransform
                .map(|gt| gt.pixel_to_geo(px as f64, py as f64)),
            sample: source.sample(px as u32, py as u32),
            shape,
        }
    }

    /// Resample the visible window through the raster source.
    ///
    /// `Ok(None)` means the image is entirely off-canvas.
    ///
    /// # Errors
    ///
    /// Propagates raster-source failures.
    pub fn render(&self, source: &dyn RasterSource) -> Result<Option<RenderedView>, EditorError> {
        Ok(render::render(
            source,
            &self.viewport,
            self.canvas_w,
            self.canvas_h,
        )?)
    }

    /// Crop the source to the current selection.
    ///
    /// `Ok(None)` when there is no selection.
    ///
    /// # Errors
    ///
    /// Propagates raster-source failures.
    pub fn commit_crop(&self, source: &dyn RasterSource) -> Result<Option<CropOutput>, EditorError> {
        let Some(region) = self.region else {
            return Ok(None);
        };
        let window = region.window();
        tracing::info!(?window, "committing crop");
        Ok(Some(source.crop(window)?))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The current selection, if any.
    pub fn region(&self) -> Option<CropRegion> {
        self.region
    }

    /// The selection's geospatial bounds, when georeferenced.
    pub fn region_geo_bounds(&self) -> Option<GeoBounds> {
        let transform = self.info.geotransform?;
        Some(self.region?.geo_bounds(&transform))
    }

    /// The current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Raster metadata for the session.
    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    /// The injected configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Zoom percentage for the UI readout.
    pub fn zoom_percent(&self) -> f64 {
        self.viewport.zoom_percent()
    }

    /// Active unit mode of the numeric panel.
    pub fn unit_mode(&self) -> UnitMode {
        self.unit_mode
    }

    /// Primary-button interaction state.
    pub fn interaction_state(&self) -> InteractionState {
        match self.drag {
            DragMode::Idle => InteractionState::Idle,
            DragMode::Drawing { .. } => InteractionState::Drawing,
            DragMode::Moving { .. } => InteractionState::Moving,
            DragMode::Resizing { .. } => InteractionState::Resizing,
        }
    }

    /// Whether a secondary-button pan is in progress.
    pub fn is_panning(&self) -> bool {
        self.panning.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoTransform;
    use crate::raster::MemoryRaster;
    use approx::assert_relative_eq;

    const IMG_W: u32 = 1000;
    const IMG_H: u32 = 800;

    fn beijing() -> GeoTransform {
        GeoTransform::from_gdal([116.0, 0.001, 0.0, 40.0, 0.0, -0.001])
    }

    fn info(geotransform: Option<GeoTransform>) -> RasterInfo {
        RasterInfo {
            width: IMG_W,
            height: IMG_H,
            band_count: 3,
            geotransform,
            projection: None,
        }
    }

    /// An editor whose display coordinates equal image coordinates:
    /// canvas matches the image and the view is at 1:1 centered, which
    /// for equal sizes means zero offsets.
    fn editor() -> CropEditor {
        let mut ed = CropEditor::new(
            info(Some(beijing())),
            EditorConfig::default(),
            f64::from(IMG_W),
            f64::from(IMG_H),
        );
        ed.actual_size();
        ed
    }

    fn raster() -> MemoryRaster {
        let mut pixels = Vec::with_capacity((IMG_W * IMG_H * 3) as usize);
        for y in 0..IMG_H {
            for x in 0..IMG_W {
                let v = ((y * IMG_W + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        MemoryRaster::new(IMG_W, IMG_H, pixels, Some(beijing()), None).unwrap()
    }

    fn select(ed: &mut CropEditor, x1: f64, y1: f64, x2: f64, y2: f64) {
        ed.pointer_down(x1, y1);
        ed.pointer_move(x2, y2);
        ed.pointer_up(x2, y2);
    }

    #[test]
    fn test_new_session_is_fitted_and_idle() {
        let ed = CropEditor::new(info(None), EditorConfig::default(), 800.0, 600.0);
        assert_eq!(ed.interaction_state(), InteractionState::Idle);
        assert_eq!(ed.region(), None);
        assert_relative_eq!(ed.viewport().scale, (600.0 / 800.0) * 0.95, epsilon = 1e-12);
    }

    #[test]
    fn test_draw_lifecycle() {
        let mut ed = editor();

        assert_eq!(ed.pointer_down(100.0, 50.0), Outcome::Unchanged);
        assert_eq!(ed.interaction_state(), InteractionState::Drawing);

        assert_eq!(ed.pointer_move(300.0, 200.0), Outcome::Redraw);
        assert_eq!(
            ed.region(),
            Some(CropRegion {
                x: 100,
                y: 50,
                width: 200,
                height: 150
            })
        );

        assert_eq!(ed.pointer_up(300.0, 200.0), Outcome::Committed);
        assert_eq!(ed.interaction_state(), InteractionState::Idle);

        let fields = ed.field_values().unwrap();
        assert_eq!(
            (fields.x, fields.y, fields.width, fields.height),
            (100.0, 50.0, 200.0, 150.0)
        );
    }

    #[test]
    fn test_zero_drag_yields_no_selection() {
        let mut ed = editor();
        select(&mut ed, 50.0, 50.0, 50.0, 50.0);
        assert_eq!(ed.region(), None);
        assert_eq!(ed.field_values(), None);
    }

    #[test]
    fn test_new_drag_replaces_selection_immediately() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);
        assert!(ed.region().is_some());

        // Pointer-down away from the rectangle discards it right away.
        assert_eq!(ed.pointer_down(600.0, 500.0), Outcome::Redraw);
        assert_eq!(ed.region(), None);
        assert_eq!(ed.interaction_state(), InteractionState::Drawing);
    }

    #[test]
    fn test_pointer_down_on_handle_resizes() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        ed.pointer_down(300.0, 200.0);
        assert_eq!(ed.interaction_state(), InteractionState::Resizing);

        ed.pointer_move(340.0, 230.0);
        assert_eq!(
            ed.region(),
            Some(CropRegion {
                x: 100,
                y: 50,
                width: 240,
                height: 180
            })
        );
        ed.pointer_up(340.0, 230.0);
        assert_eq!(ed.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn test_pointer_down_inside_moves() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        ed.pointer_down(200.0, 125.0);
        assert_eq!(ed.interaction_state(), InteractionState::Moving);

        ed.pointer_move(250.0, 155.0);
        assert_eq!(
            ed.region(),
            Some(CropRegion {
                x: 150,
                y: 80,
                width: 200,
                height: 150
            })
        );
    }

    #[test]
    fn test_drag_deltas_are_scale_invariant() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        // Zoom in anchored at the display origin so offsets stay zero:
        // display coordinates are now scale times image coordinates.
        for _ in 0..4 {
            ed.wheel(0.0, 0.0, 1.0);
        }
        let scale = ed.viewport().scale;

        // Grab the south-east handle at its display position and drag
        // by 40 display pixels: the rectangle grows by 40 / scale.
        let (hx, hy) = ed
            .region()
            .unwrap()
            .handle_center(Handle::SouthEast, ed.viewport());
        ed.pointer_down(hx, hy);
        assert_eq!(ed.interaction_state(), InteractionState::Resizing);
        ed.pointer_move(hx + 40.0, hy);
        let grown = f64::from(ed.region().unwrap().width) - 200.0;
        assert!((grown - (40.0 / scale).trunc()).abs() <= 1.0, "grew {grown} at scale {scale}");
        ed.pointer_up(hx + 40.0, hy);
    }

    #[test]
    fn test_wheel_zoom_scenario() {
        let mut ed = editor();
        assert_eq!(ed.wheel(400.0, 300.0, 1.0), Outcome::Redraw);

        assert_relative_eq!(ed.viewport().scale, 1.2, epsilon = 1e-12);
        assert_relative_eq!(ed.viewport().offset_x, -80.0, epsilon = 1e-9);
        assert_relative_eq!(ed.viewport().offset_y, -60.0, epsilon = 1e-9);
        assert_relative_eq!(ed.zoom_percent(), 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_wheel_does_not_disturb_drag_state() {
        let mut ed = editor();
        ed.pointer_down(100.0, 50.0);
        ed.pointer_move(200.0, 100.0);
        assert_eq!(ed.wheel(150.0, 75.0, -1.0), Outcome::Redraw);
        assert_eq!(ed.interaction_state(), InteractionState::Drawing);
    }

    #[test]
    fn test_secondary_pan() {
        let mut ed = editor();
        let before = *ed.viewport();

        assert_eq!(ed.secondary_down(10.0, 10.0), Outcome::Unchanged);
        assert!(ed.is_panning());
        assert_eq!(ed.secondary_move(30.0, 25.0), Outcome::Redraw);
        assert_relative_eq!(ed.viewport().offset_x, before.offset_x + 20.0);
        assert_relative_eq!(ed.viewport().offset_y, before.offset_y + 15.0);

        assert_eq!(ed.secondary_up(), Outcome::Unchanged);
        assert!(!ed.is_panning());
        // Stray secondary moves after release are ignored.
        assert_eq!(ed.secondary_move(99.0, 99.0), Outcome::Unchanged);
    }

    #[test]
    fn test_pan_keeps_primary_drag_alive() {
        let mut ed = editor();
        ed.pointer_down(100.0, 50.0);
        ed.secondary_down(0.0, 0.0);
        ed.secondary_move(5.0, 5.0);
        ed.secondary_up();
        assert_eq!(ed.interaction_state(), InteractionState::Drawing);
    }

    #[test]
    fn test_nudge_steps_and_clamp() {
        let mut ed = editor();
        select(&mut ed, 0.0, 0.0, 100.0, 100.0);

        assert_eq!(ed.nudge(1, 0, false), Outcome::Committed);
        assert_eq!(ed.region().unwrap().x, 1);

        ed.nudge(0, 1, true);
        assert_eq!(ed.region().unwrap().y, 10);

        // Clamped against the top edge.
        ed.nudge(0, -1, true);
        ed.nudge(0, -1, true);
        assert_eq!(ed.region().unwrap().y, 0);

        // Fields follow every nudge.
        assert_eq!(ed.field_values().unwrap().x, 1.0);
    }

    #[test]
    fn test_nudge_without_selection() {
        let mut ed = editor();
        assert_eq!(ed.nudge(1, 0, false), Outcome::Unchanged);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        assert_eq!(ed.reset(), Outcome::Committed);
        assert_eq!(ed.region(), None);
        assert_eq!(ed.field_values(), None);
        assert_eq!(ed.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn test_unit_mode_round_trip_with_selection() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        ed.set_unit_mode(UnitMode::Geo).unwrap();
        let geo = ed.field_values().unwrap();
        assert_relative_eq!(geo.x, 116.1, epsilon = 1e-9);
        assert_relative_eq!(geo.y, 39.8, epsilon = 1e-9);
        assert_relative_eq!(geo.width, 0.2, epsilon = 1e-9);
        assert_relative_eq!(geo.height, 0.15, epsilon = 1e-9);

        // Pixel form is canonical, so the round trip is exact.
        ed.set_unit_mode(UnitMode::Pixel).unwrap();
        let pixel = ed.field_values().unwrap();
        assert_eq!(
            (pixel.x, pixel.y, pixel.width, pixel.height),
            (100.0, 50.0, 200.0, 150.0)
        );
    }

    #[test]
    fn test_unit_mode_converts_typed_values_without_selection() {
        let mut ed = editor();
        // Entries that clamp to nothing leave the typed numbers in
        // place and no selection behind.
        ed.commit_entries("2000", "2000", "100", "100").unwrap();
        assert_eq!(ed.region(), None);
        let typed = ed.field_values().unwrap();
        assert_eq!(typed.x, 2000.0);

        ed.set_unit_mode(UnitMode::Geo).unwrap();
        let geo = ed.field_values().unwrap();
        assert_relative_eq!(geo.x, 118.0, epsilon = 1e-9);
        assert_relative_eq!(geo.y, 37.9, epsilon = 1e-9);

        ed.set_unit_mode(UnitMode::Pixel).unwrap();
        let back = ed.field_values().unwrap();
        assert_relative_eq!(back.x, 2000.0, epsilon = 1e-6);
        assert_relative_eq!(back.y, 2000.0, epsilon = 1e-6);
        assert_relative_eq!(back.width, 100.0, epsilon = 1e-6);
        assert_relative_eq!(back.height, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_entry_leaves_state_untouched() {
        let mut ed = editor();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);
        let region = ed.region();
        let fields = ed.field_values();

        assert!(matches!(
            ed.commit_entries("12", "abc", "50", "50"),
            Err(EditorError::InvalidNumericEntry)
        ));
        assert_eq!(ed.region(), region);
        assert_eq!(ed.field_values(), fields);
    }

    #[test]
    fn test_pixel_entries_commit() {
        let mut ed = editor();
        ed.commit_entries("10", "20", "30", "40").unwrap();
        assert_eq!(
            ed.region(),
            Some(CropRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            })
        );
    }

    #[test]
    fn test_geo_entries_commit() {
        let mut ed = editor();
        ed.set_unit_mode(UnitMode::Geo).unwrap();
        ed.commit_entries("116.1", "39.7", "0.2", "0.2").unwrap();

        let region = ed.region().unwrap();
        assert!((i64::from(region.width) - 200).abs() <= 1);
        assert!((i64::from(region.height) - 200).abs() <= 1);
        assert!((i64::from(region.x) - 100).abs() <= 1);
        assert!((i64::from(region.y) - 100).abs() <= 1);
    }

    #[test]
    fn test_entries_commit_cancels_drag() {
        let mut ed = editor();
        ed.pointer_down(100.0, 50.0);
        ed.commit_entries("10", "20", "30", "40").unwrap();
        assert_eq!(ed.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn test_geo_mode_needs_georeference() {
        let mut ed = CropEditor::new(info(None), EditorConfig::default(), 800.0, 600.0);
        assert!(!ed.geo_mode_available());
        assert!(matches!(
            ed.set_unit_mode(UnitMode::Geo),
            Err(EditorError::NoGeoreference)
        ));
        assert_eq!(ed.unit_mode(), UnitMode::Pixel);
    }

    #[test]
    fn test_geo_mode_rejects_singular_transform() {
        // det = 1 * 4 - 2 * 2 = 0
        let singular = GeoTransform::from_gdal([0.0, 1.0, 2.0, 0.0, 2.0, 4.0]);
        let mut ed = CropEditor::new(info(Some(singular)), EditorConfig::default(), 800.0, 600.0);
        assert!(!ed.geo_mode_available());
        assert!(matches!(
            ed.set_unit_mode(UnitMode::Geo),
            Err(EditorError::Transform(TransformError::SingularTransform))
        ));
    }

    #[test]
    fn test_field_formatting() {
        let values = FieldValues {
            x: 116.123456789,
            y: 39.5,
            width: 0.25,
            height: 0.125,
        };
        assert_eq!(
            values.formatted(UnitMode::Geo),
            ["116.123457", "39.500000", "0.250000", "0.125000"]
        );
        let values = FieldValues {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 150.0,
        };
        assert_eq!(values.formatted(UnitMode::Pixel), ["100", "50", "200", "150"]);
    }

    #[test]
    fn test_cursor_status_shapes() {
        let mut ed = editor();
        let source = raster();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        assert_eq!(
            ed.cursor_status(200.0, 125.0, &source).shape,
            CursorShape::Move
        );
        assert_eq!(
            ed.cursor_status(100.0, 50.0, &source).shape,
            CursorShape::ResizeNwSe
        );
        assert_eq!(
            ed.cursor_status(300.0, 50.0, &source).shape,
            CursorShape::ResizeNeSw
        );
        assert_eq!(
            ed.cursor_status(600.0, 500.0, &source).shape,
            CursorShape::Crosshair
        );
        assert_eq!(
            ed.cursor_status(-5.0, -5.0, &source).shape,
            CursorShape::OutOfImage
        );
    }

    #[test]
    fn test_cursor_status_readout() {
        let ed = editor();
        let source = raster();

        let status = ed.cursor_status(50.0, 25.0, &source);
        assert_eq!(status.pixel, Some((50, 25)));
        let (gx, gy) = status.geo.unwrap();
        assert_relative_eq!(gx, 116.05, epsilon = 1e-9);
        assert_relative_eq!(gy, 39.975, epsilon = 1e-9);
        assert!(status.sample.is_some());

        let status = ed.cursor_status(-5.0, 25.0, &source);
        assert_eq!(status.pixel, None);
        assert_eq!(status.sample, None);
    }

    #[test]
    fn test_commit_crop() {
        let mut ed = editor();
        let source = raster();
        select(&mut ed, 100.0, 50.0, 300.0, 200.0);

        let output = ed.commit_crop(&source).unwrap().unwrap();
        assert_eq!(output.buffer.width, 200);
        assert_eq!(output.buffer.height, 150);
        let gt = output.geotransform.unwrap();
        assert_relative_eq!(gt.x_origin, 116.1, epsilon = 1e-9);
        assert_relative_eq!(gt.y_origin, 39.95, epsilon = 1e-9);
    }

    #[test]
    fn test_commit_crop_without_selection() {
        let ed = editor();
        let source = raster();
        assert!(ed.commit_crop(&source).unwrap().is_none());
    }

    #[test]
    fn test_render_through_editor() {
        let ed = editor();
        let source = raster();
        let view = ed.render(&source).unwrap().unwrap();
        assert_eq!(view.buffer.width, view.placement.target_width);
    }

    #[test]
    fn test_canvas_resize_then_fit() {
        let mut ed = editor();
        assert_eq!(ed.set_canvas_size(400.0, 300.0), Outcome::Redraw);
        ed.fit_to_canvas();
        assert_relative_eq!(ed.viewport().scale, (300.0 / 800.0) * 0.95, epsilon = 1e-12);
    }
}
