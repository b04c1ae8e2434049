//! The crop rectangle being edited: bounds, handle geometry, hit-testing
//! and clamped mutations.
//!
//! The pixel-space rectangle is the single source of truth. The
//! geospatial form is derived on demand via [`GeoTransform`] and is only
//! ever an input immediately after a geospatial numeric entry, at which
//! point it is converted back to pixels.
//!
//! All mutations are corrective rather than error-raising: whatever the
//! input deltas, the resulting rectangle lies inside the image with
//! positive size.

use serde::{Deserialize, Serialize};

use crate::geo::{trunc_toward_zero, GeoBounds, GeoTransform, TransformError};
use crate::viewport::Viewport;
use crate::{EditorConfig, PixelWindow};

/// One of the four corner grab-points of the crop rectangle.
///
/// The per-axis predicates drive the resize logic, so a handle's effect
/// on each axis is derived rather than matched case by case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handle {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Handle {
    /// All handles, in drawing order.
    pub const ALL: [Handle; 4] = [
        Handle::NorthWest,
        Handle::NorthEast,
        Handle::SouthWest,
        Handle::SouthEast,
    ];

    /// Whether this handle drags the top edge.
    pub fn has_north(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::NorthEast)
    }

    /// Whether this handle drags the bottom edge.
    pub fn has_south(self) -> bool {
        matches!(self, Handle::SouthWest | Handle::SouthEast)
    }

    /// Whether this handle drags the right edge.
    pub fn has_east(self) -> bool {
        matches!(self, Handle::NorthEast | Handle::SouthEast)
    }

    /// Whether this handle drags the left edge.
    pub fn has_west(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::SouthWest)
    }
}

/// The crop rectangle in image pixel coordinates.
///
/// Invariant: `width >= 1`, `height >= 1`, and the rectangle lies inside
/// `[0, image_width] x [0, image_height]` of the raster it was created
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Build the rectangle spanned by a drag between two image-space
    /// points, clamped into the image.
    ///
    /// Returns `None` when the span is below 1x1 image pixels (a click
    /// or micro-drag is "no selection", not a degenerate rectangle).
    pub fn from_drag(
        ax: f64,
        ay: f64,
        bx: f64,
        by: f64,
        img_width: u32,
        img_height: u32,
    ) -> Option<CropRegion> {
        let min_x = ax.min(bx);
        let min_y = ay.min(by);
        let width = (ax - bx).abs();
        let height = (ay - by).abs();
        if width < 1.0 || height < 1.0 {
            return None;
        }

        let x0 = trunc_toward_zero(min_x).max(0);
        let y0 = trunc_toward_zero(min_y).max(0);
        let x1 = trunc_toward_zero(min_x + width).min(i64::from(img_width));
        let y1 = trunc_toward_zero(min_y + height).min(i64::from(img_height));
        if x1 - x0 < 1 || y1 - y0 < 1 {
            return None;
        }

        Some(CropRegion {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Rebuild from a non-empty pixel window.
    pub fn from_window(window: PixelWindow) -> Option<CropRegion> {
        if window.is_empty() {
            return None;
        }
        Some(CropRegion {
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
        })
    }

    /// The rectangle as a read/crop window.
    pub fn window(&self) -> PixelWindow {
        PixelWindow::new(self.x, self.y, self.width, self.height)
    }

    /// Display-space center of a corner handle.
    pub fn handle_center(&self, handle: Handle, viewport: &Viewport) -> (f64, f64) {
        let ix = if handle.has_west() {
            self.x
        } else {
            self.x + self.width
        };
        let iy = if handle.has_north() {
            self.y
        } else {
            self.y + self.height
        };
        viewport.image_to_display(f64::from(ix), f64::from(iy))
    }

    /// Strict-interior containment test in display space.
    pub fn contains(&self, display_x: f64, display_y: f64, viewport: &Viewport) -> bool {
        let (x1, y1) = viewport.image_to_display(f64::from(self.x), f64::from(self.y));
        let (x2, y2) = viewport.image_to_display(
            f64::from(self.x + self.width),
            f64::from(self.y + self.height),
        );
        display_x > x1 && display_x < x2 && display_y > y1 && display_y < y2
    }

    /// The nearest corner handle within grabbing reach of a
    /// display-space point, if any.
    ///
    /// Reach is `handle_size + handle_slack` display pixels under the
    /// Chebyshev metric (handles are square); the slack improves
    /// grabbability without enlarging the drawn handle.
    pub fn handle_at(
        &self,
        display_x: f64,
        display_y: f64,
        viewport: &Viewport,
        config: &EditorConfig,
    ) -> Option<Handle> {
        let reach = config.handle_size + config.handle_slack;
        let mut best: Option<(Handle, f64)> = None;

        for handle in Handle::ALL {
            let (cx, cy) = self.handle_center(handle, viewport);
            let dist = (display_x - cx).abs().max((display_y - cy).abs());
            if dist <= reach && best.map_or(true, |(_, d)| dist < d) {
                best = Some((handle, dist));
            }
        }

        best.map(|(handle, _)| handle)
    }

    /// Translate by an image-space delta, clamped so the rectangle stays
    /// fully inside the image. Size is unchanged.
    pub fn moved(&self, dx: f64, dy: f64, img_width: u32, img_height: u32) -> CropRegion {
        let nx = trunc_toward_zero(f64::from(self.x) + dx);
        let ny = trunc_toward_zero(f64::from(self.y) + dy);
        self.placed_at(nx, ny, img_width, img_height)
    }

    /// Keyboard-driven translation by whole pixels, same clamp rule as
    /// [`CropRegion::moved`].
    pub fn nudged(&self, dx: i64, dy: i64, img_width: u32, img_height: u32) -> CropRegion {
        self.placed_at(
            i64::from(self.x) + dx,
            i64::from(self.y) + dy,
            img_width,
            img_height,
        )
    }

    fn placed_at(&self, nx: i64, ny: i64, img_width: u32, img_height: u32) -> CropRegion {
        let max_x = (i64::from(img_width) - i64::from(self.width)).max(0);
        let max_y = (i64::from(img_height) - i64::from(self.height)).max(0);
        CropRegion {
            x: nx.clamp(0, max_x) as u32,
            y: ny.clamp(0, max_y) as u32,
            ..*self
        }
    }

    /// Resize by dragging `handle` by an image-space delta.
    ///
    /// Each axis is adjusted independently from the handle's edge flags:
    /// a north-bearing handle moves the top edge, a west-bearing handle
    /// the left edge, and so on, with the opposite edge held fixed.
    /// Dimensions are floored at `min_size` and the result is clamped
    /// into the image.
    pub fn resized(
        &self,
        handle: Handle,
        dx: f64,
        dy: f64,
        min_size: u32,
        img_width: u32,
        img_height: u32,
    ) -> CropRegion {
        let min_w = f64::from(min_size.min(img_width));
        let min_h = f64::from(min_size.min(img_height));
        let ox = f64::from(self.x);
        let oy = f64::from(self.y);
        let ow = f64::from(self.width);
        let oh = f64::from(self.height);

        let (mut nx, mut nw) = (ox, ow);
        if handle.has_east() {
            nw = (ow + dx).max(min_w);
        }
        if handle.has_west() {
            nx = (ox + dx).min(ox + ow - min_w);
            nw = (ow - dx).max(min_w);
        }

        let (mut ny, mut nh) = (oy, oh);
        if handle.has_south() {
            nh = (oh + dy).max(min_h);
        }
        if handle.has_north() {
            ny = (oy + dy).min(oy + oh - min_h);
            nh = (oh - dy).max(min_h);
        }

        // Clamp the edges into the image without dropping below the
        // minimum size; truncating both edges cannot shrink the span
        // below a whole-pixel minimum.
        let x0 = nx.max(0.0).min(f64::from(img_width) - min_w);
        let x1 = (nx + nw).min(f64::from(img_width)).max(x0 + min_w);
        let y0 = ny.max(0.0).min(f64::from(img_height) - min_h);
        let y1 = (ny + nh).min(f64::from(img_height)).max(y0 + min_h);

        CropRegion {
            x: trunc_toward_zero(x0) as u32,
            y: trunc_toward_zero(y0) as u32,
            width: (trunc_toward_zero(x1) - trunc_toward_zero(x0)) as u32,
            height: (trunc_toward_zero(y1) - trunc_toward_zero(y0)) as u32,
        }
    }

    /// Geospatial bounds of the rectangle, derived on demand.
    pub fn geo_bounds(&self, transform: &GeoTransform) -> GeoBounds {
        let (gx1, gy1) = transform.pixel_to_geo(f64::from(self.x), f64::from(self.y));
        let (gx2, gy2) = transform.pixel_to_geo(
            f64::from(self.x + self.width),
            f64::from(self.y + self.height),
        );
        GeoBounds::from_corners(gx1, gy1, gx2, gy2)
    }

    /// Build a rectangle from geospatial bounds.
    ///
    /// Bounds that clamp down to zero area yield `Ok(None)`: an empty
    /// selection, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::SingularTransform`] when the transform
    /// cannot be inverted.
    pub fn from_geo_bounds(
        bounds: GeoBounds,
        transform: &GeoTransform,
        img_width: u32,
        img_height: u32,
    ) -> Result<Option<CropRegion>, TransformError> {
        let window = transform.pixel_window_from_geo_bounds(bounds, img_width, img_height)?;
        Ok(Self::from_window(window))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
