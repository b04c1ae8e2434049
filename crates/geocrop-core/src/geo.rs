//! Affine geotransform mapping between pixel and geospatial coordinates.
//!
//! A raster's georeference is the standard 6-parameter affine transform:
//!
//! ```text
//! geo_x = x_origin + px * pixel_width + py * x_rotation
//! geo_y = y_origin + px * y_rotation  + py * pixel_height
//! ```
//!
//! `pixel_height` is negative for north-up rasters, so geospatial Y grows
//! in the opposite direction to pixel Y. The inverse mapping has a fast
//! path for the rotation-free common case and a full 2x2 solve otherwise.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::PixelWindow;

/// Determinants below this magnitude are treated as non-invertible.
const SINGULAR_DET_EPSILON: f64 = 1e-10;

/// Error types for geospatial coordinate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The rotation/shear terms degenerate to a non-invertible mapping.
    #[error("geotransform is singular and cannot be inverted")]
    SingularTransform,
}

/// Truncation toward zero, the single integerization policy for
/// continuous pixel coordinates.
///
/// Both the cursor readout and window computations go through this
/// helper so that the two paths can never disagree.
#[inline]
pub(crate) fn trunc_toward_zero(value: f64) -> i64 {
    value.trunc() as i64
}

/// A geospatial bounding box with normalized axis order
/// (`min_x <= max_x`, `min_y <= max_y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl GeoBounds {
    /// Create bounds from two opposite corners in any order.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Width of the box in geospatial units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box in geospatial units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// The 6-parameter affine geotransform, in GDAL parameter order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Geospatial X of the upper-left pixel corner.
    pub x_origin: f64,
    /// X-direction resolution (geospatial units per pixel column).
    pub pixel_width: f64,
    /// X-direction rotation term (0 for north-up rasters).
    pub x_rotation: f64,
    /// Geospatial Y of the upper-left pixel corner.
    pub y_origin: f64,
    /// Y-direction rotation term (0 for north-up rasters).
    pub y_rotation: f64,
    /// Y-direction resolution (negative for north-up rasters).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from the `[x0, pw, xr, y0, yr, ph]` array as reported by
    /// raster libraries.
    pub fn from_gdal(params: [f64; 6]) -> Self {
        Self {
            x_origin: params[0],
            pixel_width: params[1],
            x_rotation: params[2],
            y_origin: params[3],
            y_rotation: params[4],
            pixel_height: params[5],
        }
    }

    /// The transform back in GDAL array order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.x_origin,
            self.pixel_width,
            self.x_rotation,
            self.y_origin,
            self.y_rotation,
            self.pixel_height,
        ]
    }

    /// True for the `(0, 1, 0, 0, 0, 1)` default, which raster libraries
    /// report when a file carries no georeference at all.
    pub fn is_identity(&self) -> bool {
        self.to_gdal() == [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
    }

    fn has_rotation(&self) -> bool {
        self.x_rotation != 0.0 || self.y_rotation != 0.0
    }

    /// Whether [`GeoTransform::geo_to_pixel`] can succeed.
    pub fn is_invertible(&self) -> bool {
        let det = self.pixel_width * self.pixel_height - self.x_rotation * self.y_rotation;
        det.abs() >= SINGULAR_DET_EPSILON
    }

    /// Forward mapping: pixel coordinates to geospatial coordinates.
    ///
    /// Pure and total; accepts continuous (sub-pixel) input.
    pub fn pixel_to_geo(&self, px: f64, py: f64) -> (f64, f64) {
        let gx = self.x_origin + px * self.pixel_width + py * self.x_rotation;
        let gy = self.y_origin + px * self.y_rotation + py * self.pixel_height;
        (gx, gy)
    }

    /// Inverse mapping: geospatial coordinates to continuous pixel
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::SingularTransform`] when the transform
    /// matrix is not invertible.
    pub fn geo_to_pixel(&self, gx: f64, gy: f64) -> Result<(f64, f64), TransformError> {
        if !self.is_invertible() {
            return Err(TransformError::SingularTransform);
        }

        let dx = gx - self.x_origin;
        let dy = gy - self.y_origin;

        if !self.has_rotation() {
            // Rotation-free fast path, by far the common case.
            return Ok((dx / self.pixel_width, dy / self.pixel_height));
        }

        let det = self.pixel_width * self.pixel_height - self.x_rotation * self.y_rotation;
        let px = (self.pixel_height * dx - self.x_rotation * dy) / det;
        let py = (self.pixel_width * dy - self.y_rotation * dx) / det;
        Ok((px, py))
    }

    /// Map a geospatial bounding box onto a clamped integer pixel window.
    ///
    /// The box's (west, north) and (east, south) corners are inverted,
    /// element-wise min/max restores pixel axis order (geospatial Y
    /// usually grows opposite to pixel Y), and the result is clamped to
    /// `[0, img_width] x [0, img_height]`.
    ///
    /// A window clamped down to zero area is an empty selection, not an
    /// error; check [`PixelWindow::is_empty`].
    pub fn pixel_window_from_geo_bounds(
        &self,
        bounds: GeoBounds,
        img_width: u32,
        img_height: u32,
    ) -> Result<PixelWindow, TransformError> {
        let (ul_x, ul_y) = self.geo_to_pixel(bounds.min_x, bounds.max_y)?;
        let (lr_x, lr_y) = self.geo_to_pixel(bounds.max_x, bounds.min_y)?;

        let ul_x = trunc_toward_zero(ul_x);
        let ul_y = trunc_toward_zero(ul_y);
        let lr_x = trunc_toward_zero(lr_x);
        let lr_y = trunc_toward_zero(lr_y);

        let x_off = ul_x.min(lr_x).max(0).min(i64::from(img_width));
        let y_off = ul_y.min(lr_y).max(0).min(i64::from(img_height));
        let x_end = ul_x.max(lr_x).min(i64::from(img_width));
        let y_end = ul_y.max(lr_y).min(i64::from(img_height));

        let window = PixelWindow::new(
            x_off as u32,
            y_off as u32,
            (x_end - x_off).max(0) as u32,
            (y_end - y_off).max(0) as u32,
        );

        tracing::debug!(
            ?bounds,
            ?window,
            "converted geospatial bounds to pixel window"
        );
        Ok(window)
    }

    /// The geotransform of a crop starting at `(x_off, y_off)`.
    ///
    /// The new origin is the geospatial position of the window's
    /// upper-left corner under this transform; scale and rotation terms
    /// are copied unchanged, so the cropped raster reproduces the exact
    /// geospatial footprint of the source window.
    pub fn cropped(&self, x_off: u32, y_off: u32) -> GeoTransform {
        let (new_x_origin, new_y_origin) = self.pixel_to_geo(f64::from(x_off), f64::from(y_off));
        GeoTransform {
            x_origin: new_x_origin,
            y_origin: new_y_origin,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// North-up transform over the Beijing area used throughout the
    /// test suite: 0.001-degree pixels starting at 116E / 40N.
    fn beijing() -> GeoTransform {
        GeoTransform::from_gdal([116.0, 0.001, 0.0, 40.0, 0.0, -0.001])
    }

    #[test]
    fn test_pixel_to_geo_north_up() {
        let gt = beijing();
        let (gx, gy) = gt.pixel_to_geo(100.0, 50.0);
        assert_relative_eq!(gx, 116.1, epsilon = 1e-9);
        assert_relative_eq!(gy, 39.95, epsilon = 1e-9);
    }

    #[test]
    fn test_geo_to_pixel_north_up() {
        let gt = beijing();
        let (px, py) = gt.geo_to_pixel(116.1, 39.95).unwrap();
        assert_relative_eq!(px, 100.0, epsilon = 1e-6);
        assert_relative_eq!(py, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip_with_rotation() {
        let gt = GeoTransform::from_gdal([500_000.0, 2.0, 0.3, 4_000_000.0, -0.1, -2.0]);
        let (gx, gy) = gt.pixel_to_geo(123.0, 456.0);
        let (px, py) = gt.geo_to_pixel(gx, gy).unwrap();
        assert_relative_eq!(px, 123.0, epsilon = 1e-6);
        assert_relative_eq!(py, 456.0, epsilon = 1e-6);
    }

    #[test]
    fn test_singular_transform_rejected() {
        // det = 1 * 4 - 2 * 2 = 0
        let gt = GeoTransform::from_gdal([0.0, 1.0, 2.0, 0.0, 2.0, 4.0]);
        assert!(!gt.is_invertible());
        assert_eq!(
            gt.geo_to_pixel(10.0, 10.0),
            Err(TransformError::SingularTransform)
        );
    }

    #[test]
    fn test_zero_resolution_is_singular() {
        let gt = GeoTransform::from_gdal([116.0, 0.0, 0.0, 40.0, 0.0, -0.001]);
        assert_eq!(
            gt.geo_to_pixel(116.0, 39.0),
            Err(TransformError::SingularTransform)
        );
    }

    #[test]
    fn test_identity_detection() {
        assert!(GeoTransform::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).is_identity());
        assert!(!beijing().is_identity());
    }

    #[test]
    fn test_gdal_round_trip() {
        let params = [116.0, 0.001, 0.0, 40.0, 0.0, -0.001];
        assert_eq!(GeoTransform::from_gdal(params).to_gdal(), params);
    }

    #[test]
    fn test_window_geo_bounds_scenario() {
        // A 200x150 window at (100, 50) on the Beijing raster spans
        // 116.1..116.3 east and 39.8..39.95 north.
        let gt = beijing();
        let (min_x, max_y) = gt.pixel_to_geo(100.0, 50.0);
        let (max_x, min_y) = gt.pixel_to_geo(300.0, 200.0);
        assert_relative_eq!(min_x, 116.1, epsilon = 1e-9);
        assert_relative_eq!(max_x, 116.3, epsilon = 1e-9);
        assert_relative_eq!(min_y, 39.8, epsilon = 1e-9);
        assert_relative_eq!(max_y, 39.95, epsilon = 1e-9);
    }

    #[test]
    fn test_pixel_window_from_geo_bounds() {
        // The original 500x400 test raster: bounds 116.1..116.3 /
        // 39.7..39.9 resolve to a window of roughly 200x200 pixels
        // (floating truncation may lose a pixel on either edge).
        let gt = beijing();
        let bounds = GeoBounds::from_corners(116.1, 39.7, 116.3, 39.9);
        let window = gt.pixel_window_from_geo_bounds(bounds, 500, 400).unwrap();

        assert!(!window.is_empty());
        assert!((i64::from(window.width) - 200).abs() <= 1, "{window:?}");
        assert!((i64::from(window.height) - 200).abs() <= 1, "{window:?}");
        assert!((i64::from(window.x) - 100).abs() <= 1);
        assert!((i64::from(window.y) - 100).abs() <= 1);
    }

    #[test]
    fn test_pixel_window_clamps_to_image() {
        let gt = beijing();
        // Extends far west and north of the raster.
        let bounds = GeoBounds::from_corners(115.0, 39.95, 116.1, 41.0);
        let window = gt.pixel_window_from_geo_bounds(bounds, 500, 400).unwrap();
        assert_eq!(window.x, 0);
        assert_eq!(window.y, 0);
        assert!((i64::from(window.width) - 100).abs() <= 1);
        assert!((i64::from(window.height) - 50).abs() <= 1);
    }

    #[test]
    fn test_pixel_window_outside_image_is_empty() {
        let gt = beijing();
        // Entirely west of the raster's footprint.
        let bounds = GeoBounds::from_corners(100.0, 39.0, 101.0, 40.0);
        let window = gt.pixel_window_from_geo_bounds(bounds, 500, 400).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_cropped_preserves_footprint() {
        let gt = beijing();
        let cropped = gt.cropped(100, 50);
        let origin = cropped.pixel_to_geo(0.0, 0.0);
        assert_eq!(origin, gt.pixel_to_geo(100.0, 50.0));
        assert_eq!(cropped.pixel_width, gt.pixel_width);
        assert_eq!(cropped.pixel_height, gt.pixel_height);
        assert_eq!(cropped.x_rotation, gt.x_rotation);
        assert_eq!(cropped.y_rotation, gt.y_rotation);
    }

    #[test]
    fn test_geo_bounds_from_corners_normalizes() {
        let bounds = GeoBounds::from_corners(116.3, 39.9, 116.1, 39.7);
        assert_eq!(bounds.min_x, 116.1);
        assert_eq!(bounds.max_x, 116.3);
        assert_eq!(bounds.min_y, 39.7);
        assert_eq!(bounds.max_y, 39.9);
        assert_relative_eq!(bounds.width(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(bounds.height(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_trunc_toward_zero() {
        assert_eq!(trunc_toward_zero(3.7), 3);
        assert_eq!(trunc_toward_zero(-3.7), -3);
        assert_eq!(trunc_toward_zero(0.0), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
