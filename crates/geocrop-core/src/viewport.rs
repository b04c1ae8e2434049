//! Viewport mapping between image pixel space and display space.
//!
//! The viewport is a uniform scale plus a translation:
//!
//! ```text
//! display_x = image_x * scale + offset_x
//! display_y = image_y * scale + offset_y
//! ```
//!
//! `scale` is display pixels per image pixel and is always positive.
//! Offsets are unbounded; panning the image fully off-screen is legal
//! and the renderer handles the resulting empty visible window.

use serde::{Deserialize, Serialize};

/// Canvas sides below this are treated as "not laid out yet".
const MIN_CANVAS_SIDE: f64 = 10.0;

/// Fallback canvas size used before the real layout is known.
const FALLBACK_CANVAS: (f64, f64) = (800.0, 600.0);

/// Scale + offset pair mapping image pixel space to display space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Display pixels per image pixel.
    pub scale: f64,
    /// Display-space X of the image origin.
    pub offset_x: f64,
    /// Display-space Y of the image origin.
    pub offset_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

fn guard_canvas(canvas_w: f64, canvas_h: f64) -> (f64, f64) {
    if canvas_w < MIN_CANVAS_SIDE || canvas_h < MIN_CANVAS_SIDE {
        FALLBACK_CANVAS
    } else {
        (canvas_w, canvas_h)
    }
}

impl Viewport {
    /// Create a viewport at 1:1 scale with no translation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an image-space point to display space.
    #[inline]
    pub fn image_to_display(&self, ix: f64, iy: f64) -> (f64, f64) {
        (ix * self.scale + self.offset_x, iy * self.scale + self.offset_y)
    }

    /// Map a display-space point to image space.
    #[inline]
    pub fn display_to_image(&self, dx: f64, dy: f64) -> (f64, f64) {
        (
            (dx - self.offset_x) / self.scale,
            (dy - self.offset_y) / self.scale,
        )
    }

    /// Scale the whole image into the canvas, centered, with a small
    /// margin so the edges stay visible.
    pub fn fit_to_canvas(
        &mut self,
        canvas_w: f64,
        canvas_h: f64,
        img_width: u32,
        img_height: u32,
        margin: f64,
    ) {
        let (cw, ch) = guard_canvas(canvas_w, canvas_h);
        let iw = f64::from(img_width);
        let ih = f64::from(img_height);

        self.scale = (cw / iw).min(ch / ih) * margin;
        self.offset_x = (cw - iw * self.scale) / 2.0;
        self.offset_y = (ch - ih * self.scale) / 2.0;
    }

    /// Show the image at native resolution, centered in the canvas.
    pub fn actual_size(&mut self, canvas_w: f64, canvas_h: f64, img_width: u32, img_height: u32) {
        let (cw, ch) = guard_canvas(canvas_w, canvas_h);

        self.scale = 1.0;
        self.offset_x = (cw - f64::from(img_width)) / 2.0;
        self.offset_y = (ch - f64::from(img_height)) / 2.0;
    }

    /// Zoom by `factor`, keeping the image point under the display-space
    /// anchor fixed.
    ///
    /// The new scale is clamped to `[min_zoom, max_zoom]` and the offsets
    /// are recomputed from the factor that was actually applied, so
    /// hitting the clamp never makes the image jump.
    pub fn zoom_at(&mut self, anchor_x: f64, anchor_y: f64, factor: f64, min_zoom: f64, max_zoom: f64) {
        let new_scale = (self.scale * factor).clamp(min_zoom, max_zoom);
        let real_factor = new_scale / self.scale;
        self.scale = new_scale;

        self.offset_x = anchor_x - (anchor_x - self.offset_x) * real_factor;
        self.offset_y = anchor_y - (anchor_y - self.offset_y) * real_factor;
    }

    /// Translate the view by a display-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Current zoom level as a percentage for the UI readout.
    pub fn zoom_percent(&self) -> f64 {
        self.scale * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mapping_round_trip() {
        let vp = Viewport {
            scale: 2.5,
            offset_x: -120.0,
            offset_y: 34.0,
        };
        let (dx, dy) = vp.image_to_display(40.0, 80.0);
        let (ix, iy) = vp.display_to_image(dx, dy);
        assert_relative_eq!(ix, 40.0, epsilon = 1e-9);
        assert_relative_eq!(iy, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_to_canvas_centering() {
        // 1000x800 image in an 800x600 canvas: the height ratio wins.
        let mut vp = Viewport::new();
        vp.fit_to_canvas(800.0, 600.0, 1000, 800, 0.95);

        let expected_scale = (600.0f64 / 800.0) * 0.95;
        assert_relative_eq!(vp.scale, expected_scale, epsilon = 1e-12);
        assert_relative_eq!(vp.offset_x, (800.0 - 1000.0 * expected_scale) / 2.0, epsilon = 1e-9);
        assert_relative_eq!(vp.offset_y, (600.0 - 800.0 * expected_scale) / 2.0, epsilon = 1e-9);

        // The scaled image must be symmetric inside the canvas.
        let (left, top) = vp.image_to_display(0.0, 0.0);
        let (right, bottom) = vp.image_to_display(1000.0, 800.0);
        assert_relative_eq!(left, 800.0 - right, epsilon = 1e-9);
        assert_relative_eq!(top, 600.0 - bottom, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_guards_unlaid_out_canvas() {
        let mut vp = Viewport::new();
        vp.fit_to_canvas(1.0, 1.0, 400, 300, 0.95);

        // Falls back to the 800x600 default canvas.
        assert_relative_eq!(vp.scale, 2.0 * 0.95, epsilon = 1e-12);
        assert!(vp.offset_x > 0.0 && vp.offset_y > 0.0);
    }

    #[test]
    fn test_actual_size_centers() {
        let mut vp = Viewport::new();
        vp.actual_size(800.0, 600.0, 400, 300);

        assert_eq!(vp.scale, 1.0);
        assert_relative_eq!(vp.offset_x, 200.0);
        assert_relative_eq!(vp.offset_y, 150.0);
    }

    #[test]
    fn test_wheel_zoom_scenario() {
        // Zooming in by 1.2 at (400, 300) from the identity viewport.
        let mut vp = Viewport::new();
        vp.zoom_at(400.0, 300.0, 1.2, 0.1, 50.0);

        assert_relative_eq!(vp.scale, 1.2, epsilon = 1e-12);
        assert_relative_eq!(vp.offset_x, -80.0, epsilon = 1e-9);
        assert_relative_eq!(vp.offset_y, -60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_clamped_at_max() {
        let mut vp = Viewport {
            scale: 40.0,
            offset_x: 10.0,
            offset_y: 10.0,
        };
        let (before_x, before_y) = vp.display_to_image(200.0, 200.0);
        vp.zoom_at(200.0, 200.0, 10.0, 0.1, 50.0);

        assert_eq!(vp.scale, 50.0);
        // Anchor invariance must hold through the clamp.
        let (after_x, after_y) = vp.display_to_image(200.0, 200.0);
        assert_relative_eq!(after_x, before_x, epsilon = 1e-9);
        assert_relative_eq!(after_y, before_y, epsilon = 1e-9);
    }

    #[test]
    fn test_pan_is_unbounded() {
        let mut vp = Viewport::new();
        vp.pan(-1.0e6, 2.0e6);
        assert_eq!(vp.offset_x, -1.0e6);
        assert_eq!(vp.offset_y, 2.0e6);
    }

    #[test]
    fn test_zoom_percent() {
        let vp = Viewport {
            scale: 0.57,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        assert_relative_eq!(vp.zoom_percent(), 57.0, epsilon = 1e-9);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
