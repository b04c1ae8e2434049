//! Region-of-interest rendering: computing the visible sub-window and
//! placing its resampled pixels on the canvas.
//!
//! Only the part of the image the viewport can actually show is ever
//! resampled. The canvas corners are inverse-mapped into image space,
//! intersected with the image extent, and the surviving window is
//! requested from the raster source at display resolution. Off-screen
//! content costs nothing, and a fully panned-away image simply clears
//! the display.

use serde::{Deserialize, Serialize};

use crate::geo::trunc_toward_zero;
use crate::raster::{DisplayBuffer, RasterError, RasterSource};
use crate::viewport::Viewport;
use crate::PixelWindow;

/// Where a resampled sub-window lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// The visible image sub-window.
    pub window: PixelWindow,
    /// Resample target width in display pixels.
    pub target_width: u32,
    /// Resample target height in display pixels.
    pub target_height: u32,
    /// Display-space X of the sub-window's top-left corner.
    pub display_x: f64,
    /// Display-space Y of the sub-window's top-left corner.
    pub display_y: f64,
}

/// A resampled view ready to blit onto the canvas.
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub placement: Placement,
    pub buffer: DisplayBuffer,
}

/// Compute the visible image sub-window and its display placement.
///
/// Returns `None` when no part of the image intersects the canvas.
/// The window is expanded by one pixel on the far edges before
/// intersecting, and the resample target gets one extra display pixel,
/// so adjacent redraws cannot leave seam gaps.
pub fn visible_placement(
    viewport: &Viewport,
    canvas_w: f64,
    canvas_h: f64,
    img_width: u32,
    img_height: u32,
) -> Option<Placement> {
    let (ix1, iy1) = viewport.display_to_image(0.0, 0.0);
    let (ix2, iy2) = viewport.display_to_image(canvas_w, canvas_h);

    let x0 = trunc_toward_zero(ix1).max(0);
    let y0 = trunc_toward_zero(iy1).max(0);
    let x1 = (trunc_toward_zero(ix2) + 1).min(i64::from(img_width));
    let y1 = (trunc_toward_zero(iy2) + 1).min(i64::from(img_height));

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let window = PixelWindow::new(
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    );
    let (display_x, display_y) = viewport.image_to_display(x0 as f64, y0 as f64);

    Some(Placement {
        window,
        target_width: (f64::from(window.width) * viewport.scale) as u32 + 1,
        target_height: (f64::from(window.height) * viewport.scale) as u32 + 1,
        display_x,
        display_y,
    })
}

/// Produce the resampled view for the current viewport.
///
/// `Ok(None)` means the image is entirely off-canvas and the display
/// should be cleared.
///
/// # Errors
///
/// Propagates raster-source failures for the buffer request.
pub fn render(
    source: &dyn RasterSource,
    viewport: &Viewport,
    canvas_w: f64,
    canvas_h: f64,
) -> Result<Option<RenderedView>, RasterError> {
    let info = source.info();
    let Some(placement) = visible_placement(viewport, canvas_w, canvas_h, info.width, info.height)
    else {
        tracing::debug!("image fully off-canvas, clearing display");
        return Ok(None);
    };

    tracing::trace!(?placement, "requesting resampled display buffer");
    let buffer = source.read_display_buffer(
        placement.window,
        placement.target_width,
        placement.target_height,
    )?;

    Ok(Some(RenderedView { placement, buffer }))
}
