//! The raster-data collaborator interface and an in-memory source.
//!
//! File formats, codecs and on-disk output live outside this crate.
//! [`RasterSource`] is the seam they plug into: the renderer asks it for
//! resampled display buffers, the editor asks it for cursor samples and
//! for the final crop. [`MemoryRaster`] is the concrete source used by
//! the wasm shell (which receives decoded pixels from the host) and by
//! the test suite.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoTransform;
use crate::PixelWindow;

/// Error types for raster access.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The requested window has zero area.
    #[error("requested window is empty")]
    EmptyWindow,

    /// The requested window does not lie inside the raster.
    #[error("window {x},{y} {width}x{height} exceeds the raster extent")]
    WindowOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// The resample target has a zero dimension.
    #[error("invalid resample target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    /// The backing store rejected the request.
    #[error("raster backend error: {0}")]
    Backend(String),
}

impl RasterError {
    fn out_of_bounds(window: PixelWindow) -> Self {
        RasterError::WindowOutOfBounds {
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
        }
    }
}

/// Resampling filter for display-buffer requests.
///
/// Nearest neighbor is the default policy: deterministic, fast and
/// adequate at interactive zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest neighbor interpolation (fastest).
    #[default]
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Lanczos3 interpolation (slowest, highest quality).
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            ResampleFilter::Nearest => image::imageops::FilterType::Nearest,
            ResampleFilter::Bilinear => image::imageops::FilterType::Triangle,
            ResampleFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Metadata describing an open raster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RasterInfo {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Number of bands in the source (3 for plain RGB).
    pub band_count: u32,
    /// Affine georeference, absent for plain images.
    pub geotransform: Option<GeoTransform>,
    /// Projection description (WKT or an EPSG tag), if any.
    pub projection: Option<String>,
}

impl RasterInfo {
    /// Whether the raster carries a usable georeference.
    pub fn is_georeferenced(&self) -> bool {
        self.geotransform.is_some()
    }
}

/// A resampled RGB buffer ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl DisplayBuffer {
    /// Create a new DisplayBuffer with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * 3) as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a DisplayBuffer from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

/// The result of cropping a source to a pixel window.
#[derive(Debug, Clone)]
pub struct CropOutput {
    /// The cropped pixels.
    pub buffer: DisplayBuffer,
    /// Georeference recomputed for the window's origin, when the source
    /// had one.
    pub geotransform: Option<GeoTransform>,
    /// Projection carried over unchanged from the source.
    pub projection: Option<String>,
}

/// The raster-I/O collaborator as seen from the editor core.
///
/// A file-backed implementation would open datasets, stretch raw bands
/// into display RGB and persist crops; none of that is this crate's
/// concern. Implementations must apply [`GeoTransform::cropped`] when
/// producing a crop of a georeferenced source.
pub trait RasterSource {
    /// Metadata for the open raster.
    fn info(&self) -> &RasterInfo;

    /// A resampled RGB buffer for `window`, sized `target_w x target_h`.
    ///
    /// # Errors
    ///
    /// Fails when the window is empty or outside the raster, or the
    /// target size is degenerate.
    fn read_display_buffer(
        &self,
        window: PixelWindow,
        target_w: u32,
        target_h: u32,
    ) -> Result<DisplayBuffer, RasterError>;

    /// Band values at a single pixel, for the cursor-hover readout.
    /// `None` outside the raster.
    fn sample(&self, x: u32, y: u32) -> Option<Vec<u8>>;

    /// Extract `window` as a standalone raster with its georeference
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Fails when the window is empty or outside the raster.
    fn crop(&self, window: PixelWindow) -> Result<CropOutput, RasterError>;
}

/// An in-memory RGB raster.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    info: RasterInfo,
    image: image::RgbImage,
    filter: ResampleFilter,
}

impl MemoryRaster {
    /// Create a raster from raw RGB bytes.
    ///
    /// An identity geotransform is normalized to `None`, since raster
    /// libraries report `(0, 1, 0, 0, 0, 1)` for files with no
    /// georeference at all.
    ///
    /// # Errors
    ///
    /// Fails when the pixel buffer does not match `width * height * 3`.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        geotransform: Option<GeoTransform>,
        projection: Option<String>,
    ) -> Result<Self, RasterError> {
        let image = image::RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| RasterError::Backend("pixel buffer size mismatch".to_string()))?;
        Ok(Self::from_rgb_image(image, geotransform, projection))
    }

    /// Create a raster from an already-decoded image.
    pub fn from_rgb_image(
        image: image::RgbImage,
        geotransform: Option<GeoTransform>,
        projection: Option<String>,
    ) -> Self {
        let geotransform = geotransform.filter(|gt| !gt.is_identity());
        let (width, height) = image.dimensions();
        Self {
            info: RasterInfo {
                width,
                height,
                band_count: 3,
                geotransform,
                projection,
            },
            image,
            filter: ResampleFilter::Nearest,
        }
    }

    /// Use a different resampling filter for display buffers.
    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    fn check_window(&self, window: PixelWindow) -> Result<(), RasterError> {
        if window.is_empty() {
            return Err(RasterError::EmptyWindow);
        }
        let right = u64::from(window.x) + u64::from(window.width);
        let bottom = u64::from(window.y) + u64::from(window.height);
        if right > u64::from(self.info.width) || bottom > u64::from(self.info.height) {
            return Err(RasterError::out_of_bounds(window));
        }
        Ok(())
    }
}

impl RasterSource for MemoryRaster {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn read_display_buffer(
        &self,
        window: PixelWindow,
        target_w: u32,
        target_h: u32,
    ) -> Result<DisplayBuffer, RasterError> {
        self.check_window(window)?;
        if target_w == 0 || target_h == 0 {
            return Err(RasterError::InvalidTargetSize {
                width: target_w,
                height: target_h,
            });
        }

        let sub = image::imageops::crop_imm(
            &self.image,
            window.x,
            window.y,
            window.width,
            window.height,
        )
        .to_image();
        let resampled =
            image::imageops::resize(&sub, target_w, target_h, self.filter.to_image_filter());

        Ok(DisplayBuffer::from_rgb_image(resampled))
    }

    fn sample(&self, x: u32, y: u32) -> Option<Vec<u8>> {
        if x >= self.info.width || y >= self.info.height {
            return None;
        }
        Some(self.image.get_pixel(x, y).0.to_vec())
    }

    fn crop(&self, window: PixelWindow) -> Result<CropOutput, RasterError> {
        self.check_window(window)?;

        let buffer = image::imageops::crop_imm(
            &self.image,
            window.x,
            window.y,
            window.width,
            window.height,
        )
        .to_image();
        let geotransform = self
            .info
            .geotransform
            .map(|gt| gt.cropped(window.x, window.y));

        tracing::info!(?window, "cropped in-memory raster");
        Ok(CropOutput {
            buffer: DisplayBuffer::from_rgb_image(buffer),
            geotransform,
            projection: self.info.projection.clone(),
        })
    }
}
