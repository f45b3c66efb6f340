use crate::codec::{ImageCodec, Raster};
use crate::error::EncodeError;

/// Dimensions of `width` x `height` scaled down to fit a `bound` x `bound` box.
///
/// Never upscales. The aspect ratio is kept within integer rounding, and each
/// side is at least one pixel.
pub fn fit_within(width: u32, height: u32, bound: f64) -> (u32, u32) {
    let bound = bound.max(1.0);
    if width as f64 <= bound && height as f64 <= bound {
        return (width, height);
    }

    let ratio = (bound / width as f64).min(bound / height as f64);
    let limit = (bound + 1e-6).floor();
    let scale = |side: u32| (side as f64 * ratio).round().clamp(1.0, limit) as u32;
    (scale(width), scale(height))
}

/// Downscale `raster` so neither side exceeds `max_side`.
///
/// Rasters that already fit come back as a cheap clone of the input.
pub async fn resize<C: ImageCodec>(
    codec: &C,
    raster: &C::Raster,
    max_side: u32,
) -> Result<C::Raster, EncodeError> {
    resize_to_bound(codec, raster, max_side as f64).await
}

pub(crate) async fn resize_to_bound<C: ImageCodec>(
    codec: &C,
    raster: &C::Raster,
    bound: f64,
) -> Result<C::Raster, EncodeError> {
    let (width, height) = raster.dimensions();
    let (new_width, new_height) = fit_within(width, height, bound);
    if (new_width, new_height) == (width, height) {
        return Ok(raster.clone());
    }

    crate::verbose!(
        "Resizing {}x{} -> {}x{}",
        width,
        height,
        new_width,
        new_height
    );
    codec.resize(raster, new_width, new_height).await
}
