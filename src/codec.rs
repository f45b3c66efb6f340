//! Raster decode, resize and encode primitives.
//!
//! The pipeline only talks to [`ImageCodec`], so the capability check that
//! drives the format search is explicit and a scripted codec can stand in for
//! the real one in tests.

use crate::error::{DecodeError, EncodeError};
use crate::formats::OutputFormat;
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::io::Cursor;
use std::sync::Arc;

/// A decoded pixel buffer with known dimensions.
pub trait Raster: Clone + Send + Sync + 'static {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }
}

#[async_trait]
pub trait ImageCodec: Send + Sync {
    type Raster: Raster;

    async fn decode(&self, data: Arc<[u8]>) -> Result<Self::Raster, DecodeError>;

    /// Resample to exactly `width` x `height`.
    async fn resize(
        &self,
        raster: &Self::Raster,
        width: u32,
        height: u32,
    ) -> Result<Self::Raster, EncodeError>;

    fn can_encode(&self, format: OutputFormat) -> bool;

    /// `quality` is in `(0, 1]`.
    async fn encode(
        &self,
        raster: &Self::Raster,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Raster backed by the `image` crate. Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct ImageRaster {
    image: Arc<DynamicImage>,
}

impl ImageRaster {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl Raster for ImageRaster {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Codec built on the `image` crate. CPU-heavy work runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct ImageCrateCodec {
    webp: bool,
}

impl Default for ImageCrateCodec {
    fn default() -> Self {
        Self { webp: true }
    }
}

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A codec that reports WebP as unavailable, like runtimes without a WebP encoder.
    pub fn without_webp() -> Self {
        Self { webp: false }
    }
}

#[async_trait]
impl ImageCodec for ImageCrateCodec {
    type Raster = ImageRaster;

    async fn decode(&self, data: Arc<[u8]>) -> Result<ImageRaster, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        tokio::task::spawn_blocking(move || decode_blocking(&data))
            .await
            .map_err(|e| DecodeError::Invalid(e.to_string()))?
    }

    async fn resize(
        &self,
        raster: &ImageRaster,
        width: u32,
        height: u32,
    ) -> Result<ImageRaster, EncodeError> {
        if raster.dimensions() == (width, height) {
            return Ok(raster.clone());
        }

        let image = Arc::clone(&raster.image);
        tokio::task::spawn_blocking(move || {
            ImageRaster::new(image.resize_exact(width, height, FilterType::Lanczos3))
        })
        .await
        .map_err(|e| EncodeError::Resize {
            width,
            height,
            reason: e.to_string(),
        })
    }

    fn can_encode(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::WebP => self.webp,
            OutputFormat::Jpeg => true,
        }
    }

    async fn encode(
        &self,
        raster: &ImageRaster,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError> {
        if !self.can_encode(format) {
            return Err(EncodeError::Unsupported(format));
        }

        let image = Arc::clone(&raster.image);
        tokio::task::spawn_blocking(move || encode_blocking(&image, format, quality))
            .await
            .map_err(|e| EncodeError::Failed {
                format,
                quality,
                reason: e.to_string(),
            })?
    }
}

/// Decode and turn the pixels upright according to the EXIF orientation,
/// so the reported dimensions are the displayed ones.
fn decode_blocking(data: &[u8]) -> Result<ImageRaster, DecodeError> {
    let image =
        image::load_from_memory(data).map_err(|e| DecodeError::Invalid(e.to_string()))?;
    Ok(ImageRaster::new(apply_orientation(image, exif_orientation(data))))
}

/// EXIF orientation tag (0x0112) of an encoded image, 1 when absent.
pub fn exif_orientation(data: &[u8]) -> u32 {
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()
        .and_then(|metadata| {
            metadata
                .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .unwrap_or(1)
}

/// Orientation values:
/// 1 = normal, 2 = mirrored, 3 = 180°, 4 = flipped vertically,
/// 5 = mirrored + 90° CW, 6 = 90° CW, 7 = mirrored + 270° CW, 8 = 270° CW
fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

fn encode_blocking(
    image: &DynamicImage,
    format: OutputFormat,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Vec::new();
    let failed = |e: image::ImageError| EncodeError::Failed {
        format,
        quality,
        reason: e.to_string(),
    };

    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                Cursor::new(&mut buffer),
                quality_percent(quality),
            );
            encoder
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(failed)?;
        }
        OutputFormat::WebP => {
            // The pure-Rust WebP encoder is lossless only, so quality is applied
            // by coarsening the colour channels before encoding.
            let mut rgba = image.to_rgba8();
            quantize_rgb(&mut rgba, quality);
            let (width, height) = rgba.dimensions();
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(Cursor::new(&mut buffer));
            encoder
                .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(failed)?;
        }
    }

    Ok(buffer)
}

/// Map a `(0, 1]` quality onto the 1-100 scale encoders expect.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Reduce each colour channel to a quality-dependent number of levels.
/// Alpha is left untouched.
fn quantize_rgb(data: &mut [u8], quality: f32) {
    let levels = levels_for_quality(quality);
    if levels >= 256 {
        return;
    }
    let step = 255.0 / (levels as f32 - 1.0);
    for pixel in data.chunks_exact_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            let bucket = (f32::from(*channel) / step).round();
            *channel = (bucket * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn levels_for_quality(quality: f32) -> u16 {
    if quality >= 1.0 {
        return 256;
    }
    let q = quality.clamp(0.01, 1.0);
    (2.0 + q * q * 254.0).round().clamp(2.0, 256.0) as u16
}


#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
    use std::cell::RefCell;

    fn noise_image(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x2545_f491;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn png_bytes(image: &DynamicImage) -> Arc<[u8]> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer.into()
    }

    #[test]
    fn test_quality_percent() {
        assert_eq!(quality_percent(0.92), 92);
        assert_eq!(quality_percent(0.35), 35);
        assert_eq!(quality_percent(0.30), 30);
        assert_eq!(quality_percent(1.0), 100);
        assert_eq!(quality_percent(0.0), 1);
    }

    #[test]
    fn test_levels_for_quality() {
        assert_eq!(levels_for_quality(1.0), 256);
        assert!(levels_for_quality(0.92) > levels_for_quality(0.35));
        assert!(levels_for_quality(0.35) >= 2);
    }

    #[test]
    fn test_quantize_rgb_keeps_alpha() {
        let mut data = vec![13, 200, 77, 42];
        quantize_rgb(&mut data, 0.35);
        assert_eq!(data[3], 42);
    }

    #[tokio::test]
    async fn test_decode_empty_buffer() {
        let codec = ImageCrateCodec::new();
        let result = codec.decode(Arc::from(Vec::new())).await;
        assert!(matches!(result, Err(DecodeError::Empty)));
    }

    #[tokio::test]
    async fn test_decode_garbage() {
        let codec = ImageCrateCodec::new();
        let result = codec.decode(Arc::from(b"fake image data".to_vec())).await;
        assert!(matches!(result, Err(DecodeError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_decode_png_dimensions() {
        let codec = ImageCrateCodec::new();
        let raster = codec.decode(png_bytes(&noise_image(40, 30))).await.unwrap();
        assert_eq!(raster.dimensions(), (40, 30));
    }

    #[tokio::test]
    async fn test_encode_jpeg_and_webp_signatures() {
        let codec = ImageCrateCodec::new();
        let raster = ImageRaster::new(noise_image(32, 32));

        let jpeg = codec.encode(&raster, OutputFormat::Jpeg, 0.8).await.unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let webp = codec.encode(&raster, OutputFormat::WebP, 0.8).await.unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[tokio::test]
    async fn test_lower_jpeg_quality_is_smaller() {
        let codec = ImageCrateCodec::new();
        let raster = ImageRaster::new(noise_image(128, 128));

        let high = codec.encode(&raster, OutputFormat::Jpeg, 0.92).await.unwrap();
        let low = codec.encode(&raster, OutputFormat::Jpeg, 0.35).await.unwrap();
        assert!(low.len() < high.len());
    }

    #[tokio::test]
    async fn test_without_webp_reports_capability_failure() {
        let codec = ImageCrateCodec::without_webp();
        assert!(!codec.can_encode(OutputFormat::WebP));
        assert!(codec.can_encode(OutputFormat::Jpeg));

        let raster = ImageRaster::new(noise_image(8, 8));
        let result = codec.encode(&raster, OutputFormat::WebP, 0.9).await;
        assert!(matches!(result, Err(EncodeError::Unsupported(OutputFormat::WebP))));
    }

    #[tokio::test]
    async fn test_resize_exact_dimensions() {
        let codec = ImageCrateCodec::new();
        let raster = ImageRaster::new(DynamicImage::new_rgb8(200, 100));
        let resized = codec.resize(&raster, 50, 25).await.unwrap();
        assert_eq!(resized.dimensions(), (50, 25));
        assert_eq!(resized.image().dimensions(), (50, 25));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_resize_yields_to_other_tasks() {
        let codec = ImageCrateCodec::new();
        let raster = ImageRaster::new(noise_image(1200, 900));
        let order = RefCell::new(Vec::new());

        tokio::join!(
            async {
                codec.resize(&raster, 400, 300).await.unwrap();
                order.borrow_mut().push("resized");
            },
            async {
                order.borrow_mut().push("other task");
            }
        );

        assert_eq!(order.into_inner(), vec!["other task", "resized"]);
    }

    #[test]
    fn test_exif_orientation_absent() {
        let mut buffer = Vec::new();
        noise_image(8, 8)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(exif_orientation(&buffer), 1);
        assert_eq!(exif_orientation(b"not an image"), 1);
    }

    #[test]
    fn test_apply_orientation_swaps_sides() {
        let landscape = DynamicImage::new_rgb8(60, 20);
        assert_eq!(apply_orientation(landscape.clone(), 6).dimensions(), (20, 60));
        assert_eq!(apply_orientation(landscape.clone(), 8).dimensions(), (20, 60));
        assert_eq!(apply_orientation(landscape.clone(), 3).dimensions(), (60, 20));
        assert_eq!(apply_orientation(landscape, 1).dimensions(), (60, 20));
    }
}
