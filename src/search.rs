//! Format × quality search and the unconditional fallback tier.

use crate::codec::{ImageCodec, Raster};
use crate::constants::{FALLBACK_QUALITY, FALLBACK_SCALE, QUALITY_LADDER};
use crate::error::EncodeError;
use crate::formats::OutputFormat;
use crate::resize::resize_to_bound;
use crate::utils::format_file_size;

/// One encode attempt that survived long enough to be measured.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingCandidate {
    pub format: OutputFormat,
    pub quality: f32,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodingCandidate {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Find the first `(format, quality)` whose encoding fits in `max_bytes`.
///
/// Formats are tried in [`OutputFormat::PREFERENCE`] order and qualities down
/// [`QUALITY_LADDER`]; the first fit wins. A capability failure drops the
/// whole format, any other encoder failure drops just that quality.
/// `None` means nothing fit and the caller should use [`fallback`].
pub async fn search<C: ImageCodec>(
    codec: &C,
    raster: &C::Raster,
    max_bytes: usize,
) -> Option<EncodingCandidate> {
    let (width, height) = raster.dimensions();

    for format in OutputFormat::PREFERENCE {
        if !codec.can_encode(format) {
            crate::verbose!("{} not available, skipping", format);
            continue;
        }

        for quality in QUALITY_LADDER {
            let bytes = match codec.encode(raster, format, quality).await {
                Ok(bytes) => bytes,
                Err(err) if err.is_capability_failure() => {
                    crate::verbose!("{} rejected by encoder, skipping format", format);
                    break;
                }
                Err(err) => {
                    crate::warn!("{}", err);
                    continue;
                }
            };

            if bytes.len() <= max_bytes {
                crate::verbose!(
                    "{} @ {:.2}: {} fits",
                    format,
                    quality,
                    format_file_size(bytes.len() as u64)
                );
                return Some(EncodingCandidate {
                    format,
                    quality,
                    width,
                    height,
                    bytes,
                });
            }

            crate::verbose!(
                "{} @ {:.2}: {} over budget",
                format,
                quality,
                format_file_size(bytes.len() as u64)
            );
        }
    }

    None
}

/// Last-resort JPEG at a fixed low quality inside a smaller bounding box.
///
/// `original` must be the raster as decoded, not the already resized one.
/// The result is not checked against any byte budget.
pub async fn fallback<C: ImageCodec>(
    codec: &C,
    original: &C::Raster,
    max_side: u32,
) -> Result<EncodingCandidate, EncodeError> {
    let raster = resize_to_bound(codec, original, max_side as f64 * FALLBACK_SCALE).await?;
    let (width, height) = raster.dimensions();
    let bytes = codec
        .encode(&raster, OutputFormat::Jpeg, FALLBACK_QUALITY)
        .await?;

    Ok(EncodingCandidate {
        format: OutputFormat::Jpeg,
        quality: FALLBACK_QUALITY,
        width,
        height,
        bytes,
    })
}
