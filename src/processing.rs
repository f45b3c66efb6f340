use crate::codec::{ImageCodec, Raster};
use crate::error::PipelineError;
use crate::formats::{rename_for_format, OutputFormat, SourceKind};
use crate::policy::CompressionPolicy;
use crate::resize::resize;
use crate::search::{fallback, search, EncodingCandidate};
use crate::utils::format_file_size;
use std::path::Path;
use std::sync::Arc;

/// An image as handed to the pipeline. Never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub name: String,
    pub mime: String,
    pub data: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, crate::formats::mime_from_path(path), data))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn kind(&self) -> SourceKind {
        SourceKind::from_mime(&self.mime)
    }
}

/// Which stage produced a [`CompressionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionTier {
    /// Source already within budget, returned as-is
    FastPath,
    /// Found by the format × quality search
    Search,
    /// Best-effort fallback, may exceed the byte budget
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub name: String,
    pub mime: String,
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// `None` for the fast path
    pub format: Option<OutputFormat>,
    pub quality: Option<f32>,
    pub tier: CompressionTier,
}

impl CompressionResult {
    fn unchanged(source: &SourceImage, (width, height): (u32, u32)) -> Self {
        Self {
            name: source.name.clone(),
            mime: source.mime.clone(),
            data: Arc::clone(&source.data),
            width,
            height,
            format: None,
            quality: None,
            tier: CompressionTier::FastPath,
        }
    }

    fn encoded(
        source: &SourceImage,
        policy: &CompressionPolicy,
        candidate: EncodingCandidate,
        tier: CompressionTier,
    ) -> Self {
        let base_name = policy.file_name.as_deref().unwrap_or(&source.name);
        Self {
            name: rename_for_format(base_name, candidate.format),
            mime: candidate.format.mime_type().to_string(),
            data: candidate.bytes.into(),
            width: candidate.width,
            height: candidate.height,
            format: Some(candidate.format),
            quality: Some(candidate.quality),
            tier,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn to_source(&self) -> SourceImage {
        SourceImage {
            name: self.name.clone(),
            mime: self.mime.clone(),
            data: Arc::clone(&self.data),
        }
    }
}

/// Decides whether a source can skip compression entirely.
pub struct FastPathGate;

impl FastPathGate {
    /// All three must hold: within the byte budget, not a legacy format that
    /// has to be normalized, and both sides within `max_side`.
    pub fn permits(
        size: usize,
        mime: &str,
        (width, height): (u32, u32),
        policy: &CompressionPolicy,
    ) -> bool {
        size <= policy.max_bytes
            && !SourceKind::from_mime(mime).must_normalize()
            && width <= policy.max_side
            && height <= policy.max_side
    }
}

/// Core image processing pipeline:
/// decode -> fast path check -> resize -> search -> fallback
///
/// # Returns
/// * `Ok(CompressionResult)` - exactly one result; within `max_bytes` unless
///   the fallback tier produced it
/// * `Err(PipelineError)` - the source could not be decoded, resampling
///   failed, or the codec could not even produce the fallback JPEG
pub async fn compress<C: ImageCodec>(
    codec: &C,
    source: &SourceImage,
    policy: &CompressionPolicy,
) -> Result<CompressionResult, PipelineError> {
    let original = codec.decode(Arc::clone(&source.data)).await?;
    let dimensions = original.dimensions();

    if FastPathGate::permits(source.size(), &source.mime, dimensions, policy) {
        crate::verbose!(
            "{} already within budget ({}x{}, {}), skipping compression",
            source.name,
            dimensions.0,
            dimensions.1,
            format_file_size(source.size() as u64)
        );
        return Ok(CompressionResult::unchanged(source, dimensions));
    }

    let resized = resize(codec, &original, policy.max_side).await?;
    if let Some(candidate) = search(codec, &resized, policy.max_bytes).await {
        return Ok(CompressionResult::encoded(
            source,
            policy,
            candidate,
            CompressionTier::Search,
        ));
    }
    drop(resized);

    crate::warn!(
        "No encoding of {} fits in {}, using fallback",
        source.name,
        format_file_size(policy.max_bytes as u64)
    );
    let candidate = fallback(codec, &original, policy.max_side).await?;
    Ok(CompressionResult::encoded(
        source,
        policy,
        candidate,
        CompressionTier::Fallback,
    ))
}
