use crate::codec::{ImageCodec, Raster};
use crate::formats::SourceKind;
use crate::policy::CompressionPolicy;
use crate::processing::{FastPathGate, SourceImage};
use crate::upload::low_quality_advisory;
use crate::utils::format_file_size;
use std::fmt;

/// What the pipeline would do with a file under a given policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannedRoute {
    /// SVG, GIF or a non-image: submitted untouched
    PassThrough,
    /// Already within budget
    FastPath,
    /// Resize and/or re-encode
    Compress,
    /// Not decodable; the original would be submitted
    Undecodable,
}

impl fmt::Display for PlannedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PlannedRoute::PassThrough => "pass-through (not resampled)",
            PlannedRoute::FastPath => "fast path (uploaded unchanged)",
            PlannedRoute::Compress => "full compression",
            PlannedRoute::Undecodable => "undecodable (original uploaded)",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReport {
    pub name: String,
    pub mime: String,
    pub size: usize,
    pub dimensions: Option<(u32, u32)>,
    pub route: PlannedRoute,
    pub warning: Option<String>,
}

impl ImageReport {
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.dimensions
            .filter(|&(_, height)| height > 0)
            .map(|(width, height)| width as f64 / height as f64)
    }

    pub fn megapixels(&self) -> Option<f64> {
        self.dimensions
            .map(|(width, height)| width as f64 * height as f64 / 1_000_000.0)
    }
}

/// Decode just enough of `source` to say which route it would take.
pub async fn inspect_image<C: ImageCodec>(
    codec: &C,
    source: &SourceImage,
    policy: &CompressionPolicy,
) -> ImageReport {
    let kind = source.kind();
    let decoded = if matches!(kind, SourceKind::Other) {
        None
    } else {
        codec.decode(source.data.clone()).await.ok()
    };
    let dimensions = decoded.as_ref().map(|raster| raster.dimensions());

    let route = if !kind.is_compressible() {
        PlannedRoute::PassThrough
    } else {
        match dimensions {
            None => PlannedRoute::Undecodable,
            Some(dims) if FastPathGate::permits(source.size(), &source.mime, dims, policy) => {
                PlannedRoute::FastPath
            }
            Some(_) => PlannedRoute::Compress,
        }
    };

    ImageReport {
        name: source.name.clone(),
        mime: source.mime.clone(),
        size: source.size(),
        dimensions,
        route,
        warning: low_quality_advisory(source),
    }
}

pub fn print_image_report(report: &ImageReport, policy: &CompressionPolicy) {
    crate::info!("📋 Basic Information:");
    crate::info!("  📁 File: {}", report.name);
    crate::info!("  🎭 MIME type: {}", report.mime);
    crate::info!(
        "  📦 File size: {} bytes ({})",
        report.size,
        format_file_size(report.size as u64)
    );

    if let Some((width, height)) = report.dimensions {
        crate::info!("  📏 Dimensions: {}x{} pixels", width, height);
    }
    if let Some(megapixels) = report.megapixels() {
        crate::info!("  🔢 Megapixels: {:.2} MP", megapixels);
    }
    if let Some(aspect_ratio) = report.aspect_ratio() {
        crate::info!("  📐 Aspect ratio: {:.2}:1", aspect_ratio);
    }

    crate::info!("\n💡 Upload plan:");
    crate::info!(
        "  🎯 Budget: {} px per side, {}",
        policy.max_side,
        format_file_size(policy.max_bytes as u64)
    );
    crate::info!("  🛤️  Route: {}", report.route);

    if let Some(warning) = &report.warning {
        crate::warn!("{}", warning);
    }
}
