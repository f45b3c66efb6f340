/// Image format utilities and type-safe format handling
///
/// Output formats the encoding search can produce, and the classification of
/// incoming MIME types that decides which route an upload takes.
use std::fmt;
use std::path::Path;

/// Output formats the pipeline can encode to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// WebP, preferred when it fits the budget
    WebP,
    /// JPEG, always available as the last resort
    Jpeg,
}

impl OutputFormat {
    /// Search order. Earlier formats win whenever they fit.
    pub const PREFERENCE: [OutputFormat; 2] = [OutputFormat::WebP, OutputFormat::Jpeg];

    /// Returns the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::WebP => "WebP",
            OutputFormat::Jpeg => "JPEG",
        };
        write!(f, "{}", name)
    }
}

/// How an incoming file is treated by the upload path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Raster image that goes through the compression pipeline
    Raster,
    /// Raster image in a legacy format that must never be passed through as-is
    LegacyRaster,
    /// Vector or animated image; resampling would break it
    Preserved,
    /// Not an image at all
    Other,
}

impl SourceKind {
    pub fn from_mime(mime: &str) -> Self {
        let mime = normalize_mime(mime);
        match mime.as_str() {
            "image/svg+xml" | "image/gif" => SourceKind::Preserved,
            "image/bmp" | "image/x-ms-bmp" | "image/tiff" | "image/tif" => {
                SourceKind::LegacyRaster
            }
            m if m.starts_with("image/") => SourceKind::Raster,
            _ => SourceKind::Other,
        }
    }

    /// Whether the compression pipeline runs at all for this kind.
    pub fn is_compressible(&self) -> bool {
        matches!(self, SourceKind::Raster | SourceKind::LegacyRaster)
    }

    /// Legacy formats are re-encoded even when they already fit the budget.
    pub fn must_normalize(&self) -> bool {
        matches!(self, SourceKind::LegacyRaster)
    }
}

/// Whether the MIME type names a raster image (any `image/*` except SVG).
pub fn is_raster_mime(mime: &str) -> bool {
    let mime = normalize_mime(mime);
    mime.starts_with("image/") && mime != "image/svg+xml"
}

fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Guess a MIME type from a file extension, for inputs read from disk.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "heic" | "heif" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Replace the extension of `name` with the one for `format`.
pub fn rename_for_format(name: &str, format: OutputFormat) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{}.{}", stem, format.extension())
}
