pub const DEFAULT_MAX_SIDE: u32 = 2560;
pub const DEFAULT_MAX_BYTES: usize = 3 * 1024 * 1024;

/// Descending quality ladder tried for every output format.
pub const QUALITY_LADDER: [f32; 5] = [0.92, 0.80, 0.65, 0.50, 0.35];

/// The fallback tier shrinks the bounding box to this share of `max_side`.
pub const FALLBACK_SCALE: f64 = 0.6;
pub const FALLBACK_QUALITY: f32 = 0.30;

/// Originals below this size get a low-quality advisory.
pub const LOW_QUALITY_THRESHOLD: usize = 300 * 1024;
pub const LOW_QUALITY_WARNING: &str =
    "The original image is smaller than 300 KB and may look blurry when displayed large.";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const ADMIN_UPLOAD_PATH: &str = "/api/admin/upload";
pub const MEDIA_UPLOAD_PATH: &str = "/api/media/upload";

pub const FILE_FIELD: &str = "file";
pub const FOLDER_FIELD: &str = "folder";

// Checked in order, first non-empty string wins.
pub const URL_FIELDS: [&str; 2] = ["url", "location"];
pub const ERROR_FIELDS: [&str; 2] = ["error", "message"];

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const COMPRESSED_SIZE_PREFIX: &str = "📈 Compressed size:";
pub const COMPRESSION_RATIO_PREFIX: &str = "🎯 Compression ratio:";
