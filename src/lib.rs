pub mod cli;
pub mod codec;
pub mod constants;
pub mod error;
pub mod formats;
pub mod info;
pub mod logger;
pub mod policy;
pub mod processing;
pub mod resize;
pub mod search;
pub mod upload;
pub mod utils;

pub use codec::{ImageCodec, ImageCrateCodec, ImageRaster, Raster};
pub use error::{ConfigError, DecodeError, EncodeError, PipelineError, Result, UploadError};
pub use formats::{OutputFormat, SourceKind};
pub use info::{inspect_image, print_image_report, ImageReport, PlannedRoute};
pub use policy::CompressionPolicy;
pub use processing::{compress, CompressionResult, CompressionTier, FastPathGate, SourceImage};
pub use resize::{fit_within, resize};
pub use search::{fallback, search, EncodingCandidate};
pub use upload::{
    low_quality_advisory, parse_upload_response, Endpoint, HttpTransport, TransportConfig,
    TransportResponse, UploadForm, UploadOutcome, UploadTransport, Uploader,
};
