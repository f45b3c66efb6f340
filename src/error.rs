use crate::formats::OutputFormat;
use thiserror::Error;

/// The source bytes could not be turned into a raster.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image buffer is empty")]
    Empty,

    #[error("Unable to decode image: {0}")]
    Invalid(String),
}

/// Producing an encoded candidate failed, either while resampling or in the encoder.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("{0} encoding is not supported by this codec")]
    Unsupported(OutputFormat),

    #[error("{format} encoding at quality {quality:.2} failed: {reason}")]
    Failed {
        format: OutputFormat,
        quality: f32,
        reason: String,
    },

    #[error("Resizing to {width}x{height} failed: {reason}")]
    Resize {
        width: u32,
        height: u32,
        reason: String,
    },
}

impl EncodeError {
    pub fn is_capability_failure(&self) -> bool {
        matches!(self, EncodeError::Unsupported(_))
    }
}

/// Failures of the compression pipeline. The upload path absorbs these and
/// submits the original file instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid maximum side: {0}. Must be at least 1 pixel")]
    InvalidMaxSide(u32),

    #[error("Invalid maximum size: {0}. Must be at least 1 byte")]
    InvalidMaxBytes(usize),

    #[error("Unknown upload endpoint: {0}. Expected 'admin' or 'media'")]
    UnknownEndpoint(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// Non-success response; `message` comes from the body when present.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Upload succeeded but the response did not contain a URL")]
    NoUrl,

    #[error("Upload transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UploadError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Rejected { status, .. } => Some(*status),
            UploadError::Transport(err) => err.status().map(|s| s.as_u16()),
            UploadError::NoUrl => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_server_message() {
        let err = UploadError::Rejected {
            status: 413,
            message: "too large".to_string(),
        };
        assert_eq!(err.to_string(), "too large");
        assert_eq!(err.status(), Some(413));
    }

    #[test]
    fn test_capability_failure_classification() {
        assert!(EncodeError::Unsupported(OutputFormat::WebP).is_capability_failure());
        let failed = EncodeError::Failed {
            format: OutputFormat::Jpeg,
            quality: 0.5,
            reason: "boom".to_string(),
        };
        assert!(!failed.is_capability_failure());
        assert_eq!(failed.to_string(), "JPEG encoding at quality 0.50 failed: boom");

        let resize = EncodeError::Resize {
            width: 40,
            height: 13,
            reason: "task panicked".to_string(),
        };
        assert!(!resize.is_capability_failure());
    }
}
