use crate::codec::ImageCodec;
use crate::constants::{
    ADMIN_UPLOAD_PATH, DEFAULT_API_BASE_URL, ERROR_FIELDS, FILE_FIELD, FOLDER_FIELD,
    LOW_QUALITY_THRESHOLD, LOW_QUALITY_WARNING, MEDIA_UPLOAD_PATH, URL_FIELDS,
};
use crate::error::{ConfigError, Result, UploadError};
use crate::formats::is_raster_mime;
use crate::policy::CompressionPolicy;
use crate::processing::{compress, SourceImage};
use crate::utils::format_file_size;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The two known upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Admin,
    Media,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Admin => ADMIN_UPLOAD_PATH,
            Endpoint::Media => MEDIA_UPLOAD_PATH,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Admin => write!(f, "admin"),
            Endpoint::Media => write!(f, "media"),
        }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Endpoint::Admin),
            "media" => Ok(Endpoint::Media),
            _ => Err(ConfigError::UnknownEndpoint(s.to_string())),
        }
    }
}

/// Multipart body: the file plus an optional folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub file_name: String,
    pub mime: String,
    pub data: Arc<[u8]>,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Submits an upload form to an endpoint and hands back the raw response.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn submit(&self, endpoint: Endpoint, form: UploadForm) -> Result<TransportResponse>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            bearer_token: None,
        }
    }
}

impl TransportConfig {
    pub fn new(base_url: Option<String>, bearer_token: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            bearer_token: bearer_token.filter(|token| !token.is_empty()),
        }
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        build_endpoint_url(&self.base_url, endpoint)
    }
}

/// HTTP multipart transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn submit(&self, endpoint: Endpoint, form: UploadForm) -> Result<TransportResponse> {
        let url = self.config.endpoint_url(endpoint);
        crate::verbose!("POST {} ({})", url, format_file_size(form.data.len() as u64));

        let part = Part::bytes(form.data.to_vec())
            .file_name(form.file_name)
            .mime_str(&form.mime)?;
        let mut multipart = Form::new().part(FILE_FIELD, part);
        if let Some(folder) = form.folder {
            multipart = multipart.text(FOLDER_FIELD, folder);
        }

        let mut request = self.client.post(&url).multipart(multipart);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

fn build_endpoint_url(base_url: &str, endpoint: Endpoint) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), endpoint.path())
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub url: String,
    pub warning: Option<String>,
}

/// Advisory for originals that are already small before any processing.
pub fn low_quality_advisory(source: &SourceImage) -> Option<String> {
    if source.size() < LOW_QUALITY_THRESHOLD && is_raster_mime(&source.mime) {
        Some(LOW_QUALITY_WARNING.to_string())
    } else {
        None
    }
}

/// Turn an endpoint response into the uploaded file's URL.
///
/// # Returns
/// * `Ok(url)` - first non-empty of the accepted URL fields
/// * `Err(UploadError::Rejected)` - non-2xx, with the server's message or `Error {status}`
/// * `Err(UploadError::NoUrl)` - 2xx without a usable URL
pub fn parse_upload_response(response: &TransportResponse) -> Result<String> {
    let json: Option<Value> = serde_json::from_str(&response.body).ok();

    if !response.is_success() {
        let message = json
            .as_ref()
            .and_then(|body| first_string_field(body, &ERROR_FIELDS))
            .unwrap_or_else(|| format!("Error {}", response.status));
        return Err(UploadError::Rejected {
            status: response.status,
            message,
        });
    }

    json.as_ref()
        .and_then(|body| first_string_field(body, &URL_FIELDS))
        .ok_or(UploadError::NoUrl)
}

fn first_string_field(body: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        body.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Compresses images and submits them to an upload endpoint.
pub struct Uploader<C, T> {
    codec: C,
    transport: T,
    policy: CompressionPolicy,
}

impl<C: ImageCodec, T: UploadTransport> Uploader<C, T> {
    pub fn new(codec: C, transport: T) -> Self {
        Self::with_policy(codec, transport, CompressionPolicy::default())
    }

    pub fn with_policy(codec: C, transport: T, policy: CompressionPolicy) -> Self {
        Self {
            codec,
            transport,
            policy,
        }
    }

    pub fn policy(&self) -> &CompressionPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn upload(
        &self,
        file: SourceImage,
        folder: Option<&str>,
        endpoint: Endpoint,
    ) -> Result<UploadOutcome> {
        self.upload_with_policy(file, folder, endpoint, &self.policy)
            .await
    }

    /// Upload with a one-off policy instead of the configured one.
    pub async fn upload_with_policy(
        &self,
        file: SourceImage,
        folder: Option<&str>,
        endpoint: Endpoint,
        policy: &CompressionPolicy,
    ) -> Result<UploadOutcome> {
        let warning = low_quality_advisory(&file);
        let payload = self.prepare(file, policy).await;

        let form = UploadForm {
            file_name: payload.name,
            mime: payload.mime,
            data: payload.data,
            folder: folder
                .map(str::trim)
                .filter(|folder| !folder.is_empty())
                .map(str::to_string),
        };

        crate::verbose!("Submitting {} to {} endpoint", form.file_name, endpoint);
        let response = self.transport.submit(endpoint, form).await?;
        let url = parse_upload_response(&response)?;

        Ok(UploadOutcome { url, warning })
    }

    /// Pick the bytes to submit. Never fails: anything the pipeline cannot
    /// handle is submitted as the original file.
    async fn prepare(&self, file: SourceImage, policy: &CompressionPolicy) -> SourceImage {
        if !file.kind().is_compressible() {
            crate::verbose!("{} ({}) passed through unchanged", file.name, file.mime);
            return file;
        }

        match compress(&self.codec, &file, policy).await {
            Ok(result) => result.to_source(),
            Err(err) => {
                crate::warn!("Compression of {} failed, uploading original: {}", file.name, err);
                file
            }
        }
    }
}
