#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use squeeze_upload::{Endpoint, TransportResponse, UploadForm, UploadTransport};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Smooth diagonal gradient; compresses well.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    });
    DynamicImage::ImageRgb8(img)
}

/// Deterministic xorshift noise; compresses badly in every format.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9e37_79b9;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

pub fn write_image(dir: &Path, name: &str, image: &DynamicImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, encode(image, format)).unwrap();
    path
}

/// Insert an EXIF APP1 segment carrying only an Orientation tag right after
/// the JPEG SOI marker.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    // Little-endian TIFF header, one IFD entry: 0x0112 SHORT x1
    let mut tiff = b"II\x2A\x00\x08\x00\x00\x00".to_vec();
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub const SVG_LOGO: &[u8] =
    br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#;

/// Transport that records every submission and answers with a canned response.
pub struct RecordingTransport {
    status: u16,
    body: String,
    submissions: Mutex<Vec<(Endpoint, UploadForm)>>,
}

impl RecordingTransport {
    pub fn responding(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(url: &str) -> Self {
        Self::responding(200, &format!(r#"{{"url":"{}"}}"#, url))
    }

    pub fn submissions(&self) -> Vec<(Endpoint, UploadForm)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn last_form(&self) -> UploadForm {
        self.submissions()
            .pop()
            .map(|(_, form)| form)
            .expect("no submission recorded")
    }
}

#[async_trait]
impl UploadTransport for RecordingTransport {
    async fn submit(
        &self,
        endpoint: Endpoint,
        form: UploadForm,
    ) -> squeeze_upload::Result<TransportResponse> {
        self.submissions.lock().unwrap().push((endpoint, form));
        Ok(TransportResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Single-request HTTP server on a loopback port.
///
/// Returns the base URL to point a transport at and a handle resolving to the
/// raw request bytes. The reply is `status_line` with a JSON `body`.
pub async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 8192];
        while !request_complete(&request) {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        request
    });

    (base_url, handle)
}

fn request_complete(request: &[u8]) -> bool {
    let Some(header_end) = find(request, b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    let body = &request[header_end + 4..];

    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());
    match content_length {
        Some(length) => body.len() >= length,
        None if headers.contains("transfer-encoding: chunked") => body.ends_with(b"0\r\n\r\n"),
        None => true,
    }
}

/// Byte offset of the first occurrence of `needle`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
