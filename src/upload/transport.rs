//! # Upload Transport
//!
//! The network seam of the upload client. [`UploadTransport`] sends one multipart
//! body and reports either a complete response (status + body text) or a transport
//! failure; it never retries on its own. [`ReqwestTransport`] is the production
//! implementation, tests substitute scripted transports.

// Standard library imports
use std::sync::Arc;
use std::time::Duration;

// External crate imports
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

// Internal module imports
use crate::error::{ScanError, ScanResult};

/// Payload of one form part.
#[derive(Clone, Debug)]
pub enum PartBody {
    /// Binary file part; the file name is preserved on the wire
    File {
        filename: String,
        mime: &'static str,
        data: Arc<Vec<u8>>,
    },
    /// Plain text field
    Text(String),
}

/// One named part of a multipart/form-data body.
#[derive(Clone, Debug)]
pub struct FormPart {
    pub name: &'static str,
    pub body: PartBody,
}

/// Transport-agnostic multipart body, rebuilt for every attempt.
#[derive(Clone, Debug, Default)]
pub struct MultipartBody {
    pub parts: Vec<FormPart>,
}

impl MultipartBody {
    pub fn file(mut self, name: &'static str, filename: impl Into<String>, mime: &'static str, data: Arc<Vec<u8>>) -> Self {
        self.parts.push(FormPart {
            name,
            body: PartBody::File {
                filename: filename.into(),
                mime,
                data,
            },
        });
        self
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name,
            body: PartBody::Text(value.into()),
        });
        self
    }

    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parts.iter().map(|p| p.name).collect()
    }

    /// Payload bytes across all parts (framing excluded).
    pub fn payload_len(&self) -> usize {
        self.parts
            .iter()
            .map(|p| match &p.body {
                PartBody::File { data, .. } => data.len(),
                PartBody::Text(t) => t.len(),
            })
            .sum()
    }

    fn into_form(self) -> ScanResult<Form> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part.body {
                PartBody::File { filename, mime, data } => {
                    let bytes = Arc::try_unwrap(data).unwrap_or_else(|shared| shared.as_ref().clone());
                    let file = Part::bytes(bytes)
                        .file_name(filename)
                        .mime_str(mime)
                        .map_err(|e| ScanError::transport("build form", e.to_string()))?;
                    form.part(part.name, file)
                }
                PartBody::Text(value) => form.text(part.name, value),
            };
        }
        Ok(form)
    }
}

/// A response that was fully received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one multipart POST. Implementations make exactly one network call per invocation.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Returns `Err(ScanError::Transport)` when no complete response was read.
    async fn post_multipart(&self, url: &str, body: MultipartBody) -> ScanResult<HttpResponse>;
}

/// reqwest-backed transport.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// `request_timeout` bounds the whole exchange, `connect_timeout` only connection setup.
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> ScanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ScanError::transport("build client", e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UploadTransport for ReqwestTransport {
    async fn post_multipart(&self, url: &str, body: MultipartBody) -> ScanResult<HttpResponse> {
        let form = body.into_form()?;
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_keeps_part_order_and_names() {
        let body = MultipartBody::default()
            .file("rgb_image", "k_rgb.png", "image/png", Arc::new(vec![1, 2, 3]))
            .text("rgb_meta", "width:1\n");
        assert_eq!(body.names(), vec!["rgb_image", "rgb_meta"]);
        assert_eq!(body.payload_len(), 3 + 8);
        match &body.part("rgb_image").unwrap().body {
            PartBody::File { filename, mime, .. } => {
                assert_eq!(filename, "k_rgb.png");
                assert_eq!(*mime, "image/png");
            }
            other => panic!("expected file part, got {:?}", other),
        }
    }

    #[test]
    fn body_converts_to_reqwest_form() {
        let body = MultipartBody::default()
            .file("depth_image", "k_depth.raw", "application/octet-stream", Arc::new(vec![0; 8]))
            .text("depth_meta", "width:2\n");
        assert!(body.into_form().is_ok());
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse { status: 200, body: String::new() }.is_success());
        assert!(HttpResponse { status: 204, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 302, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 404, body: String::new() }.is_success());
    }
}
