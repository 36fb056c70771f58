//! Common test utilities for the nutriscan integration tests
//!
//! Scripted transports stand in for the analysis service; gated and failing
//! sources stand in for the sensors.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use nutriscan::capture::{CaptureSource, SensorImage, SyntheticColorSource, SyntheticDepthSource};
use nutriscan::upload::{HttpResponse, MultipartBody, UploadConfig, UploadTransport};
use nutriscan::{CaptureOrchestrator, FrameStore, ScanError, ScanResult, UploadClient};
use scan_codec::PixelFormat;
use tokio::sync::Notify;

/// Response body for a single egg.
pub const EGG_BODY: &str = r#"{
    "success": true,
    "data": {"volumes": [{"object_name": "egg", "volume_cups": 0.41, "uncertainty_cups": 0.05}]},
    "macronutrients": {"data": [{
        "requested_food": "egg",
        "found": true,
        "macros": {"calories": 596.66, "protein": 46.68, "fat": 42.68, "carbs": 2.28},
        "calculated_weight": 100
    }]}
}"#;

pub const WIDTH: u32 = 24;
pub const HEIGHT: u32 = 16;

/// One scripted reply of the fake service.
#[derive(Clone, Debug)]
pub enum Reply {
    Status(u16, &'static str),
    Unreachable,
}

/// What the fake service saw for one request.
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub url: String,
    pub fields: Vec<&'static str>,
    pub at: tokio::time::Instant,
}

/// Transport answering from a script; replies 200 + [`EGG_BODY`] once it runs dry.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn post_multipart(&self, url: &str, body: MultipartBody) -> ScanResult<HttpResponse> {
        self.seen.lock().unwrap().push(SeenRequest {
            url: url.to_string(),
            fields: body.names(),
            at: tokio::time::Instant::now(),
        });
        let reply = self.replies.lock().unwrap().pop_front();
        match reply.unwrap_or(Reply::Status(200, EGG_BODY)) {
            Reply::Status(status, body) => Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            Reply::Unreachable => Err(ScanError::transport("POST", "connection refused")),
        }
    }
}

/// Wraps a source and holds every capture until [`Notify::notify_one`] is called.
pub struct GatedSource<S> {
    inner: S,
    gate: Arc<Notify>,
}

impl<S> GatedSource<S> {
    pub fn new(inner: S) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                inner,
                gate: gate.clone(),
            },
            gate,
        )
    }
}

#[async_trait]
impl<S: CaptureSource> CaptureSource for GatedSource<S> {
    async fn capture_frame(&mut self) -> anyhow::Result<SensorImage> {
        self.gate.notified().await;
        self.inner.capture_frame().await
    }

    fn label(&self) -> &str {
        self.inner.label()
    }
}

/// Sensor that never delivers.
pub struct FailingSource(pub &'static str);

#[async_trait]
impl CaptureSource for FailingSource {
    async fn capture_frame(&mut self) -> anyhow::Result<SensorImage> {
        bail!("{} sensor disconnected", self.0)
    }

    fn label(&self) -> &str {
        self.0
    }
}

pub fn depth_source() -> Box<dyn CaptureSource> {
    Box::new(SyntheticDepthSource::new(WIDTH, HEIGHT, PixelFormat::DepthUint16))
}

pub fn color_source() -> Box<dyn CaptureSource> {
    Box::new(SyntheticColorSource::new(WIDTH, HEIGHT))
}

pub fn upload_config() -> UploadConfig {
    UploadConfig {
        base_uri: "http://analysis.test".to_string(),
        max_attempts: 3,
        backoff_step: Duration::from_secs(1),
        request_timeout: Duration::from_secs(300),
        connect_timeout: Duration::from_secs(10),
    }
}

pub fn orchestrator(
    depth: Box<dyn CaptureSource>,
    rgb: Box<dyn CaptureSource>,
    store: Arc<dyn FrameStore>,
    transport: ScriptedTransport,
) -> CaptureOrchestrator<ScriptedTransport> {
    CaptureOrchestrator::new(depth, rgb, store, UploadClient::with_transport(upload_config(), transport))
        .with_settle_delay(Duration::ZERO)
}
