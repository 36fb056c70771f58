//! At most one capture cycle per orchestrator; extra triggers are rejected, not queued.

mod common;

use std::sync::Arc;

use common::{GatedSource, ScriptedTransport, color_source, orchestrator};
use nutriscan::capture::SyntheticDepthSource;
use nutriscan::{MemoryStore, ScanError};
use scan_codec::PixelFormat;

#[tokio::test]
async fn trigger_while_busy_is_rejected_without_network() {
    let (depth, gate) = GatedSource::new(SyntheticDepthSource::new(16, 16, PixelFormat::DepthFloat32));
    let orch = Arc::new(orchestrator(
        Box::new(depth),
        color_source(),
        Arc::new(MemoryStore::new()),
        ScriptedTransport::default(),
    ));

    let running = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.capture_and_upload().await })
    };
    while !orch.is_busy() {
        tokio::task::yield_now().await;
    }

    let err = orch.capture_and_upload().await.unwrap_err();
    assert!(matches!(err, ScanError::CaptureBusy), "{err:?}");
    assert_eq!(orch.client().transport().calls(), 0);

    gate.notify_one();
    let report = running.await.unwrap().unwrap();
    assert_eq!(report.records.len(), 1);
    assert_eq!(orch.client().transport().calls(), 1);
    assert!(!orch.is_busy());
}

#[tokio::test]
async fn flag_clears_after_failure_and_next_trigger_runs() {
    let (depth, gate) = GatedSource::new(SyntheticDepthSource::new(16, 16, PixelFormat::DepthUint16));
    let transport = ScriptedTransport::new([common::Reply::Status(400, "bad form")]);
    let orch = orchestrator(Box::new(depth), color_source(), Arc::new(MemoryStore::new()), transport);

    gate.notify_one();
    assert!(matches!(orch.capture_and_upload().await, Err(ScanError::Client { status: 400, .. })));
    assert!(!orch.is_busy());

    gate.notify_one();
    let report = orch.capture_and_upload().await.unwrap();
    assert_eq!(report.attempts, 1);
    assert_eq!(orch.client().transport().calls(), 2);
}
