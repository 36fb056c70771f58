//! Retry timing of full cycles, on tokio's paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Reply, ScriptedTransport, color_source, depth_source, orchestrator};
use nutriscan::{MemoryStore, ScanError};

#[tokio::test(start_paused = true)]
async fn settle_then_linear_backoff_until_success() {
    let transport = ScriptedTransport::new([Reply::Status(503, "warming up"), Reply::Unreachable]);
    let orch = orchestrator(depth_source(), color_source(), Arc::new(MemoryStore::new()), transport)
        .with_settle_delay(Duration::from_millis(500));

    let started = tokio::time::Instant::now();
    let report = orch.capture_and_upload().await.unwrap();

    assert_eq!(report.attempts, 3);
    let seen = orch.client().transport().seen();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].at - started >= Duration::from_millis(500));
    let first_wait = seen[1].at - seen[0].at;
    let second_wait = seen[2].at - seen[1].at;
    assert!(first_wait >= Duration::from_secs(1) && first_wait < Duration::from_millis(1100), "{first_wait:?}");
    assert!(second_wait >= Duration::from_secs(2) && second_wait < Duration::from_millis(2100), "{second_wait:?}");
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_carry_last_error() {
    let transport = ScriptedTransport::new([
        Reply::Status(500, "boom"),
        Reply::Status(502, "bad gateway"),
        Reply::Status(503, "unavailable"),
        Reply::Status(200, common::EGG_BODY),
    ]);
    let orch = orchestrator(depth_source(), color_source(), Arc::new(MemoryStore::new()), transport);

    let err = orch.capture_and_upload().await.unwrap_err();

    match err {
        ScanError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, ScanError::Server { status: 503, .. }));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(orch.client().transport().calls(), 3);
    assert!(!orch.is_busy());
}
