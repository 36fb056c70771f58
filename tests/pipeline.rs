//! End-to-end capture → store → upload → map cycles against a scripted service.

mod common;

use std::sync::Arc;

use common::{EGG_BODY, FailingSource, HEIGHT, Reply, ScriptedTransport, WIDTH, color_source, depth_source, orchestrator};
use nutriscan::capture::SyntheticColorSource;
use nutriscan::store::{ArtifactNames, read_depth_pair};
use nutriscan::upload::fields;
use nutriscan::{FileStore, FrameStore, MemoryStore, ScanError};
use scan_codec::depth;

#[tokio::test]
async fn egg_capture_maps_to_one_record() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(depth_source(), color_source(), store.clone(), ScriptedTransport::default());

    let report = orch.capture_and_upload().await.unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(report.records.len(), 1);
    let egg = &report.records[0];
    assert_eq!(egg.food_name, "egg");
    assert_eq!(egg.volume_cups(), 0.41);
    assert_eq!(egg.calculated_weight, 100.0);
    assert!((egg.calories - 596.66).abs() < 1e-9);

    let seen = orch.client().transport().seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, "http://analysis.test/process");
    assert_eq!(
        seen[0].fields,
        [fields::RGB_IMAGE, fields::DEPTH_IMAGE, fields::RGB_META, fields::DEPTH_META]
    );
    assert_eq!(store.len(), 4);
    assert!(!orch.is_busy());
}

#[tokio::test]
async fn stored_depth_survives_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(depth_source(), color_source(), store.clone(), ScriptedTransport::default());

    let report = orch.capture_and_upload().await.unwrap();
    let (metadata, raw) = read_depth_pair(store.as_ref(), &report.key).await.unwrap();

    assert_eq!(Some(&metadata), report.depth.as_ref());
    assert_eq!(raw.len(), (WIDTH * HEIGHT * 2) as usize);
    let grid = depth::round_trip(&metadata, &raw).unwrap();
    assert_eq!(grid.get(WIDTH / 2, HEIGHT / 2), Some(metadata.center_depth));
    assert!((metadata.center_depth - 0.45).abs() < 1e-6);
    assert!(metadata.min_depth <= metadata.center_depth && metadata.center_depth <= metadata.max_depth);
}

#[tokio::test]
async fn file_store_keeps_all_four_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let orch = orchestrator(depth_source(), color_source(), store, ScriptedTransport::default());

    let report = orch.capture_and_upload().await.unwrap();
    let names = ArtifactNames::for_key(&report.key);

    for name in [&names.depth_raw, &names.depth_meta, &names.rgb_image, &names.rgb_meta] {
        assert!(dir.path().join(name).is_file(), "{} missing", name);
    }
    let png = std::fs::read(dir.path().join(&names.rgb_image)).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[tokio::test]
async fn color_sensor_failure_stops_at_missing_artifact() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(depth_source(), Box::new(FailingSource("rgb")), store.clone(), ScriptedTransport::default());

    let err = orch.capture_and_upload().await.unwrap_err();

    assert!(matches!(err.root(), ScanError::MissingArtifact { .. }), "{err:?}");
    match &err {
        ScanError::IncompleteCapture { sensors, .. } => {
            assert_eq!(sensors.len(), 1);
            assert!(matches!(&sensors[0], ScanError::Capture { stream, .. } if stream == "rgb"));
        }
        other => panic!("expected IncompleteCapture, got {other:?}"),
    }
    assert!(err.to_string().contains("rgb sensor disconnected"), "{err}");
    assert_eq!(orch.client().transport().calls(), 0);
    // depth pair was still written
    assert_eq!(store.len(), 2);
    assert!(!orch.is_busy());
}

#[tokio::test]
async fn codec_error_aborts_before_upload() {
    let store = Arc::new(MemoryStore::new());
    // a color camera wired to the depth input
    let depth = Box::new(SyntheticColorSource::new(WIDTH, HEIGHT));
    let orch = orchestrator(depth, color_source(), store, ScriptedTransport::default());

    let err = orch.capture_and_upload().await.unwrap_err();

    assert!(matches!(err, ScanError::UnsupportedFormat { .. }), "{err:?}");
    assert_eq!(orch.client().transport().calls(), 0);
    assert!(!orch.is_busy());
}

#[tokio::test]
async fn client_error_is_terminal_after_one_call() {
    let store = Arc::new(MemoryStore::new());
    let transport = ScriptedTransport::new([Reply::Status(404, "no such route")]);
    let orch = orchestrator(depth_source(), color_source(), store, transport);

    let err = orch.capture_and_upload().await.unwrap_err();

    assert!(matches!(err, ScanError::Client { status: 404, .. }), "{err:?}");
    assert_eq!(orch.client().transport().calls(), 1);
    assert!(!orch.is_busy());
}

#[tokio::test]
async fn malformed_success_body_is_reported() {
    let store = Arc::new(MemoryStore::new());
    let transport = ScriptedTransport::new([Reply::Status(200, r#"{"success": true}"#)]);
    let orch = orchestrator(depth_source(), color_source(), store, transport);

    let err = orch.capture_and_upload().await.unwrap_err();
    assert!(matches!(err, ScanError::MalformedResponse { .. }), "{err:?}");
}

#[tokio::test]
async fn consecutive_cycles_use_distinct_keys() {
    let store = Arc::new(MemoryStore::new());
    let transport = ScriptedTransport::new([Reply::Status(200, EGG_BODY), Reply::Status(200, EGG_BODY)]);
    let orch = orchestrator(depth_source(), color_source(), store.clone(), transport);

    let first = orch.capture_and_upload().await.unwrap();
    let second = orch.capture_and_upload().await.unwrap();

    assert_ne!(first.key, second.key);
    assert_eq!(store.len(), 8);
    assert!(store.exists(&ArtifactNames::for_key(&first.key).rgb_image).await.unwrap());
}
