use std::{collections::HashMap, fs, path::Path, sync::Arc};

use chrono_tz::Tz;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use planner::{
    application::{
        cycle::DocumentPatcher,
        refresh::{RefreshService, RefreshTargets},
    },
    config::{DEFAULT_PHOTO_START_MARKER, DEFAULT_PHOTO_STOP_MARKER, RefreshSource},
    domain::render::Renderer,
    infra::{
        photos::PhotoLibrary,
        store::FsDocumentStore,
        telemetry::{
            METRIC_CYCLE_FAILED, METRIC_CYCLE_MS, METRIC_PATCH_APPLIED, METRIC_PATCH_SKIPPED,
        },
    },
};
use tempfile::TempDir;

fn photo_service(css: &Path, photos: &Path) -> RefreshService {
    RefreshService::new(
        DocumentPatcher::new(Arc::new(FsDocumentStore::new())),
        Renderer::new(0, Tz::UTC, vec![':']).expect("renderer"),
        RefreshTargets {
            html: css.with_extension("html"),
            css: css.to_path_buf(),
            photo_start_marker: DEFAULT_PHOTO_START_MARKER.to_string(),
            photo_stop_marker: DEFAULT_PHOTO_STOP_MARKER.to_string(),
        },
        Arc::new(PhotoLibrary::new(photos)),
    )
}

#[tokio::test]
async fn each_aborted_cycle_is_counted_once() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let dir = TempDir::new().expect("temp dir");
    let css = dir.path().join("planner.css");
    let photos = dir.path().join("photos");
    fs::create_dir_all(&photos).expect("photos dir");
    fs::write(photos.join("lake.jpg"), b"jpeg").expect("photo");
    fs::write(&css, include_str!("../templates/planner.css")).expect("seed");

    photo_service(&css, &photos)
        .refresh(RefreshSource::Photo)
        .await
        .expect("photo cycle");
    photo_service(Path::new("/nonexistent/planner.css"), &photos)
        .refresh(RefreshSource::Photo)
        .await
        .expect_err("missing stylesheet");

    let mut counters: HashMap<String, u64> = HashMap::new();
    let mut histograms = Vec::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let name = composite_key.key().name().to_string();
        match value {
            DebugValue::Counter(count) => *counters.entry(name).or_default() += count,
            DebugValue::Histogram(_) => histograms.push(name),
            DebugValue::Gauge(_) => {}
        }
    }

    assert_eq!(counters.get(METRIC_CYCLE_FAILED), Some(&1));
    assert_eq!(counters.get(METRIC_PATCH_APPLIED), Some(&1));
    assert_eq!(counters.get(METRIC_PATCH_SKIPPED), Some(&0));
    assert!(histograms.iter().any(|name| name == METRIC_CYCLE_MS));
}
