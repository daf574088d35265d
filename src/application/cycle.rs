//! One patch cycle: load a document, apply specs in order, save once.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use dashmap::DashMap;
use metrics::{counter, histogram};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::{
    application::{error::AppError, fields::FieldMarkers, ports::DocumentStore},
    domain::{
        marker::locate,
        patch::{PatchSpec, SkippedField, apply_all},
    },
    infra::telemetry::{METRIC_CYCLE_MS, METRIC_PATCH_APPLIED, METRIC_PATCH_SKIPPED},
};

/// One async mutex per document path, created on first use.
#[derive(Debug, Default, Clone)]
pub struct PathLocks {
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.locks.entry(path.to_path_buf()).or_default().value());
        mutex.lock_owned().await
    }
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub path: PathBuf,
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedField>,
    pub saved: bool,
}

/// Runs patch cycles against a [`DocumentStore`], serializing writers per path.
#[derive(Clone)]
pub struct DocumentPatcher {
    store: Arc<dyn DocumentStore>,
    locks: PathLocks,
}

impl DocumentPatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            locks: PathLocks::new(),
        }
    }

    /// Load `path`, apply `specs`, and write the result back if anything changed.
    ///
    /// Fields whose markers cannot be located are skipped and reported; an
    /// I/O failure aborts the cycle and leaves the file untouched.
    pub async fn run(
        &self,
        source: &'static str,
        path: &Path,
        specs: &[PatchSpec],
    ) -> Result<CycleReport, AppError> {
        for spec in specs {
            spec.validate()?;
        }

        let _guard = self.locks.lock(path).await;
        let started_at = Instant::now();

        let document = self.store.load(path).await?;

        let report = apply_all(document, specs);
        for skipped in &report.skipped {
            warn!(
                target = "planner::cycle",
                op = "cycle::patch",
                source,
                path = %path.display(),
                field = %skipped.field,
                code = skipped.error.code(),
                error = %skipped.error,
                "Skipped field"
            );
        }
        counter!(METRIC_PATCH_APPLIED, "source" => source).increment(report.applied.len() as u64);
        counter!(METRIC_PATCH_SKIPPED, "source" => source).increment(report.skipped.len() as u64);

        let saved = report.changed;
        if saved {
            self.store.save(&report.document).await?;
        }

        let elapsed = started_at.elapsed();
        histogram!(METRIC_CYCLE_MS, "source" => source).record(elapsed.as_secs_f64() * 1000.0);
        info!(
            target = "planner::cycle",
            op = "cycle::run",
            source,
            path = %path.display(),
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            result = if saved { "saved" } else { "unchanged" },
            elapsed_ms = elapsed.as_millis() as u64,
            "Patch cycle finished"
        );

        Ok(CycleReport {
            path: path.to_path_buf(),
            applied: report.applied,
            skipped: report.skipped,
            saved,
        })
    }

    /// Report every field whose markers cannot be located in `path`. Never writes.
    pub async fn check(
        &self,
        path: &Path,
        fields: &[FieldMarkers],
    ) -> Result<Vec<SkippedField>, AppError> {
        let document = self.store.load(path).await?;
        let failures = fields
            .iter()
            .filter_map(|markers| {
                let spec = markers.spec("");
                spec.validate()
                    .and_then(|()| locate(document.text(), &markers.start, &markers.stop))
                    .err()
                    .map(|error| SkippedField {
                        field: markers.field.clone(),
                        error,
                    })
            })
            .collect();
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{domain::document::Document, infra::error::InfraError};

    #[derive(Default)]
    struct MemoryStore {
        text: StdMutex<String>,
        saves: StdMutex<usize>,
        fail_save: bool,
    }

    impl MemoryStore {
        fn with_text(text: &str) -> Self {
            Self {
                text: StdMutex::new(text.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn load(&self, path: &Path) -> Result<Document, InfraError> {
            let text = self.text.lock().expect("text lock").clone();
            Ok(Document::new(path, text))
        }

        async fn save(&self, document: &Document) -> Result<(), InfraError> {
            if self.fail_save {
                return Err(InfraError::Write {
                    path: document.path().to_path_buf(),
                    source: std::io::Error::other("disk full"),
                });
            }
            *self.text.lock().expect("text lock") = document.text().to_string();
            *self.saves.lock().expect("saves lock") += 1;
            Ok(())
        }
    }

    const PAGE: &str = r#"<span id="currentTemp">X &#8457</span><span id="word">old:&nbsp;<!--w1--></span>"#;

    fn temp_spec(value: &str) -> PatchSpec {
        PatchSpec::new("currentTemp", r#"<span id="currentTemp">"#, " &#8457", value)
    }

    #[tokio::test]
    async fn cycle_patches_and_saves_once() {
        let store = Arc::new(MemoryStore::with_text(PAGE));
        let patcher = DocumentPatcher::new(store.clone());
        let specs = vec![
            temp_spec("49"),
            PatchSpec::new("missing", "<nope>", "</nope>", "x"),
            PatchSpec::new("word", r#"<span id="word">"#, ":&nbsp;<!--w1--></span>", "effusion"),
        ];

        let report = patcher
            .run("test", Path::new("planner.html"), &specs)
            .await
            .expect("cycle");

        assert!(report.saved);
        assert_eq!(report.applied, vec!["currentTemp", "word"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].field, "missing");
        assert_eq!(*store.saves.lock().unwrap(), 1);
        assert_eq!(
            *store.text.lock().unwrap(),
            r#"<span id="currentTemp">49 &#8457</span><span id="word">effusion:&nbsp;<!--w1--></span>"#
        );
    }

    #[tokio::test]
    async fn unchanged_document_is_not_saved() {
        let store = Arc::new(MemoryStore::with_text(PAGE));
        let patcher = DocumentPatcher::new(store.clone());

        let report = patcher
            .run("test", Path::new("planner.html"), &[temp_spec("X")])
            .await
            .expect("cycle");

        assert!(!report.saved);
        assert_eq!(*store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_marker_fails_before_loading() {
        let store = Arc::new(MemoryStore::with_text(PAGE));
        let patcher = DocumentPatcher::new(store.clone());
        let specs = vec![PatchSpec::new("bad", "", " &#8457", "1")];

        let err = patcher
            .run("test", Path::new("planner.html"), &specs)
            .await
            .expect_err("invalid marker");
        assert!(matches!(err, AppError::Patch(_)));
        assert_eq!(*store.text.lock().unwrap(), PAGE);
    }

    #[tokio::test]
    async fn save_failure_aborts_cycle() {
        let store = Arc::new(MemoryStore {
            text: StdMutex::new(PAGE.to_string()),
            saves: StdMutex::new(0),
            fail_save: true,
        });
        let patcher = DocumentPatcher::new(store.clone());

        let err = patcher
            .run("test", Path::new("planner.html"), &[temp_spec("49")])
            .await
            .expect_err("save fails");
        assert!(matches!(err, AppError::Infra(InfraError::Write { .. })));
        assert_eq!(*store.text.lock().unwrap(), PAGE);
    }

    #[tokio::test]
    async fn check_lists_unlocatable_fields() {
        let store = Arc::new(MemoryStore::with_text(PAGE));
        let patcher = DocumentPatcher::new(store.clone());
        let fields = vec![
            FieldMarkers::new("currentTemp", r#"<span id="currentTemp">"#, " &#8457"),
            FieldMarkers::new("pos", r#"<span id="pos">"#, "<!--w3--></span>"),
        ];

        let failures = patcher
            .check(Path::new("planner.html"), &fields)
            .await
            .expect("check");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "pos");
        assert_eq!(failures[0].error.code(), "marker_not_found");
    }

    #[tokio::test]
    async fn same_path_shares_one_lock() {
        let locks = PathLocks::new();
        let guard = locks.lock(Path::new("planner.html")).await;

        let contended = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contended.lock(Path::new("planner.html")).await;
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let _other = locks.lock(Path::new("css/planner.css")).await;
        drop(guard);
        waiter.await.expect("waiter");
    }
}
