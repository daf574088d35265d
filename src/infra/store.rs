//! Filesystem-backed document storage.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tempfile::Builder as TempBuilder;
use tracing::debug;

use crate::{application::ports::DocumentStore, domain::document::Document};

use super::error::InfraError;

/// Reads documents from disk and replaces them atomically on save.
///
/// Saves go through a temporary file in the target's directory that is then
/// renamed over the target, so readers never observe a partial document.
#[derive(Debug, Default, Clone)]
pub struct FsDocumentStore;

impl FsDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load(&self, path: &Path) -> Result<Document, InfraError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InfraError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            target = "planner::store",
            op = "store::load",
            path = %path.display(),
            bytes = text.len(),
            "Loaded document"
        );
        Ok(Document::new(path, text))
    }

    async fn save(&self, document: &Document) -> Result<(), InfraError> {
        let path = document.path().to_path_buf();
        let text = document.text().to_owned();
        let bytes = text.len();

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, text.as_bytes()))
            .await
            .map_err(|err| InfraError::Write {
                path: path.clone(),
                source: std::io::Error::other(err),
            })??;

        debug!(
            target = "planner::store",
            op = "store::save",
            path = %path.display(),
            bytes,
            "Saved document"
        );
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), InfraError> {
    let write_error = |source: std::io::Error| InfraError::Write {
        path: path.to_path_buf(),
        source,
    };

    let directory = parent_dir(path);
    let mut staged = TempBuilder::new()
        .prefix(".planner-")
        .suffix(".tmp")
        .tempfile_in(&directory)
        .map_err(write_error)?;
    staged.write_all(contents).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;

    // Keep the mode of the file being replaced; temp files are created 0600.
    match fs::metadata(path) {
        Ok(metadata) => staged
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(write_error)?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(write_error(err)),
    }

    staged.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_then_load_preserves_bytes() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("planner.html");
        let text = "<p>caf\u{e9} \u{2103}</p>\r\n<!-- trailing -->";

        let store = FsDocumentStore::new();
        store
            .save(&Document::new(&path, text))
            .await
            .expect("saved");

        let loaded = store.load(&path).await.expect("loaded");
        assert_eq!(loaded.text(), text);
        assert_eq!(loaded.path(), path.as_path());
    }

    #[tokio::test]
    async fn save_replaces_whole_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("planner.css");
        fs::write(&path, "a much longer original stylesheet body").expect("seed");

        let store = FsDocumentStore::new();
        store
            .save(&Document::new(&path, "short"))
            .await
            .expect("saved");

        assert_eq!(fs::read_to_string(&path).expect("read"), "short");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("list")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".planner-"))
            .collect();
        assert!(leftovers.is_empty(), "temporary files left behind");
    }

    #[tokio::test]
    async fn missing_document_reports_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.html");

        let err = FsDocumentStore::new()
            .load(&path)
            .await
            .expect_err("missing file");
        match err {
            InfraError::Read { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("planner.html");
        fs::write(&path, "old").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        FsDocumentStore::new()
            .save(&Document::new(&path, "new"))
            .await
            .expect("saved");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn bare_file_name_uses_current_directory() {
        assert_eq!(parent_dir(Path::new("planner.html")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("css/planner.css")),
            PathBuf::from("css")
        );
    }
}
