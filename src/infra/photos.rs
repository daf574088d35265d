//! Photo directory listing and random selection.

use std::path::PathBuf;

use async_trait::async_trait;
use rand::{Rng, seq::IndexedRandom};
use tracing::debug;

use crate::application::ports::PhotoSource;

use super::error::InfraError;

#[derive(Debug, Clone)]
pub struct PhotoLibrary {
    directory: PathBuf,
}

impl PhotoLibrary {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Names of every usable photo, sorted.
    ///
    /// Hidden files, directories and names that cannot sit unquoted inside a
    /// CSS `url(...)` are left out.
    pub fn list(&self) -> Result<Vec<String>, InfraError> {
        let entries = std::fs::read_dir(&self.directory).map_err(|source| InfraError::Read {
            path: self.directory.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_usable_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Pick one photo with the supplied random source.
    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, InfraError> {
        let names = self.list()?;
        names
            .choose(rng)
            .cloned()
            .ok_or_else(|| InfraError::EmptyPhotoDirectory {
                path: self.directory.clone(),
            })
    }
}

#[async_trait]
impl PhotoSource for PhotoLibrary {
    async fn choose_photo(&self) -> Result<String, InfraError> {
        let library = self.clone();
        let name = tokio::task::spawn_blocking(move || library.pick_with(&mut rand::rng()))
            .await
            .map_err(|err| InfraError::Io(std::io::Error::other(err)))??;
        debug!(
            target = "planner::photos",
            op = "photos::choose",
            photo = %name,
            "Chose photo"
        );
        Ok(name)
    }
}

fn is_usable_name(name: &str) -> bool {
    !name.starts_with('.')
        && !name.chars().any(|ch| {
            ch.is_whitespace() || ch.is_control() || matches!(ch, '(' | ')' | '\'' | '"' | '\\')
        })
}
