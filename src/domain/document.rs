//! Text documents loaded for a single patch cycle.

use std::path::{Path, PathBuf};

/// An immutable text blob and the path it was loaded from.
///
/// Patching never mutates a document in place; every successful patch yields
/// a new value so patches compose left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    text: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Same path, new contents.
    pub(crate) fn with_text(&self, text: String) -> Self {
        Self {
            path: self.path.clone(),
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_text_keeps_path() {
        let original = Document::new("planner.html", "<p>old</p>");
        let updated = original.with_text("<p>new</p>".to_string());

        assert_eq!(updated.path(), Path::new("planner.html"));
        assert_eq!(updated.text(), "<p>new</p>");
        assert_eq!(original.text(), "<p>old</p>");
    }
}
