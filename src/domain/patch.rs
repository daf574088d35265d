//! Span patching: replace the region between two markers with a new value.

use super::{document::Document, error::PatchError, marker::locate};

/// One field to patch: the marker pair and the already rendered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSpec {
    field: String,
    start_marker: String,
    stop_marker: String,
    value: String,
}

impl PatchSpec {
    pub fn new(
        field: impl Into<String>,
        start_marker: impl Into<String>,
        stop_marker: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            start_marker: start_marker.into(),
            stop_marker: stop_marker.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn start_marker(&self) -> &str {
        &self.start_marker
    }

    pub fn stop_marker(&self) -> &str {
        &self.stop_marker
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Reject empty markers before any document is touched.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.start_marker.is_empty() || self.stop_marker.is_empty() {
            return Err(PatchError::invalid_marker(self.field.as_str()));
        }
        Ok(())
    }

    /// The text written over the old region: start marker, value, stop marker.
    pub fn replacement(&self) -> String {
        let mut out = String::with_capacity(
            self.start_marker.len() + self.value.len() + self.stop_marker.len(),
        );
        out.push_str(&self.start_marker);
        out.push_str(&self.value);
        out.push_str(&self.stop_marker);
        out
    }
}

/// Apply a single patch and return the resulting document.
///
/// The located region starts with the first occurrence of the start marker,
/// so splicing at the region is the same as replacing the first occurrence of
/// the region's text.
pub fn patch(document: &Document, spec: &PatchSpec) -> Result<Document, PatchError> {
    spec.validate()?;
    let text = document.text();
    let region = locate(text, spec.start_marker(), spec.stop_marker())?;
    let replacement = spec.replacement();

    let mut patched = String::with_capacity(text.len() - region.len() + replacement.len());
    patched.push_str(&text[..region.start()]);
    patched.push_str(&replacement);
    patched.push_str(&text[region.end()..]);

    Ok(document.with_text(patched))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    pub field: String,
    pub error: PatchError,
}

/// Outcome of applying a list of specs to one document.
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub document: Document,
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedField>,
    pub changed: bool,
}

/// Apply every spec in order, skipping fields whose markers cannot be located.
///
/// Each spec locates its region against the output of the previous one, so
/// offsets shifted by earlier patches never leak into later ones.
pub fn apply_all(document: Document, specs: &[PatchSpec]) -> PatchReport {
    let mut current = document.clone();
    let mut applied = Vec::with_capacity(specs.len());
    let mut skipped = Vec::new();

    for spec in specs {
        match patch(&current, spec) {
            Ok(next) => {
                current = next;
                applied.push(spec.field().to_string());
            }
            Err(error) => skipped.push(SkippedField {
                field: spec.field().to_string(),
                error,
            }),
        }
    }

    let changed = current.text() != document.text();
    PatchReport {
        document: current,
        applied,
        skipped,
        changed,
    }
}
