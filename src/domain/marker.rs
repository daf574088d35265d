//! Marker lookup over plain text documents.
//!
//! A region is the byte range from the first occurrence of the start marker
//! through the end of the first occurrence of the stop marker. Both markers
//! are searched over the whole document, so a stop marker that also appears
//! before the start marker makes the region inverted and it is rejected.

use std::ops::Range;

use super::error::PatchError;

/// Byte offsets of a located region, inclusive of both markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRegion {
    start: usize,
    inner_start: usize,
    inner_end: usize,
    end: usize,
}

impl MarkerRegion {
    /// Offset of the first byte of the start marker.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset immediately after the last byte of the stop marker.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Range of the current value between the two markers.
    pub fn inner_range(&self) -> Range<usize> {
        self.inner_start..self.inner_end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Locate the region bounded by `start_marker` and `stop_marker`.
pub fn locate(
    text: &str,
    start_marker: &str,
    stop_marker: &str,
) -> Result<MarkerRegion, PatchError> {
    if start_marker.is_empty() {
        return Err(PatchError::invalid_marker("start marker"));
    }
    if stop_marker.is_empty() {
        return Err(PatchError::invalid_marker("stop marker"));
    }

    let start = text
        .find(start_marker)
        .ok_or_else(|| PatchError::marker_not_found(start_marker))?;
    let stop = text
        .find(stop_marker)
        .ok_or_else(|| PatchError::marker_not_found(stop_marker))?;

    let inner_start = start + start_marker.len();
    if stop < inner_start {
        return Err(PatchError::DegenerateRegion {
            start: start_marker.to_string(),
            stop: stop_marker.to_string(),
            start_offset: start,
            stop_offset: stop,
        });
    }

    Ok(MarkerRegion {
        start,
        inner_start,
        inner_end: stop,
        end: stop + stop_marker.len(),
    })
}

/// Return the text currently held between the two markers.
pub fn extract_between<'a>(
    text: &'a str,
    start_marker: &str,
    stop_marker: &str,
) -> Result<&'a str, PatchError> {
    let region = locate(text, start_marker, stop_marker)?;
    Ok(&text[region.inner_range()])
}
