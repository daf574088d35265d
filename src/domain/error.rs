use thiserror::Error;

/// Failures raised while locating or replacing a marker-delimited span.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("marker for field `{field}` must not be empty")]
    InvalidMarker { field: String },
    #[error("marker `{marker}` not found in document")]
    MarkerNotFound { marker: String },
    #[error(
        "markers `{start}` .. `{stop}` produce a degenerate region (start at {start_offset}, stop at {stop_offset})"
    )]
    DegenerateRegion {
        start: String,
        stop: String,
        start_offset: usize,
        stop_offset: usize,
    },
}

impl PatchError {
    pub fn invalid_marker(field: impl Into<String>) -> Self {
        Self::InvalidMarker {
            field: field.into(),
        }
    }

    pub fn marker_not_found(marker: impl Into<String>) -> Self {
        Self::MarkerNotFound {
            marker: marker.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMarker { .. } => "invalid_marker",
            Self::MarkerNotFound { .. } => "marker_not_found",
            Self::DegenerateRegion { .. } => "degenerate_region",
        }
    }
}

/// Failures raised while formatting a value for a span.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RenderError {
    #[error("value {value} is not a finite number")]
    NonFinite { value: f64 },
    #[error("timestamp {timestamp} is outside the supported range")]
    TimestampOutOfRange { timestamp: i64 },
    #[error("precision {precision} exceeds the supported maximum of {max}")]
    Precision { precision: u8, max: u8 },
}
