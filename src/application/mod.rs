//! Application services: field tables, patch cycles and refresh scheduling.

pub mod cycle;
pub mod error;
pub mod fields;
pub mod jobs;
pub mod ports;
pub mod refresh;
