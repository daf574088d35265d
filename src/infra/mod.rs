//! Infrastructure adapters and runtime bootstrap.

pub mod dictionary;
pub mod error;
pub mod http;
pub mod photos;
pub mod store;
pub mod telemetry;
pub mod weather;
