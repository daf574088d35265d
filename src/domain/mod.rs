//! Domain layer: documents, marker regions, patches and value rendering.

pub mod document;
pub mod error;
pub mod forecast;
pub mod marker;
pub mod patch;
pub mod render;
pub mod word;
