//! Traits describing the adapters the refresh services depend on.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{document::Document, forecast::Forecast, word::WordOfDay},
    infra::error::InfraError,
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Document, InfraError>;

    /// Replace the file at `document.path()` with the document's text.
    async fn save(&self, document: &Document) -> Result<(), InfraError>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_forecast(&self) -> Result<Forecast, InfraError>;
}

#[async_trait]
pub trait WordSource: Send + Sync {
    async fn fetch_word(&self) -> Result<WordOfDay, InfraError>;
}

#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// File name (no directory) of the photo to show next.
    async fn choose_photo(&self) -> Result<String, InfraError>;
}
