//! Refresh services: fetch a source, render its fields, run a patch cycle.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use metrics::counter;
use tracing::warn;

use crate::{
    application::{
        cycle::{CycleReport, DocumentPatcher},
        error::AppError,
        fields::{self, FieldMarkers, MissingField, SpecBatch},
        ports::{PhotoSource, WeatherSource, WordSource},
    },
    config::{RefreshSource, Settings},
    domain::{patch::SkippedField, render::Renderer},
    infra::telemetry::METRIC_CYCLE_FAILED,
};

/// Where each source writes.
#[derive(Debug, Clone)]
pub struct RefreshTargets {
    pub html: PathBuf,
    pub css: PathBuf,
    pub photo_start_marker: String,
    pub photo_stop_marker: String,
}

impl RefreshTargets {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            html: settings.documents.html.clone(),
            css: settings.documents.css.clone(),
            photo_start_marker: settings.photos.start_marker.clone(),
            photo_stop_marker: settings.photos.stop_marker.clone(),
        }
    }
}

/// Per-document result of a marker check.
#[derive(Debug, Clone)]
pub struct DocumentCheck {
    pub path: PathBuf,
    pub checked: usize,
    pub failures: Vec<SkippedField>,
}

#[derive(Clone)]
pub struct RefreshService {
    patcher: DocumentPatcher,
    renderer: Renderer,
    targets: RefreshTargets,
    weather: Option<Arc<dyn WeatherSource>>,
    word: Option<Arc<dyn WordSource>>,
    photos: Arc<dyn PhotoSource>,
}

impl RefreshService {
    /// Photos need no credentials, so the photo source is always present.
    pub fn new(
        patcher: DocumentPatcher,
        renderer: Renderer,
        targets: RefreshTargets,
        photos: Arc<dyn PhotoSource>,
    ) -> Self {
        Self {
            patcher,
            renderer,
            targets,
            weather: None,
            word: None,
            photos,
        }
    }

    pub fn with_weather(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.weather = Some(source);
        self
    }

    pub fn with_word(mut self, source: Arc<dyn WordSource>) -> Self {
        self.word = Some(source);
        self
    }

    pub fn is_enabled(&self, source: RefreshSource) -> bool {
        match source {
            RefreshSource::Weather => self.weather.is_some(),
            RefreshSource::Word => self.word.is_some(),
            RefreshSource::Photo => true,
        }
    }

    pub async fn refresh(&self, source: RefreshSource) -> Result<CycleReport, AppError> {
        let result = match source {
            RefreshSource::Weather => self.refresh_weather().await,
            RefreshSource::Word => self.refresh_word().await,
            RefreshSource::Photo => self.refresh_photo().await,
        };
        if let Err(AppError::Infra(_)) = &result {
            counter!(METRIC_CYCLE_FAILED, "source" => source.as_str()).increment(1);
        }
        result
    }

    async fn refresh_weather(&self) -> Result<CycleReport, AppError> {
        let client = self
            .weather
            .as_ref()
            .ok_or_else(|| disabled("weather", "set weather.key"))?;
        let forecast = client.fetch_forecast().await?;
        let batch = fields::weather_specs(&forecast, &self.renderer);
        self.apply("weather", &self.targets.html, batch).await
    }

    async fn refresh_word(&self) -> Result<CycleReport, AppError> {
        let client = self
            .word
            .as_ref()
            .ok_or_else(|| disabled("word", "set word.key"))?;
        let word = client.fetch_word().await?;
        let batch = fields::word_specs(&word, &self.renderer);
        self.apply("word", &self.targets.html, batch).await
    }

    async fn refresh_photo(&self) -> Result<CycleReport, AppError> {
        let photo = self.photos.choose_photo().await?;
        let spec = fields::photo_spec(
            &photo,
            &self.targets.photo_start_marker,
            &self.targets.photo_stop_marker,
        );
        self.apply(
            "photo",
            &self.targets.css,
            SpecBatch {
                specs: vec![spec],
                missing: Vec::new(),
            },
        )
        .await
    }

    async fn apply(
        &self,
        source: &'static str,
        path: &Path,
        batch: SpecBatch,
    ) -> Result<CycleReport, AppError> {
        for MissingField { field, reason } in &batch.missing {
            warn!(
                target = "planner::refresh",
                op = "refresh::render",
                source,
                field = %field,
                reason = %reason,
                "Value unavailable; field left as is"
            );
        }
        self.patcher.run(source, path, &batch.specs).await
    }

    /// Locate every field's markers in both documents without writing.
    pub async fn check(&self) -> Result<Vec<DocumentCheck>, AppError> {
        let html_fields = fields::html_markers();
        let css_fields = vec![FieldMarkers::new(
            "photo",
            &self.targets.photo_start_marker,
            &self.targets.photo_stop_marker,
        )];

        let mut checks = Vec::with_capacity(2);
        for (path, markers) in [
            (&self.targets.html, html_fields),
            (&self.targets.css, css_fields),
        ] {
            let failures = self.patcher.check(path, &markers).await?;
            checks.push(DocumentCheck {
                path: path.clone(),
                checked: markers.len(),
                failures,
            });
        }
        Ok(checks)
    }
}

fn disabled(source: &str, hint: &str) -> AppError {
    AppError::validation(format!("{source} refresh is disabled: {hint}"))
}
