//! Forecast service client.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{info, warn};

use crate::{
    application::ports::WeatherSource, config::WeatherSettings, domain::forecast::Forecast,
};

use super::{error::InfraError, http};

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    endpoint: Url,
    snapshot_path: Option<PathBuf>,
}

impl WeatherClient {
    /// Build a client for the configured location. Fails when no API key is set.
    pub fn new(client: Client, settings: &WeatherSettings) -> Result<Self, InfraError> {
        let key = settings
            .key
            .as_deref()
            .ok_or_else(|| InfraError::configuration("weather.key is not set"))?;
        let endpoint = forecast_url(
            &settings.url,
            key,
            &settings.latitude,
            &settings.longitude,
            &settings.excludes,
        )?;
        Ok(Self {
            client,
            endpoint,
            snapshot_path: settings.snapshot_path.clone(),
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_forecast(&self) -> Result<Forecast, InfraError> {
        let body = http::get_bytes(&self.client, self.endpoint.clone()).await?;

        let mut forecast: Forecast = serde_json::from_slice(&body)
            .map_err(|err| InfraError::decode("forecast", err.to_string()))?;
        forecast.truncate_days();

        if let Some(path) = &self.snapshot_path {
            if let Err(err) = write_snapshot(path, &body).await {
                warn!(
                    target = "planner::weather",
                    op = "weather::snapshot",
                    path = %path.display(),
                    error = %err,
                    "Failed to write forecast snapshot"
                );
            }
        }

        info!(
            target = "planner::weather",
            op = "weather::fetch",
            days = forecast.daily.data.len(),
            "Fetched forecast"
        );
        Ok(forecast)
    }
}

/// `{base}{key}/{latitude},{longitude}?{excludes}`
pub fn forecast_url(
    base: &Url,
    key: &str,
    latitude: &str,
    longitude: &str,
    excludes: &str,
) -> Result<Url, InfraError> {
    let base = http::with_trailing_slash(base);
    let mut url = base
        .join(&format!("{key}/{latitude},{longitude}"))
        .map_err(|err| InfraError::configuration(format!("invalid forecast url: {err}")))?;
    let excludes = excludes.trim_start_matches('?');
    url.set_query((!excludes.is_empty()).then_some(excludes));
    Ok(url)
}

async fn write_snapshot(path: &Path, body: &[u8]) -> Result<(), InfraError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| InfraError::decode("forecast snapshot", err.to_string()))?;
    let pretty = serde_json::to_vec_pretty(&value)
        .map_err(|err| InfraError::decode("forecast snapshot", err.to_string()))?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, pretty)
        .await
        .map_err(|source| InfraError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_key_location_and_excludes() {
        let base = Url::parse("https://api.darksky.net/forecast/").unwrap();
        let url = forecast_url(
            &base,
            "abc123",
            "39.7684",
            "-86.1581",
            "exclude=minutely,hourly,alerts,flags",
        )
        .expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.darksky.net/forecast/abc123/39.7684,-86.1581?exclude=minutely,hourly,alerts,flags"
        );
    }

    #[test]
    fn base_without_slash_and_empty_excludes() {
        let base = Url::parse("http://127.0.0.1:9000/forecast").unwrap();
        let url = forecast_url(&base, "k", "1", "2", "").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/forecast/k/1,2");
    }
}
