//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::render::MAX_PRECISION;

mod cli;

pub use cli::{
    ApiKeys, CheckArgs, CliArgs, Command, DocumentOverrides, RefreshArgs, RefreshSource,
    RuntimeOverrides, ServeArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "planner";
const DEFAULT_HTML_DOCUMENT: &str = "planner.html";
const DEFAULT_CSS_DOCUMENT: &str = "css/planner.css";
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_PRECISION: u8 = 0;
const DEFAULT_WEATHER_URL: &str = "https://api.darksky.net/forecast/";
const DEFAULT_WEATHER_EXCLUDES: &str = "exclude=minutely,hourly,alerts,flags";
const DEFAULT_WEATHER_RELOAD_HOURS: u64 = 1;
const DEFAULT_WORD_RSS_URL: &str = "https://www.merriam-webster.com/wotd/feed/rss2";
const DEFAULT_WORD_DICTIONARY_URL: &str =
    "https://www.dictionaryapi.com/api/v1/references/collegiate/xml/";
const DEFAULT_WORD_RELOAD_HOURS: u64 = 24;
const DEFAULT_WORD_STRIP_CHARS: &str = ":";
const DEFAULT_PHOTOS_DIR: &str = "photos";
const DEFAULT_PHOTOS_RELOAD_MINUTES: u64 = 10;
pub const DEFAULT_PHOTO_START_MARKER: &str = "background: url(../photos/";
pub const DEFAULT_PHOTO_STOP_MARKER: &str = ") no-repeat center center fixed";
const DEFAULT_STARTUP_STAGGER_SECS: u64 = 10;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub documents: DocumentSettings,
    pub render: RenderSettings,
    pub weather: WeatherSettings,
    pub word: WordSettings,
    pub photos: PhotoSettings,
    pub scheduler: SchedulerSettings,
    pub http: HttpSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DocumentSettings {
    pub html: PathBuf,
    pub css: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub timezone: Tz,
    pub precision: u8,
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub url: Url,
    /// No key disables the weather source.
    pub key: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub excludes: String,
    pub reload_interval: Duration,
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct WordSettings {
    pub rss_url: Url,
    pub dictionary_url: Url,
    /// No key disables the word-of-day source.
    pub key: Option<String>,
    pub reload_interval: Duration,
    pub strip_chars: Vec<char>,
}

#[derive(Debug, Clone)]
pub struct PhotoSettings {
    pub directory: PathBuf,
    pub reload_interval: Duration,
    pub start_marker: String,
    pub stop_marker: String,
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub startup_stagger: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("PLANNER").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_cli(cli);
    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    documents: RawDocumentSettings,
    render: RawRenderSettings,
    weather: RawWeatherSettings,
    word: RawWordSettings,
    photos: RawPhotoSettings,
    scheduler: RawSchedulerSettings,
    http: RawHttpSettings,
}

impl RawSettings {
    fn apply_cli(&mut self, cli: &CliArgs) {
        self.apply_api_keys(&cli.keys);
        match cli.command.as_ref() {
            Some(Command::Serve(args)) => self.apply_runtime_overrides(&args.overrides),
            Some(Command::Refresh(args)) => self.apply_runtime_overrides(&args.overrides),
            Some(Command::Check(args)) => self.apply_document_overrides(&args.documents),
            None => {}
        }
    }

    fn apply_api_keys(&mut self, keys: &ApiKeys) {
        if let Some(key) = keys.weather.as_ref() {
            self.weather.key = Some(key.clone());
        }
        if let Some(key) = keys.word.as_ref() {
            self.word.key = Some(key.clone());
        }
    }

    fn apply_runtime_overrides(&mut self, overrides: &RuntimeOverrides) {
        self.apply_document_overrides(&overrides.documents);
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(timezone) = overrides.render_timezone.as_ref() {
            self.render.timezone = Some(timezone.clone());
        }
        if let Some(precision) = overrides.render_precision {
            self.render.precision = Some(precision);
        }
        if let Some(hours) = overrides.weather_reload_hours {
            self.weather.reload_hours = Some(hours);
        }
        if let Some(hours) = overrides.word_reload_hours {
            self.word.reload_hours = Some(hours);
        }
        if let Some(directory) = overrides.photos_directory.as_ref() {
            self.photos.directory = Some(directory.clone());
        }
        if let Some(minutes) = overrides.photos_reload_minutes {
            self.photos.reload_minutes = Some(minutes);
        }
        if let Some(seconds) = overrides.scheduler_startup_stagger_seconds {
            self.scheduler.startup_stagger_seconds = Some(seconds);
        }
    }

    fn apply_document_overrides(&mut self, overrides: &DocumentOverrides) {
        if let Some(path) = overrides.html.as_ref() {
            self.documents.html = Some(path.clone());
        }
        if let Some(path) = overrides.css.as_ref() {
            self.documents.css = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            documents,
            render,
            weather,
            word,
            photos,
            scheduler,
            http,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            documents: build_document_settings(documents)?,
            render: build_render_settings(render)?,
            weather: build_weather_settings(weather)?,
            word: build_word_settings(word)?,
            photos: build_photo_settings(photos)?,
            scheduler: build_scheduler_settings(scheduler),
            http: build_http_settings(http)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_document_settings(documents: RawDocumentSettings) -> Result<DocumentSettings, LoadError> {
    let html = documents
        .html
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_DOCUMENT));
    if html.as_os_str().is_empty() {
        return Err(LoadError::invalid("documents.html", "path must not be empty"));
    }

    let css = documents
        .css
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSS_DOCUMENT));
    if css.as_os_str().is_empty() {
        return Err(LoadError::invalid("documents.css", "path must not be empty"));
    }

    Ok(DocumentSettings { html, css })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let name = render
        .timezone
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = name.trim().parse::<Tz>().map_err(|err| {
        LoadError::invalid("render.timezone", format!("unknown timezone `{name}`: {err}"))
    })?;

    let precision = render.precision.unwrap_or(DEFAULT_PRECISION);
    if precision > MAX_PRECISION {
        return Err(LoadError::invalid(
            "render.precision",
            format!("must be at most {MAX_PRECISION}"),
        ));
    }

    Ok(RenderSettings {
        timezone,
        precision,
    })
}

fn build_weather_settings(weather: RawWeatherSettings) -> Result<WeatherSettings, LoadError> {
    let url = parse_url(weather.url.as_deref(), DEFAULT_WEATHER_URL, "weather.url")?;
    let key = non_blank(weather.key);
    let latitude = weather.latitude.unwrap_or_default().trim().to_string();
    let longitude = weather.longitude.unwrap_or_default().trim().to_string();

    if key.is_some() {
        if latitude.is_empty() {
            return Err(LoadError::invalid(
                "weather.latitude",
                "required when weather.key is set",
            ));
        }
        if longitude.is_empty() {
            return Err(LoadError::invalid(
                "weather.longitude",
                "required when weather.key is set",
            ));
        }
    }

    let excludes = weather
        .excludes
        .unwrap_or_else(|| DEFAULT_WEATHER_EXCLUDES.to_string());
    let hours = weather
        .reload_hours
        .unwrap_or(DEFAULT_WEATHER_RELOAD_HOURS);
    let reload_interval = hours_interval(hours, "weather.reload_hours")?;

    Ok(WeatherSettings {
        url,
        key,
        latitude,
        longitude,
        excludes,
        reload_interval,
        snapshot_path: weather
            .snapshot_path
            .filter(|path| !path.as_os_str().is_empty()),
    })
}

fn build_word_settings(word: RawWordSettings) -> Result<WordSettings, LoadError> {
    let rss_url = parse_url(word.rss_url.as_deref(), DEFAULT_WORD_RSS_URL, "word.rss_url")?;
    let dictionary_url = parse_url(
        word.dictionary_url.as_deref(),
        DEFAULT_WORD_DICTIONARY_URL,
        "word.dictionary_url",
    )?;
    let hours = word.reload_hours.unwrap_or(DEFAULT_WORD_RELOAD_HOURS);
    let reload_interval = hours_interval(hours, "word.reload_hours")?;
    let strip_chars = word
        .strip_chars
        .unwrap_or_else(|| DEFAULT_WORD_STRIP_CHARS.to_string())
        .chars()
        .collect();

    Ok(WordSettings {
        rss_url,
        dictionary_url,
        key: non_blank(word.key),
        reload_interval,
        strip_chars,
    })
}

fn build_photo_settings(photos: RawPhotoSettings) -> Result<PhotoSettings, LoadError> {
    let directory = photos
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PHOTOS_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid("photos.directory", "path must not be empty"));
    }

    let minutes = photos
        .reload_minutes
        .unwrap_or(DEFAULT_PHOTOS_RELOAD_MINUTES);
    if minutes == 0 {
        return Err(LoadError::invalid(
            "photos.reload_minutes",
            "must be greater than zero",
        ));
    }

    let start_marker = photos
        .start_marker
        .unwrap_or_else(|| DEFAULT_PHOTO_START_MARKER.to_string());
    if start_marker.is_empty() {
        return Err(LoadError::invalid(
            "photos.start_marker",
            "marker must not be empty",
        ));
    }
    let stop_marker = photos
        .stop_marker
        .unwrap_or_else(|| DEFAULT_PHOTO_STOP_MARKER.to_string());
    if stop_marker.is_empty() {
        return Err(LoadError::invalid(
            "photos.stop_marker",
            "marker must not be empty",
        ));
    }

    Ok(PhotoSettings {
        directory,
        reload_interval: Duration::from_secs(minutes.saturating_mul(60)),
        start_marker,
        stop_marker,
    })
}

fn build_scheduler_settings(scheduler: RawSchedulerSettings) -> SchedulerSettings {
    let seconds = scheduler
        .startup_stagger_seconds
        .unwrap_or(DEFAULT_STARTUP_STAGGER_SECS);
    SchedulerSettings {
        startup_stagger: Duration::from_secs(seconds),
    }
}

fn build_http_settings(http: RawHttpSettings) -> Result<HttpSettings, LoadError> {
    let seconds = http.timeout_seconds.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    if seconds == 0 {
        return Err(LoadError::invalid(
            "http.timeout_seconds",
            "must be greater than zero",
        ));
    }
    Ok(HttpSettings {
        timeout: Duration::from_secs(seconds),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocumentSettings {
    html: Option<PathBuf>,
    css: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    timezone: Option<String>,
    precision: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWeatherSettings {
    url: Option<String>,
    key: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    excludes: Option<String>,
    reload_hours: Option<u64>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWordSettings {
    rss_url: Option<String>,
    dictionary_url: Option<String>,
    key: Option<String>,
    reload_hours: Option<u64>,
    strip_chars: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPhotoSettings {
    directory: Option<PathBuf>,
    reload_minutes: Option<u64>,
    start_marker: Option<String>,
    stop_marker: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSchedulerSettings {
    startup_stagger_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHttpSettings {
    timeout_seconds: Option<u64>,
}

fn parse_url(value: Option<&str>, default: &str, key: &'static str) -> Result<Url, LoadError> {
    let candidate = value.map(str::trim).unwrap_or(default);
    Url::parse(candidate).map_err(|err| LoadError::invalid(key, format!("`{candidate}`: {err}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn hours_interval(hours: u64, key: &'static str) -> Result<Duration, LoadError> {
    if hours == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| LoadError::invalid(key, "value exceeds supported range"))
}
