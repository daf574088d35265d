use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the planner binary.
#[derive(Debug, Parser)]
#[command(name = "planner", version, about = "Personal dashboard generator")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PLANNER_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub keys: ApiKeys,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// API keys, read for every command including the implicit `serve`.
#[derive(Debug, Args, Default, Clone)]
pub struct ApiKeys {
    /// Weather API key.
    #[arg(
        long = "weather-key",
        env = "PLANNER_WEATHER_KEY",
        value_name = "KEY",
        global = true,
        hide_env_values = true
    )]
    pub weather: Option<String>,

    /// Dictionary API key.
    #[arg(
        long = "word-key",
        env = "PLANNER_WORD_KEY",
        value_name = "KEY",
        global = true,
        hide_env_values = true
    )]
    pub word: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Refresh every source on its own timer until interrupted.
    Serve(Box<ServeArgs>),
    /// Run a single refresh of one source and exit.
    Refresh(RefreshArgs),
    /// Verify that every field's markers can be located in the documents.
    Check(CheckArgs),
}

/// Sources that can be refreshed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RefreshSource {
    Weather,
    Word,
    Photo,
}

impl RefreshSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Word => "word",
            Self::Photo => "photo",
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: RuntimeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct RefreshArgs {
    /// Source to refresh.
    #[arg(value_enum, value_name = "SOURCE")]
    pub source: RefreshSource,

    #[command(flatten)]
    pub overrides: RuntimeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub documents: DocumentOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DocumentOverrides {
    /// Override the HTML document patched with weather and word-of-day values.
    #[arg(long = "documents-html", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub html: Option<PathBuf>,

    /// Override the stylesheet patched with the photo selection.
    #[arg(long = "documents-css", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub css: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
    #[command(flatten)]
    pub documents: DocumentOverrides,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the timezone used for weekday names.
    #[arg(long = "render-timezone", value_name = "TZ")]
    pub render_timezone: Option<String>,

    /// Override the number of decimals shown for measurements.
    #[arg(long = "render-precision", value_name = "DIGITS")]
    pub render_precision: Option<u8>,

    /// Override the weather refresh interval.
    #[arg(long = "weather-reload-hours", value_name = "HOURS")]
    pub weather_reload_hours: Option<u64>,

    /// Override the word-of-day refresh interval.
    #[arg(long = "word-reload-hours", value_name = "HOURS")]
    pub word_reload_hours: Option<u64>,

    /// Override the directory photos are chosen from.
    #[arg(long = "photos-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub photos_directory: Option<PathBuf>,

    /// Override the photo rotation interval.
    #[arg(long = "photos-reload-minutes", value_name = "MINUTES")]
    pub photos_reload_minutes: Option<u64>,

    /// Override the delay between starting consecutive refresh loops.
    #[arg(long = "scheduler-startup-stagger-seconds", value_name = "SECONDS")]
    pub scheduler_startup_stagger_seconds: Option<u64>,
}
