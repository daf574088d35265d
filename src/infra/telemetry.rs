use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::debug;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_PATCH_APPLIED: &str = "planner_patch_applied_total";
pub const METRIC_PATCH_SKIPPED: &str = "planner_patch_skipped_total";
pub const METRIC_CYCLE_FAILED: &str = "planner_cycle_failed_total";
pub const METRIC_CYCLE_MS: &str = "planner_cycle_ms";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// HTTP plumbing is chatty at debug; keep it at warn unless `RUST_LOG` says otherwise.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Install the global subscriber. Every planner event carries its own `target`
/// field (`planner::cycle`, `planner::refresh`, ...), so the module path is left off.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("{},{QUIET_DEPENDENCIES}", logging.level))
            .map_err(|err| InfraError::telemetry(format!("invalid log filter: {err}")))?,
    };

    let (fmt_layer, format) = match logging.format {
        LogFormat::Json => (
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_target(false)
                .boxed(),
            "json",
        ),
        LogFormat::Compact => (fmt::layer().compact().with_target(false).boxed(), "compact"),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })?;

    debug!(
        target = "planner::telemetry",
        op = "telemetry::init",
        level = %logging.level,
        format,
        "Logging initialised"
    );
    Ok(())
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_PATCH_APPLIED,
            Unit::Count,
            "Total number of fields patched into a document."
        );
        describe_counter!(
            METRIC_PATCH_SKIPPED,
            Unit::Count,
            "Total number of fields skipped because their markers could not be located."
        );
        describe_counter!(
            METRIC_CYCLE_FAILED,
            Unit::Count,
            "Total number of patch cycles aborted by an I/O failure."
        );
        describe_histogram!(
            METRIC_CYCLE_MS,
            Unit::Milliseconds,
            "Patch cycle latency in milliseconds, from load to save."
        );
    });
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn default_filter_parses_for_every_level() {
        for level in [LevelFilter::TRACE, LevelFilter::INFO, LevelFilter::ERROR] {
            let filter = EnvFilter::try_new(format!("{level},{QUIET_DEPENDENCIES}"));
            assert!(filter.is_ok(), "level {level} produced an invalid filter");
        }
    }
}
