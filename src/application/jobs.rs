//! Periodic refresh loops.

use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, warn};

use crate::{
    application::{error::AppError, refresh::RefreshService},
    config::{RefreshSource, Settings},
};

/// When and how often one source is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub source: RefreshSource,
    pub delay: Duration,
    pub interval: Duration,
}

/// Schedules for every enabled source, staggered in weather, word, photo order.
pub fn refresh_schedules(settings: &Settings, service: &RefreshService) -> Vec<RefreshSchedule> {
    let candidates = [
        (RefreshSource::Weather, settings.weather.reload_interval),
        (RefreshSource::Word, settings.word.reload_interval),
        (RefreshSource::Photo, settings.photos.reload_interval),
    ];

    let mut schedules = Vec::with_capacity(candidates.len());
    for (source, interval) in candidates {
        if !service.is_enabled(source) {
            info!(
                target = "planner::jobs",
                source = source.as_str(),
                "Refresh disabled"
            );
            continue;
        }
        let slot = u32::try_from(schedules.len()).unwrap_or(u32::MAX);
        schedules.push(RefreshSchedule {
            source,
            delay: settings.scheduler.startup_stagger.saturating_mul(slot),
            interval,
        });
    }
    schedules
}

pub fn spawn_refresh_loops(
    service: RefreshService,
    schedules: Vec<RefreshSchedule>,
) -> Vec<JoinHandle<()>> {
    schedules
        .into_iter()
        .map(|schedule| {
            let service = service.clone();
            tokio::spawn(async move { refresh_loop(service, schedule).await })
        })
        .collect()
}

async fn refresh_loop(service: RefreshService, schedule: RefreshSchedule) {
    if !schedule.delay.is_zero() {
        tokio::time::sleep(schedule.delay).await;
    }

    let mut interval = tokio::time::interval(schedule.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        // The first tick completes immediately and performs the initial load.
        interval.tick().await;
        let _ = run_refresh(&service, schedule.source).await;
    }
}

/// Run one refresh and log its outcome.
pub async fn run_refresh(service: &RefreshService, source: RefreshSource) -> Result<(), AppError> {
    match service.refresh(source).await {
        Ok(report) => {
            if !report.skipped.is_empty() {
                warn!(
                    target = "planner::jobs",
                    source = source.as_str(),
                    skipped = report.skipped.len(),
                    "Refresh finished with skipped fields"
                );
            }
            Ok(())
        }
        Err(err) => {
            error!(
                target = "planner::jobs",
                source = source.as_str(),
                error = %err,
                "Refresh failed; retrying on next tick"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono_tz::Tz;

    use super::*;
    use crate::{
        application::{
            cycle::DocumentPatcher,
            ports::{PhotoSource, WeatherSource, WordSource},
            refresh::RefreshTargets,
        },
        config::{CliArgs, load},
        domain::{forecast::Forecast, render::Renderer, word::WordOfDay},
        infra::{error::InfraError, store::FsDocumentStore},
    };
    use clap::Parser;

    struct FixedPhoto;
    struct NoWeather;
    struct NoWord;

    #[async_trait]
    impl WeatherSource for NoWeather {
        async fn fetch_forecast(&self) -> Result<Forecast, InfraError> {
            Err(InfraError::Status {
                status: 503,
                url: "http://forecast.invalid/".to_string(),
            })
        }
    }

    #[async_trait]
    impl WordSource for NoWord {
        async fn fetch_word(&self) -> Result<WordOfDay, InfraError> {
            Ok(WordOfDay::new("gambit"))
        }
    }

    #[async_trait]
    impl PhotoSource for FixedPhoto {
        async fn choose_photo(&self) -> Result<String, InfraError> {
            Ok("lake.jpg".to_string())
        }
    }

    fn service(settings: &Settings) -> RefreshService {
        RefreshService::new(
            DocumentPatcher::new(Arc::new(FsDocumentStore::new())),
            Renderer::new(0, Tz::UTC, vec![':']).expect("renderer"),
            RefreshTargets::from_settings(settings),
            Arc::new(FixedPhoto),
        )
    }

    #[test]
    fn only_enabled_sources_are_scheduled() {
        let cli = CliArgs::parse_from(["planner"]);
        let settings = load(&cli).expect("settings");
        let service = service(&settings);

        let schedules = refresh_schedules(&settings, &service);
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].source, RefreshSource::Photo);
        assert_eq!(schedules[0].delay, Duration::ZERO);
        assert_eq!(schedules[0].interval, Duration::from_secs(600));
    }

    #[test]
    fn enabled_sources_are_staggered() {
        let cli = CliArgs::parse_from(["planner"]);
        let settings = load(&cli).expect("settings");
        let service = service(&settings)
            .with_weather(Arc::new(NoWeather))
            .with_word(Arc::new(NoWord));

        let schedules = refresh_schedules(&settings, &service);
        let order: Vec<_> = schedules.iter().map(|s| s.source).collect();
        assert_eq!(
            order,
            vec![
                RefreshSource::Weather,
                RefreshSource::Word,
                RefreshSource::Photo
            ]
        );
        let delays: Vec<_> = schedules.iter().map(|s| s.delay).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(10),
                Duration::from_secs(20)
            ]
        );
        assert_eq!(schedules[0].interval, Duration::from_secs(3600));
        assert_eq!(schedules[1].interval, Duration::from_secs(24 * 3600));
    }

    #[tokio::test]
    async fn failed_refresh_is_returned_after_logging() {
        let cli = CliArgs::parse_from(["planner"]);
        let settings = load(&cli).expect("settings");
        let service = service(&settings).with_weather(Arc::new(NoWeather));

        let err = run_refresh(&service, RefreshSource::Weather)
            .await
            .expect_err("fetch fails");
        assert!(matches!(err, AppError::Infra(InfraError::Status { status: 503, .. })));

        let err = run_refresh(&service, RefreshSource::Word)
            .await
            .expect_err("word disabled");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
