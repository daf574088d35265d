use std::{process, sync::Arc};

use planner::{
    application::{
        cycle::DocumentPatcher,
        error::{AppError, ErrorReport},
        jobs,
        refresh::{RefreshService, RefreshTargets},
    },
    config::{self, Command, RefreshSource, Settings},
    domain::render::Renderer,
    infra::{
        dictionary::DictionaryClient, error::InfraError, http, photos::PhotoLibrary,
        store::FsDocumentStore, telemetry, weather::WeatherClient,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("main", error);
    if dispatcher::has_been_set() {
        error!(error = %report.joined(), "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.joined(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    let service = build_refresh_service(&settings)?;

    match command {
        Command::Serve(_) => run_serve(&settings, service).await,
        Command::Refresh(args) => run_refresh(&service, args.source).await,
        Command::Check(_) => run_check(&service).await,
    }
}

fn build_refresh_service(settings: &Settings) -> Result<RefreshService, AppError> {
    let renderer = Renderer::new(
        settings.render.precision,
        settings.render.timezone,
        settings.word.strip_chars.clone(),
    )?;
    let patcher = DocumentPatcher::new(Arc::new(FsDocumentStore::new()));
    let client = http::build_client(&settings.http)?;

    let mut service = RefreshService::new(
        patcher,
        renderer,
        RefreshTargets::from_settings(settings),
        Arc::new(PhotoLibrary::new(&settings.photos.directory)),
    );

    if settings.weather.key.is_some() {
        let weather = WeatherClient::new(client.clone(), &settings.weather)?;
        service = service.with_weather(Arc::new(weather));
    }
    if settings.word.key.is_some() {
        let word = DictionaryClient::new(client, &settings.word)?;
        service = service.with_word(Arc::new(word));
    }
    Ok(service)
}

async fn run_serve(settings: &Settings, service: RefreshService) -> Result<(), AppError> {
    let schedules = jobs::refresh_schedules(settings, &service);
    info!(
        target = "planner::serve",
        sources = schedules.len(),
        html = %settings.documents.html.display(),
        css = %settings.documents.css.display(),
        "Starting refresh loops"
    );

    let handles = jobs::spawn_refresh_loops(service, schedules);
    let signal = tokio::signal::ctrl_c().await.map_err(InfraError::from);

    for handle in &handles {
        handle.abort();
    }
    for handle in handles {
        let _ = handle.await;
    }

    signal?;
    info!(target = "planner::serve", "Shutdown complete");
    Ok(())
}

async fn run_refresh(service: &RefreshService, source: RefreshSource) -> Result<(), AppError> {
    info!(
        target = "planner::refresh",
        source = source.as_str(),
        "Running single refresh"
    );
    jobs::run_refresh(service, source).await
}

async fn run_check(service: &RefreshService) -> Result<(), AppError> {
    let checks = service.check().await?;

    let mut failed = 0usize;
    for check in &checks {
        for failure in &check.failures {
            warn!(
                target = "planner::check",
                path = %check.path.display(),
                field = %failure.field,
                code = failure.error.code(),
                error = %failure.error,
                "Field cannot be patched"
            );
        }
        failed += check.failures.len();
        info!(
            target = "planner::check",
            path = %check.path.display(),
            checked = check.checked,
            failed = check.failures.len(),
            "Checked document"
        );
    }

    if failed > 0 {
        return Err(AppError::validation(format!(
            "{failed} field(s) cannot be located"
        )));
    }
    Ok(())
}
