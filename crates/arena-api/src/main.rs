//! Arena API server entry point.

use std::sync::Arc;
use std::time::Duration;

use arena_api::config::AppConfig;
use arena_api::error::AppError;
use arena_api::routes;
use arena_api::state::AppState;
use arena_api::telemetry;
use arena_core::clock::SystemClock;
use arena_event_store::pg_event_repository::PgEventRepository;
use arena_standing::application::forfeit_scan::{TracingNotifier, scan_standings};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry_guard = telemetry::init(&config)?;

    info!(
        service_name = %config.service_name,
        otlp = telemetry_guard.is_exporting(),
        "Starting Arena API server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    let app_state = AppState::new(
        pool.clone(),
        Arc::new(SystemClock),
        Arc::new(PgEventRepository::new(pool)),
        Arc::new(TracingNotifier),
    );

    if let Some(period) = config.forfeit_scan_interval {
        tokio::spawn(run_forfeit_scans(app_state.clone(), period));
    }

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = config.bind_addr()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Arena API server stopped");
    Ok(())
}

/// Runs the forfeit scan every `period`. A failed pass is logged and the
/// next tick tries again.
async fn run_forfeit_scans(state: AppState, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match scan_standings(
            state.clock.as_ref(),
            &*state.event_repository,
            state.notifier.as_ref(),
        )
        .await
        {
            Ok(report) => info!(
                warned = report.warned.len(),
                forfeited = report.forfeited.len(),
                failed_notifications = report.failed_notifications,
                "forfeit scan finished"
            ),
            Err(e) => error!(error = %e, "forfeit scan failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
