//! Selenite reply matcher — Binary Entrypoint
//! Loads the rule snapshot, starts the refresh task, and serves the orchestrator API.

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use shuttle_axum::ShuttleAxum;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use selenite::api::{self, AppState};
use selenite::config::AppConfig;
use selenite::engine::ReplyEngine;
use selenite::refresh::{refresh_once, spawn_refresh_task};
use selenite::store::{FileSnapshotSource, SnapshotSource};

/// Compact tracing logs; `RUST_LOG` wins over the default filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("selenite=info,warn"));

    // Shuttle may already have installed a subscriber; ignore that case.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load()?;
    tracing::info!(
        store = %cfg.store.path.display(),
        refresh_secs = cfg.store.refresh_interval_secs,
        "selenite starting"
    );

    // --- Initial snapshot ---
    let engine = ReplyEngine::new();
    let source: Arc<dyn SnapshotSource> = Arc::new(FileSnapshotSource::new(cfg.store.path.clone()));
    if let Err(e) = refresh_once(&engine, source.as_ref()).await {
        // Keep serving: the engine answers NoMatch until a refresh succeeds.
        tracing::warn!(error = %e, "initial snapshot load failed");
    }
    let followed = engine.get_followed_account_ids(false);
    tracing::info!(ids = ?followed.ids, "following accounts");

    let _refresh = spawn_refresh_task(engine.clone(), source.clone(), cfg.refresh_interval());

    // --- Router + /metrics ---
    let mut router = api::router(AppState::new(engine, source));
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            router = router.route(
                "/metrics",
                get(move || {
                    let h = handle.clone();
                    async move { h.render() }
                }),
            );
        }
        Err(e) => tracing::warn!(error = %e, "prometheus recorder not installed"),
    }

    Ok(router.into())
}
