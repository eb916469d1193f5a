// src/refresh.rs
//! Snapshot refresh: load a full snapshot off to the side, then publish it in one swap.
//! A failed load keeps the previous snapshot live.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::ReplyEngine;
use crate::error::StoreError;
use crate::store::SnapshotSource;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "selenite_snapshot_refresh_total",
            "Snapshots loaded and published."
        );
        describe_counter!(
            "selenite_snapshot_refresh_errors_total",
            "Snapshot loads that failed (previous snapshot kept)."
        );
    });
}

/// Load once and publish. Returns the new version, or the load error with the old
/// snapshot still in place.
pub async fn refresh_once(
    engine: &ReplyEngine,
    source: &dyn SnapshotSource,
) -> Result<u64, StoreError> {
    ensure_metrics_described();
    match source.load().await {
        Ok(snapshot) => {
            let stats = snapshot.stats();
            let version = engine.publish(snapshot);
            counter!("selenite_snapshot_refresh_total").increment(1);
            info!(
                target: "selenite::refresh",
                source = source.name(),
                version,
                accounts = stats.accounts,
                posts = stats.posts,
                rules = stats.rules,
                "snapshot refreshed"
            );
            Ok(version)
        }
        Err(e) => {
            counter!("selenite_snapshot_refresh_errors_total").increment(1);
            warn!(
                target: "selenite::refresh",
                error = %e,
                source = source.name(),
                kept_version = engine.version(),
                "snapshot refresh failed; keeping previous snapshot"
            );
            Err(e)
        }
    }
}

/// Refresh every `interval`. The first tick is skipped: startup does the initial load.
pub fn spawn_refresh_task(
    engine: ReplyEngine,
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            // Errors are already logged and counted.
            let _ = refresh_once(&engine, source.as_ref()).await;
        }
    })
}
