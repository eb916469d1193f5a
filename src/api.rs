// src/api.rs
//! HTTP surface for the stream orchestrator: followed ids, per-event responses,
//! snapshot diagnostics, and a manual refresh trigger.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::engine::{Explanation, Followed, ReplyEngine};
use crate::model::{InboundEvent, SnapshotStats};
use crate::refresh::refresh_once;
use crate::store::SnapshotSource;

#[derive(Clone)]
pub struct AppState {
    pub engine: ReplyEngine,
    pub source: Arc<dyn SnapshotSource>,
}

impl AppState {
    pub fn new(engine: ReplyEngine, source: Arc<dyn SnapshotSource>) -> Self {
        Self { engine, source }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/followed", get(followed))
        .route("/respond", post(respond))
        .route("/debug/evaluate", post(debug_evaluate))
        .route("/debug/snapshot", get(debug_snapshot))
        .route("/admin/refresh", post(admin_refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct FollowedQuery {
    #[serde(default)]
    as_array: bool,
}

async fn followed(
    State(state): State<AppState>,
    Query(q): Query<FollowedQuery>,
) -> Json<Followed> {
    Json(state.engine.get_followed_account_ids(q.as_array))
}

#[derive(Serialize)]
struct RespondOut {
    event_id: String,
    matched: bool,
    response: Option<String>,
}

async fn respond(
    State(state): State<AppState>,
    Json(event): Json<InboundEvent>,
) -> Json<RespondOut> {
    let response = state.engine.get_response(&event);
    Json(RespondOut {
        event_id: event.event_id,
        matched: response.is_some(),
        response,
    })
}

async fn debug_evaluate(
    State(state): State<AppState>,
    Json(event): Json<InboundEvent>,
) -> Json<Explanation> {
    Json(state.engine.explain(&event))
}

#[derive(Serialize)]
struct SnapshotInfo {
    version: u64,
    retrieved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    stats: SnapshotStats,
}

async fn debug_snapshot(State(state): State<AppState>) -> Json<SnapshotInfo> {
    let snap = state.engine.snapshot();
    Json(SnapshotInfo {
        version: state.engine.version(),
        retrieved_at: snap.retrieved_at(),
        stats: snap.stats(),
    })
}

async fn admin_refresh(State(state): State<AppState>) -> String {
    match refresh_once(&state.engine, state.source.as_ref()).await {
        Ok(v) => format!("reloaded v{v}"),
        Err(e) => format!("failed: {e}"),
    }
}
