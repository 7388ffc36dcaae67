//! Common routes: health, readiness, version.

use crate::handlers::not_found;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    store: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    entities: BTreeMap<String, u64>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    let degraded = || {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                store: "unavailable",
                entities: BTreeMap::new(),
            }),
        )
    };
    if !state.store.is_healthy() {
        return Err(degraded());
    }
    let mut entities = BTreeMap::new();
    for (idx, e) in state.store.model().entities.iter().enumerate() {
        let count = CrudService::count(&state.store, idx).map_err(|_| degraded())?;
        entities.insert(e.path_segment.clone(), count);
    }
    Ok(Json(ReadyBody {
        status: "ok",
        store: "ok",
        entities,
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes including readiness with a store check. Requires AppState.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/ready", get(ready).fallback(not_found))
        .route("/version", get(version).fallback(not_found))
        .with_state(state)
}
