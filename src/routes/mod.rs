//! Router assembly: operational routes at the root, entity routes under the base path.

mod common;
mod entity;

pub use common::common_routes_with_ready;
pub use entity::entity_routes;

use crate::handlers::not_found;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Full application router with request tracing, body limit and timeout applied.
pub fn app(state: AppState) -> Router {
    let settings = state.settings.clone();
    let entities = entity_routes(state.clone());
    let router = Router::new().merge(common_routes_with_ready(state));
    let router = if settings.base_path.is_empty() {
        router.merge(entities)
    } else {
        router.nest(&settings.base_path, entities)
    };
    router.fallback(not_found).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(settings.body_limit))
            .layer(TimeoutLayer::new(settings.request_timeout)),
    )
}
