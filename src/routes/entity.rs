//! Entity CRUD routes. Parameterized paths hand the segment and id to the
//! handlers, which resolve the entity from the registry.

use crate::handlers::entity::{create, delete as delete_handler, index, list, not_found, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

/// Routes relative to the base path. Unknown verbs on known paths fall back to 404.
pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/:path_segment", get(list).post(create).fallback(not_found))
        .route(
            "/:path_segment/:id",
            get(read)
                .put(update)
                .patch(update)
                .delete(delete_handler)
                .fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state)
}
