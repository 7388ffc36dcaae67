//! Entity REST server: reads settings from the environment (and `.env`),
//! provisions the in-memory store from the declarations file, and serves it.
//!
//! Run from repo root: `cargo run -p entity-rest-server`
//! with `ENTITY_REST_SCHEMA_PATH=server/schema/entities.json`.

use entity_rest::{app, load_from_path, provision, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_rest=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let declarations = load_from_path(&settings.schema_path).await?;
    let store = provision(&declarations)?;
    settings.check_mount(store.model())?;
    tracing::info!(
        entities = store.model().entities.len(),
        base_path = %settings.index_path(),
        "store provisioned"
    );

    let listener = TcpListener::bind(&settings.bind).await?;
    let state = AppState::new(store, settings);
    let router = app(state);
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down; in-memory store discarded");
}
