//! Entity REST: declaration-driven CRUD endpoints over a volatile in-memory store.

pub mod case;
pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{load_from_path, parse_declarations, resolve, EntityConfig, ResolvedModel, Settings};
pub use error::{AppError, ConfigError, SchemaError};
pub use routes::{app, common_routes_with_ready, entity_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{provision, EntityInstance, Store};
