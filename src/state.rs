//! Shared application state for all routes. Store and settings are fixed after startup.

use crate::config::Settings;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Store, settings: Settings) -> Self {
        AppState {
            store: Arc::new(store),
            settings: Arc::new(settings),
        }
    }
}
