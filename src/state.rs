use std::sync::Arc;

use tracing::warn;

use crate::{
    config::Config,
    registrar::AttendanceRegistrar,
    store::{DocumentStore, HttpStore, MemoryStore},
};

pub struct AppState {
    pub config: Config,
    pub registrar: AttendanceRegistrar,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let store: Arc<dyn DocumentStore> = match &config.store_url {
            Some(url) => Arc::new(HttpStore::new(url, config.store_api_key.clone())),
            None => {
                warn!("STORE_URL not set, falling back to the in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        let registrar = AttendanceRegistrar::new(store, config.atomic_writes);

        Arc::new(Self { config, registrar })
    }
}
