use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use serde::Serialize;
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    /// Remote document store endpoint. When unset the service runs on the
    /// in-memory store, which loses everything on restart.
    pub store_url: Option<String>,
    /// Bearer key for the remote store, read from `/run/secrets`.
    pub store_api_key: Option<String>,
    /// Use conditional merges for the duplicate check instead of the legacy
    /// read-then-write sequence.
    pub atomic_writes: bool,
    pub project_id: String,
}

/// Public store configuration served to browser clients on
/// `/firebase-config`. Never carries the server-side API key.
#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    #[serde(rename = "storeUrl")]
    pub store_url: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "3000"),
            store_url: var("STORE_URL").ok(),
            store_api_key: try_read_secret("STORE_API_KEY"),
            atomic_writes: try_load("ATTENDANCE_ATOMIC_WRITES", "false"),
            project_id: try_load("STORE_PROJECT_ID", "asistencia"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            store_url: self.store_url.clone(),
            project_id: self.project_id.clone(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn try_read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret mounted: {e}");
        })
        .ok()
}
