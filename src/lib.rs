//! Attendance registration backend.
//!
//! One POST endpoint records a student's attendance for a course on the
//! current day, backed by an external document database. The per-day
//! attendance document for a course aggregates every student's entry, so
//! registering is a lookup, a duplicate check, and a single-field merge.
//!
//! # Infrastructure
//! - Frontend fetches `/firebase-config` on load and builds its own store
//!   handle from it (see [`bootstrap`])
//! - Backend talks to the document store over plain JSON REST
//! - Without a `STORE_URL` the backend keeps documents in memory, which is
//!   only useful for local runs and tests
//!
//! # Notes
//!
//! ## Why one document per (course, date)
//!
//! A class worth of entries is small and always read together, so a single
//! document keyed by date keeps the duplicate check to one read and the
//! write to one field merge. Per-student documents would turn "who was here
//! today" into a fan-out query for no benefit at this scale.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod registrar;
pub mod routes;
pub mod state;
pub mod store;

use routes::{health_handler, register_handler, store_config_handler};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/asistencia/registrar", post(register_handler))
        .route("/firebase-config", get(store_config_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
