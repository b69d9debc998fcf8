use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;
use crate::model::EligibilityModel;

pub mod auth;
pub mod eligibility;
mod error;
pub mod patients;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

/// Explicitly injected handler dependencies: the shared store handle, the
/// classifier artifact (immutable after startup) and the validated config.
pub struct AppState {
    config: Config,

    store: Store,

    model: Arc<EligibilityModel>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn model(&self) -> &EligibilityModel {
        &self.model
    }
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    store
        .ensure_admin_user(&config.auth.admin_username, &config.auth.admin_password)
        .await?;

    let model = EligibilityModel::load(Path::new(&config.model.path))
        .map_err(|e| anyhow::anyhow!("Failed to load eligibility model: {e}"))?;

    Ok(Arc::new(AppState {
        config,
        store,
        model: Arc::new(model),
        start_time: std::time::Instant::now(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_ttl_minutes,
        )));

    // Credentialed CORS needs explicit origins/methods/headers; a "*"
    // entry falls back to wildcard without credentials.
    let cors_layer = if server.cors_allowed_origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
    };

    Router::new()
        .route("/", get(system::home))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/patient_form", post(patients::submit_form))
        .route("/admin_dashboard", get(patients::admin_dashboard))
        .route("/check/{patient_id}", get(eligibility::check_eligibility))
        .route("/logout", post(auth::logout))
        .route("/check_session", get(auth::check_session))
        .route("/testdb", get(system::testdb))
        .layer(session_layer)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
