use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod error;
mod records;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(Arc::new(AppState { shared }))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(records::index))
        .route("/", post(records::create_record))
        .route("/ips/", get(records::search_records))
        .route("/ips/{ip}", get(records::get_record))
        .route("/ips/{ip}", put(records::update_record))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
