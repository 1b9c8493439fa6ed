pub mod draft;
pub mod health;
pub mod params;
pub mod taxi;

use crate::config::Config;
use crate::db::Repository;
use crate::orchestration::{OwnershipService, TaxiService};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub taxi: Arc<TaxiService>,
    pub ownership: Arc<OwnershipService>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        taxi: Arc<TaxiService>,
        ownership: Arc<OwnershipService>,
        config: Config,
    ) -> Self {
        Self {
            repo,
            taxi,
            ownership,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/taxi/validate", get(taxi::validate))
        .route("/v1/taxi/snapshots", get(taxi::list_snapshots))
        .route("/v1/taxi/snapshots.csv", get(taxi::export_snapshots_csv))
        .route("/v1/admin/taxi/runs", post(taxi::trigger_run))
        .route("/v1/draft/ownership", get(draft::get_ownership))
        .layer(cors)
        .with_state(state)
}
