use std::sync::Arc;

use axum::{routing::get, Router};

use agenda_cell::handlers::AgendaState;
use agenda_cell::router::agenda_routes;
use auth_cell::router::auth_routes;
use office_cell::router::office_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use treatment_cell::router::treatment_routes;

pub fn create_router(config: Arc<AppConfig>, agenda_state: Arc<AgendaState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic agenda API is running!" }))
        .nest("/auth", auth_routes(config.clone()))
        .nest("/appointments", agenda_routes(agenda_state, config.clone()))
        .nest("/patients", patient_routes(config.clone()))
        .nest("/treatments", treatment_routes(config.clone()))
        .nest("/offices", office_routes(config))
}
