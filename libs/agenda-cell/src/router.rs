// libs/agenda-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, AgendaState};

pub fn agenda_routes(state: Arc<AgendaState>, config: Arc<AppConfig>) -> Router {
    // Every agenda operation sits behind the authentication gate.
    let protected_routes = Router::new()
        // Lifecycle operations
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", put(handlers::edit_appointment))
        .route("/{appointment_id}", delete(handlers::delete_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/reassign", post(handlers::reassign_appointment))
        // Grid projections
        .route("/week", get(handlers::week_view))
        .route("/days/{date}", get(handlers::day_view))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
