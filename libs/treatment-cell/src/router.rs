// libs/treatment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn treatment_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_treatments))
        .route("/", post(handlers::create_treatment))
        .route("/{treatment_id}", get(handlers::get_treatment))
        .route("/{treatment_id}", put(handlers::update_treatment))
        .route("/{treatment_id}", delete(handlers::delete_treatment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
