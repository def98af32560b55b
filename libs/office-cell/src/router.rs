// libs/office-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn office_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_offices))
        .route("/", post(handlers::create_office))
        .route("/{office_id}", get(handlers::get_office))
        .route("/{office_id}", put(handlers::update_office))
        .route("/{office_id}", delete(handlers::delete_office))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
