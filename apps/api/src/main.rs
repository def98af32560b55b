use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use agenda_cell::directory::DocStoreDirectories;
use agenda_cell::handlers::AgendaState;
use agenda_cell::repository::{spawn_change_feed, AppointmentRepository, DocStoreAppointmentRepository};
use agenda_cell::services::booking::BookingEngine;
use shared_config::AppConfig;
use shared_database::DocStoreClient;

const CHANGE_FEED_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic agenda API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // Agenda core: one store client, one cached repository, one engine.
    let store = Arc::new(DocStoreClient::new(&config));
    let repository = Arc::new(DocStoreAppointmentRepository::new(store.clone()));
    if let Err(e) = repository.refresh().await {
        warn!("Initial appointment load failed, starting with empty agenda: {}", e);
    }
    spawn_change_feed(repository.clone(), CHANGE_FEED_INTERVAL);

    let directories = Arc::new(DocStoreDirectories::new(store));
    let agenda_state = Arc::new(AgendaState {
        engine: BookingEngine::new(repository, directories),
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(config, agenda_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .await
        .unwrap();
}
