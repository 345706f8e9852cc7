//! Atelier server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use atelier_api::{middleware::AppState, router as api_router};
use atelier_common::{Config, envelope};
use atelier_core::{CollaboratorService, CollaboratorStatsService, UserService};
use atelier_db::repositories::{CollaboratorRequestRepository, ResourceRepository, UserRepository};
use atelier_db::transition::TransitionStore;
use axum::{Router, middleware};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Wire repositories and services over one connection pool.
fn build_state(db: &Arc<sea_orm::DatabaseConnection>) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(db));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        collaborator_service: CollaboratorService::new(
            TransitionStore::new(Arc::clone(db)),
            CollaboratorRequestRepository::new(Arc::clone(db)),
            user_repo.clone(),
        ),
        collaborator_stats_service: CollaboratorStatsService::new(
            user_repo,
            ResourceRepository::new(Arc::clone(db)),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting atelier server...");

    // Load configuration
    let config = Config::load()?;
    envelope::set_expose_internal_errors(!config.server.is_production());
    info!(
        environment = %config.server.environment,
        url = %config.server.url,
        "Configuration loaded"
    );

    // Connect to database
    let db = atelier_db::init(&config).await?;

    // Run migrations
    info!("Running database migrations...");
    atelier_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let state = build_state(&db);

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            atelier_api::middleware::auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
