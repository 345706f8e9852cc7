//! API middleware.

#![allow(missing_docs)]

use atelier_core::{CollaboratorService, CollaboratorStatsService, UserService};
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub collaborator_service: CollaboratorService,
    pub collaborator_stats_service: CollaboratorStatsService,
}

/// Authentication middleware.
///
/// Attaches the account for a valid bearer token; handlers decide whether
/// authentication is required. A storage failure during the lookup ends the
/// request with the server error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Bearer token lookup failed");
                return e.into_response();
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
