//! Request extractors.

use std::marker::PhantomData;

use atelier_common::AppError;
use atelier_core::Capability;
use atelier_db::entities::user;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Marker for a capability checked by [`Authorized`].
pub trait Gate: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

/// Capability markers.
pub mod gate {
    use super::{Capability, Gate};

    /// Administrators only.
    #[derive(Debug, Clone, Copy)]
    pub struct Admin;

    /// Approved collaborators only.
    #[derive(Debug, Clone, Copy)]
    pub struct ApprovedCollaborator;

    impl Gate for Admin {
        const CAPABILITY: Capability = Capability::Admin;
    }

    impl Gate for ApprovedCollaborator {
        const CAPABILITY: Capability = Capability::ApprovedCollaborator;
    }
}

/// Authenticated user holding the capability named by `G`.
#[derive(Debug, Clone)]
pub struct Authorized<G: Gate>(pub user::Model, PhantomData<G>);

impl<G: Gate> Authorized<G> {
    /// The authorized account.
    #[must_use]
    pub fn into_inner(self) -> user::Model {
        self.0
    }
}

impl<S, G> FromRequestParts<S> for Authorized<G>
where
    S: Send + Sync,
    G: Gate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        G::CAPABILITY.authorize(&user)?;
        Ok(Self(user, PhantomData))
    }
}

/// JSON body extractor whose rejections use the error envelope.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Validation(match rejection {
                JsonRejection::JsonDataError(e) => e.body_text(),
                JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".to_string(),
                JsonRejection::MissingJsonContentType(_) => {
                    "Missing Content-Type: application/json header".to_string()
                }
                _ => "Failed to read request body".to_string(),
            })),
        }
    }
}
