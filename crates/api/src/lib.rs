//! HTTP API layer for atelier.
//!
//! - **Endpoints**: collaborator onboarding under `/collaborators`
//! - **Extractors**: bearer authentication, capability gates, JSON bodies
//! - **Middleware**: token authentication
//!
//! Every response body uses the bilingual envelope from `atelier-common`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
