//! Repository layer.
//!
//! Thin wrappers over `sea-orm` queries. Errors are mapped to `AppError`.

pub mod collaborator_request;
pub mod resource;
pub mod user;

pub use collaborator_request::{CollaboratorRequestRepository, Resolution};
pub use resource::{OwnerTotals, ResourceRepository};
pub use user::UserRepository;
