//! Database entities.

#![allow(missing_docs)]

pub mod collaborator_request;
pub mod resource;
pub mod user;

pub use collaborator_request::Entity as CollaboratorRequest;
pub use resource::Entity as Resource;
pub use user::Entity as User;
