//! Business logic services.

#![allow(missing_docs)]

pub mod authorization;
pub mod collaborator;
pub mod collaborator_stats;
pub mod user;

pub use authorization::Capability;
pub use collaborator::{
    ApplicantSummary, CollaboratorService, RequestView, ResolverSummary, SubmitApplicationInput,
};
pub use collaborator_stats::{CollaboratorStats, CollaboratorStatsService};
pub use user::UserService;
