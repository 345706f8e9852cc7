//! Core business logic for atelier.

pub mod services;

pub use atelier_db::transition::{Decision, TransitionOutcome};
pub use services::*;
