//! Common utilities and shared types for atelier.
//!
//! This crate provides foundational components used across all atelier crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: The collaborator error taxonomy via [`AppError`] and [`AppResult`]
//! - **Response envelope**: Bilingual message + violation list via [`Envelope`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use atelier_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} -> {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod id;

pub use config::Config;
pub use envelope::{Envelope, LocalizedText, ResponseStatus, Violation};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
