//! mairie-contact/crates/mc-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Mairie-Contact:
//! submission validation, moderation, delivery and auditing, plus the
//! registry tooling used by the admin side.

pub mod admin;
pub mod audit;
pub mod catalog;
pub mod csv_io;
pub mod error;
pub mod models;
pub mod moderation;
pub mod pipeline;
pub mod registry;
pub mod stats;
pub mod text;
pub mod traits;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
