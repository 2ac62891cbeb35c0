//! Core identifier types for CloudGraph.
//!
//! This crate defines the small, provider-agnostic identifiers shared by
//! every other crate in the workspace:
//! - [`EntityIdentity`] — the join key between formatting and connection resolution
//! - [`ServiceType`], [`ProviderName`], [`Region`], [`AccountId`] — scan scoping
//! - [`RunId`] — a time-ordered identifier for one scan run (UUID v7)
//!
//! Anything that knows about a concrete cloud vendor belongs in a provider,
//! not here.

mod ids;

pub use ids::{AccountId, EntityIdentity, ProviderName, Region, RunId, ServiceType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
