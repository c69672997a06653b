//! Identifier and sharded-path utilities.
//!
//! Every record Cutis persists (medical history entries, condition snapshots, specialist and
//! clinic records, conversations) is identified by a UUID in a *canonical* representation:
//! **32 lowercase hexadecimal characters** (no hyphens). Users forwarded by the upstream
//! authentication gateway are identified the same way.
//!
//! This crate provides:
//! - A wrapper type ([`ShardableUuid`]) that *guarantees* the canonical format once constructed.
//! - Shared sharding logic to derive storage locations from an identifier.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, records are stored under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>`
//!
//! Example:
//! `cutis_data/history/entries/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{ShardableUuid, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
