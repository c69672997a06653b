//! # API Shared
//!
//! Shared definitions for the Cutis APIs.
//!
//! Contains:
//! - Wire types for requests and responses (`types` module), documented with `utoipa`
//! - Shared services like `HealthService`
//! - Identity helpers for requests forwarded by the authentication gateway
//!
//! Used by `cutis-core` to shape responses and by `api-rest` to serve them.

pub mod auth;
pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
