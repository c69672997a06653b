//! # Cutis Core
//!
//! Core business logic for the Cutis skin-condition diagnosis service.
//!
//! This crate contains:
//! - the image classification workflow ([`classify::ClassificationService`])
//! - the collaborators it drives: classifier client, condition catalog, recommendation
//!   policy, specialist/clinic enrichment, medical history writer and audit log
//! - medical history and follow-up conversation services
//! - YAML record storage under the configured data directory
//!
//! **No API concerns**: HTTP routing, identity extraction and status codes belong in
//! `api-rest`; wire types live in `api-shared`.
//!
//! External services (classifier, search provider, conversation model, object storage) sit
//! behind traits so the workflow can be exercised with fakes.

pub mod audit;
pub mod best_effort;
pub mod cache;
pub mod classifier;
pub mod classify;
pub mod clock;
pub mod condition;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod enrichment;
pub mod error;
pub mod history;
pub mod recommendation;
pub mod services;
pub mod storage;
pub mod yaml_files;

pub use classifier::ImageUpload;
pub use classify::{ClassificationService, ClassifyFailure, ClassifyRequest, ClassifySuccess};
pub use condition::{Condition, ConditionCatalog};
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use services::Services;

pub use cutis_files::{ImageId, ImageStore};
pub use cutis_uuid::ShardableUuid;
