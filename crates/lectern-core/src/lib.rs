//! Lectern Core Library
//!
//! This crate provides core domain models, error types and configuration
//! shared across all Lectern components: the course snapshot models read by
//! the readiness validators, the validation result types, and the asset
//! descriptors used when moving media between draft and published scopes.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PublisherConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::{AssetStoreBackend, ResourceType, StorageClass};
