//! Asset store abstraction trait
//!
//! This module defines the AssetStore trait that all remote asset store
//! backends must implement.

use crate::{AssetStoreBackend, ResourceType, StorageClass};
use async_trait::async_trait;
use lectern_core::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Asset store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset identifier: {0}")]
    InvalidKey(String),

    #[error("Signed URL expired: {0}")]
    Expired(String),

    #[error("Asset store backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(identifier) => {
                AppError::NotFound(format!("Asset {} not found", identifier))
            }
            StorageError::InvalidKey(identifier) => {
                AppError::InvalidInput(format!("Invalid asset identifier: {}", identifier))
            }
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for asset store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata returned by a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub identifier: String,
    pub storage_class: StorageClass,
    pub resource_type: ResourceType,
    pub format: Option<String>,
    pub bytes: Option<u64>,
}

/// Target of an upload-as-copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub target_identifier: String,
    pub storage_class: StorageClass,
    pub resource_type: ResourceType,
    pub overwrite: bool,
    pub invalidate_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub identifier: String,
    pub url: String,
}

/// Result of a delete-by-prefix call. Zero matches is a normal outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub deleted: usize,
}

/// Remote asset store abstraction
///
/// Assets are addressed by `(identifier, storage_class, resource_type)`; the
/// same identifier may exist independently under several combinations.
/// Backends are constructed once at startup and shared behind an `Arc`.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetch metadata for an asset. Returns `StorageError::NotFound` when the
    /// combination holds no such asset.
    async fn lookup(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> StorageResult<AssetMetadata>;

    /// Generate a time-bounded read URL for an asset returned by `lookup`.
    /// The asset's `format`, when known, is part of the request.
    async fn signed_url(
        &self,
        asset: &AssetMetadata,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Ingest the content behind `source_url` as a new asset.
    async fn upload_from_url(
        &self,
        source_url: &str,
        options: &UploadOptions,
    ) -> StorageResult<UploadedAsset>;

    /// Delete every asset whose identifier starts with `prefix` within one
    /// storage class and resource type.
    async fn delete_by_prefix(
        &self,
        prefix: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
        invalidate_cache: bool,
    ) -> StorageResult<DeleteSummary>;

    /// Get the asset store backend type
    fn backend_type(&self) -> AssetStoreBackend;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::ErrorMetadata;

    #[test]
    fn backend_failures_become_asset_store_errors() {
        let err = AppError::from(StorageError::BackendError("401 Unauthorized".to_string()));
        assert!(matches!(err, AppError::Storage(ref msg) if msg.contains("401")));
        assert_eq!(err.error_code(), "ASSET_STORE_ERROR");
        assert!(err.is_recoverable());
    }

    #[test]
    fn configuration_and_lookup_errors_keep_their_kind() {
        let config = AppError::from(StorageError::ConfigError("CLOUDINARY_API_KEY missing".into()));
        assert_eq!(config.error_code(), "CONFIG_ERROR");
        assert_eq!(config.client_message(), "CLOUDINARY_API_KEY missing");

        let missing = AppError::from(StorageError::NotFound("lectern/a".into()));
        assert_eq!(missing.error_code(), "NOT_FOUND");
        assert!(missing.client_message().contains("lectern/a"));
    }
}
