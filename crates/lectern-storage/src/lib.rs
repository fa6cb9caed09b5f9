//! Lectern Storage Library
//!
//! This crate provides the remote asset store abstraction used by the publish
//! pipeline, with a Cloudinary backend and a local filesystem backend.
//!
//! # Identifier layout
//!
//! Every course asset lives under a deterministic identifier:
//!
//! `{root}/{organization_id}/courses/{course_id}/{draft|published}/{files|thumbnails}/{asset_id}`
//!
//! The same draft asset therefore always maps to the same published identifier,
//! which is what makes promotion idempotent. Identifier generation is
//! centralized in the `paths` module so all backends stay consistent.

pub mod factory;
pub mod paths;
#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStore;
pub use factory::create_asset_store;
pub use lectern_core::{AssetStoreBackend, ResourceType, StorageClass};
#[cfg(feature = "storage-local")]
pub use local::LocalAssetStore;
pub use paths::{strip_extension, AssetLayout};
pub use traits::{
    AssetMetadata, AssetStore, DeleteSummary, StorageError, StorageResult, UploadOptions,
    UploadedAsset,
};
