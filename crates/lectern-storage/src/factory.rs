#[cfg(feature = "storage-cloudinary")]
use crate::CloudinaryStore;
#[cfg(feature = "storage-local")]
use crate::LocalAssetStore;
use crate::{AssetStore, AssetStoreBackend, StorageError, StorageResult};
use lectern_core::Config;
use std::sync::Arc;

/// Create an asset store backend based on configuration
pub async fn create_asset_store(config: &Config) -> StorageResult<Arc<dyn AssetStore>> {
    let backend = config
        .asset_store_backend()
        .unwrap_or(AssetStoreBackend::Cloudinary);

    match backend {
        #[cfg(feature = "storage-cloudinary")]
        AssetStoreBackend::Cloudinary => {
            let cloud_name = config.cloudinary_cloud_name().ok_or_else(|| {
                StorageError::ConfigError("CLOUDINARY_CLOUD_NAME not configured".to_string())
            })?;
            let api_key = config.cloudinary_api_key().ok_or_else(|| {
                StorageError::ConfigError("CLOUDINARY_API_KEY not configured".to_string())
            })?;
            let api_secret = config.cloudinary_api_secret().ok_or_else(|| {
                StorageError::ConfigError("CLOUDINARY_API_SECRET not configured".to_string())
            })?;

            let store = CloudinaryStore::new(
                config.cloudinary_api_base_url(),
                cloud_name,
                api_key,
                api_secret,
            )?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-cloudinary"))]
        AssetStoreBackend::Cloudinary => Err(StorageError::ConfigError(
            "Cloudinary backend not available (storage-cloudinary feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        AssetStoreBackend::Local => {
            let base_path = config
                .local_asset_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_ASSET_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_asset_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_ASSET_BASE_URL not configured".to_string())
                })?;

            let store = LocalAssetStore::new(base_path, base_url).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        AssetStoreBackend::Local => Err(StorageError::ConfigError(
            "Local asset backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
