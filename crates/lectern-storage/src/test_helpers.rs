//! In-memory asset store for tests
//!
//! Records every call so tests can assert on lookup order and on the absence of
//! writes.

use crate::traits::{
    AssetMetadata, AssetStore, DeleteSummary, StorageError, StorageResult, UploadOptions,
    UploadedAsset,
};
use crate::{AssetStoreBackend, ResourceType, StorageClass};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const URL_SCHEME: &str = "memory://";

type AssetKey = (StorageClass, ResourceType, String);

/// One recorded asset store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Lookup {
        identifier: String,
        storage_class: StorageClass,
        resource_type: ResourceType,
    },
    SignedUrl {
        identifier: String,
        format: Option<String>,
    },
    Upload {
        source_url: String,
        options: UploadOptions,
    },
    DeleteByPrefix {
        prefix: String,
        storage_class: StorageClass,
        resource_type: ResourceType,
        invalidate_cache: bool,
    },
}

/// Asset store that keeps assets in memory
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    assets: Arc<Mutex<HashMap<AssetKey, Vec<u8>>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    formats: Arc<Mutex<HashMap<AssetKey, String>>>,
    failing_deletes: Arc<Mutex<HashSet<(StorageClass, ResourceType)>>>,
    fail_lookups: Arc<Mutex<bool>>,
    fail_uploads: Arc<Mutex<bool>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an asset directly into the store
    pub fn insert(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
        data: Vec<u8>,
    ) {
        self.assets
            .lock()
            .unwrap()
            .insert((storage_class, resource_type, identifier.to_string()), data);
    }

    /// Report `format` from `lookup` for an inserted asset
    pub fn set_format(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
        format: &str,
    ) {
        self.formats.lock().unwrap().insert(
            (storage_class, resource_type, identifier.to_string()),
            format.to_string(),
        );
    }

    /// Get asset data (for test assertions)
    pub fn get(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> Option<Vec<u8>> {
        self.assets
            .lock()
            .unwrap()
            .get(&(storage_class, resource_type, identifier.to_string()))
            .cloned()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Upload { .. }))
            .count()
    }

    /// Make every delete-by-prefix for this combination fail
    pub fn fail_deletes_for(&self, storage_class: StorageClass, resource_type: ResourceType) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert((storage_class, resource_type));
    }

    /// Make every lookup fail with a backend error instead of not-found
    pub fn fail_lookups(&self) {
        *self.fail_lookups.lock().unwrap() = true;
    }

    pub fn fail_uploads(&self) {
        *self.fail_uploads.lock().unwrap() = true;
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn url_for(key: &AssetKey) -> String {
        format!("{}{}/{}/{}", URL_SCHEME, key.0, key.1, key.2)
    }

    fn parse_url(url: &str) -> StorageResult<AssetKey> {
        let invalid = || StorageError::InvalidKey(url.to_string());
        let rest = url.strip_prefix(URL_SCHEME).ok_or_else(invalid)?;
        let rest = rest.split_once('?').map_or(rest, |(path, _)| path);
        let mut parts = rest.splitn(3, '/');
        let storage_class = parts
            .next()
            .and_then(|s| s.parse::<StorageClass>().ok())
            .ok_or_else(invalid)?;
        let resource_type = parts
            .next()
            .and_then(|s| s.parse::<ResourceType>().ok())
            .ok_or_else(invalid)?;
        let identifier = parts.next().ok_or_else(invalid)?;
        Ok((storage_class, resource_type, identifier.to_string()))
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn lookup(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> StorageResult<AssetMetadata> {
        self.record(StoreCall::Lookup {
            identifier: identifier.to_string(),
            storage_class,
            resource_type,
        });
        if *self.fail_lookups.lock().unwrap() {
            return Err(StorageError::BackendError(
                "injected failure: 401 Unauthorized".to_string(),
            ));
        }
        let data = self
            .get(identifier, storage_class, resource_type)
            .ok_or_else(|| StorageError::NotFound(identifier.to_string()))?;
        let format = self
            .formats
            .lock()
            .unwrap()
            .get(&(storage_class, resource_type, identifier.to_string()))
            .cloned();
        Ok(AssetMetadata {
            identifier: identifier.to_string(),
            storage_class,
            resource_type,
            format,
            bytes: Some(data.len() as u64),
        })
    }

    async fn signed_url(
        &self,
        asset: &AssetMetadata,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.record(StoreCall::SignedUrl {
            identifier: asset.identifier.clone(),
            format: asset.format.clone(),
        });
        let key = (
            asset.storage_class,
            asset.resource_type,
            asset.identifier.clone(),
        );
        if !self.assets.lock().unwrap().contains_key(&key) {
            return Err(StorageError::NotFound(asset.identifier.clone()));
        }
        Ok(format!(
            "{}?expires_in={}",
            Self::url_for(&key),
            expires_in.as_secs()
        ))
    }

    async fn upload_from_url(
        &self,
        source_url: &str,
        options: &UploadOptions,
    ) -> StorageResult<UploadedAsset> {
        self.record(StoreCall::Upload {
            source_url: source_url.to_string(),
            options: options.clone(),
        });
        if *self.fail_uploads.lock().unwrap() {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }

        let source = Self::parse_url(source_url)?;
        let target = (
            options.storage_class,
            options.resource_type,
            options.target_identifier.clone(),
        );

        let mut assets = self.assets.lock().unwrap();
        let data = assets
            .get(&source)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(source_url.to_string()))?;
        if !options.overwrite && assets.contains_key(&target) {
            return Err(StorageError::UploadFailed(format!(
                "{} already exists",
                options.target_identifier
            )));
        }
        let url = Self::url_for(&target);
        assets.insert(target, data);

        Ok(UploadedAsset {
            identifier: options.target_identifier.clone(),
            url,
        })
    }

    async fn delete_by_prefix(
        &self,
        prefix: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
        invalidate_cache: bool,
    ) -> StorageResult<DeleteSummary> {
        self.record(StoreCall::DeleteByPrefix {
            prefix: prefix.to_string(),
            storage_class,
            resource_type,
            invalidate_cache,
        });
        if self
            .failing_deletes
            .lock()
            .unwrap()
            .contains(&(storage_class, resource_type))
        {
            return Err(StorageError::DeleteFailed("injected failure".to_string()));
        }

        let mut assets = self.assets.lock().unwrap();
        let before = assets.len();
        assets.retain(|(class, kind, identifier), _| {
            !(*class == storage_class && *kind == resource_type && identifier.starts_with(prefix))
        });
        Ok(DeleteSummary {
            deleted: before - assets.len(),
        })
    }

    fn backend_type(&self) -> AssetStoreBackend {
        AssetStoreBackend::Local
    }
}
