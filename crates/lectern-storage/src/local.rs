use crate::paths::validate_identifier;
use crate::traits::{
    AssetMetadata, AssetStore, DeleteSummary, StorageError, StorageResult, UploadOptions,
    UploadedAsset,
};
use crate::{AssetStoreBackend, ResourceType, StorageClass};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem asset store
///
/// Assets live at `{base_path}/{storage_class}/{resource_type}/{identifier}`,
/// so the same identifier can exist under several combinations just like in
/// the remote store.
#[derive(Clone)]
pub struct LocalAssetStore {
    base_path: PathBuf,
    base_url: String,
    client: reqwest::Client,
}

impl LocalAssetStore {
    /// Create a new LocalAssetStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for asset storage (e.g., "/var/lib/lectern/assets")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:3000/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create asset directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalAssetStore {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn relative_key(
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> String {
        format!("{}/{}/{}", storage_class, resource_type, identifier)
    }

    /// Convert an asset key to a filesystem path with security validation
    ///
    /// Rejects keys containing traversal sequences that could escape the
    /// base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Asset key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Asset key resolves outside asset directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn asset_path(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> StorageResult<PathBuf> {
        validate_identifier(identifier)?;
        self.key_to_path(&Self::relative_key(identifier, storage_class, resource_type))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// Map a URL issued by this store back to its file, rejecting expired links.
    fn resolve_own_url(&self, url: &str) -> Option<StorageResult<PathBuf>> {
        let rest = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        let (key, query) = match rest.split_once('?') {
            Some((key, query)) => (key, Some(query)),
            None => (rest, None),
        };

        let expires = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(name, _)| *name == "expires")
                .and_then(|(_, value)| value.parse::<i64>().ok())
        });
        if let Some(expires) = expires {
            if expires < chrono::Utc::now().timestamp() {
                return Some(Err(StorageError::Expired(url.to_string())));
            }
        }

        let key = match urlencoding::decode(key) {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => return Some(Err(StorageError::InvalidKey(e.to_string()))),
        };
        Some(self.key_to_path(&key))
    }

    async fn read_source(&self, source_url: &str) -> StorageResult<Vec<u8>> {
        if let Some(path) = self.resolve_own_url(source_url) {
            let path = path?;
            return fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StorageError::NotFound(source_url.to_string())
                } else {
                    StorageError::UploadFailed(format!(
                        "Failed to read source {}: {}",
                        path.display(),
                        e
                    ))
                }
            });
        }

        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to fetch source: {}", e)))?;
        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(format!(
                "Source returned {}",
                response.status()
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to read source: {}", e)))?;
        Ok(body.to_vec())
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Every file below `dir`, as paths relative to `dir` joined with `/`.
    async fn list_files(dir: &Path) -> StorageResult<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        let mut pending = vec![(String::new(), dir.to_path_buf())];

        while let Some((relative, current)) = pending.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let child = if relative.is_empty() {
                    name
                } else {
                    format!("{}/{}", relative, name)
                };
                if entry.file_type().await?.is_dir() {
                    pending.push((child, entry.path()));
                } else {
                    files.push((child, entry.path()));
                }
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn lookup(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> StorageResult<AssetMetadata> {
        let path = self.asset_path(identifier, storage_class, resource_type)?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StorageError::NotFound(identifier.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(identifier.to_string()))
            }
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        };

        Ok(AssetMetadata {
            identifier: identifier.to_string(),
            storage_class,
            resource_type,
            format: path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned()),
            bytes: Some(meta.len()),
        })
    }

    async fn signed_url(
        &self,
        asset: &AssetMetadata,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.lookup(&asset.identifier, asset.storage_class, asset.resource_type)
            .await?;
        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        let key = Self::relative_key(&asset.identifier, asset.storage_class, asset.resource_type);
        Ok(format!("{}?expires={}", self.generate_url(&key), expires))
    }

    async fn upload_from_url(
        &self,
        source_url: &str,
        options: &UploadOptions,
    ) -> StorageResult<UploadedAsset> {
        let path = self.asset_path(
            &options.target_identifier,
            options.storage_class,
            options.resource_type,
        )?;
        let start = Instant::now();

        if !options.overwrite && fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::UploadFailed(format!(
                "{} already exists",
                options.target_identifier
            )));
        }

        let data = self.read_source(source_url).await?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let key = Self::relative_key(
            &options.target_identifier,
            options.storage_class,
            options.resource_type,
        );

        tracing::info!(
            path = %path.display(),
            identifier = %options.target_identifier,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local asset upload from URL successful"
        );

        Ok(UploadedAsset {
            identifier: options.target_identifier.clone(),
            url: self.generate_url(&key),
        })
    }

    async fn delete_by_prefix(
        &self,
        prefix: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
        _invalidate_cache: bool,
    ) -> StorageResult<DeleteSummary> {
        validate_identifier(prefix)?;
        let namespace =
            self.key_to_path(&format!("{}/{}", storage_class, resource_type))?;
        let start = Instant::now();

        let mut deleted = 0;
        for (identifier, path) in Self::list_files(&namespace).await? {
            if !identifier.starts_with(prefix) {
                continue;
            }
            fs::remove_file(&path).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            deleted += 1;
        }

        tracing::info!(
            prefix = %prefix,
            storage_class = %storage_class,
            resource_type = %resource_type,
            deleted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local asset delete by prefix completed"
        );

        Ok(DeleteSummary { deleted })
    }

    fn backend_type(&self) -> AssetStoreBackend {
        AssetStoreBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DRAFT: &str = "lectern/org/courses/c1/draft/files/a1";
    const PUBLISHED: &str = "lectern/org/courses/c1/published/files/a1";

    async fn store_with_draft(dir: &Path) -> LocalAssetStore {
        let store = LocalAssetStore::new(dir, "http://localhost:3000/assets".to_string())
            .await
            .unwrap();
        let path = dir.join("private").join("raw").join(DRAFT);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"draft content").await.unwrap();
        store
    }

    fn options(target: &str) -> UploadOptions {
        UploadOptions {
            target_identifier: target.to_string(),
            storage_class: StorageClass::Private,
            resource_type: ResourceType::Raw,
            overwrite: true,
            invalidate_cache: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_class_and_type() {
        let dir = tempdir().unwrap();
        let store = store_with_draft(dir.path()).await;

        let found = store
            .lookup(DRAFT, StorageClass::Private, ResourceType::Raw)
            .await
            .unwrap();
        assert_eq!(found.bytes, Some(13));

        let missing = store
            .lookup(DRAFT, StorageClass::Upload, ResourceType::Raw)
            .await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_from_signed_url_copies_content() {
        let dir = tempdir().unwrap();
        let store = store_with_draft(dir.path()).await;

        let draft = store
            .lookup(DRAFT, StorageClass::Private, ResourceType::Raw)
            .await
            .unwrap();
        let url = store
            .signed_url(&draft, Duration::from_secs(60))
            .await
            .unwrap();
        let uploaded = store
            .upload_from_url(&url, &options(PUBLISHED))
            .await
            .unwrap();

        assert_eq!(uploaded.identifier, PUBLISHED);
        let copied = fs::read(dir.path().join("private/raw").join(PUBLISHED))
            .await
            .unwrap();
        assert_eq!(copied, b"draft content");
    }

    #[tokio::test]
    async fn test_expired_url_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store_with_draft(dir.path()).await;

        let url = format!(
            "http://localhost:3000/assets/private/raw/{}?expires=1",
            DRAFT
        );
        let result = store.upload_from_url(&url, &options(PUBLISHED)).await;
        assert!(matches!(result, Err(StorageError::Expired(_))));
    }

    #[tokio::test]
    async fn test_delete_by_prefix_only_touches_matching_files() {
        let dir = tempdir().unwrap();
        let store = store_with_draft(dir.path()).await;
        let draft = store
            .lookup(DRAFT, StorageClass::Private, ResourceType::Raw)
            .await
            .unwrap();
        let url = store
            .signed_url(&draft, Duration::from_secs(60))
            .await
            .unwrap();
        store
            .upload_from_url(&url, &options(PUBLISHED))
            .await
            .unwrap();

        let summary = store
            .delete_by_prefix(
                "lectern/org/courses/c1/published/",
                StorageClass::Private,
                ResourceType::Raw,
                true,
            )
            .await
            .unwrap();
        assert_eq!(summary.deleted, 1);
        assert!(store
            .lookup(DRAFT, StorageClass::Private, ResourceType::Raw)
            .await
            .is_ok());

        let empty = store
            .delete_by_prefix(
                "lectern/org/courses/c1/published/",
                StorageClass::Upload,
                ResourceType::Image,
                true,
            )
            .await
            .unwrap();
        assert_eq!(empty.deleted, 0);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost:3000/assets".to_string())
            .await
            .unwrap();

        let result = store
            .lookup("../../../etc/passwd", StorageClass::Upload, ResourceType::Raw)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store
            .delete_by_prefix("/etc", StorageClass::Upload, ResourceType::Raw, true)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
