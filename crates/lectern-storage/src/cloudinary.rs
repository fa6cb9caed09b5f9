use crate::paths::validate_identifier;
use crate::traits::{
    AssetMetadata, AssetStore, DeleteSummary, StorageError, StorageResult, UploadOptions,
    UploadedAsset,
};
use crate::{AssetStoreBackend, ResourceType, StorageClass};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Cloudinary asset store backed by the Upload and Admin REST APIs.
///
/// Constructed once at startup and shared; it holds no global state.
#[derive(Clone)]
pub struct CloudinaryStore {
    client: Client,
    api_base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    public_id: String,
    format: Option<String>,
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(
        api_base_url: impl Into<String>,
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to build Cloudinary client: {}", e))
            })?;

        Ok(CloudinaryStore {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.api_base_url, self.cloud_name, path)
    }

    /// Percent-encode each segment of a public id, keeping the `/` separators.
    fn encode_public_id(identifier: &str) -> String {
        identifier
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Sign request parameters: sorted `key=value` pairs joined by `&`, followed
    /// by the API secret, hashed with SHA-256.
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn error_from_response(response: Response, identifier: &str) -> StorageError {
        let status = response.status();
        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => status.to_string(),
        };

        match status {
            StatusCode::NOT_FOUND => StorageError::NotFound(identifier.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StorageError::ConfigError(format!("Cloudinary rejected credentials: {}", message))
            }
            _ => StorageError::BackendError(format!(
                "Cloudinary returned {} for {}: {}",
                status, identifier, message
            )),
        }
    }

    fn transport_error(e: reqwest::Error) -> StorageError {
        StorageError::BackendError(format!("Cloudinary request failed: {}", e))
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn lookup(
        &self,
        identifier: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
    ) -> StorageResult<AssetMetadata> {
        validate_identifier(identifier)?;
        let url = self.endpoint(&format!(
            "resources/{}/{}/{}",
            resource_type,
            storage_class,
            Self::encode_public_id(identifier)
        ));

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, identifier).await);
        }

        let resource: ResourceResponse = response.json().await.map_err(Self::transport_error)?;

        tracing::debug!(
            identifier = %identifier,
            storage_class = %storage_class,
            resource_type = %resource_type,
            "Cloudinary lookup matched"
        );

        Ok(AssetMetadata {
            identifier: resource.public_id,
            storage_class,
            resource_type,
            format: resource.format,
            bytes: resource.bytes,
        })
    }

    async fn signed_url(
        &self,
        asset: &AssetMetadata,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_identifier(&asset.identifier)?;
        let now = chrono::Utc::now().timestamp();
        let expires_at = now + expires_in.as_secs() as i64;

        let mut params = BTreeMap::new();
        params.insert("public_id", asset.identifier.clone());
        params.insert("type", asset.storage_class.to_string());
        params.insert("timestamp", now.to_string());
        params.insert("expires_at", expires_at.to_string());
        if let Some(format) = asset.format.as_deref().filter(|f| !f.is_empty()) {
            params.insert("format", format.to_string());
        }
        let signature = self.sign(&params);
        params.insert("signature", signature);
        params.insert("signature_algorithm", "sha256".to_string());
        params.insert("api_key", self.api_key.clone());

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}?{}",
            self.endpoint(&format!("{}/download", asset.resource_type)),
            query
        ))
    }

    async fn upload_from_url(
        &self,
        source_url: &str,
        options: &UploadOptions,
    ) -> StorageResult<UploadedAsset> {
        validate_identifier(&options.target_identifier)?;
        let start = Instant::now();

        let mut params = BTreeMap::new();
        params.insert("public_id", options.target_identifier.clone());
        params.insert("type", options.storage_class.to_string());
        params.insert("overwrite", options.overwrite.to_string());
        params.insert("invalidate", options.invalidate_cache.to_string());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = self.sign(&params);
        params.insert("signature", signature);
        params.insert("signature_algorithm", "sha256".to_string());
        params.insert("api_key", self.api_key.clone());
        params.insert("file", source_url.to_string());

        let response = self
            .client
            .post(self.endpoint(&format!("{}/upload", options.resource_type)))
            .form(&params)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Cloudinary upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(match Self::error_from_response(response, &options.target_identifier).await
            {
                StorageError::BackendError(message) => StorageError::UploadFailed(message),
                other => other,
            });
        }

        let uploaded: UploadResponse = response.json().await.map_err(Self::transport_error)?;

        tracing::info!(
            identifier = %uploaded.public_id,
            storage_class = %options.storage_class,
            resource_type = %options.resource_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload from URL successful"
        );

        Ok(UploadedAsset {
            identifier: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn delete_by_prefix(
        &self,
        prefix: &str,
        storage_class: StorageClass,
        resource_type: ResourceType,
        invalidate_cache: bool,
    ) -> StorageResult<DeleteSummary> {
        validate_identifier(prefix)?;
        let start = Instant::now();
        let url = self.endpoint(&format!("resources/{}/{}", resource_type, storage_class));

        let response = self
            .client
            .delete(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&[
                ("prefix", prefix.to_string()),
                ("invalidate", invalidate_cache.to_string()),
            ])
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Cloudinary delete failed: {}", e)))?;

        // An empty namespace is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DeleteSummary::default());
        }
        if !response.status().is_success() {
            return Err(match Self::error_from_response(response, prefix).await {
                StorageError::BackendError(message) => StorageError::DeleteFailed(message),
                other => other,
            });
        }

        let body: DeleteResponse = response.json().await.map_err(Self::transport_error)?;
        let deleted = body
            .deleted
            .values()
            .filter(|status| status.as_str() == "deleted")
            .count();

        tracing::info!(
            prefix = %prefix,
            storage_class = %storage_class,
            resource_type = %resource_type,
            deleted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary delete by prefix completed"
        );

        Ok(DeleteSummary { deleted })
    }

    fn backend_type(&self) -> AssetStoreBackend {
        AssetStoreBackend::Cloudinary
    }
}
