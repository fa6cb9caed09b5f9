use lectern_core::models::{AssetReference, PromotionResult, ResourceCategory};
use lectern_storage::{
    strip_extension, AssetLayout, AssetMetadata, AssetStore, StorageError, UploadOptions,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::search::{first_match, storage_candidates};

/// Which course asset a draft identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionTarget {
    pub organization_id: Uuid,
    pub course_id: Uuid,
    pub asset_id: Uuid,
    pub category: ResourceCategory,
}

/// Copies draft assets into the published scope of the asset store.
#[derive(Clone)]
pub struct AssetPromotionService {
    store: Arc<dyn AssetStore>,
    layout: AssetLayout,
    signed_url_ttl: Duration,
}

impl AssetPromotionService {
    pub fn new(store: Arc<dyn AssetStore>, layout: AssetLayout, signed_url_ttl: Duration) -> Self {
        Self {
            store,
            layout,
            signed_url_ttl,
        }
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    /// Copy one draft asset to its deterministic published identifier.
    ///
    /// Never fails: every error is reported through `PromotionResult::Failed`.
    /// Running it again for the same asset overwrites the same target.
    #[tracing::instrument(skip(self), fields(asset_id = %target.asset_id, course_id = %target.course_id))]
    pub async fn copy_to_published(
        &self,
        draft_public_id: &str,
        target: &PromotionTarget,
    ) -> PromotionResult {
        let start = Instant::now();
        let published_identifier = self.layout.published_identifier(
            target.organization_id,
            target.course_id,
            target.category,
            target.asset_id,
        );

        let found = match self.locate(draft_public_id).await {
            Ok(found) => found,
            Err(Some(fault)) => {
                tracing::error!(
                    error = %fault,
                    draft_public_id = %draft_public_id,
                    "Draft asset lookup failed"
                );
                return PromotionResult::Failed {
                    error: format!("Failed to look up asset {}: {}", draft_public_id, fault),
                };
            }
            Err(None) => {
                tracing::warn!(
                    draft_public_id = %draft_public_id,
                    "Draft asset not found under any storage class and resource type"
                );
                return PromotionResult::Failed {
                    error: format!(
                        "Asset {} not found under any known storage class and resource type combination",
                        draft_public_id
                    ),
                };
            }
        };

        let result = self.copy(&found, &published_identifier).await;
        match result {
            Ok(url) => {
                tracing::info!(
                    draft_identifier = %found.identifier,
                    published_identifier = %published_identifier,
                    storage_class = %found.storage_class,
                    resource_type = %found.resource_type,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Asset promoted"
                );
                PromotionResult::Promoted {
                    reference: AssetReference {
                        draft_identifier: found.identifier,
                        published_identifier: published_identifier.clone(),
                        resource_type: found.resource_type,
                        storage_class: found.storage_class,
                    },
                    published_identifier,
                    url,
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    draft_identifier = %found.identifier,
                    published_identifier = %published_identifier,
                    "Asset promotion failed"
                );
                PromotionResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Find the draft under the extension-stripped identifier first, then
    /// under the identifier as given.
    ///
    /// On a miss the error is the first store fault other than not-found, or
    /// `None` when every combination simply held nothing.
    async fn locate(&self, draft_public_id: &str) -> Result<AssetMetadata, Option<StorageError>> {
        let stripped = strip_extension(draft_public_id);
        let first_fault = match self.search(stripped).await {
            Ok(found) => return Ok(found),
            Err(fault) => fault,
        };
        if stripped == draft_public_id {
            return Err(first_fault);
        }
        self.search(draft_public_id)
            .await
            .map_err(|fault| first_fault.or(fault))
    }

    async fn search(&self, identifier: &str) -> Result<AssetMetadata, Option<StorageError>> {
        let store = &self.store;
        let outcome = first_match(storage_candidates(), |(class, kind)| async move {
            store.lookup(identifier, class, kind).await
        })
        .await;

        match outcome {
            Ok(((class, kind), metadata)) => Ok(AssetMetadata {
                identifier: identifier.to_string(),
                storage_class: class,
                resource_type: kind,
                ..metadata
            }),
            Err(misses) => {
                for ((class, kind), e) in misses.iter().filter(|(_, e)| !e.is_not_found()) {
                    tracing::warn!(
                        identifier = %identifier,
                        storage_class = %class,
                        resource_type = %kind,
                        error = %e,
                        "Asset lookup failed"
                    );
                }
                Err(misses
                    .into_iter()
                    .map(|(_, e)| e)
                    .find(|e| !e.is_not_found()))
            }
        }
    }

    async fn copy(
        &self,
        found: &AssetMetadata,
        published_identifier: &str,
    ) -> Result<String, StorageError> {
        let source_url = self.store.signed_url(found, self.signed_url_ttl).await?;

        let options = UploadOptions {
            target_identifier: published_identifier.to_string(),
            storage_class: found.storage_class,
            resource_type: found.resource_type,
            overwrite: true,
            invalidate_cache: true,
        };
        let uploaded = self.store.upload_from_url(&source_url, &options).await?;
        Ok(uploaded.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::{ResourceType, StorageClass};
    use lectern_storage::test_helpers::{MemoryAssetStore, StoreCall};

    fn target() -> PromotionTarget {
        PromotionTarget {
            organization_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            asset_id: Uuid::new_v4(),
            category: ResourceCategory::Files,
        }
    }

    fn service(store: &MemoryAssetStore) -> AssetPromotionService {
        AssetPromotionService::new(
            Arc::new(store.clone()),
            AssetLayout::default(),
            Duration::from_secs(3600),
        )
    }

    fn draft_id(target: &PromotionTarget) -> String {
        AssetLayout::default().identifier(
            target.organization_id,
            target.course_id,
            lectern_core::models::AssetScope::Draft,
            target.category,
            target.asset_id,
        )
    }

    #[tokio::test]
    async fn finds_asset_under_the_last_combination() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = draft_id(&target);
        store.insert(&draft, StorageClass::Private, ResourceType::Raw, b"pdf".to_vec());

        let result = service(&store)
            .copy_to_published(&format!("{}.pdf", draft), &target)
            .await;

        assert!(result.is_success(), "{:?}", result);
        let published = result.published_identifier().unwrap().to_string();
        assert!(published.contains("/published/files/"));
        assert_eq!(
            store.get(&published, StorageClass::Private, ResourceType::Raw),
            Some(b"pdf".to_vec())
        );

        let lookups = store
            .calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Lookup { .. }))
            .count();
        assert_eq!(lookups, 9);
    }

    #[tokio::test]
    async fn finds_asset_under_every_class_and_type() {
        for class in StorageClass::ALL {
            for kind in ResourceType::ALL {
                let store = MemoryAssetStore::new();
                let target = target();
                let draft = draft_id(&target);
                store.insert(&draft, class, kind, b"asset".to_vec());

                let result = service(&store).copy_to_published(&draft, &target).await;
                assert!(result.is_success(), "{}+{}: {:?}", class, kind, result);

                let upload = store
                    .calls()
                    .into_iter()
                    .find_map(|c| match c {
                        StoreCall::Upload { options, .. } => Some(options),
                        _ => None,
                    })
                    .unwrap();
                assert_eq!(upload.storage_class, class);
                assert_eq!(upload.resource_type, kind);
                let published = result.published_identifier().unwrap();
                assert_eq!(store.get(published, class, kind), Some(b"asset".to_vec()));
            }
        }
    }

    #[tokio::test]
    async fn signed_url_request_carries_looked_up_format() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = draft_id(&target);
        store.insert(&draft, StorageClass::Upload, ResourceType::Video, b"mp4".to_vec());
        store.set_format(&draft, StorageClass::Upload, ResourceType::Video, "mp4");

        service(&store).copy_to_published(&draft, &target).await;

        let signed = store
            .calls()
            .into_iter()
            .find_map(|c| match c {
                StoreCall::SignedUrl { identifier, format } => Some((identifier, format)),
                _ => None,
            })
            .unwrap();
        assert_eq!(signed, (draft, Some("mp4".to_string())));
    }

    #[tokio::test]
    async fn store_faults_are_not_reported_as_missing_assets() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = draft_id(&target);
        store.insert(&draft, StorageClass::Upload, ResourceType::Image, b"png".to_vec());
        store.fail_lookups();

        let result = service(&store)
            .copy_to_published(&format!("{}.png", draft), &target)
            .await;

        let error = result.error().unwrap();
        assert!(error.contains("401 Unauthorized"), "{}", error);
        assert!(!error.contains("not found"), "{}", error);
        assert_eq!(store.upload_count(), 0);
    }

    #[tokio::test]
    async fn upload_keeps_source_class_and_type_with_overwrite() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = draft_id(&target);
        store.insert(&draft, StorageClass::Upload, ResourceType::Video, b"mp4".to_vec());

        service(&store).copy_to_published(&draft, &target).await;

        let upload = store
            .calls()
            .into_iter()
            .find_map(|c| match c {
                StoreCall::Upload { options, .. } => Some(options),
                _ => None,
            })
            .unwrap();
        assert_eq!(upload.storage_class, StorageClass::Upload);
        assert_eq!(upload.resource_type, ResourceType::Video);
        assert!(upload.overwrite);
        assert!(upload.invalidate_cache);
    }

    #[tokio::test]
    async fn promoting_twice_overwrites_the_same_target() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = draft_id(&target);
        let service = service(&store);
        store.insert(&draft, StorageClass::Authenticated, ResourceType::Image, b"v1".to_vec());

        let first = service.copy_to_published(&draft, &target).await;
        store.insert(&draft, StorageClass::Authenticated, ResourceType::Image, b"v2".to_vec());
        let second = service.copy_to_published(&draft, &target).await;

        assert!(second.is_success());
        assert_eq!(first.published_identifier(), second.published_identifier());
        let published = second.published_identifier().unwrap();
        assert_eq!(
            store.get(published, StorageClass::Authenticated, ResourceType::Image),
            Some(b"v2".to_vec())
        );
        assert_eq!(store.asset_count(), 2);
    }

    #[tokio::test]
    async fn falls_back_to_identifier_with_extension() {
        let store = MemoryAssetStore::new();
        let target = target();
        let legacy = format!("{}.png", draft_id(&target));
        store.insert(&legacy, StorageClass::Upload, ResourceType::Image, b"png".to_vec());

        let result = service(&store).copy_to_published(&legacy, &target).await;

        assert!(result.is_success());
        assert_eq!(store.upload_count(), 1);
        match result {
            PromotionResult::Promoted { reference, .. } => {
                assert_eq!(reference.draft_identifier, legacy)
            }
            PromotionResult::Failed { error } => panic!("unexpected failure: {}", error),
        }
    }

    #[tokio::test]
    async fn missing_asset_fails_without_writes() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = format!("{}.pdf", draft_id(&target));

        let result = service(&store).copy_to_published(&draft, &target).await;

        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("not found"));
        assert_eq!(store.upload_count(), 0);
        assert_eq!(store.asset_count(), 0);
        // both passes exhaust all nine combinations
        assert_eq!(store.calls().len(), 18);
    }

    #[tokio::test]
    async fn upload_errors_become_failed_results() {
        let store = MemoryAssetStore::new();
        let target = target();
        let draft = draft_id(&target);
        store.insert(&draft, StorageClass::Upload, ResourceType::Raw, b"zip".to_vec());
        store.fail_uploads();

        let result = service(&store).copy_to_published(&draft, &target).await;

        assert!(result.error().unwrap().contains("injected failure"));
    }
}
