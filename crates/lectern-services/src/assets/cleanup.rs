use futures::future::join_all;
use lectern_core::models::CleanupResult;
use lectern_core::{ResourceType, StorageClass};
use lectern_storage::{AssetLayout, AssetStore};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Retires every published asset of a course.
#[derive(Clone)]
pub struct AssetCleanupService {
    store: Arc<dyn AssetStore>,
    layout: AssetLayout,
}

impl AssetCleanupService {
    pub fn new(store: Arc<dyn AssetStore>, layout: AssetLayout) -> Self {
        Self { store, layout }
    }

    /// Delete by prefix across every published prefix, storage class and
    /// resource type of the course.
    ///
    /// All combinations run concurrently and independently. A combination that
    /// matches nothing or is rejected by the store does not fail the cleanup;
    /// only malformed input does.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "published_course_files"))]
    pub async fn delete_published_course_files(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> CleanupResult {
        if course_id.is_nil() || organization_id.is_nil() {
            tracing::error!(
                organization_id = %organization_id,
                course_id = %course_id,
                "Refusing to clean up assets for a nil identifier"
            );
            return CleanupResult::failed("course_id and organization_id must not be nil");
        }

        let start = Instant::now();
        let prefixes = self.layout.published_prefixes(organization_id, course_id);
        let combinations: Vec<(&str, StorageClass, ResourceType)> = prefixes
            .iter()
            .flat_map(|prefix| {
                StorageClass::ALL.iter().flat_map(move |class| {
                    ResourceType::ALL
                        .iter()
                        .map(move |kind| (prefix.as_str(), *class, *kind))
                })
            })
            .collect();

        let outcomes = join_all(combinations.iter().map(|(prefix, class, kind)| async move {
            let outcome = self
                .store
                .delete_by_prefix(prefix, *class, *kind, true)
                .await;
            (*prefix, *class, *kind, outcome)
        }))
        .await;

        let mut deleted = 0;
        let mut failed_combinations = 0;
        for (prefix, class, kind, outcome) in outcomes {
            match outcome {
                Ok(summary) => {
                    deleted += summary.deleted;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    failed_combinations += 1;
                    tracing::warn!(
                        error = %e,
                        prefix = %prefix,
                        storage_class = %class,
                        resource_type = %kind,
                        "Failed to delete published assets, continuing"
                    );
                }
            }
        }

        tracing::info!(
            organization_id = %organization_id,
            course_id = %course_id,
            combinations = combinations.len(),
            failed_combinations,
            deleted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Published course assets cleaned up"
        );

        CleanupResult {
            success: true,
            error: None,
            combinations: combinations.len(),
            failed_combinations,
            deleted,
        }
    }
}
