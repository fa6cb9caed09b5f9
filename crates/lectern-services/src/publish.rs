//! Publish orchestration
//!
//! Publishing is promote-then-commit: the four readiness validators must all
//! pass and every draft asset must be copied into the published scope before
//! the store's publish transaction is invoked. A failed promotion leaves the
//! course unpublished; the published copies that did succeed are overwritten
//! on the next attempt.

use futures::stream::{self, StreamExt};
use lectern_core::models::{
    AssetReference, CleanupResult, DraftAsset, PromotionResult, ValidationDomain,
};
use lectern_core::{AppError, Config};
use lectern_db::{CoursePublisher, CourseSnapshotSource};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::assets::{AssetCleanupService, AssetPromotionService, PromotionTarget};
use crate::validation::chapters::ChaptersValidation;
use crate::validation::lessons::LessonsValidation;
use crate::validation::overview::OverviewValidation;
use crate::validation::pricing::PricingValidation;
use crate::validation::{validate_chapters, validate_course_overview, validate_lessons, validate_pricing};

/// The four domain verdicts for one course.
#[derive(Debug, Clone, Serialize)]
pub struct CourseReadiness {
    pub overview: OverviewValidation,
    pub chapters: ChaptersValidation,
    pub lessons: LessonsValidation,
    pub pricing: PricingValidation,
}

impl CourseReadiness {
    pub fn is_ready(&self) -> bool {
        self.failing_domains().is_empty()
    }

    pub fn failing_domains(&self) -> Vec<ValidationDomain> {
        let mut failing = Vec::new();
        if !self.overview.is_success() {
            failing.push(ValidationDomain::CourseOverview);
        }
        if !self.chapters.is_success() {
            failing.push(ValidationDomain::Chapters);
        }
        if !self.lessons.is_success() {
            failing.push(ValidationDomain::Lessons);
        }
        if !self.pricing.is_success() {
            failing.push(ValidationDomain::Pricing);
        }
        failing
    }

    pub fn error_count(&self) -> usize {
        self.overview.errors().len()
            + self.chapters.errors().len()
            + self.lessons.errors().len()
            + self.pricing.errors().len()
    }
}

/// A draft asset that could not be promoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFailure {
    pub asset_id: Uuid,
    pub draft_public_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// At least one domain failed validation; nothing was written.
    NotReady { readiness: CourseReadiness },
    /// Validation passed but some assets could not be copied. The publish
    /// transaction was not invoked.
    AssetPromotionFailed {
        promoted: Vec<AssetReference>,
        failures: Vec<AssetFailure>,
    },
    Published { promoted: Vec<AssetReference> },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }
}

/// Drives validation, asset promotion and the store transitions of a course.
#[derive(Clone)]
pub struct PublishOrchestrator {
    source: Arc<dyn CourseSnapshotSource>,
    publisher: Arc<dyn CoursePublisher>,
    promotion: AssetPromotionService,
    cleanup: AssetCleanupService,
    concurrency: usize,
}

impl PublishOrchestrator {
    pub fn new(
        source: Arc<dyn CourseSnapshotSource>,
        publisher: Arc<dyn CoursePublisher>,
        promotion: AssetPromotionService,
        cleanup: AssetCleanupService,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            publisher,
            promotion,
            cleanup,
            concurrency: concurrency.max(1),
        }
    }

    /// Build an orchestrator whose promotion settings come from config.
    pub fn from_config(
        config: &Config,
        source: Arc<dyn CourseSnapshotSource>,
        publisher: Arc<dyn CoursePublisher>,
        store: Arc<dyn lectern_storage::AssetStore>,
    ) -> Self {
        let layout = lectern_storage::AssetLayout::new(config.asset_root_folder());
        let promotion =
            AssetPromotionService::new(store.clone(), layout.clone(), config.signed_url_ttl());
        let cleanup = AssetCleanupService::new(store, layout);
        Self::new(
            source,
            publisher,
            promotion,
            cleanup,
            config.asset_promotion_concurrency(),
        )
    }

    pub fn promotion(&self) -> &AssetPromotionService {
        &self.promotion
    }

    pub fn cleanup(&self) -> &AssetCleanupService {
        &self.cleanup
    }

    /// Run the four domain validators concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn validate(&self, course_id: Uuid, organization_id: Uuid) -> CourseReadiness {
        let source = self.source.as_ref();
        let (overview, chapters, lessons, pricing) = tokio::join!(
            validate_course_overview(source, course_id, organization_id),
            validate_chapters(source, course_id, organization_id),
            validate_lessons(source, course_id, organization_id),
            validate_pricing(source, course_id, organization_id),
        );

        CourseReadiness {
            overview,
            chapters,
            lessons,
            pricing,
        }
    }

    /// Validate, promote every draft asset, then commit the publish.
    ///
    /// Returns `Err` only when the asset list cannot be read or the publish
    /// transaction itself fails.
    #[tracing::instrument(skip(self))]
    pub async fn publish(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<PublishOutcome, AppError> {
        let start = Instant::now();
        let readiness = self.validate(course_id, organization_id).await;
        if !readiness.is_ready() {
            tracing::info!(
                course_id = %course_id,
                organization_id = %organization_id,
                failing_domains = ?readiness.failing_domains(),
                errors = readiness.error_count(),
                "Course is not ready to publish"
            );
            return Ok(PublishOutcome::NotReady { readiness });
        }

        let assets = self.source.draft_assets(course_id, organization_id).await?;
        let (promoted, failures) = self
            .promote_all(course_id, organization_id, assets)
            .await;

        if !failures.is_empty() {
            tracing::warn!(
                course_id = %course_id,
                organization_id = %organization_id,
                promoted = promoted.len(),
                failed = failures.len(),
                "Asset promotion failed, course left unpublished"
            );
            return Ok(PublishOutcome::AssetPromotionFailed { promoted, failures });
        }

        self.publisher
            .publish_course(course_id, organization_id)
            .await?;

        tracing::info!(
            course_id = %course_id,
            organization_id = %organization_id,
            assets = promoted.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Course published"
        );
        Ok(PublishOutcome::Published { promoted })
    }

    /// `publish` bounded by `limit`, when one is set.
    ///
    /// Promotion is idempotent, so a publish that timed out can be retried
    /// as is.
    pub async fn publish_within(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
        limit: Option<Duration>,
    ) -> Result<PublishOutcome, AppError> {
        let Some(limit) = limit else {
            return self.publish(course_id, organization_id).await;
        };

        match tokio::time::timeout(limit, self.publish(course_id, organization_id)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    course_id = %course_id,
                    organization_id = %organization_id,
                    timeout_ms = limit.as_millis() as u64,
                    "Publish timed out"
                );
                Err(AppError::Timeout(format!(
                    "Publishing course {} did not finish within {}s",
                    course_id,
                    limit.as_secs_f64()
                )))
            }
        }
    }

    /// Unpublish the course, then retire its published assets.
    #[tracing::instrument(skip(self))]
    pub async fn unpublish(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<CleanupResult, AppError> {
        self.publisher
            .unpublish_course(course_id, organization_id)
            .await?;
        tracing::info!(course_id = %course_id, "Course unpublished");

        Ok(self
            .cleanup
            .delete_published_course_files(course_id, organization_id)
            .await)
    }

    /// Delete the course, then retire its published assets.
    #[tracing::instrument(skip(self))]
    pub async fn delete_course(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<CleanupResult, AppError> {
        self.publisher
            .delete_course(course_id, organization_id)
            .await?;
        tracing::info!(course_id = %course_id, "Course deleted");

        Ok(self
            .cleanup
            .delete_published_course_files(course_id, organization_id)
            .await)
    }

    async fn promote_all(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
        assets: Vec<DraftAsset>,
    ) -> (Vec<AssetReference>, Vec<AssetFailure>) {
        let results: Vec<(DraftAsset, PromotionResult)> = stream::iter(assets)
            .map(|asset| async move {
                let target = PromotionTarget {
                    organization_id,
                    course_id,
                    asset_id: asset.asset_id,
                    category: asset.category,
                };
                let result = self
                    .promotion
                    .copy_to_published(&asset.draft_public_id, &target)
                    .await;
                (asset, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut promoted = Vec::new();
        let mut failures = Vec::new();
        for (asset, result) in results {
            match result {
                PromotionResult::Promoted { reference, .. } => promoted.push(reference),
                PromotionResult::Failed { error } => failures.push(AssetFailure {
                    asset_id: asset.asset_id,
                    draft_public_id: asset.draft_public_id,
                    error,
                }),
            }
        }
        (promoted, failures)
    }
}
