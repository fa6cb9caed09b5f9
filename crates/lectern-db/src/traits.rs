//! Repository trait abstractions
//!
//! The validators and the publish orchestrator only see these traits, so they
//! can run against in-memory stores in tests.

use async_trait::async_trait;
use lectern_core::models::{DraftAsset, RawChapter, RawCourseOverview, RawLesson, RawPricingTier};
use lectern_core::AppError;
use uuid::Uuid;

/// Read side of the course store.
///
/// Every snapshot read returns `Ok(None)` when the course does not exist in the
/// organization, and `Ok(Some(vec![]))` when it exists but has no rows for the
/// domain.
#[async_trait]
pub trait CourseSnapshotSource: Send + Sync {
    async fn course_overview(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<RawCourseOverview>, AppError>;

    async fn chapters(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawChapter>>, AppError>;

    async fn lessons(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawLesson>>, AppError>;

    async fn pricing_tiers(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawPricingTier>>, AppError>;

    /// Draft-scope assets that have to be promoted when the course is published.
    async fn draft_assets(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Vec<DraftAsset>, AppError>;
}

/// Store-side state transitions. Each call is one atomic transaction owned by
/// the store.
#[async_trait]
pub trait CoursePublisher: Send + Sync {
    async fn publish_course(&self, course_id: Uuid, organization_id: Uuid) -> Result<(), AppError>;

    async fn unpublish_course(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), AppError>;

    async fn delete_course(&self, course_id: Uuid, organization_id: Uuid) -> Result<(), AppError>;
}
