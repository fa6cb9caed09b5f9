//! Mock course store for testing
//!
//! Lets validators and the publish orchestrator run without a database.

use async_trait::async_trait;
use lectern_core::models::{DraftAsset, RawChapter, RawCourseOverview, RawLesson, RawPricingTier};
use lectern_core::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::traits::{CoursePublisher, CourseSnapshotSource};

type CourseKey = (Uuid, Uuid);

/// Store transition recorded by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherCall {
    Publish(Uuid),
    Unpublish(Uuid),
    Delete(Uuid),
}

/// In-memory course store keyed by `(course_id, organization_id)`
#[derive(Clone, Default)]
#[allow(clippy::type_complexity)]
pub struct MockCourseStore {
    overviews: Arc<Mutex<HashMap<CourseKey, RawCourseOverview>>>,
    chapters: Arc<Mutex<HashMap<CourseKey, Vec<RawChapter>>>>,
    lessons: Arc<Mutex<HashMap<CourseKey, Vec<RawLesson>>>>,
    pricing_tiers: Arc<Mutex<HashMap<CourseKey, Vec<RawPricingTier>>>>,
    draft_assets: Arc<Mutex<HashMap<CourseKey, Vec<DraftAsset>>>>,
    failing_reads: Arc<Mutex<HashSet<&'static str>>>,
    fail_publisher: Arc<Mutex<bool>>,
    publish_delay: Arc<Mutex<Option<Duration>>>,
    calls: Arc<Mutex<Vec<PublisherCall>>>,
}

impl MockCourseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a course; domains without rows read back as empty lists.
    pub fn add_course(&self, overview: RawCourseOverview) {
        let key = (overview.id, overview.organization_id);
        self.overviews.lock().unwrap().insert(key, overview);
    }

    pub fn set_chapters(&self, course_id: Uuid, organization_id: Uuid, chapters: Vec<RawChapter>) {
        self.chapters
            .lock()
            .unwrap()
            .insert((course_id, organization_id), chapters);
    }

    pub fn set_lessons(&self, course_id: Uuid, organization_id: Uuid, lessons: Vec<RawLesson>) {
        self.lessons
            .lock()
            .unwrap()
            .insert((course_id, organization_id), lessons);
    }

    pub fn set_pricing_tiers(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
        tiers: Vec<RawPricingTier>,
    ) {
        self.pricing_tiers
            .lock()
            .unwrap()
            .insert((course_id, organization_id), tiers);
    }

    pub fn set_draft_assets(&self, course_id: Uuid, organization_id: Uuid, assets: Vec<DraftAsset>) {
        self.draft_assets
            .lock()
            .unwrap()
            .insert((course_id, organization_id), assets);
    }

    /// Make one snapshot read fail: `overview`, `chapters`, `lessons`,
    /// `pricing` or `assets`.
    pub fn fail_reads_of(&self, domain: &'static str) {
        self.failing_reads.lock().unwrap().insert(domain);
    }

    pub fn fail_publisher(&self) {
        *self.fail_publisher.lock().unwrap() = true;
    }

    /// Hold every publish transaction for `delay` before applying it.
    pub fn delay_publish(&self, delay: Duration) {
        *self.publish_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<PublisherCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_published(&self, course_id: Uuid, organization_id: Uuid) -> bool {
        self.overviews
            .lock()
            .unwrap()
            .get(&(course_id, organization_id))
            .is_some_and(|c| c.is_published)
    }

    fn check_read(&self, domain: &'static str) -> Result<(), AppError> {
        if self.failing_reads.lock().unwrap().contains(domain) {
            return Err(AppError::Internal(format!("injected {} read failure", domain)));
        }
        Ok(())
    }

    fn exists(&self, key: &CourseKey) -> bool {
        self.overviews.lock().unwrap().contains_key(key)
    }

    fn list<T: Clone>(
        &self,
        rows: &Mutex<HashMap<CourseKey, Vec<T>>>,
        key: CourseKey,
    ) -> Option<Vec<T>> {
        if !self.exists(&key) {
            return None;
        }
        Some(rows.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }

    fn transition(&self, call: PublisherCall, key: CourseKey) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        if *self.fail_publisher.lock().unwrap() {
            return Err(AppError::Internal("injected publisher failure".to_string()));
        }
        let mut overviews = self.overviews.lock().unwrap();
        match call {
            PublisherCall::Delete(_) => {
                overviews
                    .remove(&key)
                    .ok_or_else(|| AppError::NotFound(format!("Course {} not found", key.0)))?;
            }
            PublisherCall::Publish(_) | PublisherCall::Unpublish(_) => {
                let course = overviews
                    .get_mut(&key)
                    .ok_or_else(|| AppError::NotFound(format!("Course {} not found", key.0)))?;
                course.is_published = matches!(call, PublisherCall::Publish(_));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CourseSnapshotSource for MockCourseStore {
    async fn course_overview(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<RawCourseOverview>, AppError> {
        self.check_read("overview")?;
        Ok(self
            .overviews
            .lock()
            .unwrap()
            .get(&(course_id, organization_id))
            .cloned())
    }

    async fn chapters(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawChapter>>, AppError> {
        self.check_read("chapters")?;
        Ok(self.list(&self.chapters, (course_id, organization_id)))
    }

    async fn lessons(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawLesson>>, AppError> {
        self.check_read("lessons")?;
        Ok(self.list(&self.lessons, (course_id, organization_id)))
    }

    async fn pricing_tiers(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawPricingTier>>, AppError> {
        self.check_read("pricing")?;
        Ok(self.list(&self.pricing_tiers, (course_id, organization_id)))
    }

    async fn draft_assets(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Vec<DraftAsset>, AppError> {
        self.check_read("assets")?;
        Ok(self
            .list(&self.draft_assets, (course_id, organization_id))
            .unwrap_or_default())
    }
}

#[async_trait]
impl CoursePublisher for MockCourseStore {
    async fn publish_course(&self, course_id: Uuid, organization_id: Uuid) -> Result<(), AppError> {
        let delay = *self.publish_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.transition(PublisherCall::Publish(course_id), (course_id, organization_id))
    }

    async fn unpublish_course(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), AppError> {
        self.transition(PublisherCall::Unpublish(course_id), (course_id, organization_id))
    }

    async fn delete_course(&self, course_id: Uuid, organization_id: Uuid) -> Result<(), AppError> {
        self.transition(PublisherCall::Delete(course_id), (course_id, organization_id))
    }
}
