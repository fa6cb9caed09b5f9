use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_core::models::{
    BlockRef, CategoryRef, DraftAsset, LessonRef, RawChapter, RawCourseOverview, RawLesson,
    RawPricingTier,
};
use lectern_core::AppError;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::traits::{CoursePublisher, CourseSnapshotSource};

/// Raised by the store RPCs when the course does not exist.
const NO_DATA_FOUND: &str = "P0002";

#[derive(Debug, sqlx::FromRow)]
struct CourseOverviewRow {
    id: Uuid,
    organization_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    course_categories: Option<Json<CategoryRef>>,
    course_sub_categories: Option<Json<CategoryRef>>,
    is_published: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl From<CourseOverviewRow> for RawCourseOverview {
    fn from(row: CourseOverviewRow) -> Self {
        RawCourseOverview {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            course_categories: row.course_categories.map(|Json(c)| c),
            course_sub_categories: row.course_sub_categories.map(|Json(c)| c),
            is_published: row.is_published,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChapterRow {
    id: Uuid,
    course_id: Uuid,
    name: Option<String>,
    description: Option<String>,
    position: i32,
    lessons: Option<Json<Vec<LessonRef>>>,
}

impl From<ChapterRow> for RawChapter {
    fn from(row: ChapterRow) -> Self {
        RawChapter {
            id: row.id,
            course_id: row.course_id,
            name: row.name,
            description: row.description,
            position: row.position,
            lessons: row.lessons.map(|Json(lessons)| lessons),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LessonRow {
    id: Uuid,
    chapter_id: Uuid,
    name: Option<String>,
    lesson_type_id: Option<Uuid>,
    position: i32,
    blocks: Option<Json<Vec<BlockRef>>>,
}

impl From<LessonRow> for RawLesson {
    fn from(row: LessonRow) -> Self {
        RawLesson {
            id: row.id,
            chapter_id: row.chapter_id,
            name: row.name,
            lesson_type_id: row.lesson_type_id,
            position: row.position,
            blocks: row.blocks.map(|Json(blocks)| blocks),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PricingTierRow {
    id: Uuid,
    course_id: Uuid,
    tier_name: Option<String>,
    description: Option<String>,
    payment_frequency: Option<String>,
    is_free: bool,
    price: Option<Decimal>,
    currency: Option<String>,
    is_active: bool,
    position: i32,
}

impl From<PricingTierRow> for RawPricingTier {
    fn from(row: PricingTierRow) -> Self {
        RawPricingTier {
            id: row.id,
            course_id: row.course_id,
            tier_name: row.tier_name,
            description: row.description,
            payment_frequency: row.payment_frequency,
            is_free: row.is_free,
            price: row.price,
            currency: row.currency,
            is_active: row.is_active,
            position: row.position,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DraftAssetRow {
    asset_id: Uuid,
    draft_public_id: String,
    category: String,
}

impl TryFrom<DraftAssetRow> for DraftAsset {
    type Error = AppError;

    fn try_from(row: DraftAssetRow) -> Result<Self, Self::Error> {
        Ok(DraftAsset {
            asset_id: row.asset_id,
            draft_public_id: row.draft_public_id,
            category: row.category.parse()?,
        })
    }
}

fn map_rpc_error(err: sqlx::Error, course_id: Uuid) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(NO_DATA_FOUND) {
            return AppError::NotFound(format!("Course {} not found", course_id));
        }
    }
    AppError::from(err)
}

/// Postgres-backed course store
#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn course_exists(&self, course_id: Uuid, organization_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1 AND organization_id = $2)",
        )
        .bind(course_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn call_rpc(
        &self,
        function: &'static str,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), AppError> {
        let start = std::time::Instant::now();
        sqlx::query(&format!("SELECT {}($1, $2)", function))
            .bind(course_id)
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_rpc_error(e, course_id))?;

        tracing::info!(
            course_id = %course_id,
            organization_id = %organization_id,
            function = function,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Course store transaction committed"
        );
        Ok(())
    }
}

#[async_trait]
impl CourseSnapshotSource for PgCourseRepository {
    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "select", db.record_id = %course_id))]
    async fn course_overview(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<RawCourseOverview>, AppError> {
        let row = sqlx::query_as::<Postgres, CourseOverviewRow>(
            r#"
            SELECT c.id, c.organization_id, c.name, c.description, c.image_url,
                   CASE WHEN cat.id IS NULL THEN NULL
                        ELSE json_build_object('id', cat.id, 'name', cat.name) END AS course_categories,
                   CASE WHEN sub.id IS NULL THEN NULL
                        ELSE json_build_object('id', sub.id, 'name', sub.name) END AS course_sub_categories,
                   c.is_published, c.updated_at
            FROM courses c
            LEFT JOIN course_categories cat ON cat.id = c.category_id
            LEFT JOIN course_sub_categories sub ON sub.id = c.sub_category_id
            WHERE c.id = $1 AND c.organization_id = $2
            "#,
        )
        .bind(course_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RawCourseOverview::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "chapters", db.operation = "select", db.record_id = %course_id))]
    async fn chapters(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawChapter>>, AppError> {
        if !self.course_exists(course_id, organization_id).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<Postgres, ChapterRow>(
            r#"
            SELECT ch.id, ch.course_id, ch.name, ch.description, ch.position,
                   (SELECT json_agg(json_build_object('id', l.id, 'name', l.name, 'position', l.position)
                                    ORDER BY l.position)
                    FROM lessons l WHERE l.chapter_id = ch.id) AS lessons
            FROM chapters ch
            WHERE ch.course_id = $1
            ORDER BY ch.position ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(rows.into_iter().map(RawChapter::from).collect()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "lessons", db.operation = "select", db.record_id = %course_id))]
    async fn lessons(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawLesson>>, AppError> {
        if !self.course_exists(course_id, organization_id).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<Postgres, LessonRow>(
            r#"
            SELECT l.id, l.chapter_id, l.name, l.lesson_type_id, l.position,
                   (SELECT json_agg(json_build_object('id', b.id, 'plugin_type', b.plugin_type, 'position', b.position)
                                    ORDER BY b.position)
                    FROM lesson_blocks b WHERE b.lesson_id = l.id) AS blocks
            FROM lessons l
            JOIN chapters ch ON ch.id = l.chapter_id
            WHERE ch.course_id = $1
            ORDER BY ch.position ASC, l.position ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(rows.into_iter().map(RawLesson::from).collect()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "pricing_tiers", db.operation = "select", db.record_id = %course_id))]
    async fn pricing_tiers(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Vec<RawPricingTier>>, AppError> {
        if !self.course_exists(course_id, organization_id).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<Postgres, PricingTierRow>(
            r#"
            SELECT id, course_id, tier_name, description, payment_frequency, is_free,
                   price, currency, is_active, position
            FROM pricing_tiers
            WHERE course_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(rows.into_iter().map(RawPricingTier::from).collect()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "course_assets", db.operation = "select", db.record_id = %course_id))]
    async fn draft_assets(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Vec<DraftAsset>, AppError> {
        let rows = sqlx::query_as::<Postgres, DraftAssetRow>(
            r#"
            SELECT a.id AS asset_id, a.public_id AS draft_public_id, a.category
            FROM course_assets a
            JOIN courses c ON c.id = a.course_id
            WHERE a.course_id = $1 AND c.organization_id = $2 AND a.scope = 'draft'
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(course_id)
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DraftAsset::try_from).collect()
    }
}

#[async_trait]
impl CoursePublisher for PgCourseRepository {
    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "rpc", db.record_id = %course_id))]
    async fn publish_course(&self, course_id: Uuid, organization_id: Uuid) -> Result<(), AppError> {
        self.call_rpc("publish_course", course_id, organization_id)
            .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "rpc", db.record_id = %course_id))]
    async fn unpublish_course(
        &self,
        course_id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), AppError> {
        self.call_rpc("unpublish_course", course_id, organization_id)
            .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "rpc", db.record_id = %course_id))]
    async fn delete_course(&self, course_id: Uuid, organization_id: Uuid) -> Result<(), AppError> {
        self.call_rpc("delete_course", course_id, organization_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_lesson_aggregate_stays_null_in_raw_snapshot() {
        let row = ChapterRow {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            name: Some("Intro".to_string()),
            description: None,
            position: 0,
            lessons: None,
        };
        let raw = RawChapter::from(row);
        assert!(raw.lessons.is_none());
        assert_eq!(raw.lesson_count(), 0);
    }

    #[test]
    fn unknown_asset_category_is_rejected() {
        let row = DraftAssetRow {
            asset_id: Uuid::new_v4(),
            draft_public_id: "lectern/x".to_string(),
            category: "audio".to_string(),
        };
        assert!(DraftAsset::try_from(row).is_err());
    }
}
