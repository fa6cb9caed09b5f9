//! Field-to-route tables for validation errors.
//!
//! Each domain has a closed set of schema fields. A field that cannot be
//! parsed resolves to the domain's fallback page.

use lectern_core::models::Navigation;
use uuid::Uuid;

/// Editor routes of one course, rooted at `/{organization_id}/courses/{course_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseRoutes {
    pub organization_id: Uuid,
    pub course_id: Uuid,
}

impl CourseRoutes {
    pub fn new(course_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            organization_id,
            course_id,
        }
    }

    fn at(&self, path: &str) -> Navigation {
        Navigation {
            route: format!("/{}/courses/{}{}", self.organization_id, self.course_id, path),
        }
    }

    pub fn overview(&self) -> Navigation {
        self.at("/overview")
    }

    pub fn chapters(&self) -> Navigation {
        self.at("/chapters")
    }

    pub fn chapter(&self, chapter_id: Uuid) -> Navigation {
        self.at(&format!("/chapters/{}", chapter_id))
    }

    pub fn lesson(&self, lesson_id: Uuid) -> Navigation {
        self.at(&format!("/lessons/{}", lesson_id))
    }

    pub fn pricing(&self) -> Navigation {
        self.at("/pricing")
    }

    pub fn pricing_tier(&self, tier_id: Uuid) -> Navigation {
        self.at(&format!("/pricing/{}", tier_id))
    }
}

/// A schema field of one domain.
pub trait SchemaField: Copy + Sized + 'static {
    /// Every field, in the order errors are reported.
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn route(&self, routes: &CourseRoutes, entity_id: Option<Uuid>) -> Navigation;

    fn fallback(routes: &CourseRoutes) -> Navigation;

    fn parse(field: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == field)
    }

    /// Report position; unknown fields sort last.
    fn rank(field: &str) -> usize {
        Self::ALL
            .iter()
            .position(|f| f.as_str() == field)
            .unwrap_or(Self::ALL.len())
    }

    fn resolve(field: &str, routes: &CourseRoutes, entity_id: Option<Uuid>) -> Navigation {
        match Self::parse(field) {
            Some(f) => f.route(routes, entity_id),
            None => Self::fallback(routes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewField {
    Id,
    Name,
    Description,
    ImageUrl,
    CourseCategories,
    CourseSubCategories,
}

impl SchemaField for OverviewField {
    const ALL: &'static [Self] = &[
        OverviewField::Id,
        OverviewField::Name,
        OverviewField::Description,
        OverviewField::ImageUrl,
        OverviewField::CourseCategories,
        OverviewField::CourseSubCategories,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            OverviewField::Id => "id",
            OverviewField::Name => "name",
            OverviewField::Description => "description",
            OverviewField::ImageUrl => "image_url",
            OverviewField::CourseCategories => "course_categories",
            OverviewField::CourseSubCategories => "course_sub_categories",
        }
    }

    fn route(&self, routes: &CourseRoutes, _entity_id: Option<Uuid>) -> Navigation {
        routes.overview()
    }

    fn fallback(routes: &CourseRoutes) -> Navigation {
        routes.overview()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterField {
    Id,
    ChapterCount,
    Name,
    Description,
    LessonCount,
}

impl SchemaField for ChapterField {
    const ALL: &'static [Self] = &[
        ChapterField::Id,
        ChapterField::ChapterCount,
        ChapterField::Name,
        ChapterField::Description,
        ChapterField::LessonCount,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ChapterField::Id => "id",
            ChapterField::ChapterCount => "chapter_count",
            ChapterField::Name => "name",
            ChapterField::Description => "description",
            ChapterField::LessonCount => "lesson_count",
        }
    }

    fn route(&self, routes: &CourseRoutes, entity_id: Option<Uuid>) -> Navigation {
        match (self, entity_id) {
            (ChapterField::Id | ChapterField::ChapterCount, _) => routes.chapters(),
            (_, Some(chapter_id)) => routes.chapter(chapter_id),
            (_, None) => routes.chapters(),
        }
    }

    fn fallback(routes: &CourseRoutes) -> Navigation {
        routes.chapters()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonField {
    Id,
    LessonCount,
    Name,
    LessonTypeId,
    BlockCount,
}

impl SchemaField for LessonField {
    const ALL: &'static [Self] = &[
        LessonField::Id,
        LessonField::LessonCount,
        LessonField::Name,
        LessonField::LessonTypeId,
        LessonField::BlockCount,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            LessonField::Id => "id",
            LessonField::LessonCount => "lesson_count",
            LessonField::Name => "name",
            LessonField::LessonTypeId => "lesson_type_id",
            LessonField::BlockCount => "block_count",
        }
    }

    fn route(&self, routes: &CourseRoutes, entity_id: Option<Uuid>) -> Navigation {
        match (self, entity_id) {
            (LessonField::Id | LessonField::LessonCount, _) => routes.chapters(),
            (_, Some(lesson_id)) => routes.lesson(lesson_id),
            (_, None) => routes.chapters(),
        }
    }

    fn fallback(routes: &CourseRoutes) -> Navigation {
        routes.chapters()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingField {
    Id,
    ActiveTierCount,
    TierName,
    PaymentFrequency,
    Price,
    Currency,
}

impl SchemaField for PricingField {
    const ALL: &'static [Self] = &[
        PricingField::Id,
        PricingField::ActiveTierCount,
        PricingField::TierName,
        PricingField::PaymentFrequency,
        PricingField::Price,
        PricingField::Currency,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PricingField::Id => "id",
            PricingField::ActiveTierCount => "active_tier_count",
            PricingField::TierName => "tier_name",
            PricingField::PaymentFrequency => "payment_frequency",
            PricingField::Price => "price",
            PricingField::Currency => "currency",
        }
    }

    fn route(&self, routes: &CourseRoutes, entity_id: Option<Uuid>) -> Navigation {
        match (self, entity_id) {
            (PricingField::Id | PricingField::ActiveTierCount, _) => routes.pricing(),
            (_, Some(tier_id)) => routes.pricing_tier(tier_id),
            (_, None) => routes.pricing(),
        }
    }

    fn fallback(routes: &CourseRoutes) -> Navigation {
        routes.pricing()
    }
}
