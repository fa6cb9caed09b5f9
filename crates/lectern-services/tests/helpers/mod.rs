//! Shared fixtures for the publication pipeline tests.

#![allow(dead_code)]

use lectern_core::models::{
    AssetScope, BlockRef, CategoryRef, DraftAsset, LessonRef, RawChapter, RawCourseOverview,
    RawLesson, RawPricingTier, ResourceCategory,
};
use lectern_core::{ResourceType, StorageClass};
use lectern_db::test_helpers::MockCourseStore;
use lectern_services::{AssetCleanupService, AssetPromotionService, PublishOrchestrator};
use lectern_storage::test_helpers::MemoryAssetStore;
use lectern_storage::AssetLayout;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct TestPipeline {
    pub store: MockCourseStore,
    pub assets: MemoryAssetStore,
    pub orchestrator: PublishOrchestrator,
    pub layout: AssetLayout,
}

pub fn setup_pipeline() -> TestPipeline {
    let store = MockCourseStore::new();
    let assets = MemoryAssetStore::new();
    let layout = AssetLayout::new("lectern-test");
    let promotion = AssetPromotionService::new(
        Arc::new(assets.clone()),
        layout.clone(),
        Duration::from_secs(600),
    );
    let cleanup = AssetCleanupService::new(Arc::new(assets.clone()), layout.clone());
    let orchestrator = PublishOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        promotion,
        cleanup,
        2,
    );

    TestPipeline {
        store,
        assets,
        orchestrator,
        layout,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CourseIds {
    pub course_id: Uuid,
    pub organization_id: Uuid,
}

pub fn overview(ids: CourseIds) -> RawCourseOverview {
    RawCourseOverview {
        id: ids.course_id,
        organization_id: ids.organization_id,
        name: Some("Systems Programming in Rust".to_string()),
        description: Some("Ownership, lifetimes and fearless concurrency".to_string()),
        image_url: Some("https://cdn.example.com/cover.png".to_string()),
        course_categories: Some(CategoryRef {
            id: Uuid::new_v4(),
            name: "Programming".to_string(),
        }),
        course_sub_categories: Some(CategoryRef {
            id: Uuid::new_v4(),
            name: "Rust".to_string(),
        }),
        is_published: false,
        updated_at: None,
    }
}

pub fn pricing_tier(course_id: Uuid) -> RawPricingTier {
    RawPricingTier {
        id: Uuid::new_v4(),
        course_id,
        tier_name: Some("Community".to_string()),
        description: None,
        payment_frequency: Some("one_time".to_string()),
        is_free: true,
        price: None,
        currency: None,
        is_active: true,
        position: 0,
    }
}

/// Seed a course that passes every domain validator: two chapters of two
/// lessons each, one block per lesson and one free tier.
pub fn seed_ready_course(pipeline: &TestPipeline) -> CourseIds {
    let ids = CourseIds {
        course_id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
    };
    pipeline.store.add_course(overview(ids));

    let mut chapters = Vec::new();
    let mut lessons = Vec::new();
    for c in 0..2 {
        let chapter_id = Uuid::new_v4();
        let mut refs = Vec::new();
        for l in 0..2 {
            let lesson = RawLesson {
                id: Uuid::new_v4(),
                chapter_id,
                name: Some(format!("Lesson {}.{}", c + 1, l + 1)),
                lesson_type_id: Some(Uuid::new_v4()),
                position: l,
                blocks: Some(vec![BlockRef {
                    id: Uuid::new_v4(),
                    plugin_type: Some("text".to_string()),
                    position: 0,
                }]),
            };
            refs.push(LessonRef {
                id: lesson.id,
                name: lesson.name.clone(),
                position: l,
            });
            lessons.push(lesson);
        }
        chapters.push(RawChapter {
            id: chapter_id,
            course_id: ids.course_id,
            name: Some(format!("Chapter {}", c + 1)),
            description: Some("Covers the basics".to_string()),
            position: c,
            lessons: Some(refs),
        });
    }

    pipeline
        .store
        .set_chapters(ids.course_id, ids.organization_id, chapters);
    pipeline
        .store
        .set_lessons(ids.course_id, ids.organization_id, lessons);
    pipeline.store.set_pricing_tiers(
        ids.course_id,
        ids.organization_id,
        vec![pricing_tier(ids.course_id)],
    );
    ids
}

/// Store a draft asset in the asset store and register it with the course.
pub fn add_draft_asset(
    pipeline: &TestPipeline,
    ids: CourseIds,
    category: ResourceCategory,
    storage_class: StorageClass,
    resource_type: ResourceType,
    extension: &str,
) -> DraftAsset {
    let asset_id = Uuid::new_v4();
    let identifier = pipeline.layout.identifier(
        ids.organization_id,
        ids.course_id,
        AssetScope::Draft,
        category,
        asset_id,
    );
    pipeline
        .assets
        .insert(&identifier, storage_class, resource_type, asset_id.as_bytes().to_vec());

    DraftAsset {
        asset_id,
        draft_public_id: format!("{}{}", identifier, extension),
        category,
    }
}
