//! Publication pipeline tests against in-memory stores.
//!
//! Run with: `cargo test -p lectern-services --test publish_test`

mod helpers;

use helpers::{add_draft_asset, seed_ready_course, setup_pipeline};
use lectern_core::models::{ResourceCategory, ValidationDomain};
use lectern_core::{AppError, ErrorMetadata, ResourceType, StorageClass};
use lectern_db::test_helpers::PublisherCall;
use lectern_services::PublishOutcome;
use lectern_storage::test_helpers::StoreCall;
use std::time::Duration;

#[tokio::test]
async fn ready_course_is_published_after_its_assets_are_promoted() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    let thumbnail = add_draft_asset(
        &pipeline,
        ids,
        ResourceCategory::Thumbnails,
        StorageClass::Upload,
        ResourceType::Image,
        ".png",
    );
    let handout = add_draft_asset(
        &pipeline,
        ids,
        ResourceCategory::Files,
        StorageClass::Private,
        ResourceType::Raw,
        ".pdf",
    );
    pipeline
        .store
        .set_draft_assets(ids.course_id, ids.organization_id, vec![thumbnail, handout.clone()]);

    let outcome = pipeline
        .orchestrator
        .publish(ids.course_id, ids.organization_id)
        .await
        .unwrap();

    let promoted = match outcome {
        PublishOutcome::Published { promoted } => promoted,
        other => panic!("expected a published course, got {:?}", other),
    };
    assert_eq!(promoted.len(), 2);
    assert!(pipeline.store.is_published(ids.course_id, ids.organization_id));
    assert_eq!(pipeline.store.calls(), vec![PublisherCall::Publish(ids.course_id)]);

    let published = pipeline.layout.published_identifier(
        ids.organization_id,
        ids.course_id,
        ResourceCategory::Files,
        handout.asset_id,
    );
    assert_eq!(
        pipeline
            .assets
            .get(&published, StorageClass::Private, ResourceType::Raw),
        Some(handout.asset_id.as_bytes().to_vec())
    );
}

#[tokio::test]
async fn incomplete_course_is_not_ready_and_nothing_is_written() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    let mut overview = helpers::overview(ids);
    overview.description = None;
    overview.course_categories = None;
    pipeline.store.add_course(overview);

    let outcome = pipeline
        .orchestrator
        .publish(ids.course_id, ids.organization_id)
        .await
        .unwrap();

    let readiness = match outcome {
        PublishOutcome::NotReady { readiness } => readiness,
        other => panic!("expected not ready, got {:?}", other),
    };
    assert_eq!(readiness.failing_domains(), vec![ValidationDomain::CourseOverview]);
    assert_eq!(readiness.overview.errors().len(), 2);
    assert_eq!(readiness.overview.completion_status().percentage, 60);
    assert!(readiness.chapters.is_success());
    assert!(pipeline.store.calls().is_empty());
    assert!(pipeline.assets.calls().is_empty());
}

#[tokio::test]
async fn missing_draft_asset_blocks_the_publish_transaction() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    let present = add_draft_asset(
        &pipeline,
        ids,
        ResourceCategory::Files,
        StorageClass::Authenticated,
        ResourceType::Video,
        ".mp4",
    );
    let mut missing = add_draft_asset(
        &pipeline,
        ids,
        ResourceCategory::Files,
        StorageClass::Upload,
        ResourceType::Raw,
        "",
    );
    missing.draft_public_id = format!("{}-gone", missing.draft_public_id);
    pipeline.store.set_draft_assets(
        ids.course_id,
        ids.organization_id,
        vec![present, missing.clone()],
    );

    let outcome = pipeline
        .orchestrator
        .publish(ids.course_id, ids.organization_id)
        .await
        .unwrap();

    match outcome {
        PublishOutcome::AssetPromotionFailed { promoted, failures } => {
            assert_eq!(promoted.len(), 1);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].asset_id, missing.asset_id);
            assert!(failures[0].error.contains("not found"));
        }
        other => panic!("expected a promotion failure, got {:?}", other),
    }
    assert!(pipeline.store.calls().is_empty());
    assert!(!pipeline.store.is_published(ids.course_id, ids.organization_id));
}

#[tokio::test]
async fn unpublish_retires_published_assets_but_keeps_drafts() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    let asset = add_draft_asset(
        &pipeline,
        ids,
        ResourceCategory::Thumbnails,
        StorageClass::Upload,
        ResourceType::Image,
        "",
    );
    pipeline
        .store
        .set_draft_assets(ids.course_id, ids.organization_id, vec![asset]);
    let outcome = pipeline
        .orchestrator
        .publish(ids.course_id, ids.organization_id)
        .await
        .unwrap();
    assert!(outcome.is_published());
    assert_eq!(pipeline.assets.asset_count(), 2);

    let cleanup = pipeline
        .orchestrator
        .unpublish(ids.course_id, ids.organization_id)
        .await
        .unwrap();

    assert!(cleanup.success);
    assert_eq!(cleanup.deleted, 1);
    assert_eq!(pipeline.assets.asset_count(), 1);
    assert!(!pipeline.store.is_published(ids.course_id, ids.organization_id));
    let deletes = pipeline
        .assets
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::DeleteByPrefix { .. }))
        .count();
    assert_eq!(deletes, 18);
}

#[tokio::test]
async fn deleting_an_unknown_course_skips_cleanup() {
    let pipeline = setup_pipeline();

    let result = pipeline
        .orchestrator
        .delete_course(uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(pipeline.assets.calls().is_empty());
}

#[tokio::test]
async fn failed_snapshot_read_marks_only_that_domain_unassessed() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    pipeline.store.fail_reads_of("lessons");

    let readiness = pipeline
        .orchestrator
        .validate(ids.course_id, ids.organization_id)
        .await;

    assert_eq!(readiness.failing_domains(), vec![ValidationDomain::Lessons]);
    assert_eq!(readiness.lessons.errors().len(), 1);
    assert_eq!(readiness.lessons.completion_status().percentage, 0);
    assert!(readiness.overview.is_success());
    assert!(readiness.pricing.is_success());
}

#[tokio::test]
async fn not_ready_outcome_serializes_with_status_tags() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    pipeline
        .store
        .set_pricing_tiers(ids.course_id, ids.organization_id, Vec::new());

    let outcome = pipeline
        .orchestrator
        .publish(ids.course_id, ids.organization_id)
        .await
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "not_ready");
    assert_eq!(json["readiness"]["overview"]["status"], "success");
    assert_eq!(json["readiness"]["pricing"]["status"], "failure");
    assert_eq!(
        json["readiness"]["pricing"]["errors"][0]["field"],
        "active_tier_count"
    );
}

#[tokio::test]
async fn publish_that_overruns_its_limit_times_out_before_committing() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    pipeline.store.delay_publish(Duration::from_millis(500));

    let result = pipeline
        .orchestrator
        .publish_within(ids.course_id, ids.organization_id, Some(Duration::from_millis(20)))
        .await;

    let err = match result {
        Err(err @ AppError::Timeout(_)) => err,
        other => panic!("expected a timeout, got {:?}", other),
    };
    assert_eq!(err.error_code(), "TIMEOUT");
    assert!(err.is_recoverable());
    assert!(pipeline.store.calls().is_empty());
    assert!(!pipeline.store.is_published(ids.course_id, ids.organization_id));
}

#[tokio::test]
async fn publish_without_a_limit_runs_to_completion() {
    let pipeline = setup_pipeline();
    let ids = seed_ready_course(&pipeline);
    pipeline.store.delay_publish(Duration::from_millis(20));

    let outcome = pipeline
        .orchestrator
        .publish_within(ids.course_id, ids.organization_id, None)
        .await
        .unwrap();

    assert!(outcome.is_published());
    assert_eq!(pipeline.store.calls(), vec![PublisherCall::Publish(ids.course_id)]);
}
