//! Lectern Services Layer
//!
//! This crate is the **publication pipeline**: the per-domain readiness
//! validators with their completion scoring and error navigation, the asset
//! promotion and cleanup services, and the orchestrator that ties them to the
//! store's publish transactions. Services depend on the `lectern-db` and
//! `lectern-storage` traits only, never on a concrete backend.

pub mod assets;
pub mod publish;
pub mod validation;

pub use assets::{AssetCleanupService, AssetPromotionService, PromotionTarget};
pub use publish::{AssetFailure, CourseReadiness, PublishOrchestrator, PublishOutcome};
pub use validation::{
    validate_chapters, validate_course_overview, validate_lessons, validate_pricing,
    CourseRoutes,
};
