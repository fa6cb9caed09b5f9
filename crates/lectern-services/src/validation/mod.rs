//! Publish-readiness validators
//!
//! One validator per course domain. Each fetches a fresh snapshot, checks it
//! against the domain schema and scores it. Validators are total: store errors
//! become a `Failure` result, never an `Err`.

pub mod chapters;
pub mod lessons;
pub mod navigation;
pub mod overview;
pub mod pricing;
pub mod schema;
pub mod scorer;

pub use chapters::validate_chapters;
pub use lessons::validate_lessons;
pub use navigation::{
    ChapterField, CourseRoutes, LessonField, OverviewField, PricingField, SchemaField,
};
pub use overview::validate_course_overview;
pub use pricing::validate_pricing;
pub use scorer::{FieldRequirement, Requirements, StructuralRequirement};

use lectern_core::models::{
    CompletionStatus, MissingField, ValidationDomain, ValidationError, ValidationResult,
};
use lectern_core::AppError;

/// The snapshot could not be fetched, so readiness is unknown. `error` is
/// `None` when the course does not exist.
pub(crate) fn unassessed<T, P, F: SchemaField>(
    domain: ValidationDomain,
    id_field: F,
    routes: &CourseRoutes,
    error: Option<AppError>,
) -> ValidationResult<T, P> {
    let message = match error {
        Some(e) => {
            tracing::warn!(
                domain = %domain,
                course_id = %routes.course_id,
                organization_id = %routes.organization_id,
                error = %e,
                "Snapshot fetch failed"
            );
            format!("Could not load {} for this course", domain_label(domain))
        }
        None => {
            tracing::debug!(
                domain = %domain,
                course_id = %routes.course_id,
                "Course not found"
            );
            "Course not found".to_string()
        }
    };

    ValidationResult::Failure {
        data: None,
        errors: vec![schema::course_error(id_field, message, routes)],
        completion_status: CompletionStatus::unassessed(),
    }
}

/// A draft passed the schema but could not be typed.
pub(crate) fn typing_error<F: SchemaField>(
    missing: MissingField,
    routes: &CourseRoutes,
    entity_index: Option<usize>,
    entity_id: Option<uuid::Uuid>,
) -> ValidationError {
    ValidationError {
        field: missing.field.to_string(),
        message: missing.to_string(),
        navigation: F::resolve(missing.field, routes, entity_id),
        entity_index,
        entity_id,
    }
}

pub(crate) fn log_outcome<T, P>(
    domain: ValidationDomain,
    routes: &CourseRoutes,
    result: &ValidationResult<T, P>,
) {
    let status = result.completion_status();
    tracing::info!(
        domain = %domain,
        course_id = %routes.course_id,
        organization_id = %routes.organization_id,
        ready = result.is_success(),
        errors = result.errors().len(),
        completed = status.completed,
        total = status.total,
        percentage = status.percentage,
        "Domain validated"
    );
}

fn domain_label(domain: ValidationDomain) -> &'static str {
    match domain {
        ValidationDomain::CourseOverview => "the course overview",
        ValidationDomain::Chapters => "chapters",
        ValidationDomain::Lessons => "lessons",
        ValidationDomain::Pricing => "pricing tiers",
    }
}
