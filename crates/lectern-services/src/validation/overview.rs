use lectern_core::constants::MAX_NAME_LENGTH;
use lectern_core::models::{
    CompletionStatus, CourseOverview, CourseOverviewDraft, RawCourseOverview, ValidationDomain,
    ValidationResult,
};
use lectern_db::CourseSnapshotSource;
use uuid::Uuid;

use super::navigation::{CourseRoutes, OverviewField};
use super::scorer::{has_bounded_text, has_text, FieldRequirement, Requirements};
use super::{log_outcome, schema, typing_error, unassessed};

pub static OVERVIEW_REQUIREMENTS: Requirements<RawCourseOverview> = Requirements {
    fields: &[
        FieldRequirement {
            field: "name",
            weight: 1,
            is_valid: |c| has_bounded_text(&c.name, MAX_NAME_LENGTH),
        },
        FieldRequirement {
            field: "description",
            weight: 1,
            is_valid: |c| has_text(&c.description),
        },
        FieldRequirement {
            field: "image_url",
            weight: 1,
            is_valid: |c| has_text(&c.image_url),
        },
        FieldRequirement {
            field: "course_categories",
            weight: 1,
            is_valid: |c| c.course_categories.is_some(),
        },
        FieldRequirement {
            field: "course_sub_categories",
            weight: 1,
            is_valid: |c| c.course_sub_categories.is_some(),
        },
    ],
    structural: &[],
};

pub type OverviewValidation = ValidationResult<CourseOverview, CourseOverviewDraft>;

/// Check that the course overview is ready to publish.
#[tracing::instrument(skip(source), fields(domain = "course_overview"))]
pub async fn validate_course_overview(
    source: &dyn CourseSnapshotSource,
    course_id: Uuid,
    organization_id: Uuid,
) -> OverviewValidation {
    let routes = CourseRoutes::new(course_id, organization_id);
    let raw = match source.course_overview(course_id, organization_id).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return unassessed(ValidationDomain::CourseOverview, OverviewField::Id, &routes, None)
        }
        Err(e) => {
            return unassessed(
                ValidationDomain::CourseOverview,
                OverviewField::Id,
                &routes,
                Some(e),
            )
        }
    };

    let result = check_overview(raw, &routes);
    log_outcome(ValidationDomain::CourseOverview, &routes, &result);
    result
}

pub(crate) fn check_overview(raw: RawCourseOverview, routes: &CourseRoutes) -> OverviewValidation {
    let completion_status = OVERVIEW_REQUIREMENTS.score(std::slice::from_ref(&raw));
    let draft = CourseOverviewDraft::from(raw);

    let errors = schema::entity_errors::<OverviewField, _>(&draft, routes, None, None);
    if !errors.is_empty() {
        return ValidationResult::Failure {
            data: Some(draft),
            errors,
            completion_status,
        };
    }

    match CourseOverview::try_from(draft.clone()) {
        Ok(data) => ValidationResult::Success {
            data,
            completion_status: CompletionStatus::complete(OVERVIEW_REQUIREMENTS.total(1)),
        },
        Err(missing) => ValidationResult::Failure {
            data: Some(draft),
            errors: vec![typing_error::<OverviewField>(missing, routes, None, None)],
            completion_status,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::models::CategoryRef;

    fn category(name: &str) -> CategoryRef {
        CategoryRef {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn complete_raw() -> RawCourseOverview {
        RawCourseOverview {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: Some("Async Rust".to_string()),
            description: Some("Futures, executors and pinning".to_string()),
            image_url: Some("https://cdn.example.com/async.png".to_string()),
            course_categories: Some(category("Programming")),
            course_sub_categories: Some(category("Rust")),
            is_published: false,
            updated_at: None,
        }
    }

    #[test]
    fn missing_description_and_category_scores_sixty_percent() {
        let mut raw = complete_raw();
        raw.description = None;
        raw.course_categories = None;
        let routes = CourseRoutes::new(raw.id, raw.organization_id);

        let result = check_overview(raw, &routes);
        assert!(!result.is_success());
        assert_eq!(result.completion_status(), CompletionStatus::new(5, 3));
        assert_eq!(result.completion_status().percentage, 60);

        let fields: Vec<&str> = result.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "course_categories"]);
        assert!(result
            .errors()
            .iter()
            .all(|e| e.navigation == routes.overview()));
    }

    #[test]
    fn complete_overview_is_success_at_full_score() {
        let raw = complete_raw();
        let routes = CourseRoutes::new(raw.id, raw.organization_id);

        let result = check_overview(raw, &routes);
        assert!(result.is_success());
        assert_eq!(result.completion_status(), CompletionStatus::complete(5));
        assert_eq!(result.success_data().unwrap().category.name, "Programming");
    }

    #[test]
    fn blank_name_counts_as_missing_in_score_and_schema() {
        let mut raw = complete_raw();
        raw.name = Some("   ".to_string());
        let routes = CourseRoutes::new(raw.id, raw.organization_id);

        let result = check_overview(raw, &routes);
        assert_eq!(result.completion_status().completed, 4);
        assert_eq!(result.errors()[0].field, "name");
        match result {
            ValidationResult::Failure { data, .. } => assert_eq!(data.unwrap().name, None),
            ValidationResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn overlong_name_fails_below_full_score() {
        let mut raw = complete_raw();
        raw.name = Some("a".repeat(MAX_NAME_LENGTH + 45));
        let routes = CourseRoutes::new(raw.id, raw.organization_id);

        let result = check_overview(raw, &routes);
        assert!(!result.is_success());
        let fields: Vec<&str> = result.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name"]);
        assert_eq!(result.completion_status(), CompletionStatus::new(5, 4));
        assert!(result.completion_status().percentage < 100);
    }
}
