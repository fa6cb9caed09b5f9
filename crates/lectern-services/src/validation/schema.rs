//! Bridge from `validator` errors to navigable validation errors.

use lectern_core::models::ValidationError;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::navigation::{CourseRoutes, SchemaField};

/// One failed schema rule, flattened from `ValidationErrors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub field: String,
    pub message: String,
}

/// Flatten field errors in the domain's report order.
pub fn issues<F: SchemaField>(errors: &ValidationErrors) -> Vec<SchemaIssue> {
    let mut issues: Vec<SchemaIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |error| SchemaIssue {
                field: field.clone(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            })
        })
        .collect();

    issues.sort_by(|a, b| {
        F::rank(&a.field)
            .cmp(&F::rank(&b.field))
            .then_with(|| a.field.cmp(&b.field))
    });
    issues
}

/// Validate one entity and turn every issue into a routed error.
pub fn entity_errors<F: SchemaField, D: Validate>(
    draft: &D,
    routes: &CourseRoutes,
    entity_index: Option<usize>,
    entity_id: Option<Uuid>,
) -> Vec<ValidationError> {
    let Err(errors) = draft.validate() else {
        return Vec::new();
    };

    issues::<F>(&errors)
        .into_iter()
        .map(|issue| ValidationError {
            navigation: F::resolve(&issue.field, routes, entity_id),
            field: issue.field,
            message: issue.message,
            entity_index,
            entity_id,
        })
        .collect()
}

/// Error for a field that is not tied to one entity.
pub fn course_error<F: SchemaField>(
    field: F,
    message: impl Into<String>,
    routes: &CourseRoutes,
) -> ValidationError {
    ValidationError {
        field: field.as_str().to_string(),
        message: message.into(),
        navigation: field.route(routes, None),
        entity_index: None,
        entity_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::navigation::OverviewField;
    use std::borrow::Cow;

    #[test]
    fn issues_follow_field_order_and_default_message() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "course_categories",
            validator::ValidationError::new("required"),
        );
        errors.add(
            "name",
            validator::ValidationError::new("required")
                .with_message(Cow::Borrowed("Course name is required")),
        );

        let issues = issues::<OverviewField>(&errors);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "name");
        assert_eq!(issues[0].message, "Course name is required");
        assert_eq!(issues[1].message, "course_categories is invalid");
    }
}
