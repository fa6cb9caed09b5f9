use lectern_core::constants::{
    MAX_NAME_LENGTH, MIN_BLOCKS_PER_LESSON, MIN_LESSONS_PER_COURSE,
};
use lectern_core::models::{
    CompletionStatus, Lesson, LessonDraft, RawLesson, ValidationDomain, ValidationResult,
};
use lectern_db::CourseSnapshotSource;
use uuid::Uuid;

use super::navigation::{CourseRoutes, LessonField};
use super::scorer::{has_bounded_text, FieldRequirement, Requirements, StructuralRequirement};
use super::{log_outcome, schema, typing_error, unassessed};

pub static LESSON_REQUIREMENTS: Requirements<RawLesson> = Requirements {
    fields: &[
        FieldRequirement {
            field: "name",
            weight: 1,
            is_valid: |l| has_bounded_text(&l.name, MAX_NAME_LENGTH),
        },
        FieldRequirement {
            field: "lesson_type_id",
            weight: 1,
            is_valid: |l| l.lesson_type_id.is_some(),
        },
        FieldRequirement {
            field: "block_count",
            weight: 1,
            is_valid: |l| l.block_count() >= MIN_BLOCKS_PER_LESSON,
        },
    ],
    structural: &[StructuralRequirement {
        field: "lesson_count",
        weight: 1,
        is_met: |lessons| lessons.len() >= MIN_LESSONS_PER_COURSE,
    }],
};

pub type LessonsValidation = ValidationResult<Vec<Lesson>, Vec<LessonDraft>>;

/// Check that every lesson of the course is ready to publish.
#[tracing::instrument(skip(source), fields(domain = "lessons"))]
pub async fn validate_lessons(
    source: &dyn CourseSnapshotSource,
    course_id: Uuid,
    organization_id: Uuid,
) -> LessonsValidation {
    let routes = CourseRoutes::new(course_id, organization_id);
    let raw = match source.lessons(course_id, organization_id).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return unassessed(ValidationDomain::Lessons, LessonField::Id, &routes, None),
        Err(e) => return unassessed(ValidationDomain::Lessons, LessonField::Id, &routes, Some(e)),
    };

    let result = check_lessons(raw, &routes);
    log_outcome(ValidationDomain::Lessons, &routes, &result);
    result
}

pub(crate) fn check_lessons(raw: Vec<RawLesson>, routes: &CourseRoutes) -> LessonsValidation {
    let completion_status = LESSON_REQUIREMENTS.score(&raw);

    let mut errors: Vec<_> = LESSON_REQUIREMENTS
        .unmet_structural(&raw)
        .into_iter()
        .map(|_| {
            schema::course_error(
                LessonField::LessonCount,
                "Add at least one lesson to the course",
                routes,
            )
        })
        .collect();

    let drafts: Vec<LessonDraft> = raw.into_iter().map(LessonDraft::from).collect();
    for (index, draft) in drafts.iter().enumerate() {
        errors.extend(schema::entity_errors::<LessonField, _>(
            draft,
            routes,
            Some(index),
            Some(draft.id),
        ));
    }

    if !errors.is_empty() {
        return ValidationResult::Failure {
            data: Some(drafts),
            errors,
            completion_status,
        };
    }

    let mut lessons = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.iter().enumerate() {
        match Lesson::try_from(draft.clone()) {
            Ok(lesson) => lessons.push(lesson),
            Err(missing) => {
                let error =
                    typing_error::<LessonField>(missing, routes, Some(index), Some(draft.id));
                return ValidationResult::Failure {
                    data: Some(drafts),
                    errors: vec![error],
                    completion_status,
                };
            }
        }
    }

    ValidationResult::Success {
        completion_status: CompletionStatus::complete(LESSON_REQUIREMENTS.total(lessons.len())),
        data: lessons,
    }
}
