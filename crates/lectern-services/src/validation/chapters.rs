use lectern_core::constants::{
    MAX_NAME_LENGTH, MIN_CHAPTERS_PER_COURSE, MIN_LESSONS_PER_CHAPTER,
};
use lectern_core::models::{
    Chapter, ChapterDraft, CompletionStatus, RawChapter, ValidationDomain, ValidationResult,
};
use lectern_db::CourseSnapshotSource;
use uuid::Uuid;

use super::navigation::{ChapterField, CourseRoutes};
use super::scorer::{
    has_bounded_text, has_text, FieldRequirement, Requirements, StructuralRequirement,
};
use super::{log_outcome, schema, typing_error, unassessed};

pub static CHAPTER_REQUIREMENTS: Requirements<RawChapter> = Requirements {
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
            field: "lesson_count",
            weight: 1,
            is_valid: |c| c.lesson_count() >= MIN_LESSONS_PER_CHAPTER,
        },
    ],
    structural: &[StructuralRequirement {
        field: "chapter_count",
        weight: 1,
        is_met: |chapters| chapters.len() >= MIN_CHAPTERS_PER_COURSE,
    }],
};

pub type ChaptersValidation = ValidationResult<Vec<Chapter>, Vec<ChapterDraft>>;

/// Check that the course's chapters are ready to publish.
#[tracing::instrument(skip(source), fields(domain = "chapters"))]
pub async fn validate_chapters(
    source: &dyn CourseSnapshotSource,
    course_id: Uuid,
    organization_id: Uuid,
) -> ChaptersValidation {
    let routes = CourseRoutes::new(course_id, organization_id);
    let raw = match source.chapters(course_id, organization_id).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return unassessed(ValidationDomain::Chapters, ChapterField::Id, &routes, None),
        Err(e) => {
            return unassessed(ValidationDomain::Chapters, ChapterField::Id, &routes, Some(e))
        }
    };

    let result = check_chapters(raw, &routes);
    log_outcome(ValidationDomain::Chapters, &routes, &result);
    result
}

pub(crate) fn check_chapters(raw: Vec<RawChapter>, routes: &CourseRoutes) -> ChaptersValidation {
    let completion_status = CHAPTER_REQUIREMENTS.score(&raw);

    let mut errors: Vec<_> = CHAPTER_REQUIREMENTS
        .unmet_structural(&raw)
        .into_iter()
        .map(|_| {
            schema::course_error(
                ChapterField::ChapterCount,
                format!(
                    "A course needs at least {} chapters",
                    MIN_CHAPTERS_PER_COURSE
                ),
                routes,
            )
        })
        .collect();

    let drafts: Vec<ChapterDraft> = raw.into_iter().map(ChapterDraft::from).collect();
    for (index, draft) in drafts.iter().enumerate() {
        errors.extend(schema::entity_errors::<ChapterField, _>(
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

    let total = CHAPTER_REQUIREMENTS.total(drafts.len());
    let mut chapters = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.iter().enumerate() {
        match Chapter::try_from(draft.clone()) {
            Ok(chapter) => chapters.push(chapter),
            Err(missing) => {
                let error =
                    typing_error::<ChapterField>(missing, routes, Some(index), Some(draft.id));
                return ValidationResult::Failure {
                    data: Some(drafts),
                    errors: vec![error],
                    completion_status,
                };
            }
        }
    }

    ValidationResult::Success {
        data: chapters,
        completion_status: CompletionStatus::complete(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::models::LessonRef;

    fn lessons(count: usize) -> Option<Vec<LessonRef>> {
        Some(
            (0..count)
                .map(|i| LessonRef {
                    id: Uuid::new_v4(),
                    name: Some(format!("Lesson {}", i + 1)),
                    position: i as i32,
                })
                .collect(),
        )
    }

    fn chapter(course_id: Uuid, lesson_count: usize) -> RawChapter {
        RawChapter {
            id: Uuid::new_v4(),
            course_id,
            name: Some("Borrowing".to_string()),
            description: Some("References and lifetimes".to_string()),
            position: 0,
            lessons: lessons(lesson_count),
        }
    }

    #[test]
    fn single_valid_chapter_fails_only_on_chapter_count() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let result = check_chapters(vec![chapter(routes.course_id, 3)], &routes);

        assert!(!result.is_success());
        assert_eq!(result.errors().len(), 1);
        let error = &result.errors()[0];
        assert_eq!(error.field, "chapter_count");
        assert_eq!(error.navigation, routes.chapters());
        assert_eq!(error.entity_id, None);

        let status = result.completion_status();
        assert_eq!((status.total, status.completed, status.percentage), (4, 3, 75));
    }

    #[test]
    fn empty_chapter_list_scores_zero_without_dividing_by_zero() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let result = check_chapters(Vec::new(), &routes);

        assert_eq!(result.completion_status(), CompletionStatus::new(1, 0));
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn per_chapter_errors_carry_index_and_id() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let good = chapter(routes.course_id, 2);
        let mut thin = chapter(routes.course_id, 1);
        thin.description = None;
        let thin_id = thin.id;

        let result = check_chapters(vec![good, thin], &routes);
        let errors = result.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.entity_index == Some(1)));
        assert!(errors.iter().all(|e| e.entity_id == Some(thin_id)));
        assert!(errors
            .iter()
            .all(|e| e.navigation == routes.chapter(thin_id)));
        assert_eq!(errors[0].field, "description");
        assert_eq!(errors[1].field, "lesson_count");
        // 2 chapters x 3 fields + chapter_count; thin misses two.
        assert_eq!(result.completion_status(), CompletionStatus::new(7, 5));
    }

    #[test]
    fn two_complete_chapters_pass() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let result = check_chapters(
            vec![chapter(routes.course_id, 2), chapter(routes.course_id, 4)],
            &routes,
        );

        assert!(result.is_success());
        assert_eq!(result.completion_status(), CompletionStatus::complete(7));
        assert_eq!(result.success_data().unwrap()[1].lesson_count, 4);
    }

    #[test]
    fn overlong_chapter_name_fails_below_full_score() {
        let routes = CourseRoutes::new(Uuid::new_v4(), Uuid::new_v4());
        let mut long = chapter(routes.course_id, 2);
        long.name = Some("b".repeat(MAX_NAME_LENGTH + 1));
        let long_id = long.id;

        let result = check_chapters(vec![chapter(routes.course_id, 2), long], &routes);
        assert!(!result.is_success());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].field, "name");
        assert_eq!(result.errors()[0].navigation, routes.chapter(long_id));
        assert_eq!(result.completion_status(), CompletionStatus::new(7, 6));
    }
}
