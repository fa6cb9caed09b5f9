use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::non_blank;
use super::validation::{require, MissingField};

/// Lesson reference nested under a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRef {
    pub id: Uuid,
    pub name: Option<String>,
    pub position: i32,
}

/// Chapter row with its lessons aggregated; `lessons` is null when the
/// aggregate found nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChapter {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: i32,
    pub lessons: Option<Vec<LessonRef>>,
}

impl RawChapter {
    pub fn lesson_count(&self) -> usize {
        self.lessons.as_ref().map_or(0, Vec::len)
    }
}

/// Sanitized chapter with its derived `lesson_count`; also the publish schema.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChapterDraft {
    pub id: Uuid,
    pub course_id: Uuid,
    #[validate(
        required(message = "Chapter name is required"),
        length(max = 255, message = "Chapter name must be at most 255 characters")
    )]
    pub name: Option<String>,
    #[validate(required(message = "Chapter description is required"))]
    pub description: Option<String>,
    pub position: i32,
    pub lessons: Vec<LessonRef>,
    #[validate(range(min = 2, message = "Each chapter needs at least 2 lessons"))]
    pub lesson_count: usize,
}

impl From<RawChapter> for ChapterDraft {
    fn from(raw: RawChapter) -> Self {
        let lessons = raw.lessons.unwrap_or_default();
        ChapterDraft {
            id: raw.id,
            course_id: raw.course_id,
            name: non_blank(raw.name),
            description: non_blank(raw.description),
            position: raw.position,
            lesson_count: lessons.len(),
            lessons,
        }
    }
}

/// Chapter that satisfies the publish schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub description: String,
    pub position: i32,
    pub lessons: Vec<LessonRef>,
    pub lesson_count: usize,
}

impl TryFrom<ChapterDraft> for Chapter {
    type Error = MissingField;

    fn try_from(draft: ChapterDraft) -> Result<Self, Self::Error> {
        Ok(Chapter {
            id: draft.id,
            course_id: draft.course_id,
            name: require(draft.name, "name")?,
            description: require(draft.description, "description")?,
            position: draft.position,
            lessons: draft.lessons,
            lesson_count: draft.lesson_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_lesson_aggregate_becomes_empty_list() {
        let raw = RawChapter {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            name: Some("Ownership".to_string()),
            description: None,
            position: 1,
            lessons: None,
        };
        assert_eq!(raw.lesson_count(), 0);

        let draft = ChapterDraft::from(raw);
        assert!(draft.lessons.is_empty());
        assert_eq!(draft.lesson_count, 0);

        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("lesson_count"));
        assert!(fields.contains_key("description"));
        assert!(!fields.contains_key("name"));
    }
}
