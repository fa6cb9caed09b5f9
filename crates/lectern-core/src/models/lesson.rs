use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::non_blank;
use super::validation::{require, MissingField};

/// Content block reference nested under a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub id: Uuid,
    pub plugin_type: Option<String>,
    pub position: i32,
}

/// Lesson row with its content blocks aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLesson {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub name: Option<String>,
    pub lesson_type_id: Option<Uuid>,
    pub position: i32,
    pub blocks: Option<Vec<BlockRef>>,
}

impl RawLesson {
    pub fn block_count(&self) -> usize {
        self.blocks.as_ref().map_or(0, Vec::len)
    }
}

/// Sanitized lesson with its derived `block_count`; also the publish schema.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LessonDraft {
    pub id: Uuid,
    pub chapter_id: Uuid,
    #[validate(
        required(message = "Lesson name is required"),
        length(max = 255, message = "Lesson name must be at most 255 characters")
    )]
    pub name: Option<String>,
    #[validate(required(message = "Choose a lesson type"))]
    pub lesson_type_id: Option<Uuid>,
    pub position: i32,
    pub blocks: Vec<BlockRef>,
    #[validate(range(min = 1, message = "Add at least one content block"))]
    pub block_count: usize,
}

impl From<RawLesson> for LessonDraft {
    fn from(raw: RawLesson) -> Self {
        let blocks = raw.blocks.unwrap_or_default();
        LessonDraft {
            id: raw.id,
            chapter_id: raw.chapter_id,
            name: non_blank(raw.name),
            lesson_type_id: raw.lesson_type_id,
            position: raw.position,
            block_count: blocks.len(),
            blocks,
        }
    }
}

/// Lesson that satisfies the publish schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub name: String,
    pub lesson_type_id: Uuid,
    pub position: i32,
    pub blocks: Vec<BlockRef>,
}

impl TryFrom<LessonDraft> for Lesson {
    type Error = MissingField;

    fn try_from(draft: LessonDraft) -> Result<Self, Self::Error> {
        Ok(Lesson {
            id: draft.id,
            chapter_id: draft.chapter_id,
            name: require(draft.name, "name")?,
            lesson_type_id: require(draft.lesson_type_id, "lesson_type_id")?,
            position: draft.position,
            blocks: draft.blocks,
        })
    }
}
