use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::non_blank;
use super::validation::{require, MissingField};

/// A category or sub-category the course is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

/// Course row as returned by the store. Every authored column may be null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCourseOverview {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub course_categories: Option<CategoryRef>,
    pub course_sub_categories: Option<CategoryRef>,
    #[serde(default)]
    pub is_published: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sanitized course overview; also the publish schema for the overview.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseOverviewDraft {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[validate(
        required(message = "Course name is required"),
        length(max = 255, message = "Course name must be at most 255 characters")
    )]
    pub name: Option<String>,
    #[validate(required(message = "Course description is required"))]
    pub description: Option<String>,
    #[validate(required(message = "Course image is required"))]
    pub image_url: Option<String>,
    #[validate(required(message = "Select a course category"))]
    pub course_categories: Option<CategoryRef>,
    #[validate(required(message = "Select a course sub-category"))]
    pub course_sub_categories: Option<CategoryRef>,
    pub is_published: bool,
}

impl From<RawCourseOverview> for CourseOverviewDraft {
    fn from(raw: RawCourseOverview) -> Self {
        CourseOverviewDraft {
            id: raw.id,
            organization_id: raw.organization_id,
            name: non_blank(raw.name),
            description: non_blank(raw.description),
            image_url: non_blank(raw.image_url),
            course_categories: raw.course_categories,
            course_sub_categories: raw.course_sub_categories,
            is_published: raw.is_published,
        }
    }
}

/// Course overview that satisfies the publish schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseOverview {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub category: CategoryRef,
    pub sub_category: CategoryRef,
    pub is_published: bool,
}

impl TryFrom<CourseOverviewDraft> for CourseOverview {
    type Error = MissingField;

    fn try_from(draft: CourseOverviewDraft) -> Result<Self, Self::Error> {
        Ok(CourseOverview {
            id: draft.id,
            organization_id: draft.organization_id,
            name: require(draft.name, "name")?,
            description: require(draft.description, "description")?,
            image_url: require(draft.image_url, "image_url")?,
            category: require(draft.course_categories, "course_categories")?,
            sub_category: require(draft.course_sub_categories, "course_sub_categories")?,
            is_published: draft.is_published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawCourseOverview {
        RawCourseOverview {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: Some("  Rust for Authors ".to_string()),
            description: Some("   ".to_string()),
            image_url: Some("https://cdn.example.com/cover.png".to_string()),
            course_categories: None,
            course_sub_categories: Some(CategoryRef {
                id: Uuid::new_v4(),
                name: "Systems".to_string(),
            }),
            is_published: false,
            updated_at: None,
        }
    }

    #[test]
    fn sanitizing_trims_and_drops_blank_text() {
        let draft = CourseOverviewDraft::from(raw());
        assert_eq!(draft.name.as_deref(), Some("Rust for Authors"));
        assert_eq!(draft.description, None);
    }

    #[test]
    fn schema_reports_missing_fields() {
        let draft = CourseOverviewDraft::from(raw());
        let errors = draft.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("course_categories"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn typed_conversion_requires_every_field() {
        let draft = CourseOverviewDraft::from(raw());
        let err = CourseOverview::try_from(draft).unwrap_err();
        assert_eq!(err.field, "description");
    }
}
