use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// The four independently validated parts of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationDomain {
    CourseOverview,
    Chapters,
    Lessons,
    Pricing,
}

impl Display for ValidationDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValidationDomain::CourseOverview => write!(f, "course_overview"),
            ValidationDomain::Chapters => write!(f, "chapters"),
            ValidationDomain::Lessons => write!(f, "lessons"),
            ValidationDomain::Pricing => write!(f, "pricing"),
        }
    }
}

/// Weighted readiness of an entity set.
///
/// `completed <= total` and `percentage` is `round(100 * completed / total)`,
/// or `0` when `total` is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub total: u32,
    pub completed: u32,
    pub percentage: u8,
}

impl CompletionStatus {
    pub fn new(total: u32, completed: u32) -> Self {
        let completed = completed.min(total);
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 * 100.0) / total as f64).round() as u8
        };
        Self {
            total,
            completed,
            percentage,
        }
    }

    /// Readiness could not be assessed at all.
    pub fn unassessed() -> Self {
        Self::new(0, 0)
    }

    /// Every requirement met.
    pub fn complete(total: u32) -> Self {
        Self::new(total, total)
    }
}

/// Where an author goes to fix a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub route: String,
}

/// One field-level reason a domain is not ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub navigation: Navigation,
    /// Position of the offending element in its collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
}

/// Outcome of validating one domain.
///
/// `Success` carries data that satisfies every constraint of the domain schema.
/// `Failure` carries the sanitized draft, when there was anything to fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult<T, P> {
    Success {
        data: T,
        completion_status: CompletionStatus,
    },
    Failure {
        data: Option<P>,
        errors: Vec<ValidationError>,
        completion_status: CompletionStatus,
    },
}

impl<T, P> ValidationResult<T, P> {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success { .. })
    }

    pub fn completion_status(&self) -> CompletionStatus {
        match self {
            ValidationResult::Success {
                completion_status, ..
            }
            | ValidationResult::Failure {
                completion_status, ..
            } => *completion_status,
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Success { .. } => &[],
            ValidationResult::Failure { errors, .. } => errors,
        }
    }

    /// The validated data, if validation passed.
    pub fn success_data(&self) -> Option<&T> {
        match self {
            ValidationResult::Success { data, .. } => Some(data),
            ValidationResult::Failure { .. } => None,
        }
    }

    pub fn into_success_data(self) -> Option<T> {
        match self {
            ValidationResult::Success { data, .. } => Some(data),
            ValidationResult::Failure { .. } => None,
        }
    }
}

/// A draft passed schema validation but a required value was still missing
/// while building the typed model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} is required")]
pub struct MissingField {
    pub field: &'static str,
}

pub(crate) fn require<T>(value: Option<T>, field: &'static str) -> Result<T, MissingField> {
    value.ok_or(MissingField { field })
}
