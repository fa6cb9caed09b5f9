//! Weighted completion scoring.
//!
//! `total` is every field requirement weight times the number of entities,
//! plus every structural requirement weight. `completed` counts the weights
//! whose predicate holds on the raw data.

use lectern_core::models::CompletionStatus;

/// A requirement every entity of the collection has to meet.
pub struct FieldRequirement<T> {
    pub field: &'static str,
    pub weight: u32,
    pub is_valid: fn(&T) -> bool,
}

/// A requirement on the collection as a whole.
pub struct StructuralRequirement<T> {
    pub field: &'static str,
    pub weight: u32,
    pub is_met: fn(&[T]) -> bool,
}

/// Requirement table for one entity type.
pub struct Requirements<T: 'static> {
    pub fields: &'static [FieldRequirement<T>],
    pub structural: &'static [StructuralRequirement<T>],
}

impl<T: 'static> Requirements<T> {
    /// Total weight for a collection of `entity_count` entities.
    pub fn total(&self, entity_count: usize) -> u32 {
        let per_entity: u32 = self.fields.iter().map(|r| r.weight).sum();
        let structural: u32 = self.structural.iter().map(|r| r.weight).sum();
        per_entity.saturating_mul(entity_count as u32) + structural
    }

    pub fn score(&self, entities: &[T]) -> CompletionStatus {
        let completed_fields: u32 = entities
            .iter()
            .flat_map(|entity| {
                self.fields
                    .iter()
                    .filter(move |r| (r.is_valid)(entity))
                    .map(|r| r.weight)
            })
            .sum();
        let completed_structural: u32 = self
            .structural
            .iter()
            .filter(|r| (r.is_met)(entities))
            .map(|r| r.weight)
            .sum();

        CompletionStatus::new(
            self.total(entities.len()),
            completed_fields + completed_structural,
        )
    }

    /// Structural requirements the collection does not meet.
    pub fn unmet_structural(&self, entities: &[T]) -> Vec<&'static StructuralRequirement<T>> {
        self.structural
            .iter()
            .filter(|r| !(r.is_met)(entities))
            .collect()
    }
}

/// Non-blank text, the scoring counterpart of a required text field.
pub(crate) fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Non-blank text of at most `max_chars` characters once trimmed.
pub(crate) fn has_bounded_text(value: &Option<String>, max_chars: usize) -> bool {
    value.as_deref().is_some_and(|s| {
        let trimmed = s.trim();
        !trimmed.is_empty() && trimmed.chars().count() <= max_chars
    })
}
