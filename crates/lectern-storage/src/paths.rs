//! Shared identifier generation for asset store backends.
//!
//! Layout: `{root}/{organization_id}/courses/{course_id}/{scope}/{category}/{asset_id}`.

use crate::traits::{StorageError, StorageResult};
use lectern_core::constants::DEFAULT_ASSET_ROOT;
use lectern_core::models::{AssetScope, ResourceCategory};
use uuid::Uuid;

/// Strip a trailing file extension from the last path segment.
///
/// Asset store identifiers exclude extensions, but authoring tools sometimes
/// record `slides.pdf` style identifiers. Dot-files and trailing dots are left
/// alone.
pub fn strip_extension(identifier: &str) -> &str {
    let segment_start = identifier.rfind('/').map_or(0, |i| i + 1);
    let segment = &identifier[segment_start..];
    match segment.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < segment.len() => &identifier[..segment_start + dot],
        _ => identifier,
    }
}

/// Reject identifiers that could escape their namespace.
pub fn validate_identifier(identifier: &str) -> StorageResult<()> {
    if identifier.trim().is_empty() {
        return Err(StorageError::InvalidKey("identifier is empty".to_string()));
    }
    if identifier.contains("..") || identifier.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "identifier contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Deterministic identifier layout rooted at a configurable folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    root: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROOT)
    }
}

impl AssetLayout {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let root = root.trim_matches('/');
        let root = if root.is_empty() {
            DEFAULT_ASSET_ROOT
        } else {
            root
        };
        Self {
            root: root.to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Folder holding one category of a course's assets, with a trailing `/`.
    pub fn prefix(
        &self,
        organization_id: Uuid,
        course_id: Uuid,
        scope: AssetScope,
        category: ResourceCategory,
    ) -> String {
        format!(
            "{}/{}/courses/{}/{}/{}/",
            self.root,
            organization_id,
            course_id,
            scope,
            category.folder()
        )
    }

    pub fn identifier(
        &self,
        organization_id: Uuid,
        course_id: Uuid,
        scope: AssetScope,
        category: ResourceCategory,
        asset_id: Uuid,
    ) -> String {
        format!(
            "{}{}",
            self.prefix(organization_id, course_id, scope, category),
            asset_id
        )
    }

    pub fn published_identifier(
        &self,
        organization_id: Uuid,
        course_id: Uuid,
        category: ResourceCategory,
        asset_id: Uuid,
    ) -> String {
        self.identifier(
            organization_id,
            course_id,
            AssetScope::Published,
            category,
            asset_id,
        )
    }

    /// Every prefix a published course can hold assets under.
    pub fn published_prefixes(&self, organization_id: Uuid, course_id: Uuid) -> Vec<String> {
        ResourceCategory::ALL
            .iter()
            .map(|category| {
                self.prefix(organization_id, course_id, AssetScope::Published, *category)
            })
            .collect()
    }
}
