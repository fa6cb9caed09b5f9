use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::storage_types::{ResourceType, StorageClass};

/// Namespace an asset lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetScope {
    Draft,
    Published,
}

impl Display for AssetScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetScope::Draft => write!(f, "draft"),
            AssetScope::Published => write!(f, "published"),
        }
    }
}

/// Group of course assets sharing a folder within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    /// Lesson documents, images and other general files.
    Files,
    Thumbnails,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 2] = [ResourceCategory::Files, ResourceCategory::Thumbnails];

    pub fn folder(&self) -> &'static str {
        match self {
            ResourceCategory::Files => "files",
            ResourceCategory::Thumbnails => "thumbnails",
        }
    }
}

impl FromStr for ResourceCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "files" => Ok(ResourceCategory::Files),
            "thumbnails" => Ok(ResourceCategory::Thumbnails),
            _ => Err(anyhow::anyhow!("Invalid resource category: {}", s)),
        }
    }
}

impl Display for ResourceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.folder())
    }
}

/// A draft asset that has to be copied into the published scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAsset {
    pub asset_id: Uuid,
    /// Identifier in the draft scope, possibly with a file extension.
    pub draft_public_id: String,
    pub category: ResourceCategory,
}

/// Where a draft asset was found and where its published copy lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub draft_identifier: String,
    pub published_identifier: String,
    pub resource_type: ResourceType,
    pub storage_class: StorageClass,
}

/// Outcome of promoting one asset. Promotion never fails with an error; it
/// reports one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromotionResult {
    Promoted {
        published_identifier: String,
        url: String,
        reference: AssetReference,
    },
    Failed {
        error: String,
    },
}

impl PromotionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PromotionResult::Promoted { .. })
    }

    pub fn published_identifier(&self) -> Option<&str> {
        match self {
            PromotionResult::Promoted {
                published_identifier,
                ..
            } => Some(published_identifier),
            PromotionResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PromotionResult::Promoted { .. } => None,
            PromotionResult::Failed { error } => Some(error),
        }
    }
}

/// Outcome of retiring every published asset of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// prefix × storage class × resource type combinations attempted.
    pub combinations: usize,
    /// Combinations the asset store rejected; a miss is not counted.
    pub failed_combinations: usize,
    pub deleted: usize,
}

impl CleanupResult {
    pub fn failed(error: impl Into<String>) -> Self {
        CleanupResult {
            success: false,
            error: Some(error.into()),
            combinations: 0,
            failed_combinations: 0,
            deleted: 0,
        }
    }
}
