use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Asset store backend types
///
/// Defined in core because it's used in configuration and by the storage factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStoreBackend {
    Cloudinary,
    Local,
}

impl FromStr for AssetStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloudinary" => Ok(AssetStoreBackend::Cloudinary),
            "local" => Ok(AssetStoreBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid asset store backend: {}", s)),
        }
    }
}

impl Display for AssetStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetStoreBackend::Cloudinary => write!(f, "cloudinary"),
            AssetStoreBackend::Local => write!(f, "local"),
        }
    }
}

/// Access-control mode an asset is stored under.
///
/// [`StorageClass::ALL`] is ordered: it is the order in which promotion
/// searches for an asset whose storage class is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Authenticated,
    Upload,
    Private,
}

impl StorageClass {
    pub const ALL: [StorageClass; 3] = [
        StorageClass::Authenticated,
        StorageClass::Upload,
        StorageClass::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Authenticated => "authenticated",
            StorageClass::Upload => "upload",
            StorageClass::Private => "private",
        }
    }
}

impl Display for StorageClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "authenticated" => Ok(StorageClass::Authenticated),
            "upload" => Ok(StorageClass::Upload),
            "private" => Ok(StorageClass::Private),
            _ => Err(anyhow::anyhow!("Invalid storage class: {}", s)),
        }
    }
}

/// Media category an asset is stored under.
///
/// [`ResourceType::ALL`] is the inner search order used during promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [ResourceType::Image, ResourceType::Video, ResourceType::Raw];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(ResourceType::Image),
            "video" => Ok(ResourceType::Video),
            "raw" => Ok(ResourceType::Raw),
            _ => Err(anyhow::anyhow!("Invalid resource type: {}", s)),
        }
    }
}
