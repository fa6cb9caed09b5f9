//! Draft-to-published asset movement and published asset cleanup.

pub mod cleanup;
pub mod promotion;
pub mod search;

pub use cleanup::AssetCleanupService;
pub use promotion::{AssetPromotionService, PromotionTarget};
