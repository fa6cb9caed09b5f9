//! Shared constants

/// Top-level folder under which every course asset lives in the asset store.
pub const DEFAULT_ASSET_ROOT: &str = "lectern";

/// Lifetime of signed read URLs issued while promoting an asset.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Number of draft assets promoted at the same time during a publish.
pub const DEFAULT_ASSET_PROMOTION_CONCURRENCY: usize = 4;

/// A course needs at least this many chapters before it can be published.
pub const MIN_CHAPTERS_PER_COURSE: usize = 2;

/// Every chapter needs at least this many lessons.
pub const MIN_LESSONS_PER_CHAPTER: usize = 2;

/// Every lesson needs at least this many content blocks.
pub const MIN_BLOCKS_PER_LESSON: usize = 1;

/// A course needs at least this many lessons overall.
pub const MIN_LESSONS_PER_COURSE: usize = 1;

/// A course needs at least this many active pricing tiers.
pub const MIN_ACTIVE_PRICING_TIERS: usize = 1;

/// Course, chapter and lesson names are at most this many characters.
pub const MAX_NAME_LENGTH: usize = 255;
