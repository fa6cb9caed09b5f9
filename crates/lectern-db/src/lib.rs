//! Lectern Database Layer
//!
//! This crate provides the course snapshot reads the readiness validators
//! depend on and the store-side publish transactions.
//!
// Module declarations
pub mod db;
pub mod traits;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-exports: Repositories and setup
pub use db::{run_migrations, setup_database, PgCourseRepository};

// Re-exports: Repository traits
pub use traits::{CoursePublisher, CourseSnapshotSource};
