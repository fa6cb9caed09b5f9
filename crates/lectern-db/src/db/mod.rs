//! Database repositories for the data access layer
//!
//! `course` holds the snapshot reads and publish RPCs; `setup` holds pool
//! construction and migrations.
//
// Course repository (snapshots, draft assets, publish transactions)
pub mod course;
//
// Connection pool and migrations
pub mod setup;

pub use course::PgCourseRepository;
pub use setup::{run_migrations, setup_database};
