//! Lectern CLI: check, publish and retire courses.
//!
//! Reads its configuration from the environment (and `.env`). Every command
//! prints its result as JSON on stdout. A failed command prints an error
//! report as JSON on stderr and exits non-zero.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lectern_cli::{init_tracing, report_error};
use lectern_core::models::ResourceCategory;
use lectern_core::{AppError, Config};
use lectern_db::{run_migrations, setup_database, PgCourseRepository};
use lectern_services::{PublishOrchestrator, PromotionTarget};
use lectern_storage::create_asset_store;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lectern", about = "Course publication pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CourseArgs {
    /// Course UUID
    #[arg(long)]
    course_id: Uuid,
    /// Organization UUID owning the course
    #[arg(long)]
    organization_id: Uuid,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Report publish readiness for every course domain
    Validate {
        #[command(flatten)]
        course: CourseArgs,
    },
    /// Validate, promote draft assets and publish the course
    Publish {
        #[command(flatten)]
        course: CourseArgs,
    },
    /// Unpublish the course and remove its published assets
    Unpublish {
        #[command(flatten)]
        course: CourseArgs,
    },
    /// Delete the course and remove its published assets
    Delete {
        #[command(flatten)]
        course: CourseArgs,
    },
    /// Copy a single draft asset into the published scope
    PromoteAsset {
        #[command(flatten)]
        course: CourseArgs,
        /// Asset UUID
        #[arg(long)]
        asset_id: Uuid,
        /// Draft identifier in the asset store, extension allowed
        #[arg(long)]
        draft_public_id: String,
        /// Asset category: files or thumbnails
        #[arg(long, default_value = "files")]
        category: String,
    },
    /// Remove every published asset of the course
    Cleanup {
        #[command(flatten)]
        course: CourseArgs,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load_config() -> Result<Config, AppError> {
    Config::from_env().map_err(|e| AppError::Config(format!("{:#}", e)))
}

async fn build_orchestrator(config: &Config) -> anyhow::Result<PublishOrchestrator> {
    let pool = setup_database(config).await?;
    let repository = Arc::new(PgCourseRepository::new(pool));
    let store = create_asset_store(config).await.map_err(AppError::from)?;

    Ok(PublishOrchestrator::from_config(
        config,
        repository.clone(),
        repository,
        store,
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => return fail(&anyhow::Error::from(err), false),
    };
    init_tracing(config.log_format());
    tracing::debug!(
        environment = %config.environment(),
        backend = ?config.asset_store_backend(),
        "Configuration loaded"
    );

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err, config.is_production()),
    }
}

fn fail(err: &anyhow::Error, is_production: bool) -> ExitCode {
    let report = report_error(err, is_production);
    match serde_json::to_string_pretty(&report) {
        Ok(out) => eprintln!("{}", out),
        Err(_) => eprintln!("{:#}", err),
    }
    ExitCode::FAILURE
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    if let Commands::Migrate = command {
        let pool = setup_database(config).await?;
        run_migrations(&pool).await?;
        return print_json(&serde_json::json!({ "success": true }));
    }

    let orchestrator = build_orchestrator(config).await?;

    match command {
        Commands::Migrate => {}
        Commands::Validate { course } => {
            let readiness = orchestrator
                .validate(course.course_id, course.organization_id)
                .await;
            print_json(&serde_json::json!({
                "ready": readiness.is_ready(),
                "domains": readiness,
            }))?;
        }
        Commands::Publish { course } => {
            let outcome = orchestrator
                .publish_within(
                    course.course_id,
                    course.organization_id,
                    config.publish_timeout(),
                )
                .await?;
            print_json(&outcome)?;
            if !outcome.is_published() {
                anyhow::bail!("Course {} was not published", course.course_id);
            }
        }
        Commands::Unpublish { course } => {
            let cleanup = orchestrator
                .unpublish(course.course_id, course.organization_id)
                .await?;
            print_json(&cleanup)?;
        }
        Commands::Delete { course } => {
            let cleanup = orchestrator
                .delete_course(course.course_id, course.organization_id)
                .await?;
            print_json(&cleanup)?;
        }
        Commands::PromoteAsset {
            course,
            asset_id,
            draft_public_id,
            category,
        } => {
            let category: ResourceCategory = category.parse()?;
            let target = PromotionTarget {
                organization_id: course.organization_id,
                course_id: course.course_id,
                asset_id,
                category,
            };
            let result = orchestrator
                .promotion()
                .copy_to_published(&draft_public_id, &target)
                .await;
            print_json(&result)?;
            if !result.is_success() {
                anyhow::bail!("Asset {} was not promoted", asset_id);
            }
        }
        Commands::Cleanup { course } => {
            let cleanup = orchestrator
                .cleanup()
                .delete_published_course_files(course.course_id, course.organization_id)
                .await;
            print_json(&cleanup)?;
        }
    }

    Ok(())
}
