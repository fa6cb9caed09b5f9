use lectern_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "lectern=info";

/// Whether `LOG_FORMAT` asks for JSON lines.
pub fn wants_json(log_format: &str) -> bool {
    log_format.trim().eq_ignore_ascii_case("json")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing(log_format: &str) {
    if wants_json(log_format) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Failure body printed on stderr when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code
    pub code: String,
    /// Whether running the command again may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Command failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Command failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Command failed");
        }
    }
}

/// Log a failed command at its error's level and build the report to print.
///
/// Details are only included outside production and for errors that are not
/// sensitive. Errors that are not an `AppError` are reported as
/// `COMMAND_FAILED` with their full context chain.
pub fn report_error(err: &anyhow::Error, is_production: bool) -> ErrorReport {
    let Some(app_error) = err.downcast_ref::<AppError>() else {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        return ErrorReport {
            error: format!("{:#}", err),
            details: None,
            error_type: None,
            code: "COMMAND_FAILED".to_string(),
            recoverable: false,
            suggested_action: None,
        };
    };

    log_error(app_error);
    let show_details = !is_production && !app_error.is_sensitive();
    ErrorReport {
        error: app_error.client_message(),
        details: show_details.then(|| app_error.detailed_message()),
        error_type: show_details.then(|| app_error.error_type().to_string()),
        code: app_error.error_code().to_string(),
        recoverable: app_error.is_recoverable(),
        suggested_action: app_error.suggested_action().map(String::from),
    }
}
