//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fleetdash_config::ConfigError;
use fleetdash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(fleetdash::connection_failed),
        help(
            "Check that the tracking server is running and reachable.\n\
             URL: {url}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(fleetdash::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fleetdash::auth_failed),
        help(
            "Verify the API token for your account.\n\
             Pass --token, set FLEETDASH_TOKEN, or configure server.token."
        )
    )]
    AuthFailed { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No tracking server configured")]
    #[diagnostic(
        code(fleetdash::no_server),
        help(
            "Pass --url, set FLEETDASH_URL, or create a config with:\n\
             fleetdash config init --url <URL>\n\
             Expected at: {path}"
        )
    )]
    NoServer { path: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(fleetdash::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(fleetdash::config))]
    Config(#[from] ConfigError),

    // ── Layout ───────────────────────────────────────────────────────
    #[error("Widget '{id}' not found")]
    #[diagnostic(
        code(fleetdash::widget_not_found),
        help("Run: fleetdash layout show to list widget IDs")
    )]
    WidgetNotFound { id: String },

    #[error("Cannot {action} widgets while edit mode is off")]
    #[diagnostic(
        code(fleetdash::edit_mode_off),
        help("Run: fleetdash layout edit-mode on")
    )]
    EditModeRequired { action: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{resource} not found: {identifier}")]
    #[diagnostic(code(fleetdash::not_found))]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(fleetdash::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fleetdash::validation))]
    Validation { field: String, reason: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(fleetdash::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(fleetdash::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(fleetdash::toml))]
    Toml(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(fleetdash::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::WidgetNotFound { .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::EditModeRequired { .. }
            | Self::NoServer { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::Config(ConfigError::Validation { .. } | ConfigError::NoServer) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound { identifier } => CliError::NotFound {
                resource: "resource".into(),
                identifier,
            },
            CoreError::Api { message, status } => CliError::ApiError { status, message },
            CoreError::Serialization(e) => CliError::Json(e),
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<fleetdash_api::Error> for CliError {
    fn from(err: fleetdash_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_exit_with_auth_code() {
        let err: CliError = CoreError::AuthenticationFailed {
            message: "bad token".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn edit_mode_is_a_usage_error() {
        let err = CliError::EditModeRequired {
            action: "move".into(),
        };
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(err.to_string(), "Cannot move widgets while edit mode is off");
    }

    #[test]
    fn api_error_message_includes_status() {
        let err: CliError = CoreError::Api {
            message: "window too large".into(),
            status: Some(400),
        }
        .into();
        assert_eq!(err.to_string(), "API error (HTTP 400): window too large");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
