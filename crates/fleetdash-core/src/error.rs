// ── Core error types ──
//
// User-facing errors from fleetdash-core. These are NOT HTTP-specific --
// consumers never see status codes or JSON parse failures directly.
// The `From<fleetdash_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.
//
// Cache reads and layout persistence never surface these to callers; they
// log and degrade. The variants reach consumers only through the profile
// and report sources used directly (e.g. loading the session user).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid dashboard configuration: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetdash_api::Error> for CoreError {
    fn from(err: fleetdash_api::Error) -> Self {
        match err {
            fleetdash_api::Error::Authentication { message }
            | fleetdash_api::Error::Forbidden { message } => {
                CoreError::AuthenticationFailed { message }
            }
            fleetdash_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            fleetdash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            fleetdash_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            fleetdash_api::Error::Api { status: 404, message } => {
                CoreError::NotFound { identifier: message }
            }
            fleetdash_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            fleetdash_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
