// ── Core error types ──
//
// User-facing errors from meshboard-core. Consumers never see HTTP
// status codes or JSON parse failures directly; the
// `From<meshboard_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

use crate::batch::Operation;
use crate::target::Target;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Batch admission errors (fail fast at schedule time) ──────────
    #[error("Batch has no targets")]
    EmptyBatch,

    #[error("Target {0} is derived, not fetchable")]
    NotFetchable(Target),

    #[error("Operation {operation} requires a payload")]
    MissingPayload { operation: Operation },

    #[error("Operation {operation} requires an entity id")]
    MissingEntityId { operation: Operation },

    // ── Scheduler errors ─────────────────────────────────────────────
    #[error("Scheduler has shut down")]
    SchedulerClosed,

    #[error("Request timed out after {timeout_secs}s")]
    RequestTimeout { timeout_secs: u64 },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// The API-specific error code (e.g., "api.err.InvalidSite").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` if re-scheduling the batch later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestTimeout { .. } | Self::ConnectionFailed { .. } => true,
            Self::Api { status, .. } => {
                status.is_some_and(|s| s == 429 || (500..600).contains(&s))
            }
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<meshboard_api::Error> for CoreError {
    fn from(err: meshboard_api::Error) -> Self {
        match err {
            meshboard_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            meshboard_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            meshboard_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::RequestTimeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            meshboard_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            meshboard_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            meshboard_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            meshboard_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Malformed response: {message}"),
                code: None,
                status: None,
            },
        }
    }
}
