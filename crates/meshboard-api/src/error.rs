use thiserror::Error;

/// Top-level error type for the `meshboard-api` crate.
///
/// Covers every transport-layer failure mode: authentication, connection,
/// controller error envelopes, and body decoding. `meshboard-core` maps
/// these into its own domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Invalid API key (rejected by controller).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Authentication failed for another reason (e.g. malformed header).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller ──────────────────────────────────────────────────
    /// Structured error from the controller REST API.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the controller rejected the request (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Api { status, .. } => (400..500).contains(status),
            Self::Transport(e) => e.status().is_some_and(|s| s.is_client_error()),
            Self::InvalidApiKey => true,
            _ => false,
        }
    }

    /// Returns `true` if the controller itself failed (5xx).
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Api { status, .. } => (500..600).contains(status),
            Self::Transport(e) => e.status().is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth re-scheduling.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the controller error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
