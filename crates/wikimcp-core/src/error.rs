//! Error types for wikimcp.
//!
//! `Error` is the top-level error carried across crate boundaries. `ApiError`
//! describes everything that can go wrong while talking to a MediaWiki
//! installation, and exposes its category through [`ApiError::kind`] so that
//! callers can decide whether a failure means "no data" or must be reported.

use thiserror::Error;

/// Result type alias using the wikimcp `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wikimcp.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// MediaWiki API error with structured details
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Tool execution error
    #[error("Tool error: {0}")]
    Tool(String),

    /// MCP error
    #[error("MCP error: {0}")]
    Mcp(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Config(_) => {
                Some("Check config.json (or the file named by CONFIG / --config)")
            }
            Error::Api(e) => e.recovery_suggestion(),
            _ => None,
        }
    }
}

/// Category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or timeout.
    Transport,
    /// Non-2xx HTTP response.
    HttpStatus,
    /// Login did not reach `PASS`, or required credentials are absent.
    Authentication,
    /// Response body was not the expected JSON.
    Decode,
    /// The wiki answered, but its payload reports an error.
    Api,
    /// The request could not be built as asked.
    InvalidRequest,
    /// The requested wiki is not configured.
    UnknownWiki,
}

/// Errors raised while talking to a MediaWiki installation.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Network error
    #[error("Network error requesting {url}: {message}")]
    Transport { url: String, message: String },

    /// Timeout
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// Non-2xx response
    #[error("HTTP error! status: {status} for URL: {url}. Response: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response was not valid JSON (or lacked a required field)
    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Error reported inside the wiki's own payload
    #[error("MediaWiki API error ({code}): {info}")]
    Api { code: String, info: String },

    /// The caller asked for a request that cannot be sent
    #[error("Invalid request to {url}: {message}")]
    InvalidRequest { url: String, message: String },

    /// Wiki not configured
    #[error("Wiki \"{0}\" not found in config")]
    UnknownWiki(String),
}

impl ApiError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport { .. } | ApiError::Timeout { .. } => ErrorKind::Transport,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ApiError::Authentication(_) => ErrorKind::Authentication,
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Api { .. } => ErrorKind::Api,
            ApiError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            ApiError::UnknownWiki(_) => ErrorKind::UnknownWiki,
        }
    }

    /// HTTP status code, if this is an HTTP-level failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            ApiError::Transport { .. } => Some("Check that the wiki server is reachable"),
            ApiError::Timeout { .. } => {
                Some("The wiki is slow to respond; raise http.timeout_secs or try again")
            }
            ApiError::HttpStatus { status: 401 | 403, .. } => {
                Some("Check the configured OAuth token or username/password")
            }
            ApiError::HttpStatus {
                status: 500..=599, ..
            } => Some("The wiki is having issues. Try again later"),
            ApiError::Authentication(_) => {
                Some("Check the username and password (bot passwords work) for this wiki")
            }
            ApiError::UnknownWiki(_) => Some("Add the wiki to the config or use set-wiki"),
            _ => None,
        }
    }

    /// Create an HTTP status error.
    pub fn http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        ApiError::HttpStatus {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication(message.into())
    }

    /// Create a decode error.
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Format an error with its recovery suggestion.
pub fn format_error_with_suggestion(error: &Error) -> String {
    let mut output = error.to_string();
    if let Some(suggestion) = error.recovery_suggestion() {
        output.push_str(&format!("\n  Suggestion: {}", suggestion));
    }
    output
}
