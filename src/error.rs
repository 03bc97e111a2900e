use serde::Serialize;

/// Error code attached to client-side timeouts.
pub const CODE_TIMEOUT: &str = "TIMEOUT";
/// Error code attached to caller-cancelled requests.
pub const CODE_ABORTED: &str = "ABORTED";
/// Error code attached to descriptors rejected before any network attempt.
pub const CODE_INVALID_REQUEST: &str = "INVALID_REQUEST";

/// The single error shape returned by [`ApiClient`](crate::ApiClient).
///
/// Status-classified errors carry `status`; exception-classified errors
/// (network failure, timeout, cancellation) do not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    /// Human-readable message suitable for display.
    pub message: String,
    /// HTTP status code when the server answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Machine-readable code (`TIMEOUT`, `ABORTED`, or one sent by the server).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Whether the executor would try the call again.
    pub retryable: bool,
}

impl ClassifiedError {
    /// Transport could not reach the server (connection refused, DNS, reset).
    pub fn network() -> Self {
        Self {
            message: "Network error. Please check your connection.".to_owned(),
            status: None,
            code: None,
            retryable: true,
        }
    }

    /// The attempt did not complete within its timeout.
    pub fn timeout() -> Self {
        Self {
            message: "Request timeout. Please try again.".to_owned(),
            status: None,
            code: Some(CODE_TIMEOUT.to_owned()),
            retryable: true,
        }
    }

    /// The caller cancelled the call. Always terminal.
    pub fn aborted() -> Self {
        Self {
            message: "Request was cancelled".to_owned(),
            status: None,
            code: Some(CODE_ABORTED.to_owned()),
            retryable: false,
        }
    }

    /// Any other failure raised while performing an attempt.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            retryable: true,
        }
    }

    /// The descriptor itself is unusable; no request was sent.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: Some(CODE_INVALID_REQUEST.to_owned()),
            retryable: false,
        }
    }

    pub(crate) fn unknown() -> Self {
        Self {
            message: "Unknown error occurred".to_owned(),
            status: None,
            code: None,
            retryable: false,
        }
    }

    /// Returns `true` if this error carries the `TIMEOUT` code.
    pub fn is_timeout(&self) -> bool {
        self.code.as_deref() == Some(CODE_TIMEOUT)
    }

    /// Returns `true` if this error carries the `ABORTED` code.
    pub fn is_aborted(&self) -> bool {
        self.code.as_deref() == Some(CODE_ABORTED)
    }
}

/// Error returned while constructing an [`ApiClient`](crate::ApiClient).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Base URL is empty, relative, or not http(s).
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// A duration that must be positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    /// Required environment variable is missing or empty.
    #[error("missing {0} environment variable")]
    MissingEnv(&'static str),
    /// Environment variable is present but could not be parsed.
    #[error("{name} is not a valid number: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
    /// Underlying HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}
