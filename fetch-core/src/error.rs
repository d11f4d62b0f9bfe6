use serde::{Deserialize, Serialize};

/// Discriminator carried by cancellation errors.
pub const ABORT_ERROR: &str = "AbortError";

/// Errors a fetch cycle can settle with.
///
/// Everything except the cancellation kind is delivered to the consumer
/// through the hook's `error` cell. Variants hold rendered strings rather
/// than the underlying client errors so the value can be cloned into state.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error,
)]
pub enum FetchError {
    /// The request was cancelled through its abort signal.
    #[error("The request was aborted.")]
    Aborted,
    #[error("Network error. Please check your connection.")]
    Network(String),
    /// The server answered with a non-2xx status, containing response text.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("The request timed out.")]
    Timeout,
    #[error("Could not decode response: {0}")]
    Decode(String),
    /// The request could not be built, e.g. a malformed URL.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// An error raised by an injected transport with its own discriminator.
    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl FetchError {
    pub fn other(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Discriminator of this error, mirroring the `name` of browser errors.
    pub fn name(&self) -> &str {
        match self {
            Self::Aborted => ABORT_ERROR,
            Self::Network(_) => "NetworkError",
            Self::Status { .. } => "HttpError",
            Self::Timeout => "TimeoutError",
            Self::Decode(_) => "DecodeError",
            Self::InvalidRequest(_) => "TypeError",
            Self::Other { name, .. } => name,
        }
    }

    /// True for the cancellation kind, which is never surfaced as state.
    pub fn is_abort(&self) -> bool {
        self.name() == ABORT_ERROR
    }

    /// HTTP status of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
