//! Error taxonomy for fetch operations.
//!
//! Every failure a fetcher can produce is one of these variants. HTTP status
//! classification is a pure function of the status code; transport failures
//! map to `Network` or `Timeout` depending on the underlying cause.

use std::error::Error as StdError;

type Cause = Box<dyn StdError + Send + Sync>;

/// Structured error produced by a fetch operation.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection refused, I/O).
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// The provider rejected the request due to rate limiting (HTTP 429).
    #[error("rate limit exceeded (status {status})")]
    RateLimit { status: u16 },

    /// The provider returned a server error (HTTP 5xx).
    #[error("server error (status {status})")]
    Server { status: u16 },

    /// The request was rejected by the provider (HTTP 4xx except 429).
    #[error("client error (status {status}): {message}")]
    Client { status: u16, message: String },

    /// The response arrived but its payload failed validation.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The request or the orchestration deadline timed out.
    #[error("timeout: {message}")]
    Timeout {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// Anything that does not fit the other categories.
    #[error("unexpected error (status {status}): {message}")]
    Unknown { status: u16, message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            cause: None,
        }
    }

    /// Classify an unsuccessful HTTP status code.
    ///
    /// 429 is rate limiting, 5xx is a server fault, any other 4xx is a
    /// client fault, and everything else lands in `Unknown`.
    pub fn classify_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimit { status },
            s if s >= 500 => Self::Server { status: s },
            s if (400..500).contains(&s) => Self::Client {
                status: s,
                message: format!("client error: HTTP {s}"),
            },
            s => Self::Unknown {
                status: s,
                message: format!("unexpected status code: {s}"),
            },
        }
    }

    /// Map a transport error from reqwest onto the taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                message: "request timed out".to_string(),
                cause: Some(Box::new(err)),
            }
        } else {
            Self::Network {
                message: "network request failed".to_string(),
                cause: Some(Box::new(err)),
            }
        }
    }

    /// Whether the retry policy may attempt this request again.
    pub fn retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RateLimit { .. } | Self::Server { .. } => true,
            Self::Timeout { .. } => true,
            Self::Client { .. } | Self::Validation { .. } | Self::Unknown { .. } => false,
        }
    }

    /// The HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimit { status }
            | Self::Server { status }
            | Self::Client { status, .. }
            | Self::Unknown { status, .. } => Some(*status),
            Self::Network { .. } | Self::Validation { .. } | Self::Timeout { .. } => None,
        }
    }
}
