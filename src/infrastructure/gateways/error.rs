//! # Gateway Errors
//!
//! Error types for calls to external collaborators (party directory,
//! notifier, payment issuer).
//!
//! # Examples
//!
//! ```
//! use agri_contracts::infrastructure::gateways::error::GatewayError;
//!
//! let error = GatewayError::timeout_with_duration("payout request", 10_000);
//! assert!(error.is_retryable());
//!
//! let error = GatewayError::rejected("destination account closed");
//! assert!(!error.is_retryable());
//! ```

use thiserror::Error;

/// Error type for collaborator calls.
///
/// Classified as retryable (transient transport trouble) or fatal (the
/// collaborator understood and refused the request).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Call did not complete in time.
    #[error("gateway timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Timeout duration in milliseconds.
        timeout_ms: Option<u64>,
    },

    /// Network or connection error, or a 5xx from the collaborator.
    #[error("gateway connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("gateway rate limit exceeded: {message}")]
    RateLimited {
        /// Error message.
        message: String,
    },

    /// Credentials rejected.
    #[error("gateway authentication error: {message}")]
    Authentication {
        /// Error message.
        message: String,
    },

    /// Request was malformed.
    #[error("gateway invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// Collaborator refused the operation (e.g. payout declined).
    #[error("gateway rejected request: {message}")]
    Rejected {
        /// Error message.
        message: String,
        /// Collaborator-specific error code.
        code: Option<String>,
    },

    /// Response could not be understood.
    #[error("gateway protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// Local failure building or sending the request.
    #[error("gateway internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl GatewayError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with duration.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            code: None,
        }
    }

    /// Creates a rejection error with a collaborator code.
    #[must_use]
    pub fn rejected_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::RateLimited { .. }
        )
    }

    /// Returns true if this is a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for collaborator calls.
pub type GatewayResult<T> = Result<T, GatewayError>;
