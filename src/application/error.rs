//! # Application Errors
//!
//! Error types for the marketplace use cases.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)          - Aggregate rule violations
//! ├── NotFound                     - Unknown contract, transaction, role tag
//! ├── Forbidden                    - Caller does not own the resource
//! ├── SettlementFailed             - Accept aborted, nothing persisted
//! ├── PayoutRetryable              - Processor transiently unavailable
//! ├── PayoutUnavailable            - Payout cannot be issued
//! ├── AlreadyPaid                  - Transaction already settled
//! ├── LookupFailed                 - Party directory unavailable
//! ├── InvalidState                 - Precondition on stored state violated
//! ├── Repository(RepositoryError)  - Storage failure
//! └── Gateway(GatewayError)        - Other collaborator failure
//! ```
//!
//! Every variant maps onto one [`ErrorKind`], which is what callers branch on.
//!
//! # Examples
//!
//! ```
//! use agri_contracts::application::error::{ApplicationError, ErrorKind};
//!
//! let err = ApplicationError::forbidden("only the buyer may accept an offer");
//! assert_eq!(err.kind(), ErrorKind::AuthorizationDenied);
//!
//! let err = ApplicationError::not_found("contract", "c-123");
//! assert!(err.is_not_found());
//! ```

use crate::domain::errors::DomainError;
use crate::infrastructure::gateways::GatewayError;
use crate::infrastructure::persistence::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Caller-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request values are malformed or out of bounds.
    InputValidation,
    /// Caller is not allowed to perform the operation.
    AuthorizationDenied,
    /// Current state forbids the operation.
    StateConflict,
    /// Referenced entity does not exist.
    NotFound,
    /// A collaborator or storage backend failed.
    CollaboratorUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InputValidation => "input_validation",
            Self::AuthorizationDenied => "authorization_denied",
            Self::StateConflict => "state_conflict",
            Self::NotFound => "not_found",
            Self::CollaboratorUnavailable => "collaborator_unavailable",
        };
        write!(f, "{s}")
    }
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain rule violation.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Caller does not own the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Settlement failed during acceptance; the contract was not changed.
    #[error("settlement failed: {reason}")]
    SettlementFailed {
        /// Underlying cause.
        reason: String,
        /// Whether repeating the accept may succeed.
        retryable: bool,
    },

    /// The payment processor is temporarily unavailable.
    #[error("payout temporarily unavailable: {0}")]
    PayoutRetryable(String),

    /// The payout cannot be issued.
    #[error("payout unavailable: {0}")]
    PayoutUnavailable(String),

    /// The transaction has already been paid out.
    #[error("transaction already paid: {0}")]
    AlreadyPaid(String),

    /// The party directory could not be consulted.
    #[error("party lookup failed: {0}")]
    LookupFailed(String),

    /// Stored state does not satisfy the operation's precondition.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Collaborator failure outside the dedicated variants.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl ApplicationError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a settlement failure.
    #[must_use]
    pub fn settlement_failed(reason: impl Into<String>, retryable: bool) -> Self {
        Self::SettlementFailed {
            reason: reason.into(),
            retryable,
        }
    }

    /// Creates a retryable payout error.
    #[must_use]
    pub fn payout_retryable(message: impl Into<String>) -> Self {
        Self::PayoutRetryable(message.into())
    }

    /// Creates a fatal payout error.
    #[must_use]
    pub fn payout_unavailable(message: impl Into<String>) -> Self {
        Self::PayoutUnavailable(message.into())
    }

    /// Creates a lookup failure.
    #[must_use]
    pub fn lookup_failed(message: impl Into<String>) -> Self {
        Self::LookupFailed(message.into())
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Maps the error onto the caller-facing taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(DomainError::OfferNotFound(_)) => ErrorKind::NotFound,
            Self::Domain(e) if e.is_validation() => ErrorKind::InputValidation,
            Self::Domain(_) => ErrorKind::StateConflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::AuthorizationDenied,
            Self::AlreadyPaid(_) | Self::InvalidState(_) => ErrorKind::StateConflict,
            Self::Repository(RepositoryError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Repository(RepositoryError::VersionConflict { .. })
            | Self::Repository(RepositoryError::Duplicate { .. }) => ErrorKind::StateConflict,
            Self::SettlementFailed { .. }
            | Self::PayoutRetryable(_)
            | Self::PayoutUnavailable(_)
            | Self::LookupFailed(_)
            | Self::Repository(_)
            | Self::Gateway(_) => ErrorKind::CollaboratorUnavailable,
        }
    }

    /// Returns true if repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SettlementFailed { retryable, .. } => *retryable,
            Self::PayoutRetryable(_) | Self::LookupFailed(_) => true,
            Self::Repository(e) => e.is_version_conflict() || e.is_connection(),
            Self::Gateway(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::InputValidation
    }

    /// Returns true if this is an authorization error.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Returns the wrapped domain error, if any.
    #[must_use]
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ContractState, OfferId};

    mod kind {
        use super::*;

        #[test]
        fn domain_validation_is_input_validation() {
            let err: ApplicationError = DomainError::InvalidPrice("zero".into()).into();
            assert_eq!(err.kind(), ErrorKind::InputValidation);
            assert!(err.is_validation());
        }

        #[test]
        fn domain_state_errors_are_conflicts() {
            let err: ApplicationError = DomainError::AlreadyFulfilled.into();
            assert_eq!(err.kind(), ErrorKind::StateConflict);

            let err: ApplicationError = DomainError::NotOpen {
                state: ContractState::Cancelled,
            }
            .into();
            assert_eq!(err.kind(), ErrorKind::StateConflict);
        }

        #[test]
        fn missing_offer_is_not_found() {
            let err: ApplicationError = DomainError::OfferNotFound(OfferId::new_v4()).into();
            assert!(err.is_not_found());
        }

        #[test]
        fn collaborator_failures() {
            for err in [
                ApplicationError::settlement_failed("timeout", true),
                ApplicationError::payout_retryable("503"),
                ApplicationError::payout_unavailable("no destination"),
                ApplicationError::lookup_failed("directory down"),
                ApplicationError::Repository(RepositoryError::connection("gone")),
            ] {
                assert_eq!(err.kind(), ErrorKind::CollaboratorUnavailable, "{err}");
            }
        }

        #[test]
        fn forbidden_and_already_paid() {
            assert_eq!(
                ApplicationError::forbidden("x").kind(),
                ErrorKind::AuthorizationDenied
            );
            assert_eq!(
                ApplicationError::AlreadyPaid("t".into()).kind(),
                ErrorKind::StateConflict
            );
        }
    }

    mod retryable {
        use super::*;

        #[test]
        fn settlement_failure_carries_flag() {
            assert!(ApplicationError::settlement_failed("t", true).is_retryable());
            assert!(!ApplicationError::settlement_failed("t", false).is_retryable());
        }

        #[test]
        fn fatal_payout_is_not_retryable() {
            assert!(!ApplicationError::payout_unavailable("x").is_retryable());
            assert!(ApplicationError::payout_retryable("x").is_retryable());
        }

        #[test]
        fn gateway_delegates() {
            let err: ApplicationError = GatewayError::timeout("slow").into();
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn display_is_informative() {
        let err = ApplicationError::not_found("contract", "c-1");
        assert_eq!(err.to_string(), "not found: contract with id c-1");
        assert_eq!(ErrorKind::StateConflict.to_string(), "state_conflict");
    }
}
