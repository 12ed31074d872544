//! # Contract State
//!
//! Open contract lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Open → PendingFulfillment → PendingFulfillment (more offers)
//!   ↓            ↓
//!   │            └──────────→ Fulfilled
//!   ├────────────┴──────────→ Expired   (end time elapsed)
//!   └────────────┴──────────→ Cancelled (buyer)
//! ```
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::value_objects::ContractState;
//!
//! let state = ContractState::Open;
//! assert!(state.can_transition_to(ContractState::PendingFulfillment));
//! assert!(!state.can_transition_to(ContractState::Fulfilled));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contract lifecycle state.
///
/// # Terminal States
///
/// - [`Fulfilled`](ContractState::Fulfilled): an offer was accepted and settled
/// - [`Expired`](ContractState::Expired): end time elapsed first
/// - [`Cancelled`](ContractState::Cancelled): withdrawn by the buyer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractState {
    /// Posted, no offers yet.
    #[default]
    Open,
    /// At least one offer is awaiting the buyer's decision.
    PendingFulfillment,
    /// An offer was accepted (terminal).
    Fulfilled,
    /// End time elapsed before acceptance (terminal).
    Expired,
    /// Withdrawn by the buyer (terminal).
    Cancelled,
}

impl ContractState {
    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Fulfilled | Self::Expired | Self::Cancelled)
    }

    /// Returns true if offers may still be submitted.
    #[inline]
    #[must_use]
    pub const fn accepts_offers(&self) -> bool {
        matches!(self, Self::Open | Self::PendingFulfillment)
    }

    /// Returns true if this state can transition to the target state.
    ///
    /// - Open → PendingFulfillment, Expired, Cancelled
    /// - PendingFulfillment → PendingFulfillment, Fulfilled, Expired, Cancelled
    /// - Terminal states → (none)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::PendingFulfillment)
                | (Self::Open, Self::Expired)
                | (Self::Open, Self::Cancelled)
                | (Self::PendingFulfillment, Self::PendingFulfillment)
                | (Self::PendingFulfillment, Self::Fulfilled)
                | (Self::PendingFulfillment, Self::Expired)
                | (Self::PendingFulfillment, Self::Cancelled)
        )
    }

    /// Returns the valid next states from this state.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Open => vec![Self::PendingFulfillment, Self::Expired, Self::Cancelled],
            Self::PendingFulfillment => vec![
                Self::PendingFulfillment,
                Self::Fulfilled,
                Self::Expired,
                Self::Cancelled,
            ],
            Self::Fulfilled | Self::Expired | Self::Cancelled => vec![],
        }
    }
}

impl fmt::Display for ContractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::PendingFulfillment => "PENDING_FULFILLMENT",
            Self::Fulfilled => "FULFILLED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [ContractState; 5] = [
        ContractState::Open,
        ContractState::PendingFulfillment,
        ContractState::Fulfilled,
        ContractState::Expired,
        ContractState::Cancelled,
    ];

    mod transitions {
        use super::*;

        #[test]
        fn open_cannot_be_fulfilled_directly() {
            assert!(!ContractState::Open.can_transition_to(ContractState::Fulfilled));
        }

        #[test]
        fn pending_accepts_more_offers() {
            assert!(
                ContractState::PendingFulfillment
                    .can_transition_to(ContractState::PendingFulfillment)
            );
        }

        #[test]
        fn pending_can_be_fulfilled() {
            assert!(
                ContractState::PendingFulfillment.can_transition_to(ContractState::Fulfilled)
            );
        }

        #[test]
        fn terminal_states_have_no_transitions() {
            for state in ALL.iter().filter(|s| s.is_terminal()) {
                assert!(state.valid_transitions().is_empty());
                for target in ALL {
                    assert!(!state.can_transition_to(target));
                }
            }
        }

        #[test]
        fn valid_transitions_agree_with_predicate() {
            for state in ALL {
                for target in ALL {
                    assert_eq!(
                        state.can_transition_to(target),
                        state.valid_transitions().contains(&target),
                        "{state} -> {target}"
                    );
                }
            }
        }
    }

    mod helpers {
        use super::*;

        #[test]
        fn accepts_offers_only_while_active() {
            assert!(ContractState::Open.accepts_offers());
            assert!(ContractState::PendingFulfillment.accepts_offers());
            assert!(!ContractState::Fulfilled.accepts_offers());
            assert!(!ContractState::Expired.accepts_offers());
        }

        #[test]
        fn display_formats() {
            assert_eq!(
                ContractState::PendingFulfillment.to_string(),
                "PENDING_FULFILLMENT"
            );
        }

        #[test]
        fn serde_roundtrip() {
            for state in ALL {
                let json = serde_json::to_string(&state).unwrap();
                let back: ContractState = serde_json::from_str(&json).unwrap();
                assert_eq!(state, back);
            }
        }
    }
}
