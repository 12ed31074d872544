//! # Notification
//!
//! Message handed to the notification collaborator.

use crate::domain::value_objects::ids::PartyId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel grouping used by clients to filter notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    /// New contracts matching a farmer's catalog.
    Contract,
    /// Offer submission and acceptance.
    Fulfillment,
    /// Money movements.
    Payout,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract => write!(f, "contract"),
            Self::Fulfillment => write!(f, "fulfillment"),
            Self::Payout => write!(f, "payout"),
        }
    }
}

/// A single `(recipient, message, category)` delivery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Party to notify.
    pub recipient: PartyId,
    /// Human-readable text.
    pub message: String,
    /// Channel grouping.
    pub category: NotificationCategory,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(
        recipient: PartyId,
        message: impl Into<String>,
        category: NotificationCategory,
    ) -> Self {
        Self {
            recipient,
            message: message.into(),
            category,
        }
    }
}
