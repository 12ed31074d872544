//! # Collaborator Ports
//!
//! Narrow interfaces to the systems the marketplace core depends on but
//! does not implement.
//!
//! - [`PartyDirectory`]: read-only party profiles (catalog, payout linkage)
//! - [`Notifier`]: best-effort message delivery
//! - [`PaymentIssuer`]: payout issuance, deduplicated by idempotency key
//!
//! Implementations are injected as `Arc<dyn Trait>` so tests can substitute
//! fakes.

use crate::domain::value_objects::{ExternalPayoutId, Money, Notification, PartyId, PartyRole};
use crate::infrastructure::gateways::error::GatewayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile of a party as held by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyProfile {
    /// Party identity.
    pub id: PartyId,
    /// Declared role.
    pub role: PartyRole,
    /// Display name.
    pub display_name: String,
    /// Product types the party supplies (farmers only).
    #[serde(default)]
    pub product_catalog: Vec<String>,
    /// Linked payout account, if onboarding is complete.
    #[serde(default)]
    pub payout_destination: Option<String>,
    /// Contact channel for notifications.
    #[serde(default)]
    pub contact_channel: Option<String>,
}

impl PartyProfile {
    /// Creates a farmer profile with a product catalog.
    #[must_use]
    pub fn farmer<I, S>(id: impl Into<String>, display_name: impl Into<String>, catalog: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: PartyId::new(id),
            role: PartyRole::Farmer,
            display_name: display_name.into(),
            product_catalog: catalog.into_iter().map(Into::into).collect(),
            payout_destination: None,
            contact_channel: None,
        }
    }

    /// Creates a buyer profile.
    #[must_use]
    pub fn buyer(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: PartyId::new(id),
            role: PartyRole::Buyer,
            display_name: display_name.into(),
            product_catalog: Vec::new(),
            payout_destination: None,
            contact_channel: None,
        }
    }

    /// Sets the linked payout destination.
    #[must_use]
    pub fn with_payout_destination(mut self, destination: impl Into<String>) -> Self {
        self.payout_destination = Some(destination.into());
        self
    }

    /// Sets the contact channel.
    #[must_use]
    pub fn with_contact_channel(mut self, channel: impl Into<String>) -> Self {
        self.contact_channel = Some(channel.into());
        self
    }

    /// Returns true if the catalog lists `product_type`.
    ///
    /// Comparison ignores case and surrounding whitespace.
    #[must_use]
    pub fn supplies(&self, product_type: &str) -> bool {
        let wanted = product_type.trim();
        self.product_catalog
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(wanted))
    }
}

/// Instruction handed to the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInstruction {
    /// Recipient's linked payout account.
    pub destination: String,
    /// Net amount to pay.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Deduplication key; the same key never pays twice.
    pub idempotency_key: String,
}

/// Read-only directory of party profiles.
#[async_trait]
pub trait PartyDirectory: Send + Sync + fmt::Debug {
    /// Resolves a party's profile.
    async fn get_profile(&self, party: &PartyId) -> GatewayResult<Option<PartyProfile>>;

    /// Finds farmers whose catalog lists `product_type`.
    async fn find_farmers_by_product(&self, product_type: &str)
    -> GatewayResult<Vec<PartyProfile>>;
}

/// Best-effort notification delivery.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Delivers one notification.
    async fn notify(&self, notification: &Notification) -> GatewayResult<()>;
}

/// Payout issuance at the payment processor.
///
/// Implementations must treat `idempotency_key` as a deduplication key:
/// repeating an instruction with the same key returns the original payout.
#[async_trait]
pub trait PaymentIssuer: Send + Sync + fmt::Debug {
    /// Issues a payout and returns the processor's identifier.
    async fn issue_payout(&self, instruction: &PayoutInstruction)
    -> GatewayResult<ExternalPayoutId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplies_ignores_case_and_whitespace() {
        let farmer = PartyProfile::farmer("f1", "Farm One", [" Tomatoes ", "beans"]);
        assert!(farmer.supplies("tomatoes"));
        assert!(farmer.supplies("BEANS "));
        assert!(!farmer.supplies("corn"));
    }

    #[test]
    fn buyer_has_empty_catalog() {
        let buyer = PartyProfile::buyer("b1", "Grocer").with_contact_channel("sms:+100");
        assert_eq!(buyer.role, PartyRole::Buyer);
        assert!(!buyer.supplies("tomatoes"));
        assert_eq!(buyer.contact_channel.as_deref(), Some("sms:+100"));
    }
}
