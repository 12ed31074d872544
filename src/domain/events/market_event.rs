//! # Market Event
//!
//! Union of all marketplace events, and the mapping from each event to the
//! notifications it produces.

use crate::domain::events::contract_events::{
    ContractCancelled, ContractCreated, ContractExpired, FarmersMatched, OfferAccepted,
    OfferSubmitted,
};
use crate::domain::events::domain_event::{DomainEvent, EventType};
use crate::domain::events::settlement_events::{PayoutCompleted, PayoutFailed};
use crate::domain::value_objects::{
    ContractId, EventId, Notification, NotificationCategory, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Any marketplace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarketEvent {
    /// Contract posted.
    ContractCreated(ContractCreated),
    /// Farmers selected for notification.
    FarmersMatched(FarmersMatched),
    /// Offer submitted.
    OfferSubmitted(OfferSubmitted),
    /// Offer accepted.
    OfferAccepted(OfferAccepted),
    /// Contract withdrawn.
    ContractCancelled(ContractCancelled),
    /// Contract expired.
    ContractExpired(ContractExpired),
    /// Payout issued.
    PayoutCompleted(PayoutCompleted),
    /// Payout attempt failed.
    PayoutFailed(PayoutFailed),
}

impl MarketEvent {
    fn inner(&self) -> &dyn DomainEvent {
        match self {
            Self::ContractCreated(e) => e,
            Self::FarmersMatched(e) => e,
            Self::OfferSubmitted(e) => e,
            Self::OfferAccepted(e) => e,
            Self::ContractCancelled(e) => e,
            Self::ContractExpired(e) => e,
            Self::PayoutCompleted(e) => e,
            Self::PayoutFailed(e) => e,
        }
    }

    /// Returns the notifications this event should produce.
    ///
    /// Events that only matter for audit produce none.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            Self::ContractCreated(_) | Self::PayoutFailed(_) => Vec::new(),
            Self::FarmersMatched(e) => {
                let message = format!(
                    "New contract available for {}. Quantity: {}, Max Price: ${}",
                    e.product_type, e.quantity, e.max_price
                );
                e.farmers
                    .iter()
                    .map(|farmer| {
                        Notification::new(
                            farmer.clone(),
                            message.clone(),
                            NotificationCategory::Contract,
                        )
                    })
                    .collect()
            }
            Self::OfferSubmitted(e) => vec![Notification::new(
                e.buyer.clone(),
                format!(
                    "Farmer {} has offered to fulfill your contract for {}.",
                    e.farmer, e.product_type
                ),
                NotificationCategory::Fulfillment,
            )],
            Self::OfferAccepted(e) => {
                let mut out = vec![Notification::new(
                    e.winner.clone(),
                    format!(
                        "Your fulfillment offer for {} has been accepted!",
                        e.product_type
                    ),
                    NotificationCategory::Fulfillment,
                )];
                out.extend(e.rejected_farmers.iter().map(|farmer| {
                    Notification::new(
                        farmer.clone(),
                        format!(
                            "Your fulfillment offer for {} was not selected.",
                            e.product_type
                        ),
                        NotificationCategory::Fulfillment,
                    )
                }));
                out
            }
            Self::ContractCancelled(e) => e
                .offering_farmers
                .iter()
                .map(|farmer| {
                    Notification::new(
                        farmer.clone(),
                        format!(
                            "The contract for {} you offered on was cancelled by the buyer.",
                            e.product_type
                        ),
                        NotificationCategory::Fulfillment,
                    )
                })
                .collect(),
            Self::ContractExpired(e) => vec![Notification::new(
                e.buyer.clone(),
                format!(
                    "Your contract for {} expired with {} offer(s) and no acceptance.",
                    e.product_type, e.offer_count
                ),
                NotificationCategory::Contract,
            )],
            Self::PayoutCompleted(e) => vec![Notification::new(
                e.recipient.clone(),
                format!(
                    "A payout of ${} {} has been issued to you.",
                    e.net_amount,
                    e.currency.to_uppercase()
                ),
                NotificationCategory::Payout,
            )],
        }
    }
}

impl DomainEvent for MarketEvent {
    fn event_id(&self) -> EventId {
        self.inner().event_id()
    }

    fn contract_id(&self) -> Option<ContractId> {
        self.inner().contract_id()
    }

    fn timestamp(&self) -> Timestamp {
        self.inner().timestamp()
    }

    fn event_type(&self) -> EventType {
        self.inner().event_type()
    }

    fn event_name(&self) -> &'static str {
        self.inner().event_name()
    }
}

macro_rules! impl_from_event {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for MarketEvent {
                fn from(event: $variant) -> Self {
                    Self::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    ContractCreated,
    FarmersMatched,
    OfferSubmitted,
    OfferAccepted,
    ContractCancelled,
    ContractExpired,
    PayoutCompleted,
    PayoutFailed,
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::Contract;
    use crate::domain::value_objects::{PartyId, Quantity};

    fn now() -> Timestamp {
        Timestamp::from_secs(1_700_000_000).unwrap()
    }

    fn contract() -> Contract {
        Contract::builder(
            PartyId::new("buyer-1"),
            "tomatoes",
            Quantity::new(100).unwrap(),
            "10.00".parse().unwrap(),
            now().add_secs(60),
        )
        .build(now())
    }

    #[test]
    fn matched_farmers_get_contract_message() {
        let event: MarketEvent = FarmersMatched::new(
            &contract(),
            vec![PartyId::new("a"), PartyId::new("b")],
            now(),
        )
        .into();
        let notes = event.notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(
            notes[0].message,
            "New contract available for tomatoes. Quantity: 100, Max Price: $10.00"
        );
        assert_eq!(notes[0].category, NotificationCategory::Contract);
    }

    #[test]
    fn offer_submitted_notifies_buyer() {
        let mut contract = contract();
        let offer = contract
            .submit_offer(
                PartyId::new("farmer-a"),
                Quantity::new(80).unwrap(),
                "9.50".parse().unwrap(),
                now(),
            )
            .unwrap();
        let event: MarketEvent = OfferSubmitted::new(&contract, &offer, now()).into();
        let notes = event.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].recipient, PartyId::new("buyer-1"));
        assert_eq!(
            notes[0].message,
            "Farmer farmer-a has offered to fulfill your contract for tomatoes."
        );
        assert_eq!(notes[0].category, NotificationCategory::Fulfillment);
    }

    #[test]
    fn offer_accepted_notifies_winner_first() {
        let mut contract = contract();
        let qty = Quantity::new(1).unwrap();
        let win = contract
            .submit_offer(PartyId::new("a"), qty, "1.00".parse().unwrap(), now())
            .unwrap();
        contract
            .submit_offer(PartyId::new("b"), qty, "1.00".parse().unwrap(), now())
            .unwrap();
        contract.accept_offer(win.id(), now()).unwrap();

        let event: MarketEvent = OfferAccepted::from_contract(&contract, now()).unwrap().into();
        let notes = event.notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(
            notes[0].message,
            "Your fulfillment offer for tomatoes has been accepted!"
        );
        assert_eq!(notes[1].recipient, PartyId::new("b"));
        assert_eq!(event.event_name(), "OfferAccepted");
        assert_eq!(event.contract_id(), Some(contract.id()));
    }

    #[test]
    fn created_event_is_silent() {
        let event: MarketEvent = ContractCreated::from_contract(&contract(), now()).into();
        assert!(event.notifications().is_empty());
    }

    #[test]
    fn serializes_with_type_tag() {
        let event: MarketEvent = ContractExpired::from_contract(&contract(), now()).into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ContractExpired");
    }
}
