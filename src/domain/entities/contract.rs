//! # Contract Aggregate Root
//!
//! An open contract is a buyer's standing purchase request. Farmers submit
//! competing [`Offer`]s until the buyer accepts exactly one of them.
//!
//! # State Machine
//!
//! ```text
//! Open → PendingFulfillment ⟲ (more offers) → Fulfilled
//!   ↓            ↓
//!   └────────────┴→ Expired / Cancelled
//! ```
//!
//! Expiry is evaluated lazily: [`Contract::effective_state`] folds an
//! elapsed end time into [`ContractState::Expired`] without mutating the
//! aggregate, and [`Contract::expire_if_elapsed`] materializes it.
//!
//! # Examples
//!
//! ```
//! use agri_contracts::domain::entities::Contract;
//! use agri_contracts::domain::value_objects::{
//!     ContractState, Money, PartyId, Quantity, Timestamp,
//! };
//!
//! let now = Timestamp::now();
//! let mut contract = Contract::new(
//!     PartyId::new("buyer-1"),
//!     "tomatoes",
//!     "vegetables",
//!     Quantity::new(100).unwrap(),
//!     "10.00".parse::<Money>().unwrap(),
//!     now.add_secs(3600),
//!     now,
//! )
//! .unwrap();
//!
//! let offer = contract
//!     .submit_offer(
//!         PartyId::new("farmer-a"),
//!         Quantity::new(80).unwrap(),
//!         "9.50".parse().unwrap(),
//!         now,
//!     )
//!     .unwrap();
//! contract.accept_offer(offer.id(), now).unwrap();
//!
//! assert_eq!(contract.state(), ContractState::Fulfilled);
//! ```

use crate::domain::entities::offer::Offer;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    ContractId, ContractState, Money, OfferId, OfferState, PartyId, Quantity, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Open contract aggregate root.
///
/// # Invariants
///
/// - `winning_offer_id` is set if and only if the state is Fulfilled
/// - At most one offer is Accepted, and it is the winning offer
/// - Quantity, ceiling and end time never change after creation
/// - Terminal states are never left
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    id: ContractId,
    buyer: PartyId,
    product_type: String,
    product_category: String,
    quantity: Quantity,
    max_price: Money,
    end_time: Timestamp,
    state: ContractState,
    /// Insertion order is submission order.
    offers: Vec<Offer>,
    winning_offer_id: Option<OfferId>,
    /// Farmers already told about this contract.
    notified_parties: BTreeSet<PartyId>,
    /// Version for optimistic locking.
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Contract {
    /// Creates a new open contract.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidPrice` if `max_price` is zero
    /// - `DomainError::ValidationError` if `product_type` is blank or
    ///   `end_time` is not after `now`
    pub fn new(
        buyer: PartyId,
        product_type: impl Into<String>,
        product_category: impl Into<String>,
        quantity: Quantity,
        max_price: Money,
        end_time: Timestamp,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let product_type = product_type.into().trim().to_string();
        if product_type.is_empty() {
            return Err(DomainError::ValidationError(
                "product type must not be empty".to_string(),
            ));
        }
        if !max_price.is_positive() {
            return Err(DomainError::InvalidPrice(
                "max price must be positive".to_string(),
            ));
        }
        if end_time.is_reached_at(now) {
            return Err(DomainError::ValidationError(
                "end time must be in the future".to_string(),
            ));
        }

        Ok(Self {
            id: ContractId::new_v4(),
            buyer,
            product_type,
            product_category: product_category.into().trim().to_string(),
            quantity,
            max_price,
            end_time,
            state: ContractState::Open,
            offers: Vec::new(),
            winning_offer_id: None,
            notified_parties: BTreeSet::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a contract from storage.
    ///
    /// Bypasses validation; only use with trusted data.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ContractId,
        buyer: PartyId,
        product_type: String,
        product_category: String,
        quantity: Quantity,
        max_price: Money,
        end_time: Timestamp,
        state: ContractState,
        offers: Vec<Offer>,
        winning_offer_id: Option<OfferId>,
        notified_parties: BTreeSet<PartyId>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            buyer,
            product_type,
            product_category,
            quantity,
            max_price,
            end_time,
            state,
            offers,
            winning_offer_id,
            notified_parties,
            version,
            created_at,
            updated_at,
        }
    }

    /// Returns a builder for constructing a contract.
    #[must_use]
    pub fn builder(
        buyer: PartyId,
        product_type: impl Into<String>,
        quantity: Quantity,
        max_price: Money,
        end_time: Timestamp,
    ) -> ContractBuilder {
        ContractBuilder::new(buyer, product_type, quantity, max_price, end_time)
    }

    fn transition_to(&mut self, target: ContractState, now: Timestamp) -> DomainResult<()> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
        self.version = self.version.saturating_add(1);
    }

    /// Fails unless the contract can still take offers or an acceptance.
    fn ensure_active(&self, now: Timestamp) -> DomainResult<()> {
        match self.effective_state(now) {
            ContractState::Fulfilled => Err(DomainError::AlreadyFulfilled),
            state if !state.accepts_offers() => Err(DomainError::NotOpen { state }),
            _ => Ok(()),
        }
    }

    // ========== Accessors ==========

    /// Returns the contract ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ContractId {
        self.id
    }

    /// Returns the buyer who posted the contract.
    #[inline]
    #[must_use]
    pub fn buyer(&self) -> &PartyId {
        &self.buyer
    }

    /// Returns the product type.
    #[inline]
    #[must_use]
    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    /// Returns the product category.
    #[inline]
    #[must_use]
    pub fn product_category(&self) -> &str {
        &self.product_category
    }

    /// Returns the requested quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the price ceiling per unit.
    #[inline]
    #[must_use]
    pub fn max_price(&self) -> Money {
        self.max_price
    }

    /// Returns the end time.
    #[inline]
    #[must_use]
    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    /// Returns the stored state, without folding in expiry.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ContractState {
        self.state
    }

    /// Returns the offers in submission order.
    #[inline]
    #[must_use]
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// Looks up an offer by ID.
    #[must_use]
    pub fn offer(&self, offer_id: OfferId) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id() == offer_id)
    }

    /// Returns the winning offer ID, if any.
    #[inline]
    #[must_use]
    pub fn winning_offer_id(&self) -> Option<OfferId> {
        self.winning_offer_id
    }

    /// Returns the winning offer, if any.
    #[must_use]
    pub fn winning_offer(&self) -> Option<&Offer> {
        self.winning_offer_id.and_then(|id| self.offer(id))
    }

    /// Returns the farmers already notified about this contract.
    #[inline]
    #[must_use]
    pub fn notified_parties(&self) -> &BTreeSet<PartyId> {
        &self.notified_parties
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when the contract was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the contract was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    // ========== State Helpers ==========

    /// Returns the state with an elapsed end time folded in.
    ///
    /// Only non-terminal states are affected.
    #[must_use]
    pub fn effective_state(&self, now: Timestamp) -> ContractState {
        if self.state.accepts_offers() && self.end_time.is_reached_at(now) {
            ContractState::Expired
        } else {
            self.state
        }
    }

    /// Returns a copy whose stored state reflects [`effective_state`](Self::effective_state).
    ///
    /// Used for read projections; version and timestamps are unchanged.
    #[must_use]
    pub fn as_of(&self, now: Timestamp) -> Self {
        let mut view = self.clone();
        view.state = self.effective_state(now);
        view
    }

    /// Returns true if `farmer` has submitted at least one offer.
    #[must_use]
    pub fn has_offer_from(&self, farmer: &PartyId) -> bool {
        self.offers.iter().any(|o| o.farmer() == farmer)
    }

    /// Returns the distinct farmers with offers, in first-submission order.
    #[must_use]
    pub fn offering_farmers(&self) -> Vec<PartyId> {
        let mut seen = BTreeSet::new();
        self.offers
            .iter()
            .filter(|o| seen.insert(o.farmer().clone()))
            .map(|o| o.farmer().clone())
            .collect()
    }

    // ========== State Transitions ==========

    /// Materializes an elapsed end time as an Expired transition.
    ///
    /// Returns true if the contract transitioned.
    ///
    /// # Errors
    ///
    /// Never fails for a contract whose effective state is Expired; the
    /// `Result` carries transition-guard failures for corrupted state.
    pub fn expire_if_elapsed(&mut self, now: Timestamp) -> DomainResult<bool> {
        if self.state.accepts_offers() && self.end_time.is_reached_at(now) {
            self.transition_to(ContractState::Expired, now)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Appends a pending offer.
    ///
    /// Transitions: Open → PendingFulfillment, PendingFulfillment → PendingFulfillment
    ///
    /// # Errors
    ///
    /// - `DomainError::NotOpen` if the effective state no longer accepts offers
    /// - `DomainError::AlreadyFulfilled` if an offer was already accepted
    /// - `DomainError::InvalidPrice` if `price` is zero
    /// - `DomainError::PriceExceedsCeiling` if `price` > max price
    /// - `DomainError::QuantityExceedsRequested` if `quantity` > requested quantity
    pub fn submit_offer(
        &mut self,
        farmer: PartyId,
        quantity: Quantity,
        price: Money,
        now: Timestamp,
    ) -> DomainResult<Offer> {
        let state = self.effective_state(now);
        if !state.accepts_offers() {
            return Err(DomainError::NotOpen { state });
        }
        if !price.is_positive() {
            return Err(DomainError::InvalidPrice(
                "offer price must be positive".to_string(),
            ));
        }
        if price > self.max_price {
            return Err(DomainError::PriceExceedsCeiling {
                offered: price,
                ceiling: self.max_price,
            });
        }
        if quantity > self.quantity {
            return Err(DomainError::QuantityExceedsRequested {
                offered: quantity,
                requested: self.quantity,
            });
        }

        let offer = Offer::pending(farmer, quantity, price, now);
        self.transition_to(ContractState::PendingFulfillment, now)?;
        self.offers.push(offer.clone());
        Ok(offer)
    }

    /// Accepts one offer and rejects all of its pending siblings.
    ///
    /// Transitions: PendingFulfillment → Fulfilled
    ///
    /// # Errors
    ///
    /// - `DomainError::AlreadyFulfilled` if a winner was already chosen
    /// - `DomainError::NotOpen` if expired or cancelled
    /// - `DomainError::OfferNotFound` if `offer_id` is not part of this contract
    pub fn accept_offer(&mut self, offer_id: OfferId, now: Timestamp) -> DomainResult<()> {
        self.ensure_active(now)?;
        if self.offer(offer_id).is_none() {
            return Err(DomainError::OfferNotFound(offer_id));
        }

        self.transition_to(ContractState::Fulfilled, now)?;
        for offer in &mut self.offers {
            if offer.id() == offer_id {
                offer.accept();
            } else {
                offer.reject();
            }
        }
        self.winning_offer_id = Some(offer_id);
        Ok(())
    }

    /// Withdraws the contract. Pending offers are rejected.
    ///
    /// Transitions: Open | PendingFulfillment → Cancelled
    ///
    /// # Errors
    ///
    /// - `DomainError::AlreadyFulfilled` if a winner was already chosen
    /// - `DomainError::NotOpen` if already expired or cancelled
    pub fn cancel(&mut self, now: Timestamp) -> DomainResult<()> {
        self.ensure_active(now)?;
        self.transition_to(ContractState::Cancelled, now)?;
        for offer in &mut self.offers {
            offer.reject();
        }
        Ok(())
    }

    /// Records farmers as notified and returns those not seen before.
    pub fn mark_notified<I>(&mut self, farmers: I, now: Timestamp) -> Vec<PartyId>
    where
        I: IntoIterator<Item = PartyId>,
    {
        let added: Vec<PartyId> = farmers
            .into_iter()
            .filter(|farmer| self.notified_parties.insert(farmer.clone()))
            .collect();
        if !added.is_empty() {
            self.touch(now);
        }
        added
    }

    /// Number of offers in each state, for diagnostics.
    #[must_use]
    pub fn offer_count(&self, state: OfferState) -> usize {
        self.offers.iter().filter(|o| o.state() == state).count()
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Contract({} {} x{} <= {} [{}])",
            self.id, self.product_type, self.quantity, self.max_price, self.state
        )
    }
}

/// Builder for [`Contract`].
#[derive(Debug, Clone)]
#[must_use = "builders do nothing unless .build() is called"]
pub struct ContractBuilder {
    buyer: PartyId,
    product_type: String,
    product_category: String,
    quantity: Quantity,
    max_price: Money,
    end_time: Timestamp,
}

impl ContractBuilder {
    /// Creates a new builder with required fields.
    pub fn new(
        buyer: PartyId,
        product_type: impl Into<String>,
        quantity: Quantity,
        max_price: Money,
        end_time: Timestamp,
    ) -> Self {
        Self {
            buyer,
            product_type: product_type.into(),
            product_category: String::new(),
            quantity,
            max_price,
            end_time,
        }
    }

    /// Sets the product category.
    pub fn product_category(mut self, category: impl Into<String>) -> Self {
        self.product_category = category.into();
        self
    }

    /// Builds the contract without validation, created at `now`.
    ///
    /// Use [`try_build`](Self::try_build) for validated construction.
    #[must_use]
    pub fn build(self, now: Timestamp) -> Contract {
        Contract {
            id: ContractId::new_v4(),
            buyer: self.buyer,
            product_type: self.product_type,
            product_category: self.product_category,
            quantity: self.quantity,
            max_price: self.max_price,
            end_time: self.end_time,
            state: ContractState::Open,
            offers: Vec::new(),
            winning_offer_id: None,
            notified_parties: BTreeSet::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the contract with validation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if validation fails.
    pub fn try_build(self, now: Timestamp) -> DomainResult<Contract> {
        Contract::new(
            self.buyer,
            self.product_type,
            self.product_category,
            self.quantity,
            self.max_price,
            self.end_time,
            now,
        )
    }
}
