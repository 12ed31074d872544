//! # Contract Ledger
//!
//! Owns contract records and drives the negotiation state machine.
//!
//! ```text
//! Open ──offer──► PendingFulfillment ──offer──► PendingFulfillment
//!   │                    │
//!   │                    └──accept──► Fulfilled (settled before commit)
//!   ├── end_time elapses ──► Expired
//!   └── buyer cancels    ──► Cancelled
//! ```
//!
//! # Concurrency
//!
//! Every mutation of a contract runs under that contract's async mutex, and
//! the repository update additionally checks the loaded version. Offers
//! submitted concurrently are all appended; of several concurrent accepts
//! exactly one wins and the rest observe `AlreadyFulfilled`.
//!
//! Notifications are dispatched only after the contract lock is released.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::lock_table::LockTable;
use crate::application::services::matcher::Matcher;
use crate::application::services::notification_dispatcher::NotificationDispatcher;
use crate::application::services::settlement_engine::SettlementEngine;
use crate::domain::entities::{Contract, Offer};
use crate::domain::errors::DomainError;
use crate::domain::events::{
    ContractCancelled, ContractCreated, ContractExpired, FarmersMatched, MarketEvent,
    OfferAccepted, OfferSubmitted,
};
use crate::domain::value_objects::{
    ContractId, ContractState, Money, OfferId, PartyId, PartyRole, Quantity, Timestamp,
};
use crate::infrastructure::persistence::ContractRepository;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Contract ledger.
#[derive(Debug)]
pub struct ContractLedger {
    contracts: Arc<dyn ContractRepository>,
    matcher: Matcher,
    settlement: Arc<SettlementEngine>,
    dispatcher: Arc<NotificationDispatcher>,
    locks: LockTable<ContractId>,
}

impl ContractLedger {
    /// Creates a ledger.
    #[must_use]
    pub fn new(
        contracts: Arc<dyn ContractRepository>,
        matcher: Matcher,
        settlement: Arc<SettlementEngine>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            contracts,
            matcher,
            settlement,
            dispatcher,
            locks: LockTable::new(),
        }
    }

    async fn load(&self, id: ContractId) -> ApplicationResult<Contract> {
        self.contracts
            .get(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("contract", id))
    }

    /// Persists an elapsed end time as Expired.
    ///
    /// Returns the event to publish once the lock is released.
    async fn materialize_expiry(
        &self,
        contract: &mut Contract,
        now: Timestamp,
    ) -> ApplicationResult<Option<MarketEvent>> {
        let expected = contract.version();
        if !contract.expire_if_elapsed(now)? {
            return Ok(None);
        }
        self.contracts.update(contract, expected).await?;
        info!(contract_id = %contract.id(), "Contract expired");
        Ok(Some(ContractExpired::from_contract(contract, now).into()))
    }

    // ========== Commands ==========

    /// Posts a new open contract and runs a best-effort matching pass.
    ///
    /// The returned contract is the one as created: Open, without offers or
    /// notified parties. Matching failures are logged and never fail the call.
    ///
    /// # Errors
    ///
    /// - Validation errors for a blank product type, zero price, or an end
    ///   time that is not in the future
    /// - Repository errors
    pub async fn create_contract(
        &self,
        buyer: PartyId,
        product_type: &str,
        product_category: &str,
        quantity: Quantity,
        max_price: Money,
        end_time: Timestamp,
    ) -> ApplicationResult<Contract> {
        let now = Timestamp::now();
        let contract = Contract::new(
            buyer,
            product_type,
            product_category,
            quantity,
            max_price,
            end_time,
            now,
        )?;
        self.contracts.insert(&contract).await?;
        info!(
            contract_id = %contract.id(),
            buyer = %contract.buyer(),
            product_type = contract.product_type(),
            quantity = %contract.quantity(),
            max_price = %contract.max_price(),
            "Contract created"
        );
        self.dispatcher
            .dispatch(ContractCreated::from_contract(&contract, now));

        if let Err(e) = self.notify_eligible_farmers(contract.id()).await {
            warn!(contract_id = %contract.id(), error = %e, "Matching pass failed");
        }
        Ok(contract)
    }

    /// Runs one matching pass and notifies farmers not notified before.
    ///
    /// Farmers are recorded as notified before dispatch, so repeated passes
    /// never notify anyone twice. Closed contracts match nobody.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` for an unknown contract
    /// - `ApplicationError::LookupFailed` if the directory is unavailable;
    ///   nobody is notified
    pub async fn notify_eligible_farmers(
        &self,
        contract_id: ContractId,
    ) -> ApplicationResult<Vec<PartyId>> {
        let snapshot = self.load(contract_id).await?;
        if !snapshot.effective_state(Timestamp::now()).accepts_offers() {
            return Ok(Vec::new());
        }
        let eligible = self.matcher.find_eligible(snapshot.product_type()).await?;

        let guard = self.locks.lock(contract_id).await;
        let mut contract = self.load(contract_id).await?;
        let now = Timestamp::now();
        if !contract.effective_state(now).accepts_offers() {
            return Ok(Vec::new());
        }
        let expected = contract.version();
        let buyer = contract.buyer().clone();
        let added = contract.mark_notified(eligible.into_iter().filter(|f| f != &buyer), now);
        if added.is_empty() {
            return Ok(added);
        }
        self.contracts.update(&contract, expected).await?;
        drop(guard);

        info!(contract_id = %contract_id, farmers = added.len(), "Farmers matched");
        self.dispatcher
            .dispatch(FarmersMatched::new(&contract, added.clone(), now));
        Ok(added)
    }

    /// Submits a farmer's offer.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` for an unknown contract
    /// - `DomainError::NotOpen` if the contract no longer accepts offers;
    ///   an elapsed end time is persisted as Expired first
    /// - `DomainError::InvalidPrice`, `PriceExceedsCeiling`, or
    ///   `QuantityExceedsRequested` for out-of-bounds offers
    pub async fn submit_offer(
        &self,
        contract_id: ContractId,
        farmer: PartyId,
        quantity: Quantity,
        price: Money,
    ) -> ApplicationResult<Offer> {
        let guard = self.locks.lock(contract_id).await;
        let mut contract = self.load(contract_id).await?;
        let now = Timestamp::now();

        if let Some(expired) = self.materialize_expiry(&mut contract, now).await? {
            drop(guard);
            self.dispatcher.dispatch(expired);
            return Err(DomainError::NotOpen {
                state: ContractState::Expired,
            }
            .into());
        }

        let expected = contract.version();
        let offer = contract.submit_offer(farmer, quantity, price, now)?;
        self.contracts.update(&contract, expected).await?;
        drop(guard);

        info!(
            contract_id = %contract_id,
            offer_id = %offer.id(),
            farmer = %offer.farmer(),
            quantity = %offer.quantity(),
            price = %offer.price(),
            "Offer submitted"
        );
        self.dispatcher
            .dispatch(OfferSubmitted::new(&contract, &offer, now));
        Ok(offer)
    }

    /// Accepts an offer and settles it before returning.
    ///
    /// The acceptance is applied to a scratch copy; it is persisted only if
    /// settlement succeeds. On failure the contract keeps its prior state and
    /// further offers remain admissible.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` for an unknown contract
    /// - `ApplicationError::Forbidden` if `buyer` does not own the contract
    /// - `DomainError::AlreadyFulfilled` if a winner was already chosen
    /// - `DomainError::NotOpen` if expired or cancelled
    /// - `DomainError::OfferNotFound` for an unknown offer
    /// - `ApplicationError::SettlementFailed` if the payout could not be made
    pub async fn accept_offer(
        &self,
        contract_id: ContractId,
        buyer: &PartyId,
        offer_id: OfferId,
    ) -> ApplicationResult<Contract> {
        let guard = self.locks.lock(contract_id).await;
        let mut contract = self.load(contract_id).await?;
        if contract.buyer() != buyer {
            return Err(ApplicationError::forbidden(
                "only the contract's buyer may accept an offer",
            ));
        }
        let now = Timestamp::now();

        if let Some(expired) = self.materialize_expiry(&mut contract, now).await? {
            drop(guard);
            self.dispatcher.dispatch(expired);
            return Err(DomainError::NotOpen {
                state: ContractState::Expired,
            }
            .into());
        }

        let expected = contract.version();
        let mut scratch = contract.clone();
        scratch.accept_offer(offer_id, now)?;

        let attempt = self.settlement.settle_contract(&scratch, now).await;
        let result = match attempt.result {
            Ok(payout) => match self.contracts.update(&scratch, expected).await {
                Ok(()) => {
                    info!(
                        contract_id = %contract_id,
                        offer_id = %offer_id,
                        payout_id = %payout.id(),
                        "Offer accepted"
                    );
                    Ok(scratch)
                }
                Err(e) => Err(e.into()),
            },
            Err(e) => {
                error!(
                    contract_id = %contract_id,
                    offer_id = %offer_id,
                    error = %e,
                    "Settlement failed; acceptance rolled back"
                );
                Err(ApplicationError::settlement_failed(
                    e.to_string(),
                    e.is_retryable(),
                ))
            }
        };
        drop(guard);

        if let Ok(accepted) = &result
            && let Some(event) = OfferAccepted::from_contract(accepted, now)
        {
            self.dispatcher.dispatch(event);
        }
        self.dispatcher.dispatch_all(attempt.events);
        result
    }

    /// Withdraws an open contract. Pending offers are rejected and the
    /// farmers who made them are notified.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` for an unknown contract
    /// - `ApplicationError::Forbidden` if `buyer` does not own the contract
    /// - `DomainError::AlreadyFulfilled` / `NotOpen` from terminal states
    pub async fn cancel_contract(
        &self,
        contract_id: ContractId,
        buyer: &PartyId,
    ) -> ApplicationResult<Contract> {
        let guard = self.locks.lock(contract_id).await;
        let mut contract = self.load(contract_id).await?;
        if contract.buyer() != buyer {
            return Err(ApplicationError::forbidden(
                "only the contract's buyer may cancel it",
            ));
        }
        let now = Timestamp::now();

        if let Some(expired) = self.materialize_expiry(&mut contract, now).await? {
            drop(guard);
            self.dispatcher.dispatch(expired);
            return Err(DomainError::NotOpen {
                state: ContractState::Expired,
            }
            .into());
        }

        let expected = contract.version();
        contract.cancel(now)?;
        self.contracts.update(&contract, expected).await?;
        drop(guard);

        info!(contract_id = %contract_id, "Contract cancelled");
        self.dispatcher
            .dispatch(ContractCancelled::from_contract(&contract, now));
        Ok(contract)
    }

    /// Persists Expired for every contract whose end time has elapsed and
    /// notifies their buyers. Returns the contracts that expired.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn expire_elapsed(&self) -> ApplicationResult<Vec<ContractId>> {
        let now = Timestamp::now();
        let candidates: Vec<ContractId> = self
            .contracts
            .find_all()
            .await?
            .into_iter()
            .filter(|c| c.state().accepts_offers() && c.effective_state(now) == ContractState::Expired)
            .map(|c| c.id())
            .collect();

        let mut expired = Vec::with_capacity(candidates.len());
        for id in candidates {
            let guard = self.locks.lock(id).await;
            let mut contract = self.load(id).await?;
            let event = self.materialize_expiry(&mut contract, now).await?;
            drop(guard);
            if let Some(event) = event {
                self.dispatcher.dispatch(event);
                expired.push(id);
            }
        }
        Ok(expired)
    }

    // ========== Queries ==========

    /// Returns a contract with its effective state.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` for an unknown contract.
    pub async fn get_contract(&self, contract_id: ContractId) -> ApplicationResult<Contract> {
        Ok(self.load(contract_id).await?.as_of(Timestamp::now()))
    }

    /// Lists the contracts a party is involved in.
    ///
    /// `role_tag` is `"buyer"` (contracts they posted) or `"farmer"`
    /// (contracts they offered on).
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::NotFound` for an unknown role tag.
    pub async fn list_for_party(
        &self,
        party: &PartyId,
        role_tag: &str,
    ) -> ApplicationResult<Vec<Contract>> {
        let role = PartyRole::from_str(role_tag)
            .map_err(|_| ApplicationError::not_found("role", role_tag))?;
        let contracts = match role {
            PartyRole::Buyer => self.contracts.find_by_buyer(party).await?,
            PartyRole::Farmer => self.contracts.find_by_farmer(party).await?,
        };
        let now = Timestamp::now();
        Ok(contracts.iter().map(|c| c.as_of(now)).collect())
    }

    /// Lists contracts still accepting offers, soonest end time first.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_open_contracts(&self) -> ApplicationResult<Vec<Contract>> {
        let now = Timestamp::now();
        let mut open: Vec<Contract> = self
            .contracts
            .find_all()
            .await?
            .iter()
            .map(|c| c.as_of(now))
            .filter(|c| c.state().accepts_offers())
            .collect();
        open.sort_by_key(|c| (c.end_time(), c.created_at(), c.id()));
        Ok(open)
    }
}
