//! # Marketplace
//!
//! Wires repositories, collaborators, and services into one handle.
//!
//! # Examples
//!
//! ```
//! use agri_contracts::application::marketplace::{Collaborators, Marketplace, Repositories};
//! use agri_contracts::application::services::{CollaboratorPolicy, SettlementPolicy};
//! use agri_contracts::infrastructure::gateways::{
//!     InMemoryPartyDirectory, InMemoryPaymentIssuer, RecordingNotifier,
//! };
//! use std::sync::Arc;
//!
//! let market = Marketplace::new(
//!     Repositories::in_memory(),
//!     Collaborators {
//!         directory: Arc::new(InMemoryPartyDirectory::new()),
//!         notifier: Arc::new(RecordingNotifier::new()),
//!         issuer: Arc::new(InMemoryPaymentIssuer::new()),
//!     },
//!     SettlementPolicy::default(),
//!     CollaboratorPolicy::default(),
//! );
//! assert_eq!(market.settlement().policy().currency, "usd");
//! ```

use crate::application::services::{
    CollaboratorPolicy, ContractLedger, Matcher, NotificationDispatcher, SettlementEngine,
    SettlementPolicy,
};
use crate::infrastructure::gateways::{Notifier, PartyDirectory, PaymentIssuer};
use crate::infrastructure::persistence::in_memory::{
    InMemoryContractRepository, InMemoryPayoutRepository, InMemoryTransactionRepository,
};
use crate::infrastructure::persistence::{
    ContractRepository, PayoutRepository, TransactionRepository,
};
use std::sync::Arc;

/// Storage ports.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Contract aggregates.
    pub contracts: Arc<dyn ContractRepository>,
    /// Payout ledger.
    pub payouts: Arc<dyn PayoutRepository>,
    /// Standalone transactions.
    pub transactions: Arc<dyn TransactionRepository>,
}

impl Repositories {
    /// Returns empty in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            contracts: Arc::new(InMemoryContractRepository::new()),
            payouts: Arc::new(InMemoryPayoutRepository::new()),
            transactions: Arc::new(InMemoryTransactionRepository::new()),
        }
    }
}

/// External collaborators.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Party profiles.
    pub directory: Arc<dyn PartyDirectory>,
    /// Notification delivery.
    pub notifier: Arc<dyn Notifier>,
    /// Payout issuance.
    pub issuer: Arc<dyn PaymentIssuer>,
}

/// Assembled marketplace services.
#[derive(Debug, Clone)]
pub struct Marketplace {
    ledger: Arc<ContractLedger>,
    settlement: Arc<SettlementEngine>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl Marketplace {
    /// Assembles the services.
    #[must_use]
    pub fn new(
        repositories: Repositories,
        collaborators: Collaborators,
        settlement_policy: SettlementPolicy,
        collaborator_policy: CollaboratorPolicy,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            collaborators.notifier,
            collaborator_policy.notify_timeout,
        ));
        let settlement = Arc::new(SettlementEngine::new(
            repositories.payouts,
            repositories.transactions,
            Arc::clone(&collaborators.directory),
            collaborators.issuer,
            Arc::clone(&dispatcher),
            settlement_policy,
            collaborator_policy.lookup_timeout,
        ));
        let ledger = Arc::new(ContractLedger::new(
            repositories.contracts,
            Matcher::new(collaborators.directory, collaborator_policy.lookup_timeout),
            Arc::clone(&settlement),
            Arc::clone(&dispatcher),
        ));
        Self {
            ledger,
            settlement,
            dispatcher,
        }
    }

    /// Returns the contract ledger.
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &ContractLedger {
        &self.ledger
    }

    /// Returns the settlement engine.
    #[inline]
    #[must_use]
    pub fn settlement(&self) -> &SettlementEngine {
        &self.settlement
    }

    /// Returns the notification dispatcher.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Waits for in-flight notifications.
    pub async fn shutdown(&self) {
        self.dispatcher.drain().await;
    }
}
