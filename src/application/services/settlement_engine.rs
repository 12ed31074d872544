//! # Settlement Engine
//!
//! Computes the fee split for a completed sale and drives exactly-once
//! payout issuance against the payout ledger.
//!
//! # Issuance Protocol
//!
//! ```text
//! lock(source)
//!   payout that may have been issued (Completed, Pending, or Failed with
//!   a retryable cause):
//!     other recipient or other amount → InvalidState
//!     Completed                       → return it
//!     otherwise                       → retry with its idempotency key
//!   otherwise → void refused payouts, reserve a Pending payout, issue
//!   issuer Ok  → Completed (external id stored)
//!   issuer Err → Failed (reason and retryability stored)
//! unlock(source)
//! ```
//!
//! The Pending reservation is persisted before the processor is called, and
//! the idempotency key is derived from the payout id. A crash between
//! issuance and recording is therefore healed by the next settle call, which
//! replays the same key and receives the original payout. A payout the
//! processor refused outright never moved money; it is voided and no longer
//! blocks another winner or another amount.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::lock_table::LockTable;
use crate::application::services::notification_dispatcher::NotificationDispatcher;
use crate::application::services::retry::{read_with_single_retry, with_timeout};
use crate::domain::entities::{Contract, Payout, PayoutSource, Transaction};
use crate::domain::errors::DomainError;
use crate::domain::events::{MarketEvent, PayoutCompleted, PayoutFailed};
use crate::domain::services::{FeeSchedule, PayoutSplit};
use crate::domain::value_objects::{
    ContractState, ExternalPayoutId, Money, PartyId, Quantity, Timestamp, TransactionId,
};
use crate::infrastructure::gateways::{
    GatewayError, PartyDirectory, PaymentIssuer, PayoutInstruction,
};
use crate::infrastructure::persistence::{PayoutRepository, TransactionRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fee and issuance settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPolicy {
    /// Fee rate and rounding.
    pub fees: FeeSchedule,
    /// Payout currency.
    pub currency: String,
    /// Upper bound on one issuance call.
    pub issuance_timeout: Duration,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            currency: "usd".to_string(),
            issuance_timeout: Duration::from_millis(10_000),
        }
    }
}

/// Outcome of a settlement attempt plus the events it raised.
///
/// Events are returned rather than dispatched so callers holding a lock can
/// publish them after releasing it.
#[derive(Debug)]
pub(crate) struct SettlementAttempt {
    pub(crate) result: ApplicationResult<Payout>,
    pub(crate) events: Vec<MarketEvent>,
}

impl SettlementAttempt {
    fn failed(error: ApplicationError) -> Self {
        Self {
            result: Err(error),
            events: Vec::new(),
        }
    }
}

/// Settlement engine.
#[derive(Debug)]
pub struct SettlementEngine {
    payouts: Arc<dyn PayoutRepository>,
    transactions: Arc<dyn TransactionRepository>,
    directory: Arc<dyn PartyDirectory>,
    issuer: Arc<dyn PaymentIssuer>,
    dispatcher: Arc<NotificationDispatcher>,
    policy: SettlementPolicy,
    lookup_timeout: Duration,
    source_locks: LockTable<PayoutSource>,
}

impl SettlementEngine {
    /// Creates a settlement engine.
    #[must_use]
    pub fn new(
        payouts: Arc<dyn PayoutRepository>,
        transactions: Arc<dyn TransactionRepository>,
        directory: Arc<dyn PartyDirectory>,
        issuer: Arc<dyn PaymentIssuer>,
        dispatcher: Arc<NotificationDispatcher>,
        policy: SettlementPolicy,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            payouts,
            transactions,
            directory,
            issuer,
            dispatcher,
            policy,
            lookup_timeout,
            source_locks: LockTable::new(),
        }
    }

    /// Returns the settlement policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    /// Computes the split for `quantity × unit_price` under the fee schedule.
    ///
    /// # Errors
    ///
    /// Returns a domain arithmetic error on overflow.
    pub fn quote(
        &self,
        quantity: Quantity,
        unit_price: Money,
    ) -> ApplicationResult<PayoutSplit> {
        Ok(self.policy.fees.split_order(quantity, unit_price)?)
    }

    // ========== Contract Settlement ==========

    /// Settles a fulfilled contract, paying the winning farmer.
    ///
    /// Idempotent: repeated calls return the same payout and never issue a
    /// second payment.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::InvalidState` if the contract is not Fulfilled
    ///   with a winning offer, or a payout that may already have been issued
    ///   names a different recipient or amount
    /// - `ApplicationError::PayoutUnavailable` if the winner has no payout
    ///   destination or the processor refused the payout
    /// - `ApplicationError::PayoutRetryable` if the processor was
    ///   temporarily unavailable
    pub async fn settle(&self, contract: &Contract) -> ApplicationResult<Payout> {
        let attempt = self.settle_contract(contract, Timestamp::now()).await;
        self.dispatcher.dispatch_all(attempt.events);
        attempt.result
    }

    pub(crate) async fn settle_contract(
        &self,
        contract: &Contract,
        now: Timestamp,
    ) -> SettlementAttempt {
        if contract.state() != ContractState::Fulfilled {
            return SettlementAttempt::failed(ApplicationError::invalid_state(format!(
                "contract {} is {}, not FULFILLED",
                contract.id(),
                contract.state()
            )));
        }
        let Some(winner) = contract.winning_offer() else {
            return SettlementAttempt::failed(ApplicationError::invalid_state(format!(
                "contract {} has no winning offer",
                contract.id()
            )));
        };
        let split = match self.policy.fees.split_order(winner.quantity(), winner.price()) {
            Ok(split) => split,
            Err(e) => return SettlementAttempt::failed(e.into()),
        };

        let source = PayoutSource::Contract(contract.id());
        self.settle_source(source, winner.farmer().clone(), split, now)
            .await
    }

    // ========== Standalone Transactions ==========

    /// Records a standalone sale to be paid out later.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `amount` is not positive, or a
    /// repository error.
    pub async fn record_transaction(
        &self,
        buyer: PartyId,
        seller: PartyId,
        amount: Money,
    ) -> ApplicationResult<Transaction> {
        let transaction = Transaction::new(buyer, seller, amount, Timestamp::now())?;
        self.transactions.save(&transaction).await?;
        info!(transaction_id = %transaction.id(), amount = %amount, "Transaction recorded");
        Ok(transaction)
    }

    /// Pays out a standalone transaction at the seller's request.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::NotFound` for an unknown transaction
    /// - `ApplicationError::Forbidden` if `recipient` is not the seller
    /// - `ApplicationError::AlreadyPaid` if the transaction was already paid
    /// - Payout errors as for [`settle`](Self::settle)
    pub async fn request_manual_payout(
        &self,
        recipient: &PartyId,
        transaction_id: TransactionId,
    ) -> ApplicationResult<Payout> {
        let source = PayoutSource::Transaction(transaction_id);
        let guard = self.source_locks.lock(source).await;

        let mut transaction = self
            .transactions
            .get(transaction_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("transaction", transaction_id))?;
        if transaction.seller() != recipient {
            return Err(ApplicationError::forbidden(
                "only the seller may request this payout",
            ));
        }
        if transaction.is_paid() {
            return Err(ApplicationError::AlreadyPaid(transaction_id.to_string()));
        }

        let now = Timestamp::now();
        let attempt = match self.policy.fees.split(transaction.amount()) {
            Ok(split) => {
                self.settle_source_locked(source, recipient.clone(), split, now)
                    .await
            }
            Err(e) => SettlementAttempt::failed(e.into()),
        };

        let result = match attempt.result {
            Ok(payout) => self
                .link_payout(&mut transaction, &payout, now)
                .await
                .map(|()| payout),
            Err(e) => Err(e),
        };
        drop(guard);
        self.dispatcher.dispatch_all(attempt.events);
        result
    }

    async fn link_payout(
        &self,
        transaction: &mut Transaction,
        payout: &Payout,
        now: Timestamp,
    ) -> ApplicationResult<()> {
        transaction.mark_paid(payout.id(), now)?;
        self.transactions.save(transaction).await?;
        info!(transaction_id = %transaction.id(), payout_id = %payout.id(), "Transaction paid");
        Ok(())
    }

    /// Returns every payout addressed to `recipient`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error.
    pub async fn payouts_for_recipient(&self, recipient: &PartyId) -> ApplicationResult<Vec<Payout>> {
        let mut payouts = self.payouts.find_by_recipient(recipient).await?;
        payouts.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(payouts)
    }

    /// Sums the net amounts of the completed payouts addressed to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns a repository error, or an arithmetic error if the sum overflows.
    pub async fn balance_for_recipient(&self, recipient: &PartyId) -> ApplicationResult<Money> {
        let payouts = self.payouts.find_by_recipient(recipient).await?;
        let balance = payouts
            .iter()
            .filter(|p| p.status().is_completed())
            .try_fold(Money::ZERO, |total, p| total.safe_add(p.net_amount()))
            .map_err(DomainError::from)?;
        Ok(balance)
    }

    // ========== Issuance ==========

    async fn settle_source(
        &self,
        source: PayoutSource,
        recipient: PartyId,
        split: PayoutSplit,
        now: Timestamp,
    ) -> SettlementAttempt {
        let _guard = self.source_locks.lock(source).await;
        self.settle_source_locked(source, recipient, split, now).await
    }

    /// Runs the issuance protocol. The caller holds the source lock.
    async fn settle_source_locked(
        &self,
        source: PayoutSource,
        recipient: PartyId,
        split: PayoutSplit,
        now: Timestamp,
    ) -> SettlementAttempt {
        let existing = match self.payouts.find_by_source(source).await {
            Ok(existing) => existing,
            Err(e) => return SettlementAttempt::failed(e.into()),
        };

        let mut live = None;
        let mut refused = Vec::new();
        for payout in existing {
            if payout.status().is_void() {
                continue;
            }
            if !payout.may_have_been_issued() {
                refused.push(payout);
                continue;
            }
            if payout.recipient() != &recipient {
                return SettlementAttempt::failed(ApplicationError::invalid_state(format!(
                    "{source} has a payout to {} that may already have been issued",
                    payout.recipient()
                )));
            }
            live = Some(payout);
        }

        if let Some(payout) = &live {
            if payout.split() != split {
                return SettlementAttempt::failed(ApplicationError::invalid_state(format!(
                    "{source} has a {} payout of gross {} to {recipient} that may already \
                     have been issued; refusing to pay gross {}",
                    payout.status(),
                    payout.gross_amount(),
                    split.gross
                )));
            }
            if payout.status().is_completed() {
                info!(payout_id = %payout.id(), %source, "Payout already completed");
                return SettlementAttempt {
                    result: Ok(payout.clone()),
                    events: Vec::new(),
                };
            }
        }

        let destination = match self.resolve_destination(&recipient).await {
            Ok(destination) => destination,
            Err(e) => return SettlementAttempt::failed(e),
        };

        let payout = match live {
            Some(payout) => {
                info!(
                    payout_id = %payout.id(),
                    %source,
                    status = %payout.status(),
                    "Retrying unfinished payout"
                );
                payout
            }
            None => {
                for mut stale in refused {
                    if let Err(e) = self.void_refused(&mut stale, now).await {
                        return SettlementAttempt::failed(e);
                    }
                }
                let payout =
                    Payout::reserve(recipient, source, split, self.policy.currency.clone(), now);
                if let Err(e) = self.payouts.insert(&payout).await {
                    return SettlementAttempt::failed(e.into());
                }
                payout
            }
        };

        self.issue(payout, destination, now).await
    }

    /// Closes a payout the processor refused so it no longer holds its slot.
    async fn void_refused(&self, payout: &mut Payout, now: Timestamp) -> ApplicationResult<()> {
        payout.void(now)?;
        self.payouts.update(payout).await?;
        info!(
            payout_id = %payout.id(),
            source = %payout.source(),
            recipient = %payout.recipient(),
            "Refused payout voided"
        );
        Ok(())
    }

    async fn resolve_destination(&self, recipient: &PartyId) -> ApplicationResult<String> {
        let profile = read_with_single_retry(self.lookup_timeout, "get_profile", || {
            self.directory.get_profile(recipient)
        })
        .await
        .map_err(|e| {
            if e.is_retryable() {
                ApplicationError::payout_retryable(format!("party lookup failed: {e}"))
            } else {
                ApplicationError::payout_unavailable(format!("party lookup failed: {e}"))
            }
        })?;

        profile
            .and_then(|p| p.payout_destination)
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| {
                warn!(%recipient, "Recipient has no payout destination");
                ApplicationError::payout_unavailable(format!(
                    "{recipient} has no linked payout destination"
                ))
            })
    }

    async fn issue(&self, mut payout: Payout, destination: String, now: Timestamp) -> SettlementAttempt {
        payout.record_attempt(now);
        if let Err(e) = self.payouts.update(&payout).await {
            return SettlementAttempt::failed(e.into());
        }

        let instruction = PayoutInstruction {
            destination,
            amount: payout.net_amount(),
            currency: payout.currency().to_string(),
            idempotency_key: payout.idempotency_key(),
        };
        let issued = with_timeout(
            self.policy.issuance_timeout,
            "issue_payout",
            self.issuer.issue_payout(&instruction),
        )
        .await;

        match issued {
            Ok(external_id) => self.record_success(payout, external_id, now).await,
            Err(e) => self.record_failure(payout, e, now).await,
        }
    }

    async fn record_success(
        &self,
        mut payout: Payout,
        external_id: ExternalPayoutId,
        now: Timestamp,
    ) -> SettlementAttempt {
        if let Err(e) = payout.complete(external_id, now) {
            return SettlementAttempt::failed(e.into());
        }
        if let Err(e) = self.payouts.update(&payout).await {
            return SettlementAttempt::failed(e.into());
        }
        info!(
            payout_id = %payout.id(),
            source = %payout.source(),
            recipient = %payout.recipient(),
            gross = %payout.gross_amount(),
            fee = %payout.platform_fee(),
            net = %payout.net_amount(),
            "Payout completed"
        );
        let event = PayoutCompleted::from_payout(&payout, now);
        SettlementAttempt {
            result: Ok(payout),
            events: vec![event.into()],
        }
    }

    async fn record_failure(
        &self,
        mut payout: Payout,
        cause: GatewayError,
        now: Timestamp,
    ) -> SettlementAttempt {
        let retryable = cause.is_retryable();
        let reason = cause.to_string();
        error!(
            payout_id = %payout.id(),
            source = %payout.source(),
            recipient = %payout.recipient(),
            retryable,
            error = %cause,
            "Payout issuance failed"
        );
        if let Err(e) = payout.fail(reason.clone(), retryable, now) {
            return SettlementAttempt::failed(e.into());
        }
        if let Err(e) = self.payouts.update(&payout).await {
            return SettlementAttempt::failed(e.into());
        }

        let event = PayoutFailed::from_payout(&payout, reason.clone(), retryable, now);
        let error = if retryable {
            ApplicationError::payout_retryable(reason)
        } else {
            ApplicationError::payout_unavailable(reason)
        };
        SettlementAttempt {
            result: Err(error),
            events: vec![event.into()],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{OfferId, PayoutStatus};
    use crate::infrastructure::gateways::{
        InMemoryPartyDirectory, InMemoryPaymentIssuer, PartyProfile, RecordingNotifier,
    };
    use crate::infrastructure::persistence::in_memory::{
        InMemoryPayoutRepository, InMemoryTransactionRepository,
    };

    struct Fixture {
        engine: SettlementEngine,
        directory: Arc<InMemoryPartyDirectory>,
        issuer: Arc<InMemoryPaymentIssuer>,
        payouts: Arc<InMemoryPayoutRepository>,
        notifier: Arc<RecordingNotifier>,
        dispatcher: Arc<NotificationDispatcher>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(InMemoryPartyDirectory::new());
        directory.upsert(
            PartyProfile::farmer("farmer-a", "A", ["tomatoes"]).with_payout_destination("acct_a"),
        );
        directory.upsert(PartyProfile::farmer("farmer-b", "B", ["tomatoes"]));
        let issuer = Arc::new(InMemoryPaymentIssuer::new());
        let payouts = Arc::new(InMemoryPayoutRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifier.clone(),
            Duration::from_secs(1),
        ));
        let engine = SettlementEngine::new(
            payouts.clone(),
            Arc::new(InMemoryTransactionRepository::new()),
            directory.clone(),
            issuer.clone(),
            dispatcher.clone(),
            SettlementPolicy::default(),
            Duration::from_secs(1),
        );
        Fixture {
            engine,
            directory,
            issuer,
            payouts,
            notifier,
            dispatcher,
        }
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn fulfilled(farmer: &str, quantity: u64, price: &str) -> Contract {
        let now = Timestamp::now();
        let mut contract = Contract::new(
            PartyId::new("buyer-1"),
            "tomatoes",
            "vegetables",
            Quantity::new(100).unwrap(),
            money("10.00"),
            now.add_secs(3_600),
            now,
        )
        .unwrap();
        let offer = contract
            .submit_offer(
                PartyId::new(farmer),
                Quantity::new(quantity).unwrap(),
                money(price),
                now,
            )
            .unwrap();
        contract.accept_offer(offer.id(), now).unwrap();
        contract
    }

    /// Open contract carrying the given `(farmer, quantity, price)` offers.
    fn with_offers(offers: &[(&str, u64, &str)]) -> (Contract, Vec<OfferId>) {
        let now = Timestamp::now();
        let mut contract = Contract::new(
            PartyId::new("buyer-1"),
            "tomatoes",
            "vegetables",
            Quantity::new(100).unwrap(),
            money("10.00"),
            now.add_secs(3_600),
            now,
        )
        .unwrap();
        let ids = offers
            .iter()
            .map(|(farmer, quantity, price)| {
                contract
                    .submit_offer(
                        PartyId::new(*farmer),
                        Quantity::new(*quantity).unwrap(),
                        money(price),
                        now,
                    )
                    .unwrap()
                    .id()
            })
            .collect();
        (contract, ids)
    }

    fn accepted(open: &Contract, offer: OfferId) -> Contract {
        let mut contract = open.clone();
        contract.accept_offer(offer, Timestamp::now()).unwrap();
        contract
    }

    #[test]
    fn quote_applies_policy_fee() {
        let f = fixture();
        let split = f
            .engine
            .quote(Quantity::new(80).unwrap(), money("9.50"))
            .unwrap();
        assert_eq!(split.gross, money("760.00"));
        assert_eq!(split.fee, money("38.00"));
        assert_eq!(split.net, money("722.00"));
    }

    mod settle {
        use super::*;

        #[tokio::test]
        async fn pays_net_of_fee() {
            let f = fixture();
            let contract = fulfilled("farmer-a", 80, "9.50");

            let payout = f.engine.settle(&contract).await.unwrap();

            assert_eq!(payout.status(), PayoutStatus::Completed);
            assert_eq!(payout.gross_amount(), money("760.00"));
            assert_eq!(payout.platform_fee(), money("38.00"));
            assert_eq!(payout.net_amount(), money("722.00"));
            assert_eq!(
                f.issuer
                    .instruction_for(&payout.idempotency_key())
                    .unwrap()
                    .amount,
                money("722.00")
            );

            f.dispatcher.drain().await;
            let sent = f.notifier.delivered_to(&PartyId::new("farmer-a"));
            assert_eq!(sent.len(), 1);
            assert!(sent[0].message.contains("722.00"));
        }

        #[tokio::test]
        async fn is_idempotent() {
            let f = fixture();
            let contract = fulfilled("farmer-a", 10, "10.00");

            let first = f.engine.settle(&contract).await.unwrap();
            let second = f.engine.settle(&contract).await.unwrap();

            assert_eq!(first.id(), second.id());
            assert_eq!(f.issuer.calls(), 1);
            assert_eq!(f.payouts.len(), 1);
        }

        #[tokio::test]
        async fn concurrent_calls_issue_once() {
            let f = Arc::new(fixture());
            let contract = fulfilled("farmer-a", 10, "10.00");

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let f = Arc::clone(&f);
                    let contract = contract.clone();
                    tokio::spawn(async move { f.engine.settle(&contract).await })
                })
                .collect();
            let ids: Vec<_> = futures::future::join_all(handles)
                .await
                .into_iter()
                .map(|r| r.unwrap().unwrap().id())
                .collect();

            assert!(ids.windows(2).all(|w| w[0] == w[1]));
            assert_eq!(f.issuer.issued_count(), 1);
            assert_eq!(f.payouts.len(), 1);
        }

        #[tokio::test]
        async fn missing_destination_records_nothing() {
            let f = fixture();
            let contract = fulfilled("farmer-b", 10, "10.00");

            let err = f.engine.settle(&contract).await.unwrap_err();

            assert!(matches!(err, ApplicationError::PayoutUnavailable(_)));
            assert!(f.payouts.is_empty());
            assert_eq!(f.issuer.calls(), 0);
        }

        #[tokio::test]
        async fn retryable_failure_then_retry_reuses_payout() {
            let f = fixture();
            f.issuer.fail_next(GatewayError::connection("reset"));
            let contract = fulfilled("farmer-a", 10, "10.00");

            let err = f.engine.settle(&contract).await.unwrap_err();
            assert!(matches!(err, ApplicationError::PayoutRetryable(_)));
            let failed = f
                .payouts
                .find_by_source(PayoutSource::Contract(contract.id()))
                .await
                .unwrap();
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].status(), PayoutStatus::Failed);

            let payout = f.engine.settle(&contract).await.unwrap();
            assert_eq!(payout.id(), failed[0].id());
            assert_eq!(payout.status(), PayoutStatus::Completed);
            assert_eq!(payout.attempts(), 2);
            assert!(payout.failure_reason().is_none());
        }

        #[tokio::test]
        async fn fatal_failure_is_unavailable() {
            let f = fixture();
            f.issuer.fail_next(GatewayError::rejected("account closed"));
            let contract = fulfilled("farmer-a", 10, "10.00");

            let err = f.engine.settle(&contract).await.unwrap_err();
            assert!(matches!(err, ApplicationError::PayoutUnavailable(_)));
            assert!(!err.is_retryable());
        }

        #[tokio::test]
        async fn issuer_timeout_is_retryable() {
            let f = fixture();
            f.issuer.set_delay(Duration::from_millis(300));
            let engine = SettlementEngine::new(
                f.payouts.clone(),
                Arc::new(InMemoryTransactionRepository::new()),
                f.directory.clone(),
                f.issuer.clone(),
                f.dispatcher.clone(),
                SettlementPolicy {
                    issuance_timeout: Duration::from_millis(20),
                    ..SettlementPolicy::default()
                },
                Duration::from_secs(1),
            );
            let contract = fulfilled("farmer-a", 10, "10.00");

            let err = engine.settle(&contract).await.unwrap_err();
            assert!(matches!(err, ApplicationError::PayoutRetryable(_)));
        }

        #[tokio::test]
        async fn unfulfilled_contract_is_rejected() {
            let f = fixture();
            let now = Timestamp::now();
            let contract = Contract::new(
                PartyId::new("buyer-1"),
                "tomatoes",
                "",
                Quantity::new(1).unwrap(),
                money("1.00"),
                now.add_secs(60),
                now,
            )
            .unwrap();

            let err = f.engine.settle(&contract).await.unwrap_err();
            assert!(matches!(err, ApplicationError::InvalidState(_)));
        }
    }

    mod after_failure {
        use super::*;

        #[tokio::test]
        async fn refused_payout_is_voided_and_reissued() {
            let f = fixture();
            f.issuer.fail_next(GatewayError::rejected("account closed"));
            let contract = fulfilled("farmer-a", 10, "10.00");
            f.engine.settle(&contract).await.unwrap_err();

            let payout = f.engine.settle(&contract).await.unwrap();
            let all = f.payouts.find_by_source(payout.source()).await.unwrap();
            assert_eq!(all.len(), 2);
            let voided: Vec<_> = all.iter().filter(|p| p.status().is_void()).collect();
            assert_eq!(voided.len(), 1);
            assert_ne!(voided[0].id(), payout.id());
            assert_ne!(voided[0].idempotency_key(), payout.idempotency_key());
            assert_eq!(payout.status(), PayoutStatus::Completed);
            assert_eq!(f.issuer.issued_count(), 1);
        }

        #[tokio::test]
        async fn refused_payout_does_not_block_another_winner() {
            let f = fixture();
            f.directory.upsert(
                PartyProfile::farmer("farmer-c", "C", ["tomatoes"])
                    .with_payout_destination("acct_c"),
            );
            let (open, offers) = with_offers(&[("farmer-a", 10, "9.00"), ("farmer-c", 20, "8.00")]);

            f.issuer.fail_next(GatewayError::rejected("account closed"));
            let err = f.engine.settle(&accepted(&open, offers[0])).await.unwrap_err();
            assert!(matches!(err, ApplicationError::PayoutUnavailable(_)));

            let payout = f.engine.settle(&accepted(&open, offers[1])).await.unwrap();
            assert_eq!(payout.recipient(), &PartyId::new("farmer-c"));
            assert_eq!(payout.gross_amount(), money("160.00"));
            assert_eq!(f.issuer.issued_count(), 1);
        }

        #[tokio::test]
        async fn refused_payout_gives_way_to_a_different_amount() {
            let f = fixture();
            let (open, offers) = with_offers(&[("farmer-a", 10, "9.00"), ("farmer-a", 50, "9.00")]);

            f.issuer.fail_next(GatewayError::rejected("account closed"));
            f.engine.settle(&accepted(&open, offers[0])).await.unwrap_err();

            let payout = f.engine.settle(&accepted(&open, offers[1])).await.unwrap();
            assert_eq!(payout.gross_amount(), money("450.00"));
            assert_eq!(payout.net_amount(), money("427.50"));
            assert_eq!(
                f.issuer
                    .instruction_for(&payout.idempotency_key())
                    .unwrap()
                    .amount,
                money("427.50")
            );
        }

        #[tokio::test]
        async fn uncertain_payout_blocks_a_different_amount() {
            let f = fixture();
            let (open, offers) = with_offers(&[("farmer-a", 10, "9.00"), ("farmer-a", 50, "9.00")]);

            f.issuer.fail_next(GatewayError::connection("reset"));
            f.engine.settle(&accepted(&open, offers[0])).await.unwrap_err();

            let err = f.engine.settle(&accepted(&open, offers[1])).await.unwrap_err();
            assert!(matches!(err, ApplicationError::InvalidState(_)));
            assert_eq!(f.issuer.issued_count(), 0);

            let payout = f.engine.settle(&accepted(&open, offers[0])).await.unwrap();
            assert_eq!(payout.gross_amount(), money("90.00"));
            assert_eq!(f.issuer.issued_count(), 1);
        }

        #[tokio::test]
        async fn uncertain_payout_blocks_another_recipient() {
            let f = fixture();
            f.directory.upsert(
                PartyProfile::farmer("farmer-c", "C", ["tomatoes"])
                    .with_payout_destination("acct_c"),
            );
            let (open, offers) = with_offers(&[("farmer-a", 10, "9.00"), ("farmer-c", 20, "8.00")]);

            f.issuer.fail_next(GatewayError::rate_limited("slow down"));
            f.engine.settle(&accepted(&open, offers[0])).await.unwrap_err();

            let err = f.engine.settle(&accepted(&open, offers[1])).await.unwrap_err();
            assert!(matches!(err, ApplicationError::InvalidState(_)));
            assert!(f
                .payouts
                .find_by_recipient(&PartyId::new("farmer-c"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn source_locks_are_released() {
            let f = fixture();
            f.engine.settle(&fulfilled("farmer-a", 10, "10.00")).await.unwrap();
            f.engine.settle(&fulfilled("farmer-b", 10, "10.00")).await.unwrap_err();
            assert_eq!(f.engine.source_locks.len(), 0);
        }
    }

    mod manual_payout {
        use super::*;

        #[tokio::test]
        async fn pays_seller_and_marks_transaction() {
            let f = fixture();
            let tx = f
                .engine
                .record_transaction(PartyId::new("buyer-1"), PartyId::new("farmer-a"), money("33.33"))
                .await
                .unwrap();

            let payout = f
                .engine
                .request_manual_payout(&PartyId::new("farmer-a"), tx.id())
                .await
                .unwrap();
            assert_eq!(payout.platform_fee(), money("1.67"));
            assert_eq!(payout.net_amount(), money("31.66"));

            let err = f
                .engine
                .request_manual_payout(&PartyId::new("farmer-a"), tx.id())
                .await
                .unwrap_err();
            assert!(matches!(err, ApplicationError::AlreadyPaid(_)));
            assert_eq!(f.issuer.issued_count(), 1);
        }

        #[tokio::test]
        async fn only_seller_may_request() {
            let f = fixture();
            let tx = f
                .engine
                .record_transaction(PartyId::new("buyer-1"), PartyId::new("farmer-a"), money("10.00"))
                .await
                .unwrap();

            let err = f
                .engine
                .request_manual_payout(&PartyId::new("buyer-1"), tx.id())
                .await
                .unwrap_err();
            assert!(err.is_forbidden());
        }

        #[tokio::test]
        async fn unknown_transaction_is_not_found() {
            let f = fixture();
            let err = f
                .engine
                .request_manual_payout(&PartyId::new("farmer-a"), TransactionId::new_v4())
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn history_lists_recipient_payouts() {
            let f = fixture();
            f.engine.settle(&fulfilled("farmer-a", 1, "10.00")).await.unwrap();
            f.engine.settle(&fulfilled("farmer-a", 2, "10.00")).await.unwrap();

            let history = f
                .engine
                .payouts_for_recipient(&PartyId::new("farmer-a"))
                .await
                .unwrap();
            assert_eq!(history.len(), 2);
            assert!(f
                .engine
                .payouts_for_recipient(&PartyId::new("farmer-b"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn balance_counts_completed_payouts_only() {
            let f = fixture();
            f.engine.settle(&fulfilled("farmer-a", 80, "9.50")).await.unwrap();
            f.issuer.fail_next(GatewayError::rejected("account closed"));
            f.engine.settle(&fulfilled("farmer-a", 10, "10.00")).await.unwrap_err();
            f.issuer.fail_next(GatewayError::timeout("no response"));
            f.engine.settle(&fulfilled("farmer-a", 20, "10.00")).await.unwrap_err();

            let balance = f
                .engine
                .balance_for_recipient(&PartyId::new("farmer-a"))
                .await
                .unwrap();
            assert_eq!(balance, money("722.00"));
            assert_eq!(
                f.engine
                    .balance_for_recipient(&PartyId::new("farmer-b"))
                    .await
                    .unwrap(),
                Money::ZERO
            );
        }
    }
}
