//! # Payout Entity
//!
//! Record of money owed to (and eventually issued to) a seller.
//!
//! A payout is reserved in `Pending` before the payment processor is called,
//! so a crash between issuance and recording is healed by retrying with the
//! same [`idempotency_key`](Payout::idempotency_key).
//!
//! A payout the processor refused outright was never issued. It can be
//! voided, which frees its `(source, recipient)` slot for a new reservation
//! under a fresh key. Anything else may have reached the recipient and is
//! only ever retried as recorded.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::services::PayoutSplit;
use crate::domain::value_objects::{
    ContractId, ExternalPayoutId, Money, PartyId, PayoutId, PayoutStatus, Timestamp,
    TransactionId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a payout settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PayoutSource {
    /// A fulfilled open contract.
    Contract(ContractId),
    /// A standalone sale transaction.
    Transaction(TransactionId),
}

impl fmt::Display for PayoutSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract(id) => write!(f, "contract:{id}"),
            Self::Transaction(id) => write!(f, "transaction:{id}"),
        }
    }
}

impl From<ContractId> for PayoutSource {
    fn from(id: ContractId) -> Self {
        Self::Contract(id)
    }
}

impl From<TransactionId> for PayoutSource {
    fn from(id: TransactionId) -> Self {
        Self::Transaction(id)
    }
}

/// Payout record.
///
/// # Invariants
///
/// - `net_amount == gross_amount - platform_fee`
/// - `external_payout_id` is set once the status is Completed
/// - Never deleted; at most one non-void payout per (source, recipient)
/// - Only a payout whose last failure was not retryable can be voided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    id: PayoutId,
    recipient: PartyId,
    source: PayoutSource,
    gross_amount: Money,
    platform_fee: Money,
    net_amount: Money,
    currency: String,
    external_payout_id: Option<ExternalPayoutId>,
    status: PayoutStatus,
    failure_reason: Option<String>,
    /// Whether the last failure left the issuance outcome unknown.
    #[serde(default)]
    failure_retryable: bool,
    /// Number of issuance attempts made.
    attempts: u32,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Payout {
    /// Reserves a pending payout for `recipient`.
    #[must_use]
    pub fn reserve(
        recipient: PartyId,
        source: PayoutSource,
        split: PayoutSplit,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PayoutId::new_v4(),
            recipient,
            source,
            gross_amount: split.gross,
            platform_fee: split.fee,
            net_amount: split.net,
            currency: currency.into(),
            external_payout_id: None,
            status: PayoutStatus::Pending,
            failure_reason: None,
            failure_retryable: false,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a payout from storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PayoutId,
        recipient: PartyId,
        source: PayoutSource,
        gross_amount: Money,
        platform_fee: Money,
        net_amount: Money,
        currency: String,
        external_payout_id: Option<ExternalPayoutId>,
        status: PayoutStatus,
        failure_reason: Option<String>,
        failure_retryable: bool,
        attempts: u32,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            recipient,
            source,
            gross_amount,
            platform_fee,
            net_amount,
            currency,
            external_payout_id,
            status,
            failure_reason,
            failure_retryable,
            attempts,
            created_at,
            updated_at,
        }
    }

    fn transition_to(&mut self, target: PayoutStatus, now: Timestamp) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidPayoutTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Returns the payout ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PayoutId {
        self.id
    }

    /// Returns the recipient.
    #[inline]
    #[must_use]
    pub fn recipient(&self) -> &PartyId {
        &self.recipient
    }

    /// Returns what this payout settles.
    #[inline]
    #[must_use]
    pub fn source(&self) -> PayoutSource {
        self.source
    }

    /// Returns the gross amount.
    #[inline]
    #[must_use]
    pub fn gross_amount(&self) -> Money {
        self.gross_amount
    }

    /// Returns the platform fee.
    #[inline]
    #[must_use]
    pub fn platform_fee(&self) -> Money {
        self.platform_fee
    }

    /// Returns the net amount issued to the recipient.
    #[inline]
    #[must_use]
    pub fn net_amount(&self) -> Money {
        self.net_amount
    }

    /// Returns the ISO currency code.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the processor's identifier, once issued.
    #[inline]
    #[must_use]
    pub fn external_payout_id(&self) -> Option<&ExternalPayoutId> {
        self.external_payout_id.as_ref()
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> PayoutStatus {
        self.status
    }

    /// Returns the last failure reason, if any.
    #[inline]
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the number of issuance attempts.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns when the payout was reserved.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when the payout was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the recipient may already hold this money.
    ///
    /// Completed and Pending payouts qualify, and so does a Failed payout
    /// whose failure was retryable, since a timeout or a 5xx says nothing
    /// about whether the processor acted.
    #[must_use]
    pub fn may_have_been_issued(&self) -> bool {
        match self.status {
            PayoutStatus::Pending | PayoutStatus::Completed => true,
            PayoutStatus::Failed => self.failure_retryable,
            PayoutStatus::Void => false,
        }
    }

    /// Key handed to the payment processor to deduplicate issuance.
    ///
    /// Derived from the payout id, so it is stable across retries of this
    /// record and plain ASCII whatever the recipient id contains.
    #[must_use]
    pub fn idempotency_key(&self) -> String {
        format!("payout_{}", self.id.as_uuid().simple())
    }

    /// Returns the split recorded on this payout.
    #[must_use]
    pub fn split(&self) -> PayoutSplit {
        PayoutSplit {
            gross: self.gross_amount,
            fee: self.platform_fee,
            net: self.net_amount,
        }
    }

    /// Records that an issuance attempt is about to be made.
    pub fn record_attempt(&mut self, now: Timestamp) {
        self.attempts = self.attempts.saturating_add(1);
        self.updated_at = now;
    }

    /// Marks the payout as issued.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayoutTransition` if already Completed.
    pub fn complete(&mut self, external_id: ExternalPayoutId, now: Timestamp) -> DomainResult<()> {
        self.transition_to(PayoutStatus::Completed, now)?;
        self.external_payout_id = Some(external_id);
        self.failure_reason = None;
        Ok(())
    }

    /// Marks the payout as failed.
    ///
    /// `retryable` records whether the processor might still have acted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayoutTransition` if already Completed.
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        retryable: bool,
        now: Timestamp,
    ) -> DomainResult<()> {
        self.transition_to(PayoutStatus::Failed, now)?;
        self.failure_reason = Some(reason.into());
        self.failure_retryable = retryable;
        Ok(())
    }

    /// Closes a payout the processor refused.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayoutTransition` unless the payout is
    /// Failed with a non-retryable failure.
    pub fn void(&mut self, now: Timestamp) -> DomainResult<()> {
        if self.may_have_been_issued() {
            return Err(DomainError::InvalidPayoutTransition {
                from: self.status,
                to: PayoutStatus::Void,
            });
        }
        self.transition_to(PayoutStatus::Void, now)
    }
}

impl fmt::Display for Payout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Payout({} to {} for {}: net {} {} [{}])",
            self.id, self.recipient, self.source, self.net_amount, self.currency, self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::services::FeeSchedule;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_700_000_000).unwrap()
    }

    fn reserved() -> Payout {
        let split = FeeSchedule::default()
            .split("760.00".parse().unwrap())
            .unwrap();
        Payout::reserve(
            PartyId::new("farmer-a"),
            PayoutSource::Contract(ContractId::new_v4()),
            split,
            "usd",
            now(),
        )
    }

    #[test]
    fn reserve_starts_pending_with_split() {
        let payout = reserved();
        assert_eq!(payout.status(), PayoutStatus::Pending);
        assert_eq!(payout.net_amount(), "722.00".parse().unwrap());
        assert!(payout.external_payout_id().is_none());
        assert_eq!(payout.attempts(), 0);
    }

    #[test]
    fn complete_stores_external_id() {
        let mut payout = reserved();
        payout.complete(ExternalPayoutId::new("po_1"), now()).unwrap();
        assert_eq!(payout.status(), PayoutStatus::Completed);
        assert_eq!(payout.external_payout_id().unwrap().as_str(), "po_1");
    }

    #[test]
    fn completed_payout_cannot_fail() {
        let mut payout = reserved();
        payout.complete(ExternalPayoutId::new("po_1"), now()).unwrap();
        assert!(matches!(
            payout.fail("late", false, now()),
            Err(DomainError::InvalidPayoutTransition { .. })
        ));
    }

    #[test]
    fn failed_payout_can_complete_on_retry() {
        let mut payout = reserved();
        payout.fail("timeout", true, now()).unwrap();
        assert_eq!(payout.failure_reason(), Some("timeout"));
        payout.complete(ExternalPayoutId::new("po_2"), now()).unwrap();
        assert!(payout.failure_reason().is_none());
    }

    #[test]
    fn idempotency_key_is_stable_ascii() {
        let split = FeeSchedule::default().split("10.00".parse().unwrap()).unwrap();
        let payout = Payout::reserve(
            PartyId::new("fermière-é"),
            PayoutSource::Contract(ContractId::new_v4()),
            split,
            "usd",
            now(),
        );
        let key = payout.idempotency_key();
        assert!(key.starts_with("payout_"));
        assert!(key.bytes().all(|b| b.is_ascii_graphic()));
        assert_eq!(key, payout.clone().idempotency_key());
        assert_ne!(key, reserved().idempotency_key());
    }

    mod voiding {
        use super::*;

        #[test]
        fn refused_payout_is_voided() {
            let mut payout = reserved();
            payout.fail("account closed", false, now()).unwrap();
            assert!(!payout.may_have_been_issued());
            payout.void(now()).unwrap();
            assert_eq!(payout.status(), PayoutStatus::Void);
            assert!(payout.complete(ExternalPayoutId::new("po_1"), now()).is_err());
        }

        #[test]
        fn uncertain_failure_cannot_be_voided() {
            let mut payout = reserved();
            payout.fail("timed out", true, now()).unwrap();
            assert!(payout.may_have_been_issued());
            assert!(matches!(
                payout.void(now()),
                Err(DomainError::InvalidPayoutTransition { .. })
            ));
        }

        #[test]
        fn pending_payout_cannot_be_voided() {
            let mut payout = reserved();
            assert!(payout.void(now()).is_err());
            assert_eq!(payout.status(), PayoutStatus::Pending);
        }
    }

    #[test]
    fn source_serializes_tagged() {
        let id = TransactionId::new_v4();
        let json = serde_json::to_value(PayoutSource::Transaction(id)).unwrap();
        assert_eq!(json["kind"], "transaction");
    }
}
