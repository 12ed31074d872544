//! # Transaction Entity
//!
//! A standalone sale recorded outside the contract flow. Its seller may
//! request a manual payout once.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    Money, PartyId, PayoutId, Timestamp, TransactionId, TransactionPayoutStatus,
};
use serde::{Deserialize, Serialize};

/// Standalone sale transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    buyer: PartyId,
    seller: PartyId,
    amount: Money,
    payout_status: TransactionPayoutStatus,
    payout_id: Option<PayoutId>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Transaction {
    /// Records a new sale awaiting payout.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if `amount` is zero.
    pub fn new(buyer: PartyId, seller: PartyId, amount: Money, now: Timestamp) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::InvalidPrice(
                "transaction amount must be positive".to_string(),
            ));
        }
        Ok(Self {
            id: TransactionId::new_v4(),
            buyer,
            seller,
            amount,
            payout_status: TransactionPayoutStatus::Pending,
            payout_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a transaction from storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TransactionId,
        buyer: PartyId,
        seller: PartyId,
        amount: Money,
        payout_status: TransactionPayoutStatus,
        payout_id: Option<PayoutId>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            buyer,
            seller,
            amount,
            payout_status,
            payout_id,
            created_at,
            updated_at,
        }
    }

    /// Returns the transaction ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the buyer.
    #[inline]
    #[must_use]
    pub fn buyer(&self) -> &PartyId {
        &self.buyer
    }

    /// Returns the seller, who receives the payout.
    #[inline]
    #[must_use]
    pub fn seller(&self) -> &PartyId {
        &self.seller
    }

    /// Returns the gross sale amount.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the payout status.
    #[inline]
    #[must_use]
    pub fn payout_status(&self) -> TransactionPayoutStatus {
        self.payout_status
    }

    /// Returns the linked payout, once paid.
    #[inline]
    #[must_use]
    pub fn payout_id(&self) -> Option<PayoutId> {
        self.payout_id
    }

    /// Returns when the transaction was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the seller was already paid.
    #[inline]
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payout_status == TransactionPayoutStatus::Completed
    }

    /// Links a completed payout.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadyPaid` if a payout was already linked.
    pub fn mark_paid(&mut self, payout_id: PayoutId, now: Timestamp) -> DomainResult<()> {
        if self.is_paid() {
            return Err(DomainError::AlreadyPaid(self.id));
        }
        self.payout_status = TransactionPayoutStatus::Completed;
        self.payout_id = Some(payout_id);
        self.updated_at = now;
        Ok(())
    }
}
