//! # In-Memory Payout Repository
//!
//! In-memory implementation of [`PayoutRepository`].
//!
//! Uses [`DashMap`] for records and a second `DashMap` as the
//! `(source, recipient)` unique index. The index entry is claimed through
//! the entry API, so two concurrent inserts for the same pair cannot both
//! succeed. Voiding a payout releases its index entry.

use crate::domain::entities::{Payout, PayoutSource};
use crate::domain::value_objects::{PartyId, PayoutId};
use crate::infrastructure::persistence::traits::{
    PayoutRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-memory implementation of [`PayoutRepository`].
#[derive(Debug, Default)]
pub struct InMemoryPayoutRepository {
    payouts: DashMap<PayoutId, Payout>,
    unique_index: DashMap<(PayoutSource, PartyId), PayoutId>,
}

impl InMemoryPayoutRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored payouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payouts.len()
    }

    /// Returns true if no payouts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }

    fn collect_where<F>(&self, predicate: F) -> Vec<Payout>
    where
        F: Fn(&Payout) -> bool,
    {
        let mut found: Vec<Payout> = self
            .payouts
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|p| (p.created_at(), p.id()));
        found
    }
}

#[async_trait]
impl PayoutRepository for InMemoryPayoutRepository {
    async fn insert(&self, payout: &Payout) -> RepositoryResult<()> {
        let key = (payout.source(), payout.recipient().clone());
        match self.unique_index.entry(key) {
            Entry::Occupied(_) => Err(RepositoryError::duplicate(
                "Payout",
                payout.idempotency_key(),
            )),
            Entry::Vacant(slot) => {
                if self.payouts.contains_key(&payout.id()) {
                    return Err(RepositoryError::duplicate("Payout", payout.id().to_string()));
                }
                self.payouts.insert(payout.id(), payout.clone());
                slot.insert(payout.id());
                Ok(())
            }
        }
    }

    async fn update(&self, payout: &Payout) -> RepositoryResult<()> {
        let mut stored = self
            .payouts
            .get_mut(&payout.id())
            .ok_or_else(|| RepositoryError::not_found("Payout", payout.id().to_string()))?;
        *stored = payout.clone();
        drop(stored);
        if payout.status().is_void() {
            let key = (payout.source(), payout.recipient().clone());
            self.unique_index.remove_if(&key, |_, id| *id == payout.id());
        }
        Ok(())
    }

    async fn get(&self, id: PayoutId) -> RepositoryResult<Option<Payout>> {
        Ok(self.payouts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_source(&self, source: PayoutSource) -> RepositoryResult<Vec<Payout>> {
        Ok(self.collect_where(|p| p.source() == source))
    }

    async fn find_by_recipient(&self, recipient: &PartyId) -> RepositoryResult<Vec<Payout>> {
        Ok(self.collect_where(|p| p.recipient() == recipient))
    }
}
