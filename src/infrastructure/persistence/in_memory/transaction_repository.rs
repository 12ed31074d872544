//! # In-Memory Transaction Repository

use crate::domain::entities::Transaction;
use crate::domain::value_objects::TransactionId;
use crate::infrastructure::persistence::traits::{RepositoryResult, TransactionRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`TransactionRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionRepository {
    storage: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
}

impl InMemoryTransactionRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn save(&self, transaction: &Transaction) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        storage.insert(transaction.id(), transaction.clone());
        Ok(())
    }

    async fn get(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>> {
        let storage = self.storage.read().await;
        Ok(storage.get(&id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{PartyId, PayoutId, Timestamp};

    #[tokio::test]
    async fn save_overwrites() {
        let repo = InMemoryTransactionRepository::new();
        let mut tx = Transaction::new(
            PartyId::new("b"),
            PartyId::new("s"),
            "3.00".parse().unwrap(),
            Timestamp::now(),
        )
        .unwrap();
        repo.save(&tx).await.unwrap();

        tx.mark_paid(PayoutId::new_v4(), Timestamp::now()).unwrap();
        repo.save(&tx).await.unwrap();

        assert!(repo.get(tx.id()).await.unwrap().unwrap().is_paid());
        assert!(repo.get(TransactionId::new_v4()).await.unwrap().is_none());
    }
}
