//! # In-Memory Collaborators
//!
//! Fakes for the collaborator ports, used by tests and the demo binary.
//!
//! Each fake can be scripted to fail, so best-effort and critical failure
//! paths can be exercised without a network.

use crate::domain::value_objects::{ExternalPayoutId, Notification, PartyId, PartyRole};
use crate::infrastructure::gateways::error::{GatewayError, GatewayResult};
use crate::infrastructure::gateways::traits::{
    Notifier, PartyDirectory, PartyProfile, PaymentIssuer, PayoutInstruction,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory [`PartyDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryPartyDirectory {
    profiles: DashMap<PartyId, PartyProfile>,
    scripted_failures: Mutex<VecDeque<GatewayError>>,
    calls: AtomicUsize,
}

impl InMemoryPartyDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn upsert(&self, profile: PartyProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    /// Makes the next `count` calls fail with `error`.
    pub fn fail_next(&self, count: usize, error: GatewayError) {
        let mut failures = self.scripted_failures.lock();
        failures.extend(std::iter::repeat_n(error, count));
    }

    /// Returns the number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> GatewayResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripted_failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PartyDirectory for InMemoryPartyDirectory {
    async fn get_profile(&self, party: &PartyId) -> GatewayResult<Option<PartyProfile>> {
        self.begin_call()?;
        Ok(self.profiles.get(party).map(|entry| entry.value().clone()))
    }

    async fn find_farmers_by_product(
        &self,
        product_type: &str,
    ) -> GatewayResult<Vec<PartyProfile>> {
        self.begin_call()?;
        Ok(self
            .profiles
            .iter()
            .filter(|entry| {
                entry.value().role == PartyRole::Farmer && entry.value().supplies(product_type)
            })
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// [`Notifier`] that records every delivered notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<Notification>>,
    failing_recipients: Mutex<HashSet<PartyId>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingNotifier {
    /// Creates a notifier with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes delivery to `recipient` fail.
    pub fn fail_for(&self, recipient: PartyId) {
        self.failing_recipients.lock().insert(recipient);
    }

    /// Delays every delivery.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Returns a copy of all delivered notifications.
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }

    /// Returns notifications delivered to `recipient`.
    #[must_use]
    pub fn delivered_to(&self, recipient: &PartyId) -> Vec<Notification> {
        self.delivered
            .lock()
            .iter()
            .filter(|n| &n.recipient == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> GatewayResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_recipients.lock().contains(&notification.recipient) {
            return Err(GatewayError::connection(format!(
                "no route to {}",
                notification.recipient
            )));
        }
        self.delivered.lock().push(notification.clone());
        Ok(())
    }
}

/// [`PaymentIssuer`] that honors idempotency keys.
///
/// A repeated key returns the payout id issued the first time without
/// counting as a new issuance.
#[derive(Debug, Default)]
pub struct InMemoryPaymentIssuer {
    issued: DashMap<String, (ExternalPayoutId, PayoutInstruction)>,
    scripted_failures: Mutex<VecDeque<GatewayError>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    sequence: AtomicUsize,
}

impl InMemoryPaymentIssuer {
    /// Creates an issuer with no payouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: GatewayError) {
        self.scripted_failures.lock().push_back(error);
    }

    /// Delays every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Returns the number of calls received, including deduplicated ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the number of distinct payouts issued.
    #[must_use]
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    /// Returns the instruction recorded under `idempotency_key`.
    #[must_use]
    pub fn instruction_for(&self, idempotency_key: &str) -> Option<PayoutInstruction> {
        self.issued
            .get(idempotency_key)
            .map(|entry| entry.value().1.clone())
    }
}

#[async_trait]
impl PaymentIssuer for InMemoryPaymentIssuer {
    async fn issue_payout(
        &self,
        instruction: &PayoutInstruction,
    ) -> GatewayResult<ExternalPayoutId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.scripted_failures.lock().pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        let entry = self
            .issued
            .entry(instruction.idempotency_key.clone())
            .or_insert_with(|| {
                let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                (ExternalPayoutId::new(format!("po_{n:06}")), instruction.clone())
            });
        Ok(entry.value().0.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Money, NotificationCategory};

    #[tokio::test]
    async fn directory_filters_farmers_by_product() {
        let directory = InMemoryPartyDirectory::new();
        directory.upsert(PartyProfile::farmer("f1", "One", ["tomatoes"]));
        directory.upsert(PartyProfile::farmer("f2", "Two", ["corn"]));
        directory.upsert(PartyProfile::buyer("b1", "Buyer"));

        let found = directory.find_farmers_by_product("Tomatoes").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, PartyId::new("f1"));
    }

    #[tokio::test]
    async fn directory_scripted_failures_are_consumed() {
        let directory = InMemoryPartyDirectory::new();
        directory.fail_next(1, GatewayError::timeout("slow"));
        assert!(directory.get_profile(&PartyId::new("x")).await.is_err());
        assert!(directory.get_profile(&PartyId::new("x")).await.is_ok());
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn notifier_records_and_fails_per_recipient() {
        let notifier = RecordingNotifier::new();
        notifier.fail_for(PartyId::new("down"));

        let ok = Notification::new(PartyId::new("up"), "hi", NotificationCategory::Contract);
        let bad = Notification::new(PartyId::new("down"), "hi", NotificationCategory::Contract);
        notifier.notify(&ok).await.unwrap();
        assert!(notifier.notify(&bad).await.is_err());

        assert_eq!(notifier.delivered(), vec![ok]);
    }

    #[tokio::test]
    async fn issuer_deduplicates_by_key() {
        let issuer = InMemoryPaymentIssuer::new();
        let instruction = PayoutInstruction {
            destination: "acct".into(),
            amount: Money::from_minor(100),
            currency: "usd".into(),
            idempotency_key: "k1".into(),
        };
        let first = issuer.issue_payout(&instruction).await.unwrap();
        let second = issuer.issue_payout(&instruction).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(issuer.issued_count(), 1);
        assert_eq!(issuer.calls(), 2);
        assert_eq!(issuer.instruction_for("k1").unwrap().amount, Money::from_minor(100));
    }

    #[tokio::test]
    async fn issuer_scripted_failure_then_success() {
        let issuer = InMemoryPaymentIssuer::new();
        issuer.fail_next(GatewayError::connection("reset"));
        let instruction = PayoutInstruction {
            destination: "acct".into(),
            amount: Money::from_minor(100),
            currency: "usd".into(),
            idempotency_key: "k1".into(),
        };
        assert!(issuer.issue_payout(&instruction).await.unwrap_err().is_retryable());
        assert!(issuer.issue_payout(&instruction).await.is_ok());
        assert_eq!(issuer.issued_count(), 1);
    }
}
