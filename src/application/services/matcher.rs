//! # Matcher
//!
//! Selects the farmers eligible to hear about a new contract.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::retry::read_with_single_retry;
use crate::domain::value_objects::{PartyId, PartyRole};
use crate::infrastructure::gateways::PartyDirectory;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Capability lookup by product type.
#[derive(Debug, Clone)]
pub struct Matcher {
    directory: Arc<dyn PartyDirectory>,
    lookup_timeout: Duration,
}

impl Matcher {
    /// Creates a matcher over `directory`.
    #[must_use]
    pub fn new(directory: Arc<dyn PartyDirectory>, lookup_timeout: Duration) -> Self {
        Self {
            directory,
            lookup_timeout,
        }
    }

    /// Returns the farmers whose catalog lists `product_type`.
    ///
    /// Matching ignores case and surrounding whitespace. A blank product
    /// type matches nobody.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::LookupFailed` if the directory fails after
    /// its retry budget.
    pub async fn find_eligible(&self, product_type: &str) -> ApplicationResult<BTreeSet<PartyId>> {
        let wanted = product_type.trim();
        if wanted.is_empty() {
            return Ok(BTreeSet::new());
        }

        let profiles = read_with_single_retry(self.lookup_timeout, "find_farmers_by_product", || {
            self.directory.find_farmers_by_product(wanted)
        })
        .await
        .map_err(|e| ApplicationError::lookup_failed(e.to_string()))?;

        let eligible: BTreeSet<PartyId> = profiles
            .into_iter()
            .filter(|p| p.role == PartyRole::Farmer && p.supplies(wanted))
            .map(|p| p.id)
            .collect();
        debug!(product_type = wanted, count = eligible.len(), "Matched farmers");
        Ok(eligible)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::gateways::{GatewayError, InMemoryPartyDirectory, PartyProfile};

    fn directory() -> Arc<InMemoryPartyDirectory> {
        let directory = InMemoryPartyDirectory::new();
        directory.upsert(PartyProfile::farmer("farmer-b", "B", ["Tomatoes"]));
        directory.upsert(PartyProfile::farmer("farmer-a", "A", ["tomatoes ", "corn"]));
        directory.upsert(PartyProfile::farmer("farmer-c", "C", ["corn"]));
        directory.upsert(PartyProfile::buyer("buyer-1", "Grocer"));
        Arc::new(directory)
    }

    #[tokio::test]
    async fn matches_case_insensitively() {
        let matcher = Matcher::new(directory(), Duration::from_secs(1));
        let eligible = matcher.find_eligible(" TOMATOES").await.unwrap();
        let ids: Vec<&str> = eligible.iter().map(PartyId::as_str).collect();
        assert_eq!(ids, vec!["farmer-a", "farmer-b"]);
    }

    #[tokio::test]
    async fn unknown_product_matches_nobody() {
        let matcher = Matcher::new(directory(), Duration::from_secs(1));
        assert!(matcher.find_eligible("saffron").await.unwrap().is_empty());
        assert!(matcher.find_eligible("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_transient_failure_is_absorbed() {
        let dir = directory();
        dir.fail_next(1, GatewayError::timeout("slow"));
        let matcher = Matcher::new(dir.clone(), Duration::from_secs(1));
        assert_eq!(matcher.find_eligible("corn").await.unwrap().len(), 2);
        assert_eq!(dir.calls(), 2);
    }

    #[tokio::test]
    async fn persistent_failure_is_lookup_failed() {
        let dir = directory();
        dir.fail_next(2, GatewayError::connection("down"));
        let matcher = Matcher::new(dir, Duration::from_secs(1));
        let err = matcher.find_eligible("corn").await.unwrap_err();
        assert!(matches!(err, ApplicationError::LookupFailed(_)));
    }
}
