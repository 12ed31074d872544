//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use agri_contracts::application::services::{CollaboratorPolicy, SettlementPolicy};
use agri_contracts::application::{Collaborators, Marketplace, Repositories};
use agri_contracts::domain::entities::Contract;
use agri_contracts::domain::value_objects::{Money, PartyId, Quantity, Timestamp};
use agri_contracts::infrastructure::gateways::{
    InMemoryPartyDirectory, InMemoryPaymentIssuer, PartyProfile, RecordingNotifier,
};
use std::sync::Arc;

pub const BUYER: &str = "buyer-1";

pub struct TestMarket {
    pub market: Marketplace,
    pub repos: Repositories,
    pub directory: Arc<InMemoryPartyDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub issuer: Arc<InMemoryPaymentIssuer>,
}

/// Marketplace with `farmers` tomato growers, all with payout accounts.
pub fn market_with_farmers(farmers: usize) -> TestMarket {
    let directory = Arc::new(InMemoryPartyDirectory::new());
    directory.upsert(PartyProfile::buyer(BUYER, "Green Grocer"));
    for i in 0..farmers {
        directory.upsert(
            PartyProfile::farmer(farmer_name(i), format!("Farm {i}"), ["tomatoes"])
                .with_payout_destination(format!("acct_{i}")),
        );
    }
    let notifier = Arc::new(RecordingNotifier::new());
    let issuer = Arc::new(InMemoryPaymentIssuer::new());
    let repos = Repositories::in_memory();
    let market = Marketplace::new(
        repos.clone(),
        Collaborators {
            directory: directory.clone(),
            notifier: notifier.clone(),
            issuer: issuer.clone(),
        },
        SettlementPolicy::default(),
        CollaboratorPolicy::default(),
    );
    TestMarket {
        market,
        repos,
        directory,
        notifier,
        issuer,
    }
}

pub fn farmer_name(i: usize) -> String {
    format!("farmer-{i}")
}

pub fn farmer(i: usize) -> PartyId {
    PartyId::new(farmer_name(i))
}

pub fn buyer() -> PartyId {
    PartyId::new(BUYER)
}

pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

pub fn qty(n: u64) -> Quantity {
    Quantity::new(n).unwrap()
}

pub async fn post_tomato_contract(t: &TestMarket, quantity: u64, max_price: &str) -> Contract {
    t.market
        .ledger()
        .create_contract(
            buyer(),
            "tomatoes",
            "vegetables",
            qty(quantity),
            money(max_price),
            Timestamp::now().add_secs(86_400),
        )
        .await
        .unwrap()
}
