//! Concurrent offers and accepts against one contract.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use agri_contracts::application::ApplicationError;
use agri_contracts::domain::entities::PayoutSource;
use agri_contracts::domain::errors::DomainError;
use agri_contracts::domain::value_objects::{ContractState, OfferState};
use common::*;
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_offers_are_all_recorded() {
    const FARMERS: usize = 32;
    let t = market_with_farmers(FARMERS);
    let contract = post_tomato_contract(&t, 100, "10.00").await;

    let tasks = (0..FARMERS).map(|i| {
        let market = t.market.clone();
        let id = contract.id();
        tokio::spawn(async move {
            market
                .ledger()
                .submit_offer(id, farmer(i), qty(10), money("9.00"))
                .await
        })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let stored = t.market.ledger().get_contract(contract.id()).await.unwrap();
    assert_eq!(stored.state(), ContractState::PendingFulfillment);
    assert_eq!(stored.offers().len(), FARMERS);
    assert_eq!(stored.offer_count(OfferState::Pending), FARMERS);
    assert_eq!(stored.offering_farmers().len(), FARMERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_settle_exactly_once() {
    const FARMERS: usize = 8;
    let t = market_with_farmers(FARMERS);
    let ledger = t.market.ledger();
    let contract = post_tomato_contract(&t, 50, "4.00").await;

    let mut offers = Vec::with_capacity(FARMERS);
    for i in 0..FARMERS {
        offers.push(
            ledger
                .submit_offer(contract.id(), farmer(i), qty(50), money("4.00"))
                .await
                .unwrap(),
        );
    }

    let tasks = offers.iter().map(|offer| {
        let market = t.market.clone();
        let (contract_id, offer_id) = (contract.id(), offer.id());
        tokio::spawn(async move {
            market
                .ledger()
                .accept_offer(contract_id, &buyer(), offer_id)
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, ApplicationError::Domain(DomainError::AlreadyFulfilled)),
                "unexpected error: {e}"
            );
        }
    }

    let stored = ledger.get_contract(contract.id()).await.unwrap();
    assert_eq!(stored.state(), ContractState::Fulfilled);
    assert_eq!(stored.offer_count(OfferState::Accepted), 1);
    assert_eq!(stored.offer_count(OfferState::Rejected), FARMERS - 1);
    assert_eq!(stored.winning_offer_id(), winners[0].winning_offer_id());

    let payouts = t
        .repos
        .payouts
        .find_by_source(PayoutSource::Contract(contract.id()))
        .await
        .unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(t.issuer.issued_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_matching_passes_notify_each_farmer_once() {
    const FARMERS: usize = 5;
    let t = market_with_farmers(FARMERS);
    let contract = post_tomato_contract(&t, 10, "1.00").await;

    let tasks = (0..6).map(|_| {
        let market = t.market.clone();
        let id = contract.id();
        tokio::spawn(async move { market.ledger().notify_eligible_farmers(id).await })
    });
    for result in join_all(tasks).await {
        assert!(result.unwrap().unwrap().is_empty());
    }

    t.market.shutdown().await;
    for i in 0..FARMERS {
        assert_eq!(t.notifier.delivered_to(&farmer(i)).len(), 1, "farmer {i}");
    }
}
