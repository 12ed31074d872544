//! Property-based tests for the fee split and settlement idempotence.

#![allow(clippy::unwrap_used)]

mod common;

use agri_contracts::domain::services::FeeSchedule;
use agri_contracts::domain::value_objects::{FeeRate, Money, Quantity, Rounding};
use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

// ── Fee split ───────────────────────────────────────────────

proptest! {
    /// Fee and net always add back up to the gross amount.
    #[test]
    fn fee_plus_net_is_gross(minor in 0u64..10_000_000_000) {
        let gross = Money::from_minor(minor);
        let split = FeeSchedule::default().split(gross).unwrap();
        prop_assert_eq!(split.gross, gross);
        prop_assert_eq!(split.fee.amount() + split.net.amount(), gross.amount());
    }

    /// The fee is gross × 5% rounded half-up to the cent.
    #[test]
    fn default_fee_rounds_half_up(minor in 0u64..10_000_000_000) {
        let gross = Money::from_minor(minor);
        let split = FeeSchedule::default().split(gross).unwrap();
        let exact = gross.amount() * Decimal::new(5, 2);
        let expected = exact.round_dp_with_strategy(
            2,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        );
        prop_assert_eq!(split.fee.amount(), expected);
        prop_assert!(split.fee.amount().scale() <= 2);
    }

    /// The fee never exceeds the gross amount for any valid rate.
    #[test]
    fn fee_is_bounded_by_gross(minor in 0u64..1_000_000_000, basis_points in 0i64..10_000) {
        let rate = FeeRate::new(Decimal::new(basis_points, 4)).unwrap();
        let schedule = FeeSchedule::new(rate, Rounding::HalfUp);
        let gross = Money::from_minor(minor);
        let split = schedule.split(gross).unwrap();
        prop_assert!(split.fee <= gross);
        prop_assert!(split.net <= gross);
    }

    /// Order splits agree with splitting the precomputed gross.
    #[test]
    fn order_split_matches_gross_split(units in 1u64..10_000, cents in 1u64..100_000) {
        let schedule = FeeSchedule::default();
        let price = Money::from_minor(cents);
        let quantity = Quantity::new(units).unwrap();
        let by_order = schedule.split_order(quantity, price).unwrap();
        let by_gross = schedule.split(price.times(quantity).unwrap()).unwrap();
        prop_assert_eq!(by_order, by_gross);
    }
}

// ── Settlement idempotence ──────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// However many times an accepted contract is settled, one payout is issued.
    #[test]
    fn repeated_settlement_issues_once(units in 1u64..500, cents in 1u64..5_000, repeats in 1usize..5) {
        let t = market_with_farmers(1);
        let issued = tokio_test::block_on(async {
            let ledger = t.market.ledger();
            let max = Money::from_minor(cents).to_string();
            let contract = post_tomato_contract(&t, units, &max).await;
            let offer = ledger
                .submit_offer(contract.id(), farmer(0), qty(units), Money::from_minor(cents))
                .await
                .unwrap();
            let fulfilled = ledger
                .accept_offer(contract.id(), &buyer(), offer.id())
                .await
                .unwrap();
            let mut ids = Vec::new();
            for _ in 0..repeats {
                ids.push(t.market.settlement().settle(&fulfilled).await.unwrap().id());
            }
            t.market.shutdown().await;
            ids
        });
        prop_assert!(issued.windows(2).all(|w| w[0] == w[1]));
        prop_assert_eq!(t.issuer.issued_count(), 1);
    }
}

#[test]
fn documented_examples() {
    let schedule = FeeSchedule::default();
    let split = schedule.split(money("100.00")).unwrap();
    assert_eq!((split.fee, split.net), (money("5.00"), money("95.00")));

    let split = schedule.split(money("33.33")).unwrap();
    assert_eq!((split.fee, split.net), (money("1.67"), money("31.66")));

    let split = schedule.split_order(qty(80), money("9.50")).unwrap();
    assert_eq!(
        (split.gross, split.fee, split.net),
        (money("760.00"), money("38.00"), money("722.00"))
    );
}
