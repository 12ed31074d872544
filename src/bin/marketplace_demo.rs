//! End-to-end marketplace walk-through against in-memory collaborators.
//!
//! ```text
//! cargo run --features cli --bin marketplace-demo -- --quantity 80 --price 9.50
//! ```

use agri_contracts::application::{Collaborators, Marketplace, Repositories};
use agri_contracts::config::AppConfig;
use agri_contracts::domain::value_objects::{Money, PartyId, Quantity, Timestamp};
use agri_contracts::infrastructure::gateways::{
    HttpPaymentIssuer, InMemoryPartyDirectory, InMemoryPaymentIssuer, PartyProfile, PaymentIssuer,
    RecordingNotifier,
};
use agri_contracts::infrastructure::telemetry::init_tracing;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

/// Runs a buyer/farmer negotiation and settlement in memory.
#[derive(Debug, Parser)]
#[command(name = "marketplace-demo", version, about)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Product the buyer wants.
    #[arg(long, default_value = "tomatoes")]
    product: String,

    /// Units requested by the buyer.
    #[arg(long, default_value_t = 100)]
    requested: u64,

    /// Buyer's price ceiling per unit.
    #[arg(long, default_value = "10.00")]
    max_price: String,

    /// Units offered by the winning farmer.
    #[arg(long, default_value_t = 80)]
    quantity: u64,

    /// Winning farmer's price per unit.
    #[arg(long, default_value = "9.50")]
    price: String,

    /// Hours until the contract closes.
    #[arg(long, default_value_t = 24)]
    hours: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging).context("initialising tracing")?;

    let directory = Arc::new(InMemoryPartyDirectory::new());
    directory.upsert(PartyProfile::buyer("buyer-1", "Green Grocer"));
    directory.upsert(
        PartyProfile::farmer("farmer-a", "Sunny Acres", [args.product.as_str()])
            .with_payout_destination("acct_farmer_a"),
    );
    directory.upsert(
        PartyProfile::farmer("farmer-b", "Hillside Farm", [args.product.as_str(), "corn"])
            .with_payout_destination("acct_farmer_b"),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let issuer: Arc<dyn PaymentIssuer> = match &config.payment_gateway.base_url {
        Some(url) => Arc::new(
            HttpPaymentIssuer::new(
                url,
                config.payment_gateway.api_key.as_deref(),
                config.settlement.issuance_timeout_ms,
            )
            .context("building payment issuer")?,
        ),
        None => Arc::new(InMemoryPaymentIssuer::new()),
    };

    let market = Marketplace::new(
        Repositories::in_memory(),
        Collaborators {
            directory,
            notifier: notifier.clone(),
            issuer,
        },
        config.settlement_policy()?,
        config.collaborator_policy(),
    );

    let buyer = PartyId::new("buyer-1");
    let max_price: Money = args.max_price.parse().context("parsing --max-price")?;
    let price: Money = args.price.parse().context("parsing --price")?;

    let contract = market
        .ledger()
        .create_contract(
            buyer.clone(),
            &args.product,
            "produce",
            Quantity::new(args.requested)?,
            max_price,
            Timestamp::now().add_secs(args.hours.saturating_mul(3_600)),
        )
        .await?;
    info!(contract_id = %contract.id(), "Contract posted");

    let winner = market
        .ledger()
        .submit_offer(
            contract.id(),
            PartyId::new("farmer-a"),
            Quantity::new(args.quantity)?,
            price,
        )
        .await?;
    market
        .ledger()
        .submit_offer(
            contract.id(),
            PartyId::new("farmer-b"),
            Quantity::new(args.requested)?,
            max_price,
        )
        .await?;

    let split = market
        .settlement()
        .quote(Quantity::new(args.quantity)?, price)?;
    info!(gross = %split.gross, fee = %split.fee, net = %split.net, "Quoted winning offer");

    let fulfilled = market
        .ledger()
        .accept_offer(contract.id(), &buyer, winner.id())
        .await?;
    info!(state = %fulfilled.state(), "Offer accepted");

    market.shutdown().await;

    for payout in market
        .settlement()
        .payouts_for_recipient(&PartyId::new("farmer-a"))
        .await?
    {
        println!(
            "payout {}: gross {} fee {} net {} {} [{}]",
            payout.id(),
            payout.gross_amount(),
            payout.platform_fee(),
            payout.net_amount(),
            payout.currency(),
            payout.status()
        );
    }
    for notification in notifier.delivered() {
        println!(
            "notify {} [{}]: {}",
            notification.recipient, notification.category, notification.message
        );
    }
    Ok(())
}
