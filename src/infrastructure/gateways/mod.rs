//! # Collaborator Gateways
//!
//! Ports to the external collaborators and their adapters.
//!
//! ## Ports
//!
//! - [`PartyDirectory`]: party profiles and product catalogs
//! - [`Notifier`]: notification delivery
//! - [`PaymentIssuer`]: payout issuance
//!
//! ## Adapters
//!
//! - [`HttpPaymentIssuer`]: JSON payout API over `reqwest`
//! - [`in_memory`]: scriptable fakes

pub mod error;
pub mod http_client;
pub mod http_payment_issuer;
pub mod in_memory;
pub mod traits;

pub use error::{GatewayError, GatewayResult};
pub use http_payment_issuer::HttpPaymentIssuer;
pub use in_memory::{InMemoryPartyDirectory, InMemoryPaymentIssuer, RecordingNotifier};
pub use traits::{Notifier, PartyDirectory, PartyProfile, PaymentIssuer, PayoutInstruction};
