//! # Application Layer
//!
//! Use cases over the domain model: contract negotiation, settlement, and
//! the notification side channel.

pub mod error;
pub mod marketplace;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, ErrorKind};
pub use marketplace::{Collaborators, Marketplace, Repositories};
