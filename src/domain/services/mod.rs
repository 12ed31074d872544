//! # Domain Services
//!
//! Domain logic that doesn't naturally belong to a single entity.
//!
//! ## Services
//!
//! - [`fee_schedule::FeeSchedule`]: Platform fee and net payout computation

pub mod fee_schedule;

pub use fee_schedule::{FeeSchedule, PayoutSplit};
