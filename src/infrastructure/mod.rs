//! # Infrastructure Layer
//!
//! Adapters for persistence, external collaborators, and telemetry.

pub mod gateways;
pub mod persistence;
pub mod telemetry;
