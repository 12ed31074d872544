//! # Domain Layer
//!
//! Aggregates, value objects, domain services and events for the open
//! contract marketplace. Nothing in this layer performs I/O.

pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
