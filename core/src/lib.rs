//! Synthetic customer lifecycle data and the reporting tables built from it.
//!
//! Stage functions are pure transforms over immutable tables; the engine
//! wires them to the flat-file store in a fixed order.

pub mod activity;
pub mod clock;
pub mod cohort;
pub mod config;
pub mod customer_generator;
pub mod engine;
pub mod error;
pub mod funnel;
pub mod lifecycle;
pub mod profile_source;
pub mod rng;
pub mod store;
pub mod transaction_generator;
pub mod types;
