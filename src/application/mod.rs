//! Application layer: services and use cases
//!
//! Services hold the latest snapshot and apply every intent to it in order.
//! They depend on I/O boundary traits for the lazy child fetch.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
