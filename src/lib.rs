//! Selfscan
//!
//! Selfscan is the engine of a self-checkout kiosk: a product catalog, a cart that
//! aggregates scanned products, a checkout session state machine and a receipt
//! generator. Rendering is left to the caller, which drives a [`session::Session`]
//! with events and observes the result.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod sample;
pub mod scan;
pub mod session;
