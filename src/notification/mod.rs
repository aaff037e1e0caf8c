//! User notifications raised by workflows.
//!
//! Delivery is fire-and-forget: a sink acknowledges acceptance, not receipt.
//! Sinks live in [`adapters`]; the contract is in [`ports`].

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
