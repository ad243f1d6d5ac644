//! Command implementations.
//!
//! Results are reported through `tracing::info!`; failures bubble up to
//! `main`, which logs them and exits non-zero.

pub mod account;
pub mod admin;
pub mod public;
