//! Portfolio Core - Shared types library.
//!
//! This crate provides the domain types used across the portfolio components:
//! - `client` - Session, authentication, moderation and public form logic
//! - `cli` - Command-line front end for the site backend
//! - `integration-tests` - Mock backend speaking the same wire format
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage,
//! no HTTP clients. Wire-format quirks of the backend (two testimonial shapes,
//! SQLite timestamps, integer booleans) are absorbed here at the decode
//! boundary so the rest of the workspace sees one canonical model.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, roles, statuses and resource records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
