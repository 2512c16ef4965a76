//! Core domain + application logic for the Telegram signal ingester.
//!
//! This crate is intentionally transport-agnostic. The Telegram Bot API lives
//! behind ports (traits) implemented in the `sigbot-telegram` adapter crate.

pub mod artifact;
pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod offset;
pub mod poller;
pub mod ports;
pub mod refresh;
pub mod report;
pub mod utils;
pub mod validate;

pub use errors::{Error, Result};
