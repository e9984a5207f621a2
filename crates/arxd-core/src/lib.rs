//! Core domain + application logic for the arXiv digest bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / the arXiv API
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod digest;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod items;
pub mod logging;
pub mod ports;
pub mod scheduler;
pub mod store;

pub use errors::{Error, Result};
