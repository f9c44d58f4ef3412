//! Core domain + application logic for sitewatch.
//!
//! This crate is framework-agnostic. Telegram, HTTP inspection and the
//! headless browser live behind ports (traits) implemented in adapter crates.

pub mod artifacts;
pub mod config;
pub mod controller;
mod delivery;
pub mod detector;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod menu;
pub mod messaging;
pub mod model;
pub mod ports;
pub mod registry;
pub mod scheduler;
pub mod services;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
