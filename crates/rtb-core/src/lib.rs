//! Core domain + application logic for the Telegram relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the
//! persistent store live behind ports (traits) implemented in adapter
//! crates, so the relay engine, reply session, and dispatcher are fully
//! testable against fakes.

pub mod actions;
pub mod blocklist;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod relay;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::{Error, Result};
