//! Telerelay: relays Telegram messages along an administrator-defined,
//! acyclic graph of channels, filtering every forwarded message.
//!
//! The persisted graph lives in SQLite ([`store`]); live forwarding bindings
//! are kept in step with it by the sync engine ([`relay::sync`]). Every
//! forwarded message runs through the filter pipeline ([`filters`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;

pub mod channels;
pub mod filters;
pub mod graph;
pub mod store;

pub mod commands;
pub mod relay;
pub mod telegram;
