//! CloudSaver client library
//!
//! A local data layer for a cloud drive resource search service: an expiring
//! key-value cache, a local account/settings database, and an adapter that
//! serves each API call from the cache, the backend, or placeholder data.

pub mod adapter;
pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod logging;
pub mod placeholder;
pub mod remote;

pub use adapter::{ApiAdapter, Mode};
pub use config::{AdapterConfig, RemoteUnavailablePolicy};
pub use error::{AdapterError, Result};
