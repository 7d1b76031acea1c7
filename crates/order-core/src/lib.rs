//! Order Core Library
//!
//! Order model, canonical encoding, digest and signing pipeline for the
//! exchange contract, plus the configuration and JSON-RPC client the
//! pipeline is driven with.

pub mod api;
pub mod config;
pub mod error;
pub mod signing;
pub mod types;

pub use error::{Error, Result};
