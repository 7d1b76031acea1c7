//! Clients for external services.

pub mod rpc;

pub use rpc::ChainClient;
