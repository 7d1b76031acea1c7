//! DEX Order Signer
//!
//! Root crate giving benchmarks and integration tests access to the
//! workspace. For actual functionality, use the individual crates directly:
//!
//! - `order-core`: order model, canonical encoding, digest, signing pipeline
//! - `order-client`: command-line harness that signs the reference orders

// Re-export for benchmarks
pub use order_core as core;
