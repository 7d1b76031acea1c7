//! Encode → digest → sign pipeline for exchange orders.
//!
//! # Architecture
//!
//! ```text
//! Order ── encode ──► EncodedOrder (142 bytes, tight-packed)
//!                          │
//!                       keccak256
//!                          ▼
//!                     digest (B256)
//!                          │
//!   SigningService ◄── sign_digest(sender, digest)
//!   (LocalKeyring | RpcSigner)
//!                          ▼
//!                    SignedOrder { order, digest, signature }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use order_core::signing::{LocalKeyring, OrderSigner};
//! use order_core::types::{Order, OrderSide, DEFAULT_ORDER_LIFETIME};
//!
//! let keyring = LocalKeyring::from_private_keys(["0x..."])?;
//! let signer = OrderSigner::new(keyring);
//!
//! let order = Order::builder()
//!     .sender(buyer)
//!     .matcher(matcher)
//!     .pair(weth, wbtc)
//!     .matcher_fee_asset(weth)
//!     .amount(350_000_000)
//!     .price(2_100_000)
//!     .matcher_fee(350_000)
//!     .nonce_now()
//!     .expires_in(DEFAULT_ORDER_LIFETIME)
//!     .side(OrderSide::Buy)
//!     .build()?;
//!
//! let signed = signer.sign_order(order).await?;
//! ```

pub mod digest;
pub mod encoder;
pub mod recovery;
pub mod service;
pub mod signer;

pub use digest::{eth_signed_message_hash, hash_order, order_digest};
pub use encoder::{
    encode, encode_request, EncodedOrder, ENCODED_ORDER_LEN, ORDER_LAYOUT, ORDER_SCHEMA_VERSION,
};
pub use recovery::recover_signer;
pub use service::{LocalKeyring, RpcSigner, SigningService, PRIVATE_KEYS_ENV};
pub use signer::{OrderSigner, SignedOrder};
