//! Order digest.
//!
//! The digest is keccak-256 over the tight-packed order bytes, the same value
//! the exchange contract computes with its native `keccak256`.

use alloy_primitives::{keccak256, B256};

use super::encoder::{encode, EncodedOrder};
use crate::types::Order;

/// EIP-191 prefix applied by `eth_sign`-style signers to a 32-byte message.
const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Hash an encoded order.
pub fn order_digest(encoded: &EncodedOrder) -> B256 {
    keccak256(encoded.as_bytes())
}

/// Encode and hash an order in one step.
pub fn hash_order(order: &Order) -> B256 {
    order_digest(&encode(order))
}

/// The hash an account actually signs when asked to sign `digest` as a
/// personal message.
///
/// On-chain verification recovers the signer against this value, not
/// against the bare order digest.
pub fn eth_signed_message_hash(digest: B256) -> B256 {
    let mut message = [0u8; ETH_SIGNED_MESSAGE_PREFIX.len() + 32];
    message[..ETH_SIGNED_MESSAGE_PREFIX.len()].copy_from_slice(ETH_SIGNED_MESSAGE_PREFIX);
    message[ETH_SIGNED_MESSAGE_PREFIX.len()..].copy_from_slice(digest.as_slice());
    keccak256(message)
}
