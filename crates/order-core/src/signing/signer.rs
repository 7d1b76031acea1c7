//! Order signing pipeline.
//!
//! Each order goes through encode → digest → sign exactly once. A failure at
//! any stage ends the pipeline for that order; nothing is retried and no
//! partial result is returned.

use std::time::Duration;

use alloy_primitives::{Address, Signature, B256};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::digest::order_digest;
use super::encoder::encode;
use super::recovery::recover_signer;
use super::service::SigningService;
use crate::types::Order;
use crate::{Error, Result};

/// An order together with its digest and the sender's signature over it.
///
/// This is the unit handed to an order relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    pub order: Order,
    /// keccak-256 of the packed order.
    pub digest: B256,
    /// 65-byte `r ‖ s ‖ v` signature, hex encoded in JSON.
    #[serde(with = "signature_hex")]
    pub signature: Signature,
}

impl SignedOrder {
    /// Signature as a `0x`-prefixed hex string (v = 27/28).
    pub fn signature_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signature.as_bytes()))
    }
}

/// Signs orders on behalf of their senders through a [`SigningService`].
#[derive(Debug, Clone)]
pub struct OrderSigner<S> {
    service: S,
    timeout: Option<Duration>,
}

impl<S: SigningService> OrderSigner<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            timeout: None,
        }
    }

    /// Give up on a signing request after `timeout`.
    ///
    /// A timed-out order is discarded; any signature produced later by the
    /// service is never observed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run the full pipeline for one order.
    pub async fn sign_order(&self, order: Order) -> Result<SignedOrder> {
        let encoded = encode(&order);
        let digest = order_digest(&encoded);
        let account = order.sender_address;

        debug!(
            sender = %account,
            side = %order.side,
            nonce = order.nonce,
            encoded = ?encoded,
            %digest,
            "Order digested"
        );

        let signature = self
            .request_signature(account, digest)
            .await
            .inspect_err(|e| warn!(sender = %account, %digest, error = %e, "Order signing failed"))?;

        let recovered = recover_signer(digest, &signature)?;
        if recovered != account {
            warn!(sender = %account, %recovered, "Signature does not recover to sender");
            return Err(Error::SignatureMismatch {
                expected: account,
                recovered,
            });
        }

        let signed = SignedOrder {
            order,
            digest,
            signature,
        };

        info!(
            sender = %account,
            %digest,
            signature = %signed.signature_hex(),
            "Order signed"
        );

        Ok(signed)
    }

    /// Sign several orders concurrently.
    ///
    /// Every order runs its own pipeline; results are returned in input
    /// order and one failure does not affect the others.
    pub async fn sign_all(&self, orders: Vec<Order>) -> Vec<Result<SignedOrder>> {
        join_all(orders.into_iter().map(|order| self.sign_order(order))).await
    }

    async fn request_signature(&self, account: Address, digest: B256) -> Result<Signature> {
        let request = self.service.sign_digest(account, digest);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| Error::SigningUnavailable {
                    account,
                    reason: format!("signing timed out after {:?}", limit),
                })?,
            None => request.await,
        }
    }
}

mod signature_hex {
    use alloy_primitives::Signature;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        signature: &Signature,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(signature.as_bytes())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(&raw)).map_err(D::Error::custom)?;
        Signature::from_raw(&bytes).map_err(D::Error::custom)
    }
}
