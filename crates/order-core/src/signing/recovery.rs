//! Signer recovery for signed orders.

use alloy_primitives::{Address, Signature, B256};

use super::digest::hash_order;
use super::signer::SignedOrder;
use crate::{Error, Result};

/// Recover the account that signed `digest` as an EIP-191 personal message.
pub fn recover_signer(digest: B256, signature: &Signature) -> Result<Address> {
    signature
        .recover_address_from_msg(digest)
        .map_err(|e| Error::InvalidSignature {
            message: e.to_string(),
        })
}

impl SignedOrder {
    /// Recover the signing account from the stored digest and signature.
    pub fn recover_signer(&self) -> Result<Address> {
        recover_signer(self.digest, &self.signature)
    }

    /// Check the order the way the exchange contract will: recompute the
    /// digest from the order fields and recover the sender from it.
    pub fn verify(&self) -> Result<()> {
        let digest = hash_order(&self.order);
        if digest != self.digest {
            return Err(Error::InvalidSignature {
                message: format!(
                    "stored digest {} does not match order digest {}",
                    self.digest, digest
                ),
            });
        }

        let recovered = recover_signer(digest, &self.signature)?;
        if recovered != self.order.sender_address {
            return Err(Error::SignatureMismatch {
                expected: self.order.sender_address,
                recovered,
            });
        }

        Ok(())
    }
}
