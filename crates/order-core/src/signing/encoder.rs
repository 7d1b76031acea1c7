//! Canonical byte layout of an order.
//!
//! The exchange contract rebuilds exactly this byte string on-chain before
//! hashing it, so the layout below is protocol surface:
//!
//! ```text
//! offset  width  field
//!      0      1  schema version (0x03)
//!      1     20  senderAddress
//!     21     20  matcherAddress
//!     41     20  baseAsset
//!     61     20  quoteAsset
//!     81     20  matcherFeeAsset
//!    101      8  amount       (big-endian)
//!    109      8  price        (big-endian)
//!    117      8  matcherFee   (big-endian)
//!    125      8  nonce        (big-endian)
//!    133      8  expiration   (big-endian)
//!    141      1  side (0x00 buy, 0x01 sell)
//! ```
//!
//! Segments are tightly packed: no separators, length prefixes or padding.

use alloy_primitives::Address;

use crate::types::{Order, OrderRequest};
use crate::Result;

/// Version tag of the order schema understood by the exchange contract.
pub const ORDER_SCHEMA_VERSION: u8 = 0x03;

/// Width of an account or asset identifier.
pub const IDENTIFIER_WIDTH: usize = 20;

/// Width of every numeric field.
pub const INTEGER_WIDTH: usize = 8;

/// Total length of an encoded order.
pub const ENCODED_ORDER_LEN: usize = 1 + 5 * IDENTIFIER_WIDTH + 5 * INTEGER_WIDTH + 1;

/// Segment names and widths in layout order.
pub const ORDER_LAYOUT: [(&str, usize); 12] = [
    ("version", 1),
    ("senderAddress", IDENTIFIER_WIDTH),
    ("matcherAddress", IDENTIFIER_WIDTH),
    ("baseAsset", IDENTIFIER_WIDTH),
    ("quoteAsset", IDENTIFIER_WIDTH),
    ("matcherFeeAsset", IDENTIFIER_WIDTH),
    ("amount", INTEGER_WIDTH),
    ("price", INTEGER_WIDTH),
    ("matcherFee", INTEGER_WIDTH),
    ("nonce", INTEGER_WIDTH),
    ("expiration", INTEGER_WIDTH),
    ("side", 1),
];

/// A tightly packed order, ready to be hashed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedOrder([u8; ENCODED_ORDER_LEN]);

impl EncodedOrder {
    pub fn as_bytes(&self) -> &[u8; ENCODED_ORDER_LEN] {
        &self.0
    }

    /// Iterate over `(name, bytes)` for each segment in layout order.
    pub fn segments(&self) -> impl Iterator<Item = (&'static str, &[u8])> + '_ {
        ORDER_LAYOUT.iter().scan(0usize, move |offset, &(name, width)| {
            let start = *offset;
            *offset += width;
            Some((name, &self.0[start..start + width]))
        })
    }
}

impl AsRef<[u8]> for EncodedOrder {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncodedOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedOrder(0x{})", hex::encode(self.0))
    }
}

/// Fixed-capacity writer over the output buffer.
struct PackedWriter {
    buf: [u8; ENCODED_ORDER_LEN],
    pos: usize,
}

impl PackedWriter {
    fn new() -> Self {
        Self {
            buf: [0u8; ENCODED_ORDER_LEN],
            pos: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        self
    }

    fn put_u8(&mut self, value: u8) -> &mut Self {
        self.put(&[value])
    }

    fn put_address(&mut self, address: &Address) -> &mut Self {
        self.put(address.as_slice())
    }

    fn put_u64(&mut self, value: u64) -> &mut Self {
        let bytes: [u8; INTEGER_WIDTH] = value.to_be_bytes();
        self.put(&bytes)
    }

    fn finish(self) -> EncodedOrder {
        debug_assert_eq!(self.pos, ENCODED_ORDER_LEN);
        EncodedOrder(self.buf)
    }
}

/// Encode a typed order.
///
/// Field widths are guaranteed by the types, so this cannot fail.
pub fn encode(order: &Order) -> EncodedOrder {
    let mut writer = PackedWriter::new();
    writer
        .put_u8(ORDER_SCHEMA_VERSION)
        .put_address(&order.sender_address)
        .put_address(&order.matcher_address)
        .put_address(&order.base_asset)
        .put_address(&order.quote_asset)
        .put_address(&order.matcher_fee_asset)
        .put_u64(order.amount)
        .put_u64(order.price)
        .put_u64(order.matcher_fee)
        .put_u64(order.nonce)
        .put_u64(order.expiration)
        .put_u8(order.side.as_u8());
    writer.finish()
}

/// Encode an untyped order request, checking every field width.
pub fn encode_request(request: &OrderRequest) -> Result<EncodedOrder> {
    let order = Order::try_from(request)?;
    Ok(encode(&order))
}
