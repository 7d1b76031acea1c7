//! Order data model.
//!
//! An [`Order`] is built once from trading intent, handed to the signing
//! pipeline by value and never mutated afterwards. Changing any field (for
//! example renewing the nonce) means building a new order.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::signing::encoder::IDENTIFIER_WIDTH;
use crate::{Error, Result};

/// Default order lifetime used by the reference flow: 29 days.
pub const DEFAULT_ORDER_LIFETIME: Duration = Duration::from_millis(29 * 24 * 60 * 60 * 1000);

/// Order side. The byte values are part of the on-chain encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Get the sentinel byte for encoding.
    pub fn as_u8(&self) -> u8 {
        match self {
            OrderSide::Buy => 0x00,
            OrderSide::Sell => 0x01,
        }
    }
}

impl TryFrom<u8> for OrderSide {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(OrderSide::Buy),
            0x01 => Ok(OrderSide::Sell),
            other => Err(Error::encoding(
                "side",
                format!("unknown side byte 0x{:02x}", other),
            )),
        }
    }
}

impl FromStr for OrderSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(Error::encoding(
                "side",
                format!("expected \"buy\" or \"sell\", got {:?}", other),
            )),
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// A trade order as the exchange contract sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Account that places (and signs) the order.
    pub sender_address: Address,
    /// Matcher allowed to settle the order.
    pub matcher_address: Address,
    pub base_asset: Address,
    pub quote_asset: Address,
    /// Asset the matcher fee is paid in.
    pub matcher_fee_asset: Address,
    /// Amount of the base asset, fixed-point.
    pub amount: u64,
    /// Price in quote units per base unit, fixed-point.
    pub price: u64,
    pub matcher_fee: u64,
    /// Uniqueness token, usually a millisecond timestamp.
    pub nonce: u64,
    /// Expiration timestamp in milliseconds.
    pub expiration: u64,
    pub side: OrderSide,
}

impl Order {
    /// Start building an order.
    pub fn builder() -> OrderBuilder {
        OrderBuilder::new()
    }

    /// Caller-side sanity check that the order expires after it was created.
    ///
    /// The pipeline never calls this; signing an already expired order is
    /// allowed and simply produces an order the contract will refuse.
    pub fn check_expiration(&self) -> Result<()> {
        if self.expiration <= self.nonce {
            return Err(Error::InvalidOrder {
                message: format!(
                    "expiration {} must be greater than nonce {}",
                    self.expiration, self.nonce
                ),
            });
        }
        Ok(())
    }

    /// Build a copy of this order with a fresh nonce and expiration.
    pub fn renewed(&self, nonce: u64, lifetime: Duration) -> Result<Order> {
        Ok(Order {
            nonce,
            expiration: expiration_after(nonce, lifetime)?,
            ..self.clone()
        })
    }
}

/// Untyped order as received from JSON or the command line.
///
/// Identifiers are hex strings and quantities are decimal (or `0x` hex)
/// strings so that out-of-range input can be reported instead of being
/// silently truncated by a deserializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub sender_address: String,
    pub matcher_address: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub matcher_fee_asset: String,
    pub amount: String,
    pub price: String,
    pub matcher_fee: String,
    pub nonce: String,
    pub expiration: String,
    pub side: String,
}

impl TryFrom<&OrderRequest> for Order {
    type Error = Error;

    fn try_from(request: &OrderRequest) -> Result<Self> {
        Ok(Order {
            sender_address: parse_identifier("senderAddress", &request.sender_address)?,
            matcher_address: parse_identifier("matcherAddress", &request.matcher_address)?,
            base_asset: parse_identifier("baseAsset", &request.base_asset)?,
            quote_asset: parse_identifier("quoteAsset", &request.quote_asset)?,
            matcher_fee_asset: parse_identifier("matcherFeeAsset", &request.matcher_fee_asset)?,
            amount: parse_u64("amount", &request.amount)?,
            price: parse_u64("price", &request.price)?,
            matcher_fee: parse_u64("matcherFee", &request.matcher_fee)?,
            nonce: parse_u64("nonce", &request.nonce)?,
            expiration: parse_u64("expiration", &request.expiration)?,
            side: request.side.parse()?,
        })
    }
}

impl TryFrom<OrderRequest> for Order {
    type Error = Error;

    fn try_from(request: OrderRequest) -> Result<Self> {
        Order::try_from(&request)
    }
}

impl From<&Order> for OrderRequest {
    fn from(order: &Order) -> Self {
        Self {
            sender_address: format!("{:?}", order.sender_address),
            matcher_address: format!("{:?}", order.matcher_address),
            base_asset: format!("{:?}", order.base_asset),
            quote_asset: format!("{:?}", order.quote_asset),
            matcher_fee_asset: format!("{:?}", order.matcher_fee_asset),
            amount: order.amount.to_string(),
            price: order.price.to_string(),
            matcher_fee: order.matcher_fee.to_string(),
            nonce: order.nonce.to_string(),
            expiration: order.expiration.to_string(),
            side: order.side.to_string(),
        }
    }
}

/// Parse a hex identifier that must be exactly 20 bytes wide.
fn parse_identifier(field: &'static str, raw: &str) -> Result<Address> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    let bytes =
        hex::decode(digits).map_err(|e| Error::encoding(field, format!("invalid hex: {}", e)))?;

    if bytes.len() != IDENTIFIER_WIDTH {
        return Err(Error::encoding(
            field,
            format!("expected {} bytes, got {}", IDENTIFIER_WIDTH, bytes.len()),
        ));
    }

    Ok(Address::from_slice(&bytes))
}

/// Parse a decimal or `0x` hex unsigned integer and check that it fits the
/// 8-byte field. Empty input is an error, never zero.
fn parse_u64(field: &'static str, raw: &str) -> Result<u64> {
    let raw = raw.trim();
    let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (raw, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(Error::encoding(
            field,
            format!("{:?} is not a decimal or 0x-hex unsigned integer", raw),
        ));
    }

    let value = U256::from_str_radix(digits, u64::from(radix))
        .map_err(|e| Error::encoding(field, format!("not an unsigned integer: {}", e)))?;

    if value > U256::from(u64::MAX) {
        return Err(Error::encoding(
            field,
            format!("{} does not fit in 64 bits", value),
        ));
    }

    Ok(value.to::<u64>())
}

fn expiration_after(nonce: u64, lifetime: Duration) -> Result<u64> {
    u64::try_from(lifetime.as_millis())
        .ok()
        .and_then(|ms| nonce.checked_add(ms))
        .ok_or_else(|| Error::InvalidOrder {
            message: format!("lifetime {:?} overflows the expiration field", lifetime),
        })
}

/// Current UTC time in milliseconds, the conventional nonce.
pub fn current_nonce() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Order builder with a fluent API.
#[derive(Debug, Clone, Default)]
pub struct OrderBuilder {
    sender_address: Option<Address>,
    matcher_address: Option<Address>,
    base_asset: Option<Address>,
    quote_asset: Option<Address>,
    matcher_fee_asset: Option<Address>,
    amount: Option<u64>,
    price: Option<u64>,
    matcher_fee: Option<u64>,
    nonce: Option<u64>,
    expiration: Option<u64>,
    lifetime: Option<Duration>,
    side: Option<OrderSide>,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(mut self, sender: Address) -> Self {
        self.sender_address = Some(sender);
        self
    }

    pub fn matcher(mut self, matcher: Address) -> Self {
        self.matcher_address = Some(matcher);
        self
    }

    /// Set base and quote assets in one call.
    pub fn pair(mut self, base: Address, quote: Address) -> Self {
        self.base_asset = Some(base);
        self.quote_asset = Some(quote);
        self
    }

    pub fn base_asset(mut self, asset: Address) -> Self {
        self.base_asset = Some(asset);
        self
    }

    pub fn quote_asset(mut self, asset: Address) -> Self {
        self.quote_asset = Some(asset);
        self
    }

    pub fn matcher_fee_asset(mut self, asset: Address) -> Self {
        self.matcher_fee_asset = Some(asset);
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn price(mut self, price: u64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn matcher_fee(mut self, fee: u64) -> Self {
        self.matcher_fee = Some(fee);
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Use the current time in milliseconds as nonce.
    pub fn nonce_now(mut self) -> Self {
        self.nonce = Some(current_nonce());
        self
    }

    /// Set an absolute expiration timestamp (milliseconds).
    pub fn expiration(mut self, expiration: u64) -> Self {
        self.expiration = Some(expiration);
        self.lifetime = None;
        self
    }

    /// Expire `lifetime` after the nonce timestamp.
    pub fn expires_in(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self.expiration = None;
        self
    }

    pub fn side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Build the order.
    ///
    /// Fails with [`Error::InvalidOrder`] if a required field is missing.
    pub fn build(self) -> Result<Order> {
        let nonce = required("nonce", self.nonce)?;
        let expiration = match (self.expiration, self.lifetime) {
            (Some(expiration), _) => expiration,
            (None, Some(lifetime)) => expiration_after(nonce, lifetime)?,
            (None, None) => return Err(missing("expiration")),
        };

        Ok(Order {
            sender_address: required("senderAddress", self.sender_address)?,
            matcher_address: required("matcherAddress", self.matcher_address)?,
            base_asset: required("baseAsset", self.base_asset)?,
            quote_asset: required("quoteAsset", self.quote_asset)?,
            matcher_fee_asset: required("matcherFeeAsset", self.matcher_fee_asset)?,
            amount: required("amount", self.amount)?,
            price: required("price", self.price)?,
            matcher_fee: required("matcherFee", self.matcher_fee)?,
            nonce,
            expiration,
            side: required("side", self.side)?,
        })
    }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| missing(field))
}

fn missing(field: &str) -> Error {
    Error::InvalidOrder {
        message: format!("missing field `{}`", field),
    }
}
