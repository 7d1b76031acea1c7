//! Reference order flow: one buy and one sell leg on the configured pair.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use order_core::config::ExchangeConfig;
use order_core::types::{scale_quantity, Order, OrderSide, DEFAULT_ORDER_LIFETIME};
use rust_decimal::Decimal;

/// Accounts taking part in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub matcher: Address,
    pub buyer: Address,
    pub seller: Address,
}

impl Roles {
    /// Pick roles from explicit overrides, falling back to the first three
    /// signing accounts in order.
    pub fn resolve(
        accounts: &[Address],
        matcher: Option<Address>,
        buyer: Option<Address>,
        seller: Option<Address>,
    ) -> Result<Self> {
        let nth = |index: usize, role: &str| {
            accounts.get(index).copied().with_context(|| {
                format!(
                    "No {} account: signer exposes {} account(s)",
                    role,
                    accounts.len()
                )
            })
        };

        Ok(Self {
            matcher: matcher.map(Ok).unwrap_or_else(|| nth(0, "matcher"))?,
            buyer: buyer.map(Ok).unwrap_or_else(|| nth(1, "buyer"))?,
            seller: seller.map(Ok).unwrap_or_else(|| nth(2, "seller"))?,
        })
    }
}

/// Human-readable leg of the reference flow.
struct Leg {
    side: OrderSide,
    amount: Decimal,
    price: Decimal,
    matcher_fee: Decimal,
}

fn legs() -> [Leg; 2] {
    [
        Leg {
            side: OrderSide::Buy,
            amount: Decimal::new(35, 1),      // 3.5
            price: Decimal::new(21, 3),       // 0.021
            matcher_fee: Decimal::new(35, 4), // 0.0035
        },
        Leg {
            side: OrderSide::Sell,
            amount: Decimal::new(15, 1),      // 1.5
            price: Decimal::new(2, 2),        // 0.02
            matcher_fee: Decimal::new(15, 4), // 0.0015
        },
    ]
}

/// Build the buy and sell orders of the reference flow.
pub fn reference_orders(config: &ExchangeConfig, roles: &Roles, nonce: u64) -> Result<Vec<Order>> {
    let decimals = config.amount_decimals;

    legs()
        .into_iter()
        .map(|leg| {
            let sender = match leg.side {
                OrderSide::Buy => roles.buyer,
                OrderSide::Sell => roles.seller,
            };

            let order = Order::builder()
                .sender(sender)
                .matcher(roles.matcher)
                .pair(config.assets.base, config.assets.quote)
                .matcher_fee_asset(config.assets.matcher_fee)
                .amount(scale_quantity(leg.amount, decimals)?)
                .price(scale_quantity(leg.price, decimals)?)
                .matcher_fee(scale_quantity(leg.matcher_fee, decimals)?)
                .nonce(nonce)
                .expires_in(DEFAULT_ORDER_LIFETIME)
                .side(leg.side)
                .build()?;

            Ok(order)
        })
        .collect()
}
