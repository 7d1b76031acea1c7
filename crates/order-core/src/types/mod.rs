//! Core types for exchange orders.

pub mod order;
pub mod quantity;

pub use order::{current_nonce, Order, OrderBuilder, OrderRequest, OrderSide, DEFAULT_ORDER_LIFETIME};
pub use quantity::{scale_quantity, REFERENCE_DECIMALS};
