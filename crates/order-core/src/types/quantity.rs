//! Fixed-point scaling of order quantities.
//!
//! The numeric order fields carry integers scaled by a decimal convention
//! agreed for the asset pair. The core does not pick that convention; callers
//! pass it explicitly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{Error, Result};

/// Scale used for both legs by the reference order flow.
pub const REFERENCE_DECIMALS: u32 = 8;

/// Convert a decimal quantity into its fixed-point integer form.
///
/// Fails if the value is negative, carries more fractional digits than
/// `decimals`, or does not fit in 64 bits.
pub fn scale_quantity(value: Decimal, decimals: u32) -> Result<u64> {
    const FIELD: &str = "quantity";

    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::encoding(FIELD, format!("{} is negative", value)));
    }

    let factor = 10u64
        .checked_pow(decimals)
        .map(Decimal::from)
        .ok_or_else(|| Error::encoding(FIELD, format!("{} decimals is out of range", decimals)))?;

    let scaled = value
        .checked_mul(factor)
        .ok_or_else(|| Error::encoding(FIELD, format!("{} overflows at {} decimals", value, decimals)))?;

    if scaled.fract() != Decimal::ZERO {
        return Err(Error::encoding(
            FIELD,
            format!("{} has more than {} fractional digits", value, decimals),
        ));
    }

    scaled
        .to_u64()
        .ok_or_else(|| Error::encoding(FIELD, format!("{} does not fit in 64 bits", scaled)))
}
