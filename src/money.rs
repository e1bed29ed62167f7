//! Money is stored as a signed count of ten-thousandths, so the same exact
//! integer column works on every backend.

use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Fractional digits kept in storage.
pub const SCALE: u32 = 4;

const UNITS_PER_WHOLE: i64 = 10_000;

/// The stored form of `value`, or `None` when it has more than [`SCALE`]
/// fractional digits or does not fit in an `i64`.
pub fn to_minor_units(value: Decimal) -> Option<i64> {
    let value = value.normalize();
    if value.scale() > SCALE {
        return None;
    }
    value
        .checked_mul(Decimal::from(UNITS_PER_WHOLE))?
        .to_i64()
}

pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, SCALE)
}
