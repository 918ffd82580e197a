//! Fixed-point values.
//!
//! Prices and quantities travel as an integer numerator plus a number of
//! decimal places (NDP): `{1042, 2}` is `10.42`.

use rust_decimal::Decimal;
use std::fmt;

/// Fixed-point numerator.
pub type Value = i64;

/// Number of decimal places (log10 of the denominator).
pub type Ndp = u8;

/// Largest supported NDP.
pub const MAX_NDP: Ndp = 18;

/// Largest magnitude a [`Value`] may hold.
pub const VALUE_MAX: Value = 999_999_999_999_999_999;

fn pow10(ndp: Ndp) -> i128 {
    10_i128.pow(u32::from(ndp.min(MAX_NDP)))
}

fn saturate(v: i128) -> Value {
    v.clamp(-i128::from(VALUE_MAX), i128::from(VALUE_MAX)) as Value
}

/// Rescales `value` from `from` decimal places to `to`, truncating toward
/// zero when precision is lost.
#[must_use]
pub fn rescale(value: Value, from: Ndp, to: Ndp) -> Value {
    if from == to {
        return value;
    }
    let v = i128::from(value);
    if to > from {
        saturate(v * pow10(to - from))
    } else {
        saturate(v / pow10(from - to))
    }
}

/// Notional of `qty` at `px`; the result keeps the price's NDP.
#[must_use]
pub fn notional(px: Value, qty: Value, qty_ndp: Ndp) -> Value {
    saturate(i128::from(px) * i128::from(qty) / pow10(qty_ndp))
}

/// Display adapter pairing a value with its NDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValNdp {
    /// Numerator.
    pub value: Value,
    /// Decimal places.
    pub ndp: Ndp,
}

impl ValNdp {
    /// Creates a display adapter.
    #[must_use]
    pub const fn new(value: Value, ndp: Ndp) -> Self {
        Self { value, ndp }
    }

    /// Converts to a `Decimal`, if the NDP is representable.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        Decimal::try_new(self.value, u32::from(self.ndp)).ok()
    }
}

impl fmt::Display for ValNdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{d}"),
            None => write!(f, "{}e-{}", self.value, self.ndp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rescale_up_and_down() {
        assert_eq!(rescale(1042, 2, 4), 104_200);
        assert_eq!(rescale(104_299, 4, 2), 1042);
        assert_eq!(rescale(7, 0, 0), 7);
    }

    #[test]
    fn notional_keeps_price_ndp() {
        // 10.42 * 2.5 = 26.05
        assert_eq!(notional(1042, 25, 1), 2605);
        // 103 * 40 = 4120
        assert_eq!(notional(103, 40, 0), 4120);
    }

    #[test]
    fn notional_saturates() {
        assert_eq!(notional(VALUE_MAX, VALUE_MAX, 0), VALUE_MAX);
    }

    #[test]
    fn val_ndp_display() {
        assert_eq!(ValNdp::new(1042, 2).to_string(), "10.42");
        assert_eq!(ValNdp::new(100, 0).to_string(), "100");
    }

    proptest! {
        #[test]
        fn rescale_round_trip_is_lossless_upward(v in -1_000_000_000_i64..1_000_000_000, ndp in 0_u8..6) {
            prop_assert_eq!(rescale(rescale(v, 0, ndp), ndp, 0), v);
        }

        #[test]
        fn notional_of_positive_terms_is_non_negative(px in 0_i64..1_000_000_000, qty in 0_i64..1_000_000_000, ndp in 0_u8..8) {
            prop_assert!(notional(px, qty, ndp) >= 0);
        }
    }
}
