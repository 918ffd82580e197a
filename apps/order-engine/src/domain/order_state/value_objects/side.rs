//! Order side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an order leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Buy.
    Buy,
    /// Sell (long).
    Sell,
    /// Sell short.
    SellShort,
    /// Sell short, exempt from short-sale restrictions.
    SellShortExempt,
}

impl Side {
    /// Returns true for `Sell`, `SellShort` and `SellShortExempt`.
    #[must_use]
    pub const fn is_sell(self) -> bool {
        matches!(self, Self::Sell | Self::SellShort | Self::SellShortExempt)
    }

    /// Returns true for the short-sale variants.
    #[must_use]
    pub const fn is_short(self) -> bool {
        matches!(self, Self::SellShort | Self::SellShortExempt)
    }

    /// Returns true if a leg on this side may be amended to `to`.
    ///
    /// Only changes within the sell family are permitted.
    #[must_use]
    pub const fn may_change_to(self, to: Self) -> bool {
        self.is_sell() && to.is_sell()
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::SellShort => write!(f, "SELL_SHORT"),
            Self::SellShortExempt => write!(f, "SELL_SHORT_EXEMPT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_families() {
        assert!(!Side::Buy.is_sell());
        assert!(Side::Sell.is_sell());
        assert!(!Side::Sell.is_short());
        assert!(Side::SellShortExempt.is_short());
    }

    #[test]
    fn side_may_change_within_sell_family_only() {
        assert!(Side::Sell.may_change_to(Side::SellShort));
        assert!(Side::SellShort.may_change_to(Side::Sell));
        assert!(!Side::Buy.may_change_to(Side::Sell));
        assert!(!Side::Sell.may_change_to(Side::Buy));
    }

    #[test]
    fn side_serde() {
        let json = serde_json::to_string(&Side::SellShortExempt).unwrap();
        assert_eq!(json, "\"SELL_SHORT_EXEMPT\"");
    }
}
