//! Order type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrdType {
    /// Market order.
    Market,
    /// Limit order.
    Limit,
    /// Stop (market) order.
    Stop,
    /// Stop-limit order.
    StopLimit,
    /// Limit, converting to market on close.
    Funari,
    /// Market if touched.
    MarketIfTouched,
    /// Market during auction, unfilled remainder becomes limit.
    MarketToLimit,
    /// Pegged order.
    Pegged,
    /// Best limit.
    BestLimit,
    /// Limit if touched.
    LimitIfTouched,
    /// Best limit if touched.
    BestLimitIfTouched,
}

impl OrdType {
    /// Returns true if the order carries a limit price that bounds fills.
    #[must_use]
    pub const fn is_limit(self) -> bool {
        matches!(
            self,
            Self::Limit
                | Self::StopLimit
                | Self::Funari
                | Self::Pegged
                | Self::BestLimit
                | Self::LimitIfTouched
                | Self::BestLimitIfTouched
        )
    }
}

impl fmt::Display for OrdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::Stop => write!(f, "STOP"),
            Self::StopLimit => write!(f, "STOP_LIMIT"),
            Self::Funari => write!(f, "FUNARI"),
            Self::MarketIfTouched => write!(f, "MARKET_IF_TOUCHED"),
            Self::MarketToLimit => write!(f, "MARKET_TO_LIMIT"),
            Self::Pegged => write!(f, "PEGGED"),
            Self::BestLimit => write!(f, "BEST_LIMIT"),
            Self::LimitIfTouched => write!(f, "LIMIT_IF_TOUCHED"),
            Self::BestLimitIfTouched => write!(f, "BEST_LIMIT_IF_TOUCHED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrdType::Market, false)]
    #[test_case(OrdType::Limit, true)]
    #[test_case(OrdType::Stop, false)]
    #[test_case(OrdType::StopLimit, true)]
    #[test_case(OrdType::Funari, true)]
    #[test_case(OrdType::MarketIfTouched, false)]
    #[test_case(OrdType::MarketToLimit, false)]
    #[test_case(OrdType::Pegged, true)]
    #[test_case(OrdType::BestLimit, true)]
    #[test_case(OrdType::LimitIfTouched, true)]
    #[test_case(OrdType::BestLimitIfTouched, true)]
    fn ord_type_is_limit(ord_type: OrdType, expected: bool) {
        assert_eq!(ord_type.is_limit(), expected);
    }
}
