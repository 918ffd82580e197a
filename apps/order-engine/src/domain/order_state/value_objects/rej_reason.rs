//! Reject reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason attached to a reject, or `Ok` for a filter that passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejReason {
    /// No reject.
    #[default]
    Ok,
    /// Unknown order.
    UnknownOrder,
    /// Duplicate order.
    DuplicateOrder,
    /// A modify is already pending.
    ModifyPending,
    /// A cancel is already pending.
    CancelPending,
    /// The order is closed or rejected.
    OrderClosed,
    /// Price not on a tick boundary.
    PriceNotRoundTick,
    /// Price out of range.
    PriceOutOfRange,
    /// Quantity not a round lot.
    QtyNotRoundLot,
    /// Quantity out of range.
    QtyOutOfRange,
    /// Invalid side.
    BadSide,
    /// Invalid order type.
    BadOrderType,
    /// Invalid time in force.
    BadTimeInForce,
    /// Broker-specific reject.
    BrokerReject,
    /// Market-specific reject.
    MarketReject,
    /// Order state management (request arrived in an impossible state).
    Osm,
}

impl RejReason {
    /// Returns true if this is not a reject.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for RejReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::UnknownOrder => write!(f, "UNKNOWN_ORDER"),
            Self::DuplicateOrder => write!(f, "DUPLICATE_ORDER"),
            Self::ModifyPending => write!(f, "MODIFY_PENDING"),
            Self::CancelPending => write!(f, "CANCEL_PENDING"),
            Self::OrderClosed => write!(f, "ORDER_CLOSED"),
            Self::PriceNotRoundTick => write!(f, "PRICE_NOT_ROUND_TICK"),
            Self::PriceOutOfRange => write!(f, "PRICE_OUT_OF_RANGE"),
            Self::QtyNotRoundLot => write!(f, "QTY_NOT_ROUND_LOT"),
            Self::QtyOutOfRange => write!(f, "QTY_OUT_OF_RANGE"),
            Self::BadSide => write!(f, "BAD_SIDE"),
            Self::BadOrderType => write!(f, "BAD_ORDER_TYPE"),
            Self::BadTimeInForce => write!(f, "BAD_TIME_IN_FORCE"),
            Self::BrokerReject => write!(f, "BROKER_REJECT"),
            Self::MarketReject => write!(f, "MARKET_REJECT"),
            Self::Osm => write!(f, "OSM"),
        }
    }
}
