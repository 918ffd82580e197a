//! Time in force.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long an order remains working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Day order (venue default).
    #[default]
    Normal,
    /// Immediate or cancel.
    Ioc,
    /// Fill or kill.
    Fok,
    /// At the opening auction.
    AtOpen,
    /// At the closing auction.
    AtClose,
    /// Good till canceled.
    Gtc,
    /// Good till date.
    Gtd,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Ioc => write!(f, "IOC"),
            Self::Fok => write!(f, "FOK"),
            Self::AtOpen => write!(f, "AT_OPEN"),
            Self::AtClose => write!(f, "AT_CLOSE"),
            Self::Gtc => write!(f, "GTC"),
            Self::Gtd => write!(f, "GTD"),
        }
    }
}
