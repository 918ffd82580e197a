//! Event kinds exchanged with the client and the market.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an event record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// New order accepted, queued to market.
    #[default]
    NewOrder,
    /// Order acknowledged.
    Ordered,
    /// Order rejected.
    Reject,
    /// Modify accepted, queued to market.
    Modify,
    /// Modify accepted, simulated as cancel/replace.
    ModSimulated,
    /// Modify acknowledged.
    Modified,
    /// Modify rejected, original order left open.
    ModReject,
    /// Modify rejected, original order canceled.
    ModRejectCxl,
    /// Cancel accepted, queued to market.
    Cancel,
    /// Cancel acknowledged.
    Canceled,
    /// Cancel rejected.
    CxlReject,
    /// Order filled (partially or fully).
    Fill,
    /// Order closed (expired, done for day).
    Closed,
}

impl EventType {
    /// Returns true for client/trader requests.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(
            self,
            Self::NewOrder | Self::Modify | Self::ModSimulated | Self::Cancel
        )
    }

    /// Returns true for acknowledgments of a request.
    #[must_use]
    pub const fn is_ack(self) -> bool {
        matches!(self, Self::Ordered | Self::Modified | Self::Canceled)
    }

    /// Returns true for any of the reject kinds.
    #[must_use]
    pub const fn is_reject(self) -> bool {
        matches!(
            self,
            Self::Reject | Self::ModReject | Self::ModRejectCxl | Self::CxlReject
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewOrder => write!(f, "NEW_ORDER"),
            Self::Ordered => write!(f, "ORDERED"),
            Self::Reject => write!(f, "REJECT"),
            Self::Modify => write!(f, "MODIFY"),
            Self::ModSimulated => write!(f, "MOD_SIMULATED"),
            Self::Modified => write!(f, "MODIFIED"),
            Self::ModReject => write!(f, "MOD_REJECT"),
            Self::ModRejectCxl => write!(f, "MOD_REJECT_CXL"),
            Self::Cancel => write!(f, "CANCEL"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::CxlReject => write!(f, "CXL_REJECT"),
            Self::Fill => write!(f, "FILL"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_categories() {
        assert!(EventType::NewOrder.is_request());
        assert!(EventType::ModSimulated.is_request());
        assert!(!EventType::Fill.is_request());
        assert!(EventType::Canceled.is_ack());
        assert!(EventType::ModRejectCxl.is_reject());
        assert!(!EventType::Closed.is_reject());
    }

    #[test]
    fn event_type_display() {
        assert_eq!(EventType::ModRejectCxl.to_string(), "MOD_REJECT_CXL");
        assert_eq!(EventType::NewOrder.to_string(), "NEW_ORDER");
    }
}
