//! Event state within the order lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an event slot.
///
/// The ordinal is significant: transitions test contiguous ranges
/// (e.g. `Held..=PendingFill`), so variants must stay in this order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    /// Slot is empty.
    #[default]
    Unset,
    /// Received, not yet processed further.
    Received,
    /// Held awaiting release (trigger or review).
    Held,
    /// Deferred awaiting ack of the pending order or modify.
    Deferred,
    /// Queued to market.
    Queued,
    /// Transmitted to market (or to the client, for outbound acks).
    Sent,
    /// Acknowledged, but the ack waits for fills to catch up.
    PendingFill,
    /// Acknowledged.
    Acknowledged,
    /// Rejected.
    Rejected,
    /// Closed.
    Closed,
}

impl EventState {
    /// Returns true if `lo <= self <= hi` by ordinal.
    #[must_use]
    pub const fn between(self, lo: Self, hi: Self) -> bool {
        self as u8 >= lo as u8 && self as u8 <= hi as u8
    }

    /// Returns true if a request in this state is still outstanding
    /// (`Held..=PendingFill`).
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.between(Self::Held, Self::PendingFill)
    }

    /// Returns true if the slot holds nothing outstanding
    /// (`Unset`, `Acknowledged` or `Rejected`).
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Unset | Self::Acknowledged | Self::Rejected)
    }

    /// Returns true for `Rejected` or `Closed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Closed)
    }

    /// Single-letter code used in compact state dumps.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Unset => 'U',
            Self::Received => 'R',
            Self::Held => 'H',
            Self::Deferred => 'D',
            Self::Queued => 'Q',
            Self::Sent => 'S',
            Self::PendingFill => 'P',
            Self::Acknowledged => 'A',
            Self::Rejected => 'X',
            Self::Closed => 'C',
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "UNSET"),
            Self::Received => write!(f, "RECEIVED"),
            Self::Held => write!(f, "HELD"),
            Self::Deferred => write!(f, "DEFERRED"),
            Self::Queued => write!(f, "QUEUED"),
            Self::Sent => write!(f, "SENT"),
            Self::PendingFill => write!(f, "PENDING_FILL"),
            Self::Acknowledged => write!(f, "ACKNOWLEDGED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn event_state_ordinal_order() {
        let all = [
            EventState::Unset,
            EventState::Received,
            EventState::Held,
            EventState::Deferred,
            EventState::Queued,
            EventState::Sent,
            EventState::PendingFill,
            EventState::Acknowledged,
            EventState::Rejected,
            EventState::Closed,
        ];
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test_case(EventState::Unset, false)]
    #[test_case(EventState::Received, false)]
    #[test_case(EventState::Held, true)]
    #[test_case(EventState::Deferred, true)]
    #[test_case(EventState::Queued, true)]
    #[test_case(EventState::Sent, true)]
    #[test_case(EventState::PendingFill, true)]
    #[test_case(EventState::Acknowledged, false)]
    #[test_case(EventState::Rejected, false)]
    #[test_case(EventState::Closed, false)]
    fn event_state_is_active(state: EventState, expected: bool) {
        assert_eq!(state.is_active(), expected);
    }

    #[test]
    fn event_state_between_is_inclusive() {
        assert!(EventState::Deferred.between(EventState::Deferred, EventState::PendingFill));
        assert!(EventState::PendingFill.between(EventState::Deferred, EventState::PendingFill));
        assert!(!EventState::Held.between(EventState::Deferred, EventState::PendingFill));
    }

    #[test]
    fn event_state_idle_and_terminal() {
        assert!(EventState::Unset.is_idle());
        assert!(EventState::Rejected.is_idle());
        assert!(!EventState::Closed.is_idle());
        assert!(EventState::Closed.is_terminal());
        assert!(!EventState::Acknowledged.is_terminal());
    }

    #[test]
    fn event_state_display_and_code() {
        assert_eq!(EventState::PendingFill.to_string(), "PENDING_FILL");
        assert_eq!(EventState::PendingFill.code(), 'P');
        assert_eq!(EventState::Rejected.code(), 'X');
    }

    #[test]
    fn event_state_serde() {
        let json = serde_json::to_string(&EventState::Acknowledged).unwrap();
        assert_eq!(json, "\"ACKNOWLEDGED\"");
        let parsed: EventState = serde_json::from_str("\"QUEUED\"").unwrap();
        assert_eq!(parsed, EventState::Queued);
    }
}
