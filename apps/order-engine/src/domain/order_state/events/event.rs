//! Common event header.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_state::value_objects::{EventFlag, EventFlags, EventState, EventType};

/// Header carried by every event record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Kind of record.
    pub event_type: EventType,
    /// Lifecycle state.
    pub event_state: EventState,
    /// Flags.
    pub event_flags: EventFlags,
    /// Leg index for leg-specific events (fills).
    pub event_leg: u8,
}

impl Event {
    /// Header in state `Received` with the given flags and leg.
    #[must_use]
    pub const fn init(event_type: EventType, event_flags: EventFlags, event_leg: u8) -> Self {
        Self {
            event_type,
            event_state: EventState::Received,
            event_flags,
            event_leg,
        }
    }

    /// Marks the event unsolicited.
    pub const fn unsolicited_set(&mut self) {
        self.event_flags.insert(EventFlag::Unsolicited);
    }

    /// Returns true if the record is to be transmitted.
    #[must_use]
    pub const fn is_tx(&self) -> bool {
        self.event_flags.tx()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} state={} flags=[{}] leg={}",
            self.event_type, self.event_state, self.event_flags, self.event_leg
        )
    }
}
