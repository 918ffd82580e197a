//! Event flags.
//!
//! `Rx`, `Tx` and `Ack` are transient: the order manager clears them at the
//! start of every transition. The remaining flags persist until explicitly
//! changed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single named event flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventFlag {
    /// Received in the current transition.
    Rx,
    /// To be transmitted following the current transition.
    Tx,
    /// Acknowledged in the current transition.
    Ack,
    /// A cancel is standing in for a simulated modify (cancel/replace).
    ModifyCxl,
    /// The new order already reflects a modify that arrived before it was
    /// acknowledged (modify-on-queue).
    ModifyNew,
    /// Unsolicited by the client (market-initiated or out of sequence).
    Unsolicited,
    /// Synthesized locally, not received from the market.
    Synthetic,
    /// Synthesized ack for terms still pending at the market.
    Pending,
}

impl EventFlag {
    /// Every flag, in bit order.
    pub const ALL: [Self; 8] = [
        Self::Rx,
        Self::Tx,
        Self::Ack,
        Self::ModifyCxl,
        Self::ModifyNew,
        Self::Unsolicited,
        Self::Synthetic,
        Self::Pending,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for EventFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rx => write!(f, "RX"),
            Self::Tx => write!(f, "TX"),
            Self::Ack => write!(f, "ACK"),
            Self::ModifyCxl => write!(f, "MODIFY_CXL"),
            Self::ModifyNew => write!(f, "MODIFY_NEW"),
            Self::Unsolicited => write!(f, "UNSOLICITED"),
            Self::Synthetic => write!(f, "SYNTHETIC"),
            Self::Pending => write!(f, "PENDING"),
        }
    }
}

/// Set of [`EventFlag`]s.
///
/// Serializes as a list of flag names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<EventFlag>", into = "Vec<EventFlag>")]
pub struct EventFlags(u8);

const TRANSIENT: u8 = EventFlag::Rx.bit() | EventFlag::Tx.bit() | EventFlag::Ack.bit();

impl EventFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);
    /// `Synthetic` only.
    pub const SYNTHETIC: Self = Self(EventFlag::Synthetic.bit());
    /// `Synthetic | Pending`.
    pub const SYNTHETIC_PENDING: Self =
        Self(EventFlag::Synthetic.bit() | EventFlag::Pending.bit());
    /// `Unsolicited` only.
    pub const UNSOLICITED: Self = Self(EventFlag::Unsolicited.bit());

    /// Returns true if `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: EventFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Sets `flag`.
    pub const fn insert(&mut self, flag: EventFlag) {
        self.0 |= flag.bit();
    }

    /// Clears `flag`.
    pub const fn remove(&mut self, flag: EventFlag) {
        self.0 &= !flag.bit();
    }

    /// Returns `self` with `flag` set.
    #[must_use]
    pub const fn with(mut self, flag: EventFlag) -> Self {
        self.insert(flag);
        self
    }

    /// Returns only the persistent flags.
    #[must_use]
    pub const fn persistent(self) -> Self {
        Self(self.0 & !TRANSIENT)
    }

    /// Clears `Rx`, `Tx` and `Ack`.
    pub const fn clear_transient(&mut self) {
        self.0 &= !TRANSIENT;
    }

    /// Returns true if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Iterates over the set flags in bit order.
    pub fn iter(self) -> impl Iterator<Item = EventFlag> {
        EventFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    // ============================================
    // Named predicates
    // ============================================

    /// Received in the current transition.
    #[must_use]
    pub const fn rx(self) -> bool {
        self.contains(EventFlag::Rx)
    }

    /// To be transmitted following the current transition.
    #[must_use]
    pub const fn tx(self) -> bool {
        self.contains(EventFlag::Tx)
    }

    /// Acknowledged in the current transition.
    #[must_use]
    pub const fn ack(self) -> bool {
        self.contains(EventFlag::Ack)
    }

    /// Cancel/replace in progress.
    #[must_use]
    pub const fn modify_cxl(self) -> bool {
        self.contains(EventFlag::ModifyCxl)
    }

    /// New order already reflects a modify-on-queue.
    #[must_use]
    pub const fn modify_new(self) -> bool {
        self.contains(EventFlag::ModifyNew)
    }

    /// Unsolicited.
    #[must_use]
    pub const fn unsolicited(self) -> bool {
        self.contains(EventFlag::Unsolicited)
    }

    /// Synthesized locally.
    #[must_use]
    pub const fn synthetic(self) -> bool {
        self.contains(EventFlag::Synthetic)
    }

    /// Synthesized, terms pending at the market.
    #[must_use]
    pub const fn pending(self) -> bool {
        self.contains(EventFlag::Pending)
    }
}

impl From<Vec<EventFlag>> for EventFlags {
    fn from(flags: Vec<EventFlag>) -> Self {
        flags.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl From<EventFlags> for Vec<EventFlag> {
    fn from(flags: EventFlags) -> Self {
        flags.iter().collect()
    }
}

impl FromIterator<EventFlag> for EventFlags {
    fn from_iter<I: IntoIterator<Item = EventFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flag in self.iter() {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            write!(f, "{flag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_flags_insert_and_remove() {
        let mut flags = EventFlags::EMPTY;
        flags.insert(EventFlag::ModifyCxl);
        assert!(flags.modify_cxl());
        assert!(!flags.modify_new());
        flags.remove(EventFlag::ModifyCxl);
        assert!(flags.is_empty());
    }

    #[test]
    fn event_flags_clear_transient_keeps_persistent() {
        let mut flags: EventFlags = [
            EventFlag::Rx,
            EventFlag::Tx,
            EventFlag::Ack,
            EventFlag::Unsolicited,
            EventFlag::Pending,
        ]
        .into_iter()
        .collect();
        flags.clear_transient();
        assert!(!flags.rx() && !flags.tx() && !flags.ack());
        assert!(flags.unsolicited());
        assert!(flags.pending());
        assert_eq!(flags, flags.persistent());
    }

    #[test]
    fn event_flags_display() {
        assert_eq!(EventFlags::SYNTHETIC_PENDING.to_string(), "SYNTHETIC|PENDING");
        assert_eq!(EventFlags::EMPTY.to_string(), "");
    }

    #[test]
    fn event_flags_serde_as_names() {
        let json = serde_json::to_string(&EventFlags::SYNTHETIC_PENDING).unwrap();
        assert_eq!(json, "[\"SYNTHETIC\",\"PENDING\"]");
        let parsed: EventFlags = serde_json::from_str("[\"UNSOLICITED\"]").unwrap();
        assert_eq!(parsed, EventFlags::UNSOLICITED);
    }
}
