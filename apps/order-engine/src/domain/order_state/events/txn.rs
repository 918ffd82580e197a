//! Discriminated event record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::event::Event;
use super::records::{
    AnyReject, Cancel, Canceled, Closed, CxlReject, Fill, ModReject, ModRejectCxl, ModSimulated,
    Modified, Modify, NewOrder, Ordered, Reject,
};
use crate::domain::order_state::errors::TxnError;
use crate::domain::order_state::value_objects::{EventFlags, EventType, RejReason};

/// Any event record, tagged by kind.
///
/// The variant is the discriminant; [`Txn::normalize`] keeps the header's
/// `event_type` in agreement with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Txn {
    /// New order.
    NewOrder(NewOrder),
    /// New order ack.
    Ordered(Ordered),
    /// New order reject.
    Reject(Reject),
    /// Modify.
    Modify(Modify),
    /// Modify simulated by cancel/replace.
    ModSimulated(ModSimulated),
    /// Modify ack.
    Modified(Modified),
    /// Modify reject.
    ModReject(ModReject),
    /// Modify reject, cancel original.
    ModRejectCxl(ModRejectCxl),
    /// Cancel.
    Cancel(Cancel),
    /// Cancel ack.
    Canceled(Canceled),
    /// Cancel reject.
    CxlReject(CxlReject),
    /// Fill.
    Fill(Fill),
    /// Closed.
    Closed(Closed),
}

impl Txn {
    /// Blank record of `event_type`, state `Received`, with the given flags
    /// and leg.
    #[must_use]
    pub fn init(event_type: EventType, flags: EventFlags, leg: u8) -> Self {
        match event_type {
            EventType::NewOrder => Self::NewOrder(NewOrder::init(flags, leg)),
            EventType::Ordered => Self::Ordered(Ordered::init(flags, leg)),
            EventType::Modify => Self::Modify(Modify::init(event_type, flags, leg)),
            EventType::ModSimulated => Self::ModSimulated(Modify::init(event_type, flags, leg)),
            EventType::Modified => Self::Modified(Modify::init(event_type, flags, leg)),
            EventType::Cancel => Self::Cancel(Cancel::init(event_type, flags, leg)),
            EventType::Canceled => Self::Canceled(Cancel::init(event_type, flags, leg)),
            EventType::Reject
            | EventType::ModReject
            | EventType::ModRejectCxl
            | EventType::CxlReject => {
                let mut reject = AnyReject::init(event_type, flags, RejReason::Ok);
                reject.event.event_leg = leg;
                Self::reject_of(reject)
            }
            EventType::Fill => Self::Fill(Fill {
                event: Event::init(event_type, flags, leg),
                ..Fill::default()
            }),
            EventType::Closed => Self::Closed(Closed::init(flags, leg)),
        }
    }

    /// Wraps a reject in the variant named by its header.
    #[must_use]
    pub const fn reject_of(reject: AnyReject) -> Self {
        match reject.event.event_type {
            EventType::ModReject => Self::ModReject(reject),
            EventType::ModRejectCxl => Self::ModRejectCxl(reject),
            EventType::CxlReject => Self::CxlReject(reject),
            _ => Self::Reject(reject),
        }
    }

    /// Kind of record held.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::NewOrder(_) => EventType::NewOrder,
            Self::Ordered(_) => EventType::Ordered,
            Self::Reject(_) => EventType::Reject,
            Self::Modify(_) => EventType::Modify,
            Self::ModSimulated(_) => EventType::ModSimulated,
            Self::Modified(_) => EventType::Modified,
            Self::ModReject(_) => EventType::ModReject,
            Self::ModRejectCxl(_) => EventType::ModRejectCxl,
            Self::Cancel(_) => EventType::Cancel,
            Self::Canceled(_) => EventType::Canceled,
            Self::CxlReject(_) => EventType::CxlReject,
            Self::Fill(_) => EventType::Fill,
            Self::Closed(_) => EventType::Closed,
        }
    }

    /// Header of the held record.
    #[must_use]
    pub const fn event(&self) -> &Event {
        match self {
            Self::NewOrder(r) => &r.event,
            Self::Ordered(r) => &r.event,
            Self::Modify(r) | Self::ModSimulated(r) | Self::Modified(r) => &r.event,
            Self::Cancel(r) | Self::Canceled(r) => &r.event,
            Self::Reject(r) | Self::ModReject(r) | Self::ModRejectCxl(r) | Self::CxlReject(r) => {
                &r.event
            }
            Self::Fill(r) => &r.event,
            Self::Closed(r) => &r.event,
        }
    }

    /// Mutable header of the held record.
    pub const fn event_mut(&mut self) -> &mut Event {
        match self {
            Self::NewOrder(r) => &mut r.event,
            Self::Ordered(r) => &mut r.event,
            Self::Modify(r) | Self::ModSimulated(r) | Self::Modified(r) => &mut r.event,
            Self::Cancel(r) | Self::Canceled(r) => &mut r.event,
            Self::Reject(r) | Self::ModReject(r) | Self::ModRejectCxl(r) | Self::CxlReject(r) => {
                &mut r.event
            }
            Self::Fill(r) => &mut r.event,
            Self::Closed(r) => &mut r.event,
        }
    }

    /// Sets the header's `event_type` from the variant.
    pub const fn normalize(&mut self) {
        let event_type = self.event_type();
        self.event_mut().event_type = event_type;
    }

    /// Size in bytes of the held record.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::NewOrder(_) => size_of::<NewOrder>(),
            Self::Ordered(_) => size_of::<Ordered>(),
            Self::Modify(_) | Self::ModSimulated(_) | Self::Modified(_) => size_of::<Modify>(),
            Self::Cancel(_) | Self::Canceled(_) => size_of::<Cancel>(),
            Self::Reject(_) | Self::ModReject(_) | Self::ModRejectCxl(_) | Self::CxlReject(_) => {
                size_of::<AnyReject>()
            }
            Self::Fill(_) => size_of::<Fill>(),
            Self::Closed(_) => size_of::<Closed>(),
        }
    }

    // ============================================
    // Checked access
    // ============================================

    const fn mismatch(&self, expected: &'static str) -> TxnError {
        TxnError::KindMismatch {
            expected,
            actual: self.event_type(),
        }
    }

    /// The new order record.
    pub const fn as_new_order(&self) -> Result<&NewOrder, TxnError> {
        match self {
            Self::NewOrder(r) => Ok(r),
            _ => Err(self.mismatch("NEW_ORDER")),
        }
    }

    /// The ordered record.
    pub const fn as_ordered(&self) -> Result<&Ordered, TxnError> {
        match self {
            Self::Ordered(r) => Ok(r),
            _ => Err(self.mismatch("ORDERED")),
        }
    }

    /// The modify-shaped record (Modify, ModSimulated, Modified).
    pub const fn as_modify(&self) -> Result<&Modify, TxnError> {
        match self {
            Self::Modify(r) | Self::ModSimulated(r) | Self::Modified(r) => Ok(r),
            _ => Err(self.mismatch("MODIFY")),
        }
    }

    /// The cancel-shaped record (Cancel, Canceled).
    pub const fn as_cancel(&self) -> Result<&Cancel, TxnError> {
        match self {
            Self::Cancel(r) | Self::Canceled(r) => Ok(r),
            _ => Err(self.mismatch("CANCEL")),
        }
    }

    /// The reject-shaped record (any reject kind).
    pub const fn as_reject(&self) -> Result<&AnyReject, TxnError> {
        match self {
            Self::Reject(r) | Self::ModReject(r) | Self::ModRejectCxl(r) | Self::CxlReject(r) => {
                Ok(r)
            }
            _ => Err(self.mismatch("REJECT")),
        }
    }

    /// The fill record.
    pub const fn as_fill(&self) -> Result<&Fill, TxnError> {
        match self {
            Self::Fill(r) => Ok(r),
            _ => Err(self.mismatch("FILL")),
        }
    }

    /// The closed record.
    pub const fn as_closed(&self) -> Result<&Closed, TxnError> {
        match self {
            Self::Closed(r) => Ok(r),
            _ => Err(self.mismatch("CLOSED")),
        }
    }
}

impl fmt::Display for Txn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewOrder(r) => write!(f, "{r}"),
            Self::Ordered(r) => write!(f, "{r}"),
            Self::Modify(r) | Self::ModSimulated(r) | Self::Modified(r) => write!(f, "{r}"),
            Self::Cancel(r) | Self::Canceled(r) => write!(f, "{r}"),
            Self::Reject(r) | Self::ModReject(r) | Self::ModRejectCxl(r) | Self::CxlReject(r) => {
                write!(f, "{r}")
            }
            Self::Fill(r) => write!(f, "{r}"),
            Self::Closed(r) => write!(f, "{r}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_state::value_objects::EventState;

    const ALL_KINDS: [EventType; 13] = [
        EventType::NewOrder,
        EventType::Ordered,
        EventType::Reject,
        EventType::Modify,
        EventType::ModSimulated,
        EventType::Modified,
        EventType::ModReject,
        EventType::ModRejectCxl,
        EventType::Cancel,
        EventType::Canceled,
        EventType::CxlReject,
        EventType::Fill,
        EventType::Closed,
    ];

    #[test]
    fn init_sets_discriminant_state_and_flags() {
        for kind in ALL_KINDS {
            let txn = Txn::init(kind, EventFlags::SYNTHETIC, 0);
            assert_eq!(txn.event_type(), kind);
            assert_eq!(txn.event().event_type, kind);
            assert_eq!(txn.event().event_state, EventState::Received);
            assert!(txn.event().event_flags.synthetic());
        }
    }

    #[test]
    fn size_never_exceeds_capacity() {
        for kind in ALL_KINDS {
            let txn = Txn::init(kind, EventFlags::EMPTY, 0);
            assert!(txn.size() > 0);
            assert!(txn.size() <= size_of::<Txn>());
        }
    }

    #[test]
    fn checked_access_matches_shape() {
        let txn = Txn::init(EventType::Modified, EventFlags::EMPTY, 0);
        assert!(txn.as_modify().is_ok());
        assert_eq!(
            txn.as_fill(),
            Err(TxnError::KindMismatch {
                expected: "FILL",
                actual: EventType::Modified
            })
        );
        let reject = Txn::init(EventType::CxlReject, EventFlags::EMPTY, 0);
        assert!(reject.as_reject().is_ok());
        assert!(reject.as_cancel().is_err());
    }

    #[test]
    fn normalize_repairs_header() {
        let mut txn = Txn::Fill(Fill::default());
        assert_eq!(txn.event().event_type, EventType::NewOrder);
        txn.normalize();
        assert_eq!(txn.event().event_type, EventType::Fill);
    }

    #[test]
    fn serde_externally_tagged() {
        let txn = Txn::Fill(Fill::new(0, 103, 0, 40, 0));
        let json = serde_json::to_string(&txn).unwrap();
        assert!(json.starts_with("{\"FILL\":"));
        let back: Txn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, txn);
    }

    #[test]
    fn display_dispatches() {
        let txn = Txn::init(EventType::Ordered, EventFlags::EMPTY, 0);
        assert!(txn.to_string().starts_with("type=ORDERED"));
    }
}
