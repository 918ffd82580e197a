//! Event records.
//!
//! One record shape per event kind. Several kinds share a shape: the
//! [`Event::event_type`] header field distinguishes them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::event::Event;
use super::legs::{CancelLeg, Legs, Merge, ModifyLeg, OrderLeg};
use crate::domain::order_state::value_objects::{
    EventFlags, EventType, Ndp, RejReason, TimeInForce, ValNdp, Value,
};

// ============================================
// New order
// ============================================

/// New order request, and the persisted state of a working order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewOrder {
    /// Header.
    pub event: Event,
    /// Legs.
    pub legs: Legs<OrderLeg>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl NewOrder {
    /// Blank new order.
    #[must_use]
    pub fn init(flags: EventFlags, leg: u8) -> Self {
        Self {
            event: Event::init(EventType::NewOrder, flags, leg),
            ..Self::default()
        }
    }

    /// New order with the given legs.
    #[must_use]
    pub fn with_legs(legs: Legs<OrderLeg>, time_in_force: TimeInForce) -> Self {
        Self {
            legs,
            time_in_force,
            ..Self::init(EventFlags::EMPTY, 0)
        }
    }

    /// Merges a modify (request or ack) into the order terms.
    pub fn update_modify(&mut self, modify: &Modify, merge: Merge) {
        self.legs.update(&modify.legs, merge);
        if let Some(tif) = modify.time_in_force {
            self.time_in_force = tif;
        }
    }

    /// Worst-case legs while `modify` is outstanding.
    #[must_use]
    pub fn exposure(&self, modify: &Modify) -> Legs<OrderLeg> {
        let mut legs = self.legs.clone();
        legs.expose(&modify.legs);
        legs
    }

    /// Returns true if every leg is fully filled.
    #[must_use]
    pub fn filled(&self) -> bool {
        self.legs.filled()
    }

    /// Resets cumulative accounting on every leg.
    pub fn reset_fills(&mut self) {
        for leg in self.legs.iter_mut() {
            leg.cum_qty = 0;
            leg.cum_value = 0;
            leg.update_leaves_qty();
        }
    }

    /// Zeroes leaves on every leg (order is done).
    pub fn zero_leaves(&mut self) {
        for leg in self.legs.iter_mut() {
            leg.leaves_qty = 0;
        }
    }
}

impl fmt::Display for NewOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} tif={}", self.event, self.legs, self.time_in_force)
    }
}

// ============================================
// Ordered
// ============================================

/// New order acknowledgment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ordered {
    /// Header.
    pub event: Event,
}

impl Ordered {
    /// Blank ack.
    #[must_use]
    pub const fn init(flags: EventFlags, leg: u8) -> Self {
        Self {
            event: Event::init(EventType::Ordered, flags, leg),
        }
    }
}

impl fmt::Display for Ordered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event)
    }
}

// ============================================
// Modify
// ============================================

/// Modify request and modify ack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modify {
    /// Header.
    pub event: Event,
    /// Proposed (or acknowledged) leg terms.
    pub legs: Legs<ModifyLeg>,
    /// New time in force, if changed.
    pub time_in_force: Option<TimeInForce>,
    /// Flags of an ack deferred until fills catch up.
    pub ack_flags: EventFlags,
}

/// Modify simulated by cancel/replace.
pub type ModSimulated = Modify;

/// Modify acknowledgment.
pub type Modified = Modify;

impl Modify {
    /// Blank record of the given modify kind.
    #[must_use]
    pub fn init(event_type: EventType, flags: EventFlags, leg: u8) -> Self {
        Self {
            event: Event::init(event_type, flags, leg),
            ..Self::default()
        }
    }

    /// Merges another modify (request or ack) into this one.
    pub fn update_modify(&mut self, other: &Self, merge: Merge) {
        self.legs.update(&other.legs, merge);
        if other.time_in_force.is_some() {
            self.time_in_force = other.time_in_force;
        }
    }
}

impl fmt::Display for Modify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event, self.legs)?;
        if let Some(tif) = self.time_in_force {
            write!(f, " tif={tif}")?;
        }
        if !self.ack_flags.is_empty() {
            write!(f, " ackFlags=[{}]", self.ack_flags)?;
        }
        Ok(())
    }
}

// ============================================
// Cancel
// ============================================

/// Cancel request and cancel ack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cancel {
    /// Header.
    pub event: Event,
    /// Leg quantities (cumulative quantities are meaningful on acks).
    pub legs: Legs<CancelLeg>,
    /// Flags of an ack deferred until fills catch up.
    pub ack_flags: EventFlags,
}

/// Cancel acknowledgment.
pub type Canceled = Cancel;

impl Cancel {
    /// Blank record of the given cancel kind.
    #[must_use]
    pub fn init(event_type: EventType, flags: EventFlags, leg: u8) -> Self {
        Self {
            event: Event::init(event_type, flags, leg),
            ..Self::default()
        }
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event, self.legs)?;
        if !self.ack_flags.is_empty() {
            write!(f, " ackFlags=[{}]", self.ack_flags)?;
        }
        Ok(())
    }
}

// ============================================
// Rejects
// ============================================

/// Reject of a new order, modify or cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnyReject {
    /// Header.
    pub event: Event,
    /// Source-specific numeric code.
    pub rej_code: i32,
    /// Reason.
    pub rej_reason: RejReason,
}

/// New order reject.
pub type Reject = AnyReject;
/// Modify reject, original order left open.
pub type ModReject = AnyReject;
/// Modify reject, original order to be canceled.
pub type ModRejectCxl = AnyReject;
/// Cancel reject.
pub type CxlReject = AnyReject;
/// Reject of a held order.
pub type Deny = AnyReject;

impl AnyReject {
    /// Reject of the given kind with a reason.
    #[must_use]
    pub const fn init(event_type: EventType, flags: EventFlags, rej_reason: RejReason) -> Self {
        Self {
            event: Event::init(event_type, flags, 0),
            rej_code: 0,
            rej_reason,
        }
    }
}

impl fmt::Display for AnyReject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rejReason={} rejCode={}",
            self.event, self.rej_reason, self.rej_code
        )
    }
}

// ============================================
// Fill
// ============================================

/// Execution against one leg; `event.event_leg` selects the leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fill {
    /// Header.
    pub event: Event,
    /// Execution price.
    pub last_px: Value,
    /// Execution quantity.
    pub last_qty: Value,
    /// Price decimal places.
    pub px_ndp: Ndp,
    /// Quantity decimal places.
    pub qty_ndp: Ndp,
}

impl Fill {
    /// Fill of `last_qty` at `last_px` on leg `leg`.
    #[must_use]
    pub const fn new(leg: u8, last_px: Value, px_ndp: Ndp, last_qty: Value, qty_ndp: Ndp) -> Self {
        Self {
            event: Event::init(EventType::Fill, EventFlags::EMPTY, leg),
            last_px,
            last_qty,
            px_ndp,
            qty_ndp,
        }
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lastPx={} lastQty={}",
            self.event,
            ValNdp::new(self.last_px, self.px_ndp),
            ValNdp::new(self.last_qty, self.qty_ndp)
        )
    }
}

// ============================================
// Closed
// ============================================

/// Order closed by the market (expired, done for day).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Closed {
    /// Header.
    pub event: Event,
    /// Final leg quantities.
    pub legs: Legs<CancelLeg>,
}

impl Closed {
    /// Blank close notice.
    #[must_use]
    pub fn init(flags: EventFlags, leg: u8) -> Self {
        Self {
            event: Event::init(EventType::Closed, flags, leg),
            ..Self::default()
        }
    }
}

impl fmt::Display for Closed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event, self.legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_state::value_objects::{EventState, OrdType, Side};

    fn order(px: Value, qty: Value) -> NewOrder {
        NewOrder::with_legs(
            Legs::single(OrderLeg::new(Side::Buy, OrdType::Limit, px, 0, qty, 0)),
            TimeInForce::Gtc,
        )
    }

    #[test]
    fn init_sets_received_and_kind() {
        let modify = Modify::init(EventType::ModSimulated, EventFlags::SYNTHETIC, 0);
        assert_eq!(modify.event.event_type, EventType::ModSimulated);
        assert_eq!(modify.event.event_state, EventState::Received);
        assert!(modify.event.event_flags.synthetic());
    }

    #[test]
    fn new_order_update_modify_merges_terms() {
        let mut new_order = order(100, 100);
        let mut modify = Modify::init(EventType::Modify, EventFlags::EMPTY, 0);
        modify.legs = Legs::single(ModifyLeg {
            px: 105,
            ..ModifyLeg::default()
        });
        modify.time_in_force = Some(TimeInForce::Ioc);
        new_order.update_modify(&modify, Merge::Request);
        assert_eq!(new_order.legs.get(0).map(|l| l.px), Some(105));
        assert_eq!(new_order.time_in_force, TimeInForce::Ioc);
    }

    #[test]
    fn exposure_does_not_mutate_order() {
        let new_order = order(100, 100);
        let mut modify = Modify::init(EventType::Modify, EventFlags::EMPTY, 0);
        modify.legs = Legs::single(ModifyLeg {
            px: 110,
            order_qty: 200,
            ..ModifyLeg::default()
        });
        let exposed = new_order.exposure(&modify);
        assert_eq!(exposed.get(0).map(|l| (l.px, l.order_qty)), Some((110, 200)));
        assert_eq!(new_order.legs.get(0).map(|l| l.px), Some(100));
    }

    #[test]
    fn zero_leaves_and_reset_fills() {
        let mut new_order = order(100, 100);
        if let Some(leg) = new_order.legs.get_mut(0) {
            leg.cum_qty = 40;
            leg.cum_value = 4000;
        }
        new_order.zero_leaves();
        assert_eq!(new_order.legs.get(0).map(|l| l.leaves_qty), Some(0));
        new_order.reset_fills();
        assert_eq!(new_order.legs.get(0).map(|l| (l.cum_qty, l.leaves_qty)), Some((0, 100)));
    }

    #[test]
    fn reject_display() {
        let reject = AnyReject::init(EventType::ModReject, EventFlags::SYNTHETIC, RejReason::OrderClosed);
        assert!(reject.to_string().contains("rejReason=ORDER_CLOSED"));
    }
}
