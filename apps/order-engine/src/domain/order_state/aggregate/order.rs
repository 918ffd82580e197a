//! Order Aggregate Root
//!
//! One open order: the new order slot plus at most one pending modify, at
//! most one pending cancel, the last ack and the last execution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_state::events::{Cancel, Merge, Modify, NewOrder, Txn};
use crate::domain::order_state::value_objects::EventState;

/// Open order state.
///
/// Mutated only through [`OrderMgr`](crate::domain::order_state::services::OrderMgr)
/// operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    order_txn: NewOrder,
    modify_txn: Modify,
    cancel_txn: Cancel,
    ack_txn: Option<Txn>,
    exec_txn: Option<Txn>,
}

impl Order {
    /// Creates an empty order, ready for a new order request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// New order slot.
    #[must_use]
    pub const fn new_order(&self) -> &NewOrder {
        &self.order_txn
    }

    /// Modify slot.
    #[must_use]
    pub const fn modify(&self) -> &Modify {
        &self.modify_txn
    }

    /// Cancel slot.
    #[must_use]
    pub const fn cancel(&self) -> &Cancel {
        &self.cancel_txn
    }

    /// Last ack emitted to the client.
    #[must_use]
    pub const fn ack(&self) -> Option<&Txn> {
        self.ack_txn.as_ref()
    }

    /// Last execution (reject, fill, closed).
    #[must_use]
    pub const fn exec(&self) -> Option<&Txn> {
        self.exec_txn.as_ref()
    }

    /// Returns true once the order is rejected or closed and no ack is
    /// waiting on fills.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.order_txn.event.event_state.is_terminal()
            && !matches!(self.modify_txn.event.event_state, EventState::PendingFill)
            && !matches!(self.cancel_txn.event.event_state, EventState::PendingFill)
    }

    /// Returns true if modify and cancel are both outstanding.
    ///
    /// Legal only while a cancel stands in for a simulated modify.
    #[must_use]
    pub const fn modify_and_cancel_active(&self) -> bool {
        self.modify_txn.event.event_state.is_active() && self.cancel_txn.event.event_state.is_active()
    }

    /// Compact `order/modify/cancel` state codes, e.g. `A/S/U`.
    #[must_use]
    pub fn state_code(&self) -> String {
        format!(
            "{}/{}/{}",
            self.order_txn.event.event_state.code(),
            self.modify_txn.event.event_state.code(),
            self.cancel_txn.event.event_state.code()
        )
    }

    // ========================================================================
    // Mutation (order manager only)
    // ========================================================================

    pub(crate) const fn new_order_mut(&mut self) -> &mut NewOrder {
        &mut self.order_txn
    }

    pub(crate) const fn modify_mut(&mut self) -> &mut Modify {
        &mut self.modify_txn
    }

    pub(crate) const fn cancel_mut(&mut self) -> &mut Cancel {
        &mut self.cancel_txn
    }

    pub(crate) fn set_ack(&mut self, ack: Txn) {
        self.ack_txn = Some(ack);
    }

    pub(crate) fn set_exec(&mut self, exec: Txn) {
        self.exec_txn = Some(exec);
    }

    /// Merges the modify slot's terms into the new order.
    pub(crate) fn apply_modify(&mut self) {
        self.order_txn.update_modify(&self.modify_txn, Merge::Request);
    }

    pub(crate) fn install(&mut self, new_order: NewOrder) {
        *self = Self {
            order_txn: new_order,
            ..Self::default()
        };
    }

    /// Clears `Rx`, `Tx` and `Ack` on all five slots.
    pub(crate) fn clear_transient(&mut self) {
        self.order_txn.event.event_flags.clear_transient();
        self.modify_txn.event.event_flags.clear_transient();
        self.cancel_txn.event.event_flags.clear_transient();
        if let Some(ack) = self.ack_txn.as_mut() {
            ack.event_mut().event_flags.clear_transient();
        }
        if let Some(exec) = self.exec_txn.as_mut() {
            exec.event_mut().event_flags.clear_transient();
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order={{{}}}", self.order_txn)?;
        if self.modify_txn.event.event_state != EventState::Unset {
            write!(f, " modify={{{}}}", self.modify_txn)?;
        }
        if self.cancel_txn.event.event_state != EventState::Unset {
            write!(f, " cancel={{{}}}", self.cancel_txn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_state::value_objects::{EventFlag, EventFlags, EventType};

    #[test]
    fn new_order_is_empty() {
        let order = Order::new();
        assert_eq!(order.state_code(), "U/U/U");
        assert!(order.ack().is_none());
        assert!(order.exec().is_none());
        assert!(!order.is_terminal());
    }

    #[test]
    fn clear_transient_covers_all_slots() {
        let mut order = Order::new();
        order.new_order_mut().event.event_flags.insert(EventFlag::Tx);
        order.modify_mut().event.event_flags.insert(EventFlag::Rx);
        order.cancel_mut().event.event_flags.insert(EventFlag::Ack);
        let mut ack = Txn::init(EventType::Ordered, EventFlags::SYNTHETIC, 0);
        ack.event_mut().event_flags.insert(EventFlag::Tx);
        order.set_ack(ack);
        order.clear_transient();
        assert!(!order.new_order().event.is_tx());
        assert!(!order.modify().event.event_flags.rx());
        assert!(!order.cancel().event.event_flags.ack());
        let ack = order.ack().map(|a| *a.event());
        assert_eq!(ack.map(|e| e.is_tx()), Some(false));
        assert_eq!(ack.map(|e| e.event_flags.synthetic()), Some(true));
    }

    #[test]
    fn terminal_waits_for_pending_fill() {
        let mut order = Order::new();
        order.new_order_mut().event.event_state = EventState::Closed;
        order.cancel_mut().event.event_state = EventState::PendingFill;
        assert!(!order.is_terminal());
        order.cancel_mut().event.event_state = EventState::Acknowledged;
        assert!(order.is_terminal());
    }

    #[test]
    fn install_resets_other_slots() {
        let mut order = Order::new();
        order.modify_mut().event.event_state = EventState::Queued;
        order.install(NewOrder::init(EventFlags::EMPTY, 0));
        assert_eq!(order.modify().event.event_state, EventState::Unset);
    }
}
