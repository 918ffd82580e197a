//! New order, order ack and order reject transitions.

use tracing::{debug, info};

use super::{
    OrderMgr, Step, cancel_state, cxl_replace, modify_new, modify_state, order_state,
    set_order_flag, then,
};
use crate::application::ports::App;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{Deny, Event, NewOrder, Ordered, Reject, Txn};
use crate::domain::order_state::value_objects::{
    EventFlag, EventFlags, EventState, EventType, RejReason,
};

impl<A: App> OrderMgr<A> {
    fn install_order(order: &mut Order, input: &mut NewOrder, state: EventState) {
        input.event.event_type = EventType::NewOrder;
        input.event.event_state = EventState::Received;
        let mut new_order = input.clone();
        new_order.event.event_flags.clear_transient();
        new_order.event.event_state = state;
        new_order.reset_fills();
        order.install(new_order);
    }

    /// Accepts a new order and queues it to market.
    pub fn new_order(&mut self, order: &mut Order, input: &mut NewOrder) -> Step<A, NewOrder> {
        Self::begin(order, "new_order", &input.event);
        Self::install_order(order, input, EventState::Received);
        Self::queue_order(order);
        info!(order = %order.new_order(), "New order queued");
        Step::Done
    }

    /// Accepts a new order but holds it pending [`release`](Self::release)
    /// or [`deny`](Self::deny).
    pub fn order_held(&mut self, order: &mut Order, input: &mut NewOrder) -> Step<A, NewOrder> {
        Self::begin(order, "order_held", &input.event);
        Self::install_order(order, input, EventState::Held);
        info!(order = %order.new_order(), "New order held");
        Step::Done
    }

    /// Rejects a new order locally with `reason`.
    pub fn order_filtered(
        &mut self,
        order: &mut Order,
        input: &mut NewOrder,
        reason: RejReason,
    ) -> Step<A, NewOrder> {
        Self::begin(order, "order_filtered", &input.event);
        Self::install_order(order, input, EventState::Rejected);
        order.new_order_mut().zero_leaves();
        Self::synthetic_reject(order, EventType::Reject, reason);
        info!(reason = %reason, "New order filtered");
        Step::Done
    }

    /// Releases a held new order, or a held modify, to market.
    pub fn release(&mut self, order: &mut Order, _input: &mut ()) -> Step<A, ()> {
        let event = order.new_order().event;
        Self::begin(order, "release", &event);
        if order_state(order) == EventState::Held {
            Self::queue_order(order);
            info!(state = %order.state_code(), "Held order released");
            return Step::Done;
        }
        if modify_state(order) == EventState::Held {
            self.release_modify(order);
            info!(state = %order.state_code(), "Held modify released");
            return Step::Done;
        }
        self.abnormal(order, &event);
        Step::Done
    }

    /// A released native modify replaces the cancel that stood in for it,
    /// unless that cancel is already at market. A released simulated modify
    /// waits on its cancel.
    fn release_modify(&mut self, order: &mut Order) {
        let c = cancel_state(order);
        order.modify_mut().event.event_state = EventState::Deferred;
        if order.modify().event.event_type == EventType::ModSimulated {
            if c.between(EventState::Deferred, EventState::PendingFill) {
                return;
            }
            debug!("release: cancel for simulated modify");
            set_order_flag(order, EventFlag::ModifyCxl, true);
            self.synthetic_cancel(order);
            self.send_cancel(order);
            return;
        }
        if matches!(c, EventState::Sent | EventState::PendingFill) {
            debug!("release: cancel at market, completing as replace");
            return;
        }
        if matches!(c, EventState::Deferred | EventState::Queued) {
            order.cancel_mut().event.event_state = EventState::Unset;
        }
        set_order_flag(order, EventFlag::ModifyCxl, false);
        if order_state(order) == EventState::Sent && !self.app.async_mod(order) {
            debug!("release: modify deferred until order ack");
            return;
        }
        Self::queue_modify(order);
    }

    /// Rejects a held new order, or a held modify, with the reason carried
    /// by `input`.
    ///
    /// An order carrying a modify-on-queue is answered with a ModReject for
    /// the modify. A denied held modify leaves its order canceled.
    pub fn deny(&mut self, order: &mut Order, input: &mut Deny) -> Step<A, Deny> {
        input.event.event_state = EventState::Received;
        Self::begin(order, "deny", &input.event);
        if order_state(order) == EventState::Held {
            let new_order = order.new_order_mut();
            new_order.event.event_state = EventState::Rejected;
            new_order.zero_leaves();
            let event_type = if modify_new(order) {
                set_order_flag(order, EventFlag::ModifyNew, false);
                EventType::ModReject
            } else {
                EventType::Reject
            };
            Self::emit_denied(order, input, event_type);
            info!(reason = %input.rej_reason, "Held order denied");
            return Step::Done;
        }
        if modify_state(order) == EventState::Held {
            set_order_flag(order, EventFlag::ModifyCxl, false);
            order.modify_mut().event.event_state = EventState::Rejected;
            Self::emit_denied(order, input, EventType::ModReject);
            if !cancel_state(order).between(EventState::Deferred, EventState::PendingFill) {
                self.synthetic_cancel(order);
                self.send_cancel(order);
            }
            info!(reason = %input.rej_reason, state = %order.state_code(), "Held modify denied");
            return Step::Done;
        }
        self.abnormal(order, &input.event);
        Step::Done
    }

    fn emit_denied(order: &mut Order, input: &Deny, event_type: EventType) {
        let mut reject = *input;
        reject.event = Event::init(event_type, EventFlags::SYNTHETIC, input.event.event_leg);
        Self::emit_exec(order, Txn::reject_of(reject));
    }

    // ========================================================================
    // Ordered
    // ========================================================================

    /// Applies a new order ack from the market.
    pub fn ordered(&mut self, order: &mut Order, input: &mut Ordered) -> Step<A, Ordered> {
        Self::begin(order, "ordered", &input.event);
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if !cxl_replace(order) && matches!(no, EventState::Held | EventState::Queued | EventState::Sent) {
            debug!("ordered: solicited");
            Self::apply_ordered(order, input.event.event_flags.persistent());
            Self::release_deferred(order);
            return Step::Done;
        }
        if matches!(no, EventState::Acknowledged | EventState::Closed) {
            debug!("ordered: late");
            input.event.unsolicited_set();
            return Step::Done;
        }
        if cxl_replace(order)
            && no == EventState::Sent
            && matches!(m, EventState::Held | EventState::Deferred)
            && (c.between(EventState::Deferred, EventState::PendingFill) || c == EventState::Rejected)
        {
            debug!("ordered: cancel/replace in progress");
            Self::apply_ordered(order, input.event.event_flags.persistent());
            if matches!(c, EventState::Deferred | EventState::Rejected) {
                Self::queue_cancel(order);
            }
            return Step::Done;
        }
        input.event.unsolicited_set();
        self.abnormal(order, &input.event);
        if !no.is_terminal() {
            Self::apply_ordered(order, input.event.event_flags.persistent());
        }
        Step::Done
    }

    // ========================================================================
    // Reject
    // ========================================================================

    /// Applies a new order reject from the market.
    ///
    /// A pending modify or cancel is rejected first; the order reject follows
    /// in the second stage.
    pub fn reject(&mut self, order: &mut Order, input: &mut Reject) -> Step<A, Reject> {
        Self::begin(order, "reject", &input.event);
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        let deferred_or_queued = |s: EventState| matches!(s, EventState::Deferred | EventState::Queued);
        if !cxl_replace(order)
            && matches!(
                no,
                EventState::Held
                    | EventState::Queued
                    | EventState::Sent
                    | EventState::Acknowledged
                    | EventState::Rejected
            )
        {
            if matches!(no, EventState::Acknowledged | EventState::Rejected) {
                input.event.unsolicited_set();
            }
            if deferred_or_queued(c) {
                debug!("reject: rejecting pending cancel");
                Self::synthetic_cxl_reject(order, RejReason::OrderClosed);
                return then("reject_apply", Self::reject_apply);
            }
            if deferred_or_queued(m) {
                debug!("reject: rejecting pending modify");
                Self::synthetic_mod_reject(order, RejReason::OrderClosed);
                return then("reject_apply", Self::reject_apply);
            }
            return self.reject_apply(order, input);
        }
        if cxl_replace(order)
            && matches!(no, EventState::Sent | EventState::Acknowledged)
            && matches!(m, EventState::Held | EventState::Deferred)
            && (c.between(EventState::Deferred, EventState::PendingFill) || c == EventState::Rejected)
        {
            debug!("reject: cancel/replace in progress");
            if deferred_or_queued(c) {
                order.cancel_mut().event.event_state = EventState::Unset;
            }
            Self::synthetic_mod_reject(order, RejReason::OrderClosed);
            return then("reject_apply", Self::reject_apply);
        }
        input.event.unsolicited_set();
        self.abnormal(order, &input.event);
        self.reject_apply(order, input)
    }

    fn reject_apply(&mut self, order: &mut Order, input: &mut Reject) -> Step<A, Reject> {
        let new_order = order.new_order_mut();
        if !new_order.event.event_state.is_terminal() {
            new_order.event.event_state = EventState::Rejected;
        }
        new_order.zero_leaves();
        set_order_flag(order, EventFlag::ModifyNew, false);
        input.event.event_type = EventType::Reject;
        Self::emit_exec(order, Txn::Reject(*input));
        info!(reason = %input.rej_reason, state = %order.state_code(), "Order rejected");
        Step::Done
    }
}
