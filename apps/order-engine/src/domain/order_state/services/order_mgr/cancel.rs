//! Cancel transitions, and completion of a simulated cancel/replace.

use tracing::{debug, error, info};

use super::{
    OrderMgr, Step, cancel_legs, cancel_state, cxl_replace, modify_state, order_state,
    set_order_flag, then,
};
use crate::application::ports::App;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{Cancel, Canceled, CxlReject, Merge, Txn};
use crate::domain::order_state::value_objects::{
    EventFlag, EventFlags, EventState, EventType, RejReason,
};

impl<A: App> OrderMgr<A> {
    /// Checks whether a cancel may be applied to `order`.
    ///
    /// Must return [`RejReason::Ok`] before [`cancel`](Self::cancel) is
    /// called; otherwise the caller answers with
    /// [`cxl_filtered`](Self::cxl_filtered).
    #[must_use]
    pub fn filter_cancel(&self, order: &Order) -> RejReason {
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if no.is_terminal() {
            return RejReason::OrderClosed;
        }
        if c.between(EventState::Deferred, EventState::PendingFill) {
            return if cxl_replace(order) {
                RejReason::ModifyPending
            } else {
                RejReason::CancelPending
            };
        }
        // A modify already at market must be answered before a cancel goes out.
        if matches!(m, EventState::Sent | EventState::PendingFill) {
            return RejReason::ModifyPending;
        }
        RejReason::Ok
    }

    /// Rejects a cancel locally with the reason its filter returned.
    pub fn cxl_filtered(
        &mut self,
        order: &mut Order,
        input: &mut Cancel,
        reason: RejReason,
    ) -> Step<A, Cancel> {
        Self::begin(order, "cxl_filtered", &input.event);
        input.event.event_state = EventState::Rejected;
        Self::synthetic_reject(order, EventType::CxlReject, reason);
        debug!(reason = %reason, "Cancel filtered");
        Step::Done
    }

    // ========================================================================
    // Cancel
    // ========================================================================

    /// Applies a client cancel.
    ///
    /// A cancel of a new order that never reached the market closes it
    /// immediately.
    pub fn cancel(&mut self, order: &mut Order, input: &mut Cancel) -> Step<A, Cancel> {
        Self::begin(order, "cancel", &input.event);
        input.event.event_type = EventType::Cancel;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if matches!(no, EventState::Sent | EventState::Acknowledged)
            && !matches!(m, EventState::Sent | EventState::PendingFill)
            && !c.between(EventState::Deferred, EventState::PendingFill)
        {
            debug!("cancel: usual case");
            if matches!(m, EventState::Held | EventState::Deferred | EventState::Queued) {
                Self::synthetic_mod_reject(order, RejReason::OrderClosed);
            }
            set_order_flag(order, EventFlag::ModifyCxl, false);
            let mut cancel = input.clone();
            cancel.event.event_flags.clear_transient();
            cancel.ack_flags = EventFlags::EMPTY;
            cancel.legs = cancel_legs(order);
            *order.cancel_mut() = cancel;
            self.send_cancel(order);
            return Step::Done;
        }
        if matches!(no, EventState::Held | EventState::Queued) {
            debug!("cancel: cancel-on-queue");
            Self::close(order);
            Self::emit_canceled(order, EventFlags::SYNTHETIC);
            return Step::Done;
        }
        let mut reason = self.filter_cancel(order);
        if reason.is_ok() {
            reason = RejReason::Osm;
        }
        error!(reason = %reason, state = %order.state_code(), "Cancel applied without a passing filter");
        input.event.event_state = EventState::Rejected;
        self.abnormal(order, &input.event);
        Self::synthetic_reject(order, EventType::CxlReject, reason);
        Step::Done
    }

    // ========================================================================
    // Canceled
    // ========================================================================

    /// Applies a cancel ack from the market, or an unsolicited cancel.
    pub fn canceled(&mut self, order: &mut Order, input: &mut Canceled) -> Step<A, Canceled> {
        Self::begin(order, "canceled", &input.event);
        input.event.event_type = EventType::Canceled;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if !cxl_replace(order)
            && matches!(
                no,
                EventState::Held | EventState::Queued | EventState::Sent | EventState::Acknowledged
            )
        {
            if no != EventState::Acknowledged {
                debug!("canceled: acknowledging order first");
                Self::synthetic_ordered(order);
                return then("canceled_apply", Self::canceled_apply);
            }
            return self.canceled_apply(order, input);
        }
        if no.is_terminal() {
            debug!("canceled: late");
            if matches!(c, EventState::Deferred | EventState::Queued | EventState::Sent) {
                order.cancel_mut().event.event_state = EventState::Acknowledged;
            }
            input.event.unsolicited_set();
            return Step::Done;
        }
        if cxl_replace(order)
            && matches!(no, EventState::Sent | EventState::Acknowledged)
            && matches!(m, EventState::Held | EventState::Deferred)
        {
            if no == EventState::Sent {
                debug!("canceled: acknowledging order before replace");
                Self::synthetic_ordered(order);
                return then("mod_canceled_apply", Self::mod_canceled_apply);
            }
            return self.mod_canceled_apply(order, input);
        }
        input.event.unsolicited_set();
        self.abnormal(order, &input.event);
        Self::close(order);
        Self::emit_canceled(order, EventFlags::UNSOLICITED);
        Step::Done
    }

    fn canceled_apply(&mut self, order: &mut Order, input: &mut Canceled) -> Step<A, Canceled> {
        if matches!(modify_state(order), EventState::Deferred | EventState::Queued) {
            Self::synthetic_mod_reject(order, RejReason::OrderClosed);
        }
        if !matches!(
            cancel_state(order),
            EventState::Deferred | EventState::Queued | EventState::Sent
        ) {
            debug!("canceled: unsolicited");
            input.event.unsolicited_set();
            Self::close(order);
            Self::emit_canceled(order, input.event.event_flags.persistent());
            return Step::Done;
        }
        order.cancel_mut().legs.update(&input.legs, Merge::Ack);
        if order.new_order().legs.pending(&order.cancel().legs) {
            debug!("canceled: awaiting fills");
            let cancel = order.cancel_mut();
            cancel.event.event_state = EventState::PendingFill;
            cancel.ack_flags = input.event.event_flags.persistent();
            return Step::Done;
        }
        order.cancel_mut().event.event_state = EventState::Acknowledged;
        Self::close(order);
        Self::emit_canceled(order, input.event.event_flags.persistent());
        Step::Done
    }

    fn mod_canceled_apply(&mut self, order: &mut Order, input: &mut Canceled) -> Step<A, Canceled> {
        if matches!(
            cancel_state(order),
            EventState::Deferred | EventState::Queued | EventState::Sent
        ) {
            order.cancel_mut().legs.update(&input.legs, Merge::Ack);
            if order.new_order().legs.pending(&order.cancel().legs) {
                debug!("canceled: replace awaiting fills");
                let cancel = order.cancel_mut();
                cancel.event.event_state = EventState::PendingFill;
                cancel.ack_flags = input.event.event_flags.persistent();
                return Step::Done;
            }
            order.cancel_mut().event.event_state = EventState::Acknowledged;
        }
        Self::complete_replace(order);
        Step::Done
    }

    /// The cancel of a simulated modify is done: resubmit the order with
    /// the modified terms.
    pub(super) fn complete_replace(order: &mut Order) {
        let held = modify_state(order) == EventState::Held;
        set_order_flag(order, EventFlag::ModifyCxl, false);
        set_order_flag(order, EventFlag::ModifyNew, true);
        order.apply_modify();
        order.modify_mut().event.event_state = EventState::Unset;
        if held {
            order.new_order_mut().event.event_state = EventState::Held;
            return;
        }
        if order.new_order().filled() {
            debug!("replace: order now filled");
            Self::emit_modified(order, EventFlags::SYNTHETIC, false);
            set_order_flag(order, EventFlag::ModifyNew, false);
            order.new_order_mut().event.event_state = EventState::Acknowledged;
            return;
        }
        Self::queue_order(order);
        Self::emit_modified(order, EventFlags::SYNTHETIC_PENDING, false);
        info!(order = %order.new_order(), "Order replaced");
    }

    // ========================================================================
    // Cancel reject
    // ========================================================================

    /// Applies a cancel reject from the market.
    ///
    /// The reject of a cancel standing in for a simulated modify is absorbed.
    pub fn cxl_reject(&mut self, order: &mut Order, input: &mut CxlReject) -> Step<A, CxlReject> {
        Self::begin(order, "cxl_reject", &input.event);
        input.event.event_type = EventType::CxlReject;
        if matches!(
            cancel_state(order),
            EventState::Deferred | EventState::Queued | EventState::Sent
        ) {
            order.cancel_mut().event.event_state = EventState::Rejected;
            if cxl_replace(order) {
                debug!("cxl_reject: cancel/replace");
                Self::absorb_exec(order, Txn::CxlReject(*input));
            } else {
                info!(reason = %input.rej_reason, "Cancel rejected");
                Self::emit_exec(order, Txn::CxlReject(*input));
            }
            return Step::Done;
        }
        input.event.unsolicited_set();
        self.abnormal(order, &input.event);
        Self::absorb_exec(order, Txn::CxlReject(*input));
        Step::Done
    }
}
