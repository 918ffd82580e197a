//! Modify transitions: native modify, modify simulated by cancel/replace,
//! held modify, and the market's answers.

use tracing::{debug, error, info};

use super::{
    OrderMgr, Step, cancel_state, cxl_replace, modify_new, modify_state, order_state,
    set_order_flag, then,
};
use crate::application::ports::App;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{Merge, ModReject, ModRejectCxl, Modified, Modify, Txn};
use crate::domain::order_state::value_objects::{
    EventFlag, EventFlags, EventState, EventType, RejReason,
};

impl<A: App> OrderMgr<A> {
    /// Checks whether a modify may be applied to `order`.
    ///
    /// Must return [`RejReason::Ok`] before [`modify`](Self::modify) or
    /// [`mod_simulated`](Self::mod_simulated) is called; otherwise the
    /// caller answers with [`mod_filtered`](Self::mod_filtered).
    #[must_use]
    pub fn filter_modify(&self, order: &Order) -> RejReason {
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
        if matches!(m, EventState::Deferred | EventState::Sent | EventState::PendingFill) {
            return RejReason::ModifyPending;
        }
        if no != EventState::Acknowledged && m == EventState::Queued {
            return RejReason::ModifyPending;
        }
        RejReason::Ok
    }

    /// Rejects a modify locally with the reason its filter returned.
    pub fn mod_filtered(
        &mut self,
        order: &mut Order,
        input: &mut Modify,
        reason: RejReason,
    ) -> Step<A, Modify> {
        Self::begin(order, "mod_filtered", &input.event);
        input.event.event_state = EventState::Rejected;
        Self::synthetic_reject(order, EventType::ModReject, reason);
        debug!(reason = %reason, "Modify filtered");
        Step::Done
    }

    fn install_modify(order: &mut Order, input: &Modify, event_type: EventType) {
        let mut modify = input.clone();
        modify.event.event_type = event_type;
        modify.event.event_flags.clear_transient();
        modify.ack_flags = EventFlags::EMPTY;
        *order.modify_mut() = modify;
    }

    /// Acks a modify-on-queue: Ordered for the first one, Modified after.
    fn ack_modify_on_queue(order: &mut Order, flags: EventFlags) {
        if modify_new(order) {
            Self::emit_modified(order, flags, false);
        } else {
            set_order_flag(order, EventFlag::ModifyNew, true);
            Self::emit_ordered(order, flags);
        }
    }

    fn modify_precondition_failed(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        let mut reason = self.filter_modify(order);
        if reason.is_ok() {
            reason = RejReason::Osm;
        }
        error!(reason = %reason, state = %order.state_code(), "Modify applied without a passing filter");
        input.event.event_state = EventState::Rejected;
        self.abnormal(order, &input.event);
        Self::synthetic_reject(order, EventType::ModReject, reason);
        Step::Done
    }

    // ========================================================================
    // Modify
    // ========================================================================

    /// Applies a client modify, sent natively to market.
    pub fn modify(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        Self::begin(order, "modify", &input.event);
        input.event.event_type = EventType::Modify;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if m.is_idle() && c.is_idle() {
            if matches!(no, EventState::Sent | EventState::Acknowledged) {
                debug!("modify: usual case");
                Self::install_modify(order, input, EventType::Modify);
                if no == EventState::Sent && !self.app.async_mod(order) {
                    order.modify_mut().event.event_state = EventState::Deferred;
                } else {
                    Self::queue_modify(order);
                }
                return Step::Done;
            }
            if matches!(no, EventState::Held | EventState::Queued) {
                debug!("modify: modify-on-queue");
                Self::ack_modify_on_queue(order, EventFlags::SYNTHETIC_PENDING);
                return then("modify_on_queue", Self::modify_on_queue);
            }
        }
        if no == EventState::Acknowledged
            && matches!(m, EventState::Held | EventState::Deferred | EventState::Queued)
        {
            debug!("modify: merging into unsent modify");
            Self::emit_modified(order, EventFlags::SYNTHETIC_PENDING, true);
            return then("modify_requeue", Self::modify_requeue);
        }
        self.modify_precondition_failed(order, input)
    }

    /// Merges a modify into the unsent new order and queues it again.
    fn modify_on_queue(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        order.new_order_mut().update_modify(input, Merge::Request);
        if order.new_order().filled() {
            debug!("modify-on-queue: order now filled");
            Self::emit_modified(order, EventFlags::SYNTHETIC, false);
            set_order_flag(order, EventFlag::ModifyNew, false);
            order.new_order_mut().event.event_state = EventState::Acknowledged;
            return Step::Done;
        }
        Self::queue_order(order);
        Step::Done
    }

    fn modify_requeue(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        let modify = order.modify_mut();
        modify.update_modify(input, Merge::Request);
        modify.event.event_state = EventState::Deferred;
        if cxl_replace(order) {
            if matches!(cancel_state(order), EventState::Sent | EventState::PendingFill) {
                debug!("modify: cancel/replace already sent");
                return Step::Done;
            }
            order.cancel_mut().event.event_state = EventState::Unset;
            order.modify_mut().event.event_type = EventType::Modify;
            set_order_flag(order, EventFlag::ModifyCxl, false);
        }
        Self::queue_modify(order);
        Step::Done
    }

    // ========================================================================
    // Simulated modify
    // ========================================================================

    /// Applies a client modify on a venue without native modify: the order
    /// is canceled, then resubmitted with the new terms.
    pub fn mod_simulated(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        Self::begin(order, "mod_simulated", &input.event);
        input.event.event_type = EventType::ModSimulated;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if m.is_idle() && c.is_idle() {
            if matches!(no, EventState::Sent | EventState::Acknowledged) {
                debug!("mod_simulated: usual case");
                set_order_flag(order, EventFlag::ModifyCxl, true);
                Self::install_modify(order, input, EventType::ModSimulated);
                order.modify_mut().event.event_state = EventState::Deferred;
                self.synthetic_cancel(order);
                self.send_cancel(order);
                return Step::Done;
            }
            if matches!(no, EventState::Held | EventState::Queued) {
                debug!("mod_simulated: modify-on-queue");
                Self::ack_modify_on_queue(order, EventFlags::SYNTHETIC);
                return then("modify_on_queue", Self::modify_on_queue);
            }
        }
        if no == EventState::Acknowledged
            && matches!(m, EventState::Held | EventState::Deferred | EventState::Queued)
        {
            debug!("mod_simulated: merging into unsent modify");
            Self::emit_modified(order, EventFlags::SYNTHETIC, true);
            return then("mod_simulated_requeue", Self::mod_simulated_requeue);
        }
        self.modify_precondition_failed(order, input)
    }

    fn mod_simulated_requeue(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        let modify = order.modify_mut();
        modify.update_modify(input, Merge::Request);
        modify.event.event_type = EventType::ModSimulated;
        modify.event.event_state = EventState::Deferred;
        if cxl_replace(order) {
            if matches!(
                cancel_state(order),
                EventState::Queued | EventState::Sent | EventState::PendingFill
            ) {
                debug!("mod_simulated: cancel already queued");
                return Step::Done;
            }
        } else {
            set_order_flag(order, EventFlag::ModifyCxl, true);
        }
        self.synthetic_cancel(order);
        Self::queue_cancel(order);
        Step::Done
    }

    // ========================================================================
    // Held modify
    // ========================================================================

    /// Applies a client modify that is held pending
    /// [`release`](Self::release) or [`deny`](Self::deny).
    ///
    /// A working order is pulled from the market while the modify is held,
    /// as for a simulated modify. On release, a modify of kind
    /// [`EventType::ModSimulated`] completes as a cancel/replace; any other
    /// goes to market natively.
    pub fn mod_held(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        Self::begin(order, "mod_held", &input.event);
        if input.event.event_type != EventType::ModSimulated {
            input.event.event_type = EventType::Modify;
        }
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if m.is_idle() && c.is_idle() {
            if matches!(no, EventState::Sent | EventState::Acknowledged) {
                debug!("mod_held: usual case");
                set_order_flag(order, EventFlag::ModifyCxl, true);
                self.synthetic_cancel(order);
                self.send_cancel(order);
                Self::install_modify(order, input, input.event.event_type);
                order.modify_mut().event.event_state = EventState::Held;
                info!(state = %order.state_code(), "Modify held");
                return Step::Done;
            }
            if matches!(no, EventState::Held | EventState::Queued) {
                debug!("mod_held: modify-on-queue");
                Self::ack_modify_on_queue(order, EventFlags::SYNTHETIC);
                return then("mod_held_on_queue", Self::mod_held_on_queue);
            }
        }
        if no == EventState::Acknowledged
            && matches!(m, EventState::Held | EventState::Deferred | EventState::Queued)
        {
            debug!("mod_held: merging into unsent modify");
            Self::emit_modified(order, EventFlags::SYNTHETIC, true);
            return then("mod_held_requeue", Self::mod_held_requeue);
        }
        self.modify_precondition_failed(order, input)
    }

    /// Merges a held modify into the unsent new order, which is held again.
    fn mod_held_on_queue(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        let new_order = order.new_order_mut();
        new_order.update_modify(input, Merge::Request);
        new_order.event.event_state = EventState::Held;
        info!(order = %order.new_order(), "New order held with modify");
        Step::Done
    }

    fn mod_held_requeue(&mut self, order: &mut Order, input: &mut Modify) -> Step<A, Modify> {
        let modify = order.modify_mut();
        modify.update_modify(input, Merge::Request);
        modify.event.event_type = input.event.event_type;
        modify.event.event_state = EventState::Held;
        if cxl_replace(order) {
            if matches!(
                cancel_state(order),
                EventState::Queued | EventState::Sent | EventState::PendingFill
            ) {
                debug!("mod_held: cancel already queued");
                return Step::Done;
            }
        } else {
            set_order_flag(order, EventFlag::ModifyCxl, true);
        }
        self.synthetic_cancel(order);
        Self::queue_cancel(order);
        Step::Done
    }

    // ========================================================================
    // Modify filtered with cancel
    // ========================================================================

    /// Rejects a modify locally with `reason` and cancels the order.
    ///
    /// Any unsent modify that preceded this one is rejected in the second
    /// stage. While a modify is at market the order cannot be canceled
    /// (see [`filter_cancel`](Self::filter_cancel)) and only the modify is
    /// rejected.
    pub fn mod_filtered_cxl(
        &mut self,
        order: &mut Order,
        input: &mut Modify,
        reason: RejReason,
    ) -> Step<A, Modify> {
        Self::begin(order, "mod_filtered_cxl", &input.event);
        input.event.event_state = EventState::Rejected;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if no.is_terminal() || c.between(EventState::Deferred, EventState::PendingFill) {
            debug!("mod_filtered_cxl: closed or cancel in progress");
            set_order_flag(order, EventFlag::ModifyCxl, false);
            Self::synthetic_reject(order, EventType::ModReject, reason);
            return Self::then_reject_preceding(m);
        }
        if matches!(m, EventState::Sent | EventState::PendingFill) {
            debug!("mod_filtered_cxl: modify at market");
            Self::synthetic_reject(order, EventType::ModReject, reason);
            return Step::Done;
        }
        if matches!(no, EventState::Held | EventState::Queued) {
            debug!("mod_filtered_cxl: cancel-on-queue");
            Self::close(order);
            Self::emit_canceled(order, EventFlags::SYNTHETIC);
            Self::synthetic_reject(order, EventType::ModReject, reason);
            return Step::Done;
        }
        set_order_flag(order, EventFlag::ModifyCxl, false);
        self.synthetic_cancel(order);
        self.send_cancel(order);
        Self::synthetic_reject(order, EventType::ModReject, reason);
        info!(reason = %reason, state = %order.state_code(), "Modify filtered, order canceled");
        Self::then_reject_preceding(m)
    }

    /// A modify still unsent when its order is canceled is rejected after
    /// the reject of the latest one.
    fn then_reject_preceding(m: EventState) -> Step<A, Modify> {
        if matches!(m, EventState::Held | EventState::Deferred | EventState::Queued) {
            return then("reject_preceding_modify", Self::reject_preceding_modify);
        }
        Step::Done
    }

    fn reject_preceding_modify(&mut self, order: &mut Order, _input: &mut Modify) -> Step<A, Modify> {
        debug!("mod_filtered_cxl: rejecting preceding modify");
        Self::synthetic_mod_reject(order, RejReason::OrderClosed);
        Step::Done
    }

    // ========================================================================
    // Modified
    // ========================================================================

    /// Applies a modify ack from the market, or an unsolicited restatement.
    pub fn modified(&mut self, order: &mut Order, input: &mut Modified) -> Step<A, Modified> {
        Self::begin(order, "modified", &input.event);
        input.event.event_type = EventType::Modified;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if matches!(no, EventState::Sent | EventState::Acknowledged)
            && matches!(m, EventState::Deferred | EventState::Queued | EventState::Sent)
        {
            if no == EventState::Sent {
                debug!("modified: acknowledging order first");
                Self::synthetic_ordered(order);
                return then("modified_apply", Self::modified_apply);
            }
            return self.modified_apply(order, input);
        }
        if m == EventState::Acknowledged && order.modify().event.event_flags.synthetic() {
            debug!("modified: already applied by fill");
            order.modify_mut().event.event_flags.remove(EventFlag::Synthetic);
            return Step::Done;
        }
        input.event.unsolicited_set();
        if matches!(no, EventState::Acknowledged | EventState::Closed) {
            debug!("modified: restated");
            Self::apply_restated(order, input);
            return Step::Done;
        }
        if !cxl_replace(order) && matches!(no, EventState::Held | EventState::Queued | EventState::Sent) {
            debug!("modified: restated before order ack");
            Self::synthetic_ordered(order);
            return then("restated_release", Self::restated_release);
        }
        if cxl_replace(order)
            && no == EventState::Sent
            && matches!(m, EventState::Held | EventState::Deferred)
            && (c.between(EventState::Deferred, EventState::PendingFill) || c == EventState::Rejected)
        {
            debug!("modified: restated during cancel/replace");
            Self::synthetic_ordered(order);
            return then("restated_release_cxl", Self::restated_release_cxl);
        }
        self.abnormal(order, &input.event);
        Self::apply_restated(order, input);
        Step::Done
    }

    fn modified_apply(&mut self, order: &mut Order, input: &mut Modified) -> Step<A, Modified> {
        order.modify_mut().update_modify(input, Merge::Ack);
        if order.new_order().legs.pending(&order.modify().legs) {
            debug!("modified: awaiting fills");
            let modify = order.modify_mut();
            modify.event.event_state = EventState::PendingFill;
            modify.ack_flags = input.event.event_flags.persistent();
        } else {
            order.modify_mut().event.event_state = EventState::Acknowledged;
            order.apply_modify();
            Self::emit_modified(order, input.event.event_flags.persistent(), false);
            info!(state = %order.state_code(), "Order modified");
        }
        if cancel_state(order) == EventState::Deferred {
            Self::queue_cancel(order);
        }
        Step::Done
    }

    /// Applies a market restatement to the order's terms.
    fn apply_restated(order: &mut Order, input: &Modified) {
        order.new_order_mut().update_modify(input, Merge::Request);
        Self::emit_modified(order, EventFlags::UNSOLICITED, false);
    }

    fn restated_release(&mut self, order: &mut Order, input: &mut Modified) -> Step<A, Modified> {
        Self::apply_restated(order, input);
        Self::release_deferred(order);
        Step::Done
    }

    fn restated_release_cxl(&mut self, order: &mut Order, input: &mut Modified) -> Step<A, Modified> {
        Self::apply_restated(order, input);
        if matches!(cancel_state(order), EventState::Deferred | EventState::Rejected) {
            Self::queue_cancel(order);
        }
        Step::Done
    }

    // ========================================================================
    // Modify rejects
    // ========================================================================

    /// Applies a modify reject from the market; the order stays open.
    pub fn mod_reject(&mut self, order: &mut Order, input: &mut ModReject) -> Step<A, ModReject> {
        Self::begin(order, "mod_reject", &input.event);
        input.event.event_type = EventType::ModReject;
        if self.mod_reject_solicited(order, input) {
            Self::emit_exec(order, Txn::ModReject(*input));
            if cancel_state(order) == EventState::Deferred {
                Self::queue_cancel(order);
            }
        }
        Step::Done
    }

    /// Applies a modify reject from the market that requires the original
    /// order to be canceled.
    pub fn mod_reject_cxl(
        &mut self,
        order: &mut Order,
        input: &mut ModRejectCxl,
    ) -> Step<A, ModRejectCxl> {
        Self::begin(order, "mod_reject_cxl", &input.event);
        input.event.event_type = EventType::ModRejectCxl;
        if !self.mod_reject_solicited(order, input) {
            return Step::Done;
        }
        set_order_flag(order, EventFlag::ModifyCxl, false);
        Self::emit_exec(order, Txn::ModRejectCxl(*input));
        if order.new_order().filled() {
            debug!("mod_reject_cxl: order filled, no cancel");
            return Step::Done;
        }
        let c = cancel_state(order);
        if matches!(c, EventState::Queued | EventState::Sent | EventState::PendingFill) {
            return Step::Done;
        }
        if c != EventState::Deferred {
            self.synthetic_cancel(order);
        }
        self.send_cancel(order);
        Step::Done
    }

    /// Rejects the modify slot. Returns true if the reject was solicited
    /// and is to be forwarded to the client.
    fn mod_reject_solicited(&mut self, order: &mut Order, input: &mut ModReject) -> bool {
        let (no, m) = (order_state(order), modify_state(order));
        let in_flight = m.between(EventState::Deferred, EventState::PendingFill);
        order.modify_mut().event.event_state = EventState::Rejected;
        if matches!(no, EventState::Sent | EventState::Acknowledged) && in_flight {
            info!(reason = %input.rej_reason, "Modify rejected");
            return true;
        }
        input.event.unsolicited_set();
        if !(no.is_terminal() && matches!(m, EventState::Sent | EventState::PendingFill)) {
            self.abnormal(order, &input.event);
        }
        Self::absorb_exec(order, Txn::reject_of(*input));
        false
    }
}
