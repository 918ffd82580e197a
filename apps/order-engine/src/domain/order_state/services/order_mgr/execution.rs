//! Fill and close transitions.

use tracing::{debug, info};

use super::{OrderMgr, Step, cancel_state, cxl_replace, modify_state, order_state, then};
use crate::application::ports::App;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{Closed, Fill, LegView, Merge, Txn};
use crate::domain::order_state::value_objects::fixed::{notional, rescale};
use crate::domain::order_state::value_objects::{EventFlag, EventFlags, EventState, EventType};

impl<A: App> OrderMgr<A> {
    /// Applies a fill. Fills are always applied and forwarded, whatever the
    /// order's state; an unacknowledged order is acknowledged first.
    pub fn fill(&mut self, order: &mut Order, input: &mut Fill) -> Step<A, Fill> {
        Self::begin(order, "fill", &input.event);
        input.event.event_type = EventType::Fill;
        let (no, m, c) = (order_state(order), modify_state(order), cancel_state(order));
        if matches!(no, EventState::Acknowledged | EventState::Closed) {
            return self.fill_apply(order, input);
        }
        if !cxl_replace(order) && matches!(no, EventState::Held | EventState::Queued | EventState::Sent) {
            debug!("fill: acknowledging order first");
            Self::apply_ordered(order, EventFlags::SYNTHETIC);
            Self::release_deferred(order);
            return then("fill_apply", Self::fill_apply);
        }
        if cxl_replace(order)
            && no == EventState::Sent
            && matches!(m, EventState::Held | EventState::Deferred)
            && (c.between(EventState::Deferred, EventState::PendingFill) || c == EventState::Rejected)
        {
            debug!("fill: acknowledging order during cancel/replace");
            Self::apply_ordered(order, EventFlags::SYNTHETIC);
            if matches!(c, EventState::Deferred | EventState::Rejected) {
                Self::queue_cancel(order);
            }
            return then("fill_apply", Self::fill_apply);
        }
        self.fill_apply(order, input)
    }

    fn fill_apply(&mut self, order: &mut Order, input: &mut Fill) -> Step<A, Fill> {
        Self::emit_exec(order, Txn::Fill(*input));
        let index = usize::from(input.event.event_leg);
        if index >= order.new_order().legs.len() || input.last_qty <= 0 {
            // forwarded, but not applied
            self.abnormal(order, &input.event);
            return Step::Done;
        }
        if modify_state(order) == EventState::Sent && Self::fill_crosses(order, index, input) {
            debug!("fill: crosses pending modify");
            let modify = order.modify_mut();
            modify.event.event_state = EventState::Acknowledged;
            modify.event.event_flags.insert(EventFlag::Synthetic);
            order.apply_modify();
            Self::emit_modified(order, EventFlags::SYNTHETIC, false);
            info!(state = %order.state_code(), "Order modified by fill");
        }
        Self::apply_fill(order, index, input);
        Self::release_pending(order);
        Step::Done
    }

    /// Returns true if `fill` is only possible under the pending modify's
    /// terms, i.e. the market has already applied the modify.
    fn fill_crosses(order: &Order, index: usize, fill: &Fill) -> bool {
        let (Some(leg), Some(proposed)) = (
            order.new_order().legs.get(index),
            order.modify().legs.get(index),
        ) else {
            return false;
        };
        if let (Some(ord_type), Some((px, px_ndp))) = (leg.ord_type, proposed.px()) {
            let new_px = rescale(px, px_ndp, leg.px_ndp);
            let fill_px = rescale(fill.last_px, fill.px_ndp, leg.px_ndp);
            let old_px = leg.px;
            if ord_type.is_limit() && new_px != old_px {
                let crossed = if matches!(leg.side, Some(side) if side.is_sell()) {
                    fill_px < old_px && fill_px >= new_px
                } else {
                    fill_px > old_px && fill_px <= new_px
                };
                if crossed {
                    return true;
                }
            }
        }
        if let Some(qty) = proposed.order_qty() {
            let new_qty = rescale(qty, proposed.qty_ndp(), leg.qty_ndp);
            let last_qty = rescale(fill.last_qty, fill.qty_ndp, leg.qty_ndp);
            if new_qty > leg.order_qty && leg.cum_qty.saturating_add(last_qty) > leg.order_qty {
                return true;
            }
        }
        false
    }

    fn apply_fill(order: &mut Order, index: usize, fill: &Fill) {
        let done = order_state(order).is_terminal();
        let Some(leg) = order.new_order_mut().legs.get_mut(index) else {
            return;
        };
        if leg.cum_qty == 0 && leg.order_qty == 0 {
            leg.qty_ndp = fill.qty_ndp;
        } else {
            leg.widen_qty_ndp(fill.qty_ndp);
        }
        if leg.px == 0 && leg.cum_value == 0 {
            leg.px_ndp = fill.px_ndp;
        } else {
            leg.widen_px_ndp(fill.px_ndp);
        }
        let qty = rescale(fill.last_qty, fill.qty_ndp, leg.qty_ndp);
        let px = rescale(fill.last_px, fill.px_ndp, leg.px_ndp);
        leg.cum_qty = leg.cum_qty.saturating_add(qty);
        leg.cum_value = leg.cum_value.saturating_add(notional(px, qty, leg.qty_ndp));
        if done {
            leg.leaves_qty = 0;
        } else {
            leg.update_leaves_qty();
        }
        debug!(leg = index, cum_qty = leg.cum_qty, leaves_qty = leg.leaves_qty, "Fill applied");
    }

    /// Releases modify and cancel acks whose fills have caught up.
    fn release_pending(order: &mut Order) {
        if modify_state(order) == EventState::PendingFill
            && !order.new_order().legs.pending(&order.modify().legs)
        {
            debug!("fill: releasing modify ack");
            order.modify_mut().event.event_state = EventState::Acknowledged;
            order.apply_modify();
            let flags = order.modify().ack_flags;
            Self::emit_modified(order, flags, false);
            info!(state = %order.state_code(), "Order modified");
        }
        if cancel_state(order) == EventState::PendingFill
            && !order.new_order().legs.pending(&order.cancel().legs)
        {
            debug!("fill: releasing cancel ack");
            order.cancel_mut().event.event_state = EventState::Acknowledged;
            if cxl_replace(order) {
                Self::complete_replace(order);
            } else {
                let flags = order.cancel().ack_flags;
                Self::close(order);
                Self::emit_canceled(order, flags);
            }
        }
    }

    // ========================================================================
    // Closed
    // ========================================================================

    /// Closes the order on the market's say-so (expiry, done for day).
    pub fn closed(&mut self, order: &mut Order, input: &mut Closed) -> Step<A, Closed> {
        Self::begin(order, "closed", &input.event);
        input.event.event_type = EventType::Closed;
        order.new_order_mut().legs.update(&input.legs, Merge::Request);
        Self::close(order);
        input.legs = order.new_order().legs.snapshot();
        Self::emit_exec(order, Txn::Closed(input.clone()));
        Step::Done
    }
}
