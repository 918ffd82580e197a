//! Order Manager
//!
//! The order state-transition engine. One entry point per inbound or
//! outbound event kind; each takes the [`Order`] and the event record and
//! leaves its output in the order's slots:
//!
//! - requests to market: the order, modify or cancel slot in state
//!   `Queued` with `Tx` set
//! - client-visible executions: the exec slot, `Sent` with `Tx` set
//! - client-visible acks: the ack slot, `Sent` with `Tx` set
//!
//! [`outbox`] collects whatever the last stage produced.
//!
//! # Two-phase protocol
//!
//! Some transitions emit an ack that must reach the client before the rest
//! of the transition is applied. Those entry points return
//! [`Step::Continue`]; the caller transmits the outbox, then calls
//! [`OrderMgr::resume`] with the same order and input record. A
//! continuation must run before any other event for the same order.
//! [`OrderMgr::drive`] runs the whole sequence.
//!
//! # Preconditions
//!
//! [`OrderMgr::modify`], [`OrderMgr::mod_simulated`],
//! [`OrderMgr::mod_held`] and [`OrderMgr::cancel`] require [`OrderMgr::filter_modify`] /
//! [`OrderMgr::filter_cancel`] to have returned `Ok` immediately before.
//! A violated precondition is reported as abnormal and answered with a
//! local reject; order slots are left untouched.

mod cancel;
mod execution;
mod modify;
mod new_order;

use std::fmt;

use tracing::{debug, info, warn};

use crate::application::ports::App;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{
    AnyReject, Cancel, CancelLeg, Event, Legs, Merge, Modify, Ordered, Txn,
};
use crate::domain::order_state::value_objects::{
    EventFlag, EventFlags, EventState, EventType, RejReason,
};

// ============================================
// Step protocol
// ============================================

type Stage<A, I> = fn(&mut OrderMgr<A>, &mut Order, &mut I) -> Step<A, I>;

/// Outcome of an entry point or continuation.
#[must_use]
pub enum Step<A, I> {
    /// Transition complete.
    Done,
    /// Transmit the outbox, then resume with this continuation.
    Continue(Continuation<A, I>),
}

impl<A, I> Step<A, I> {
    /// Returns true if the transition is complete.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl<A, I> fmt::Debug for Step<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "Done"),
            Self::Continue(k) => f.debug_tuple("Continue").field(k).finish(),
        }
    }
}

/// Second stage of a two-phase transition.
pub struct Continuation<A, I> {
    name: &'static str,
    stage: Stage<A, I>,
}

impl<A, I> Continuation<A, I> {
    /// Name of the stage, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<A, I> Clone for Continuation<A, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, I> Copy for Continuation<A, I> {}

impl<A, I> fmt::Debug for Continuation<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation").field("name", &self.name).finish()
    }
}

const fn then<A, I>(name: &'static str, stage: Stage<A, I>) -> Step<A, I> {
    Step::Continue(Continuation { name, stage })
}

// ============================================
// Outbound
// ============================================

/// Records produced by the last stage, in transmission order: order,
/// modify and cancel requests, then the execution, then the ack.
#[must_use]
pub fn outbox(order: &Order) -> Vec<Txn> {
    let mut out = Vec::new();
    if order.new_order().event.is_tx() {
        out.push(Txn::NewOrder(order.new_order().clone()));
    }
    if order.modify().event.is_tx() {
        out.push(modify_txn(order.modify().clone()));
    }
    if order.cancel().event.is_tx() {
        out.push(Txn::Cancel(order.cancel().clone()));
    }
    for slot in [order.exec(), order.ack()].into_iter().flatten() {
        if slot.event().is_tx() {
            out.push(slot.clone());
        }
    }
    out
}

/// The ack to send to the client, if one is ready.
#[must_use]
pub fn ack(order: &Order) -> Option<&Txn> {
    order
        .ack()
        .filter(|ack| ack.event().event_state == EventState::Sent)
}

fn modify_txn(modify: Modify) -> Txn {
    match modify.event.event_type {
        EventType::ModSimulated => Txn::ModSimulated(modify),
        EventType::Modified => Txn::Modified(modify),
        _ => Txn::Modify(modify),
    }
}

// ============================================
// Slot accessors
// ============================================

const fn order_state(order: &Order) -> EventState {
    order.new_order().event.event_state
}

const fn modify_state(order: &Order) -> EventState {
    order.modify().event.event_state
}

const fn cancel_state(order: &Order) -> EventState {
    order.cancel().event.event_state
}

/// A cancel is standing in for a simulated modify.
const fn cxl_replace(order: &Order) -> bool {
    order.new_order().event.event_flags.modify_cxl()
}

/// The new order carries a modify-on-queue.
const fn modify_new(order: &Order) -> bool {
    order.new_order().event.event_flags.modify_new()
}

fn set_order_flag(order: &mut Order, flag: EventFlag, on: bool) {
    let flags = &mut order.new_order_mut().event.event_flags;
    if on {
        flags.insert(flag);
    } else {
        flags.remove(flag);
    }
}

// ============================================
// Order manager
// ============================================

/// Order state-transition engine.
///
/// Holds the [`App`] policy; orders are passed in per call and never
/// retained.
pub struct OrderMgr<A> {
    app: A,
}

impl<A: fmt::Debug> fmt::Debug for OrderMgr<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderMgr").field("app", &self.app).finish()
    }
}

impl<A: App> OrderMgr<A> {
    /// Creates an order manager consulting `app`.
    #[must_use]
    pub const fn new(app: A) -> Self {
        Self { app }
    }

    /// The policy collaborator.
    #[must_use]
    pub const fn app(&self) -> &A {
        &self.app
    }

    /// Mutable access to the policy collaborator.
    pub const fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    /// Consumes the manager, returning the policy collaborator.
    pub fn into_app(self) -> A {
        self.app
    }

    /// Runs the second stage of a two-phase transition.
    ///
    /// `order` and `input` must be the ones passed to the entry point that
    /// returned `k`, and the outbox must have been transmitted.
    pub fn resume<I>(&mut self, k: Continuation<A, I>, order: &mut Order, input: &mut I) -> Step<A, I> {
        order.clear_transient();
        debug!(stage = k.name, state = %order.state_code(), "Resuming transition");
        (k.stage)(self, order, input)
    }

    /// Runs `step` and every continuation after it, collecting the outbox
    /// of each stage.
    pub fn drive<I>(&mut self, order: &mut Order, input: &mut I, mut step: Step<A, I>) -> Vec<Txn> {
        let mut out = outbox(order);
        while let Step::Continue(k) = step {
            step = self.resume(k, order, input);
            out.extend(outbox(order));
        }
        out
    }

    // ========================================================================
    // Transport confirmations
    // ========================================================================

    /// The queued new order is being transmitted.
    ///
    /// Returns false if it is no longer queued and transmission must be
    /// aborted.
    pub fn order_sent(&mut self, order: &mut Order) -> bool {
        Self::sent(&mut order.new_order_mut().event)
    }

    /// The queued modify is being transmitted.
    ///
    /// Returns false if it is no longer queued and transmission must be
    /// aborted.
    pub fn modify_sent(&mut self, order: &mut Order) -> bool {
        Self::sent(&mut order.modify_mut().event)
    }

    /// The queued cancel is being transmitted.
    ///
    /// Returns false if it is no longer queued and transmission must be
    /// aborted.
    pub fn cancel_sent(&mut self, order: &mut Order) -> bool {
        Self::sent(&mut order.cancel_mut().event)
    }

    fn sent(event: &mut Event) -> bool {
        event.event_flags.remove(EventFlag::Tx);
        if event.event_state != EventState::Queued {
            debug!(event = %event, "Transmission aborted");
            return false;
        }
        event.event_state = EventState::Sent;
        true
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    fn begin(order: &mut Order, op: &'static str, event: &Event) {
        order.clear_transient();
        debug!(op, state = %order.state_code(), event = %event, "Applying event");
    }

    fn abnormal(&mut self, order: &Order, event: &Event) {
        warn!(state = %order.state_code(), event = %event, "Abnormal event");
        self.app.abnormal(order, event);
    }

    fn queue(event: &mut Event) {
        event.event_state = EventState::Queued;
        event.event_flags.insert(EventFlag::Tx);
    }

    fn queue_order(order: &mut Order) {
        Self::queue(&mut order.new_order_mut().event);
    }

    fn queue_modify(order: &mut Order) {
        Self::queue(&mut order.modify_mut().event);
    }

    fn queue_cancel(order: &mut Order) {
        Self::queue(&mut order.cancel_mut().event);
    }

    /// Queues the cancel, or defers it until the new order is acknowledged.
    fn send_cancel(&self, order: &mut Order) {
        if order_state(order) == EventState::Sent && !self.app.async_cxl(order) {
            order.cancel_mut().event.event_state = EventState::Deferred;
        } else {
            Self::queue_cancel(order);
        }
    }

    /// Queues a cancel or modify deferred on the new order's ack.
    fn release_deferred(order: &mut Order) {
        if cancel_state(order) == EventState::Deferred {
            Self::queue_cancel(order);
        } else if modify_state(order) == EventState::Deferred {
            Self::queue_modify(order);
        }
    }

    fn emit_exec(order: &mut Order, mut exec: Txn) {
        let event = exec.event_mut();
        event.event_state = EventState::Sent;
        event.event_flags.insert(EventFlag::Tx);
        order.set_exec(exec);
    }

    /// Records an execution that carries no new information for the client.
    fn absorb_exec(order: &mut Order, mut exec: Txn) {
        let event = exec.event_mut();
        event.event_state = EventState::Received;
        event.event_flags.remove(EventFlag::Tx);
        order.set_exec(exec);
    }

    fn emit_ack(order: &mut Order, mut ack: Txn) {
        ack.normalize();
        let event = ack.event_mut();
        event.event_state = EventState::Sent;
        event.event_flags.insert(EventFlag::Tx);
        order.set_ack(ack);
    }

    fn emit_ordered(order: &mut Order, flags: EventFlags) {
        Self::emit_ack(order, Txn::Ordered(Ordered::init(flags, 0)));
    }

    /// Emits a Modified carrying the order's terms, optionally overlaid with
    /// the pending modify.
    fn emit_modified(order: &mut Order, flags: EventFlags, include_modify: bool) {
        let new_order = order.new_order();
        let mut modified = Modify::init(EventType::Modified, flags, 0);
        modified.legs = new_order.legs.snapshot();
        modified.time_in_force = Some(new_order.time_in_force);
        if include_modify {
            modified.update_modify(order.modify(), Merge::Request);
        }
        Self::emit_ack(order, Txn::Modified(modified));
    }

    fn emit_canceled(order: &mut Order, flags: EventFlags) {
        let mut canceled = Cancel::init(EventType::Canceled, flags, 0);
        canceled.legs = order.new_order().legs.snapshot();
        Self::emit_ack(order, Txn::Canceled(canceled));
    }

    /// New order acknowledged. Emits Ordered, or Modified if the order
    /// carries a modify-on-queue.
    fn apply_ordered(order: &mut Order, flags: EventFlags) {
        order.new_order_mut().event.event_state = EventState::Acknowledged;
        if modify_new(order) {
            set_order_flag(order, EventFlag::ModifyNew, false);
            Self::emit_modified(order, EventFlags::SYNTHETIC, false);
        } else {
            Self::emit_ordered(order, flags);
        }
        info!(state = %order.state_code(), "Order acknowledged");
    }

    /// Acknowledges the new order on behalf of the market.
    fn synthetic_ordered(order: &mut Order) {
        order.new_order_mut().event.event_state = EventState::Acknowledged;
        set_order_flag(order, EventFlag::ModifyNew, false);
        Self::emit_ordered(order, EventFlags::SYNTHETIC);
    }

    fn synthetic_reject(order: &mut Order, event_type: EventType, reason: RejReason) {
        let reject = AnyReject::init(event_type, EventFlags::SYNTHETIC, reason);
        Self::emit_exec(order, Txn::reject_of(reject));
    }

    /// Rejects the pending modify locally.
    fn synthetic_mod_reject(order: &mut Order, reason: RejReason) {
        order.modify_mut().event.event_state = EventState::Rejected;
        Self::synthetic_reject(order, EventType::ModReject, reason);
    }

    /// Rejects the pending cancel locally.
    fn synthetic_cxl_reject(order: &mut Order, reason: RejReason) {
        order.cancel_mut().event.event_state = EventState::Rejected;
        Self::synthetic_reject(order, EventType::CxlReject, reason);
    }

    /// Installs a synthetic cancel of the order's current legs.
    fn synthetic_cancel(&mut self, order: &mut Order) {
        let mut cancel = Cancel::init(EventType::Cancel, EventFlags::SYNTHETIC, 0);
        self.app.syn_cancel(order, &mut cancel);
        cancel.legs = cancel_legs(order);
        *order.cancel_mut() = cancel;
    }

    /// Closes the order (no further fills expected).
    fn close(order: &mut Order) {
        let new_order = order.new_order_mut();
        new_order.event.event_state = EventState::Closed;
        new_order.zero_leaves();
        set_order_flag(order, EventFlag::ModifyNew, false);
        info!(state = %order.state_code(), "Order closed");
    }
}

fn cancel_legs(order: &Order) -> Legs<CancelLeg> {
    order.new_order().legs.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_state::events::{Canceled, Modify, ModifyLeg, NewOrder, OrderLeg};
    use crate::domain::order_state::value_objects::{OrdType, Side, TimeInForce};
    use test_case::test_case;

    #[derive(Debug, Default)]
    struct TestApp {
        abnormal: u32,
        async_mod: bool,
        async_cxl: bool,
    }

    impl App for TestApp {
        fn abnormal(&mut self, _order: &Order, _event: &Event) {
            self.abnormal += 1;
        }

        fn async_mod(&self, _order: &Order) -> bool {
            self.async_mod
        }

        fn async_cxl(&self, _order: &Order) -> bool {
            self.async_cxl
        }
    }

    fn buy_100() -> NewOrder {
        NewOrder::with_legs(
            Legs::single(OrderLeg::new(Side::Buy, OrdType::Limit, 100, 0, 100, 0)),
            TimeInForce::Normal,
        )
    }

    fn new_order(mgr: &mut OrderMgr<TestApp>, order: &mut Order) {
        let mut input = buy_100();
        let step = mgr.new_order(order, &mut input);
        assert!(step.is_done());
    }

    fn kinds(out: &[Txn]) -> Vec<EventType> {
        out.iter().map(Txn::event_type).collect()
    }

    #[test]
    fn new_order_is_queued_for_transmission() {
        let mut mgr = OrderMgr::new(TestApp::default());
        let mut order = Order::new();
        new_order(&mut mgr, &mut order);

        assert_eq!(order.state_code(), "Q/U/U");
        assert_eq!(kinds(&outbox(&order)), vec![EventType::NewOrder]);
        assert!(ack(&order).is_none());
    }

    #[test]
    fn order_sent_only_from_queued() {
        let mut mgr = OrderMgr::new(TestApp::default());
        let mut order = Order::new();
        new_order(&mut mgr, &mut order);

        assert!(mgr.order_sent(&mut order));
        assert_eq!(order_state(&order), EventState::Sent);
        assert!(outbox(&order).is_empty());
        assert!(!mgr.order_sent(&mut order));
        assert_eq!(order_state(&order), EventState::Sent);
    }

    #[test]
    fn outbox_puts_requests_before_acks() {
        let mut mgr = OrderMgr::new(TestApp::default());
        let mut order = Order::new();
        new_order(&mut mgr, &mut order);
        assert!(mgr.order_sent(&mut order));

        let mut cancel = Cancel::init(EventType::Cancel, EventFlags::EMPTY, 0);
        assert!(mgr.filter_cancel(&order).is_ok());
        assert!(mgr.cancel(&mut order, &mut cancel).is_done());
        assert_eq!(cancel_state(&order), EventState::Deferred);
        assert!(outbox(&order).is_empty());

        let mut ordered = Ordered::init(EventFlags::EMPTY, 0);
        let step = mgr.ordered(&mut order, &mut ordered);
        let out = mgr.drive(&mut order, &mut ordered, step);
        assert_eq!(kinds(&out), vec![EventType::Cancel, EventType::Ordered]);
        assert_eq!(ack(&order).map(Txn::event_type), Some(EventType::Ordered));
    }

    #[test]
    fn continuation_runs_after_ack_is_transmitted() {
        let mut mgr = OrderMgr::new(TestApp::default());
        let mut order = Order::new();
        new_order(&mut mgr, &mut order);

        let mut modify = Modify::init(EventType::Modify, EventFlags::EMPTY, 0);
        modify.legs = Legs::single(ModifyLeg {
            px: 105,
            ..ModifyLeg::default()
        });
        assert!(mgr.filter_modify(&order).is_ok());
        let Step::Continue(k) = mgr.modify(&mut order, &mut modify) else {
            panic!("modify-on-queue should be two-phase");
        };
        assert_eq!(k.name(), "modify_on_queue");
        let first = outbox(&order);
        assert_eq!(kinds(&first), vec![EventType::Ordered]);
        assert!(first[0].event().event_flags.pending());

        assert!(mgr.resume(k, &mut order, &mut modify).is_done());
        let second = outbox(&order);
        assert_eq!(kinds(&second), vec![EventType::NewOrder]);
        assert_eq!(order.new_order().legs.get(0).map(|l| l.px), Some(105));
        assert!(ack(&order).is_some_and(|a| !a.event().is_tx()));
    }

    #[test]
    fn abnormal_is_reported_to_app() {
        let mut mgr = OrderMgr::new(TestApp::default());
        let mut order = Order::new();
        new_order(&mut mgr, &mut order);

        let mut canceled = Canceled::init(EventType::Canceled, EventFlags::EMPTY, 0);
        let step = mgr.canceled(&mut order, &mut canceled);
        mgr.drive(&mut order, &mut canceled, step);

        assert_eq!(mgr.app().abnormal, 0);
        assert_eq!(order_state(&order), EventState::Closed);
        assert!(canceled.event.event_flags.unsolicited());

        assert!(mgr.release(&mut order, &mut ()).is_done());
        assert_eq!(mgr.into_app().abnormal, 1);
    }

    #[test]
    fn async_cxl_queues_cancel_before_order_ack() {
        let mut mgr = OrderMgr::new(TestApp {
            async_cxl: true,
            ..TestApp::default()
        });
        let mut order = Order::new();
        new_order(&mut mgr, &mut order);
        assert!(mgr.order_sent(&mut order));

        let mut cancel = Cancel::init(EventType::Cancel, EventFlags::EMPTY, 0);
        assert!(mgr.cancel(&mut order, &mut cancel).is_done());
        assert_eq!(cancel_state(&order), EventState::Queued);
        assert_eq!(kinds(&outbox(&order)), vec![EventType::Cancel]);
    }

    fn order_in(no: EventState, m: EventState, c: EventState, cxl_replace: bool) -> Order {
        let mut order = Order::new();
        order.new_order_mut().event.event_state = no;
        order.modify_mut().event.event_state = m;
        order.cancel_mut().event.event_state = c;
        set_order_flag(&mut order, EventFlag::ModifyCxl, cxl_replace);
        order
    }

    #[test_case(EventState::Acknowledged, EventState::Unset, EventState::Unset, false, RejReason::Ok)]
    #[test_case(EventState::Closed, EventState::Unset, EventState::Unset, false, RejReason::OrderClosed)]
    #[test_case(EventState::Rejected, EventState::Unset, EventState::Unset, false, RejReason::OrderClosed)]
    #[test_case(EventState::Acknowledged, EventState::Unset, EventState::Sent, false, RejReason::CancelPending)]
    #[test_case(EventState::Acknowledged, EventState::Deferred, EventState::Queued, true, RejReason::ModifyPending)]
    #[test_case(EventState::Acknowledged, EventState::Sent, EventState::Unset, false, RejReason::ModifyPending)]
    #[test_case(EventState::Acknowledged, EventState::Queued, EventState::Unset, false, RejReason::Ok)]
    #[test_case(EventState::Queued, EventState::Queued, EventState::Unset, false, RejReason::ModifyPending)]
    #[test_case(EventState::Queued, EventState::Unset, EventState::Unset, false, RejReason::Ok)]
    fn filter_modify_table(no: EventState, m: EventState, c: EventState, cxl: bool, expected: RejReason) {
        let mgr = OrderMgr::new(TestApp::default());
        assert_eq!(mgr.filter_modify(&order_in(no, m, c, cxl)), expected);
    }

    #[test_case(EventState::Acknowledged, EventState::Unset, EventState::Unset, false, RejReason::Ok)]
    #[test_case(EventState::Closed, EventState::Unset, EventState::Unset, false, RejReason::OrderClosed)]
    #[test_case(EventState::Acknowledged, EventState::Unset, EventState::PendingFill, false, RejReason::CancelPending)]
    #[test_case(EventState::Acknowledged, EventState::Deferred, EventState::Sent, true, RejReason::ModifyPending)]
    #[test_case(EventState::Acknowledged, EventState::PendingFill, EventState::Unset, false, RejReason::ModifyPending)]
    #[test_case(EventState::Acknowledged, EventState::Queued, EventState::Unset, false, RejReason::Ok)]
    #[test_case(EventState::Held, EventState::Unset, EventState::Unset, false, RejReason::Ok)]
    fn filter_cancel_table(no: EventState, m: EventState, c: EventState, cxl: bool, expected: RejReason) {
        let mgr = OrderMgr::new(TestApp::default());
        assert_eq!(mgr.filter_cancel(&order_in(no, m, c, cxl)), expected);
    }
}
