//! App Port (Driven Port)
//!
//! Session policy consulted by the order manager: reporting of
//! out-of-sequence input and whether requests may be pipelined.

use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{Cancel, Event};

/// Policy collaborator of [`OrderMgr`](crate::domain::order_state::services::OrderMgr).
///
/// Implemented by the owner of session state. The order manager holds one
/// instance and never calls it re-entrantly.
pub trait App {
    /// Reports an event that is out of sequence for `order`.
    ///
    /// The event is still applied; this is a notification only.
    fn abnormal(&mut self, order: &Order, event: &Event);

    /// Returns true if a modify may be sent to market before the new order
    /// has been acknowledged.
    fn async_mod(&self, order: &Order) -> bool;

    /// Returns true if a cancel may be sent to market before the new order
    /// (or the modify it replaces) has been acknowledged.
    fn async_cxl(&self, order: &Order) -> bool;

    /// Populates a synthetic cancel before its legs are filled in from the
    /// order.
    fn syn_cancel(&mut self, _order: &Order, _cancel: &mut Cancel) {}
}

impl<T: App + ?Sized> App for Box<T> {
    fn abnormal(&mut self, order: &Order, event: &Event) {
        (**self).abnormal(order, event);
    }

    fn async_mod(&self, order: &Order) -> bool {
        (**self).async_mod(order)
    }

    fn async_cxl(&self, order: &Order) -> bool {
        (**self).async_cxl(order)
    }

    fn syn_cancel(&mut self, order: &Order, cancel: &mut Cancel) {
        (**self).syn_cancel(order, cancel);
    }
}

impl<T: App + ?Sized> App for &mut T {
    fn abnormal(&mut self, order: &Order, event: &Event) {
        (**self).abnormal(order, event);
    }

    fn async_mod(&self, order: &Order) -> bool {
        (**self).async_mod(order)
    }

    fn async_cxl(&self, order: &Order) -> bool {
        (**self).async_cxl(order)
    }

    fn syn_cancel(&mut self, order: &Order, cancel: &mut Cancel) {
        (**self).syn_cancel(order, cancel);
    }
}
