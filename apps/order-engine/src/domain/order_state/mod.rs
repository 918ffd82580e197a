//! Order State Bounded Context
//!
//! Tracks one open order through its new order, modify, cancel and fill
//! lifecycles, for venues with or without native modify.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: five slots (new order, modify, cancel, last ack,
//!   last execution)
//! - **Event States**: strictly ordered; transitions test contiguous ranges
//! - **Modify-on-queue**: a modify arriving before the new order was sent is
//!   merged into it
//! - **Simulated cancel/replace**: cancel, then resubmit with new terms
//! - **PendingFill**: an ack deferred until the fills it reflects arrive
//! - **Legs**: `leavesQty = max(orderQty - cumQty, 0)` after every update

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregate::Order;
pub use errors::TxnError;
pub use events::{
    AnyReject, Cancel, CancelLeg, Canceled, Closed, CxlReject, Deny, Event, Fill, Leg, LegView,
    Legs, Merge, ModReject, ModRejectCxl, ModSimulated, Modified, Modify, ModifyLeg, NewOrder,
    OrderLeg, Ordered, Reject, Txn,
};
pub use services::{Continuation, OrderMgr, Step};
pub use value_objects::{
    EventFlag, EventFlags, EventState, EventType, Ndp, OrdType, RejReason, Side, TimeInForce,
    ValNdp, Value,
};
