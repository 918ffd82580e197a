//! Order State Events
//!
//! The event alphabet exchanged with client and market: a common header,
//! per-leg records, one record per event kind and the [`Txn`] sum type.

mod event;
pub mod legs;
mod records;
mod txn;

pub use event::Event;
pub use legs::{CancelLeg, Leg, LegView, Legs, Merge, ModifyLeg, OrderLeg};
pub use records::{
    AnyReject, Cancel, Canceled, Closed, CxlReject, Deny, Fill, ModReject, ModRejectCxl,
    ModSimulated, Modified, Modify, NewOrder, Ordered, Reject,
};
pub use txn::Txn;
