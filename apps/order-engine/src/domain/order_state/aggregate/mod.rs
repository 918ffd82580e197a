//! Order Aggregate
//!
//! The Order aggregate is the root entity for order-state management.

mod order;

pub use order::Order;
