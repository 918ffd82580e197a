//! Order State Domain Services
//!
//! The order manager: state transitions driven by client and market events.

mod order_mgr;

pub use order_mgr::{Continuation, OrderMgr, Step, ack, outbox};
