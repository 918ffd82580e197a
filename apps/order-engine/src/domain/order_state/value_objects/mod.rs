//! Order State Value Objects
//!
//! Enumerations, flags and fixed-point types shared by every event record.

mod event_flags;
mod event_state;
mod event_type;
pub mod fixed;
mod ord_type;
mod rej_reason;
mod side;
mod time_in_force;

pub use event_flags::{EventFlag, EventFlags};
pub use event_state::EventState;
pub use event_type::EventType;
pub use fixed::{Ndp, ValNdp, Value};
pub use ord_type::OrdType;
pub use rej_reason::RejReason;
pub use side::Side;
pub use time_in_force::TimeInForce;
