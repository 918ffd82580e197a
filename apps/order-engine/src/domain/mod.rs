//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//!
//! # Bounded Contexts
//!
//! - [`order_state`]: Order-state management (new order, modify, cancel, fills)

pub mod order_state;
