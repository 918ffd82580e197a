//! Application Services
//!
//! Application services coordinate domain logic with session state.

mod session_policy;

pub use session_policy::SessionPolicy;
