//! Application Layer
//!
//! The application layer connects the order-state domain to its
//! surroundings. It defines:
//!
//! - **Ports**: the [`App`](ports::App) policy interface the order manager consults
//! - **Services**: [`SessionPolicy`](services::SessionPolicy), the config-driven App

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
