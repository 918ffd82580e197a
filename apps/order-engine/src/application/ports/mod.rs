//! Application Ports
//!
//! - **Driven Ports** (Secondary/Outbound): policy the order manager consults

mod app_port;

pub use app_port::App;
