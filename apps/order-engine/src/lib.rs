// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Order Engine - Rust Core Library
//!
//! Synchronous order-state machine for an order management system. One
//! [`Order`] is tracked through its new order, modify, cancel and fill
//! lifecycles, for venues with or without native modify.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `order_state`: value objects, event records, the `Order` aggregate
//!     and the `OrderMgr` transition engine
//!
//! - **Application**: Ports and services
//!   - `ports`: `App`, the session policy the order manager consults
//!   - `services`: `SessionPolicy`, a config-driven `App`
//!
//! - **Ambient**
//!   - `config`: YAML configuration with environment interpolation
//!   - `telemetry`: tracing subscriber setup
//!   - `replay`: scripted replay of inbound events
//!
//! The engine performs no I/O. A transport layer hands it decoded records
//! and transmits whatever [`outbox`] returns.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Ports and session services.
pub mod application;

// =============================================================================
// Ambient
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Scripted replay driver.
pub mod replay;

/// Logging setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::order_state::{
    Event, EventFlag, EventFlags, EventState, EventType, NewOrder, OrdType, Order, OrderLeg,
    RejReason, Side, TimeInForce, Txn, TxnError,
    services::{Continuation, OrderMgr, Step, ack, outbox},
};

// Application re-exports
pub use application::ports::App;
pub use application::services::SessionPolicy;

// Ambient re-exports
pub use config::{ConfigError, EngineConfig, load_config};
pub use replay::{ReplayError, ReplayStep, Replayer};
