//! Session Policy Service
//!
//! Config-driven implementation of the [`App`] port: answers the
//! pipelining questions from [`PolicyConfig`] and keeps a tally of abnormal
//! events for the session.

use tracing::{debug, error};

use crate::application::ports::App;
use crate::config::PolicyConfig;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::Event;

/// Session policy backed by [`PolicyConfig`].
#[derive(Debug, Clone, Default)]
pub struct SessionPolicy {
    config: PolicyConfig,
    abnormal_count: u32,
    last_abnormal: Option<Event>,
}

impl SessionPolicy {
    /// Creates a policy with a zeroed abnormal tally.
    #[must_use]
    pub const fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            abnormal_count: 0,
            last_abnormal: None,
        }
    }

    /// The policy configuration.
    #[must_use]
    pub const fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Number of abnormal events reported so far.
    #[must_use]
    pub const fn abnormal_count(&self) -> u32 {
        self.abnormal_count
    }

    /// Header of the most recent abnormal event.
    #[must_use]
    pub const fn last_abnormal(&self) -> Option<&Event> {
        self.last_abnormal.as_ref()
    }

    /// Returns true once the abnormal tally exceeds the configured limit.
    #[must_use]
    pub fn limit_exceeded(&self) -> bool {
        self.config
            .abnormal_limit
            .is_some_and(|limit| self.abnormal_count > limit)
    }
}

impl App for SessionPolicy {
    fn abnormal(&mut self, order: &Order, event: &Event) {
        self.abnormal_count = self.abnormal_count.saturating_add(1);
        self.last_abnormal = Some(*event);
        if self.limit_exceeded() {
            error!(
                count = self.abnormal_count,
                limit = ?self.config.abnormal_limit,
                state = %order.state_code(),
                "Abnormal event limit exceeded"
            );
        } else {
            debug!(count = self.abnormal_count, "Abnormal event recorded");
        }
    }

    fn async_mod(&self, _order: &Order) -> bool {
        self.config.async_modify
    }

    fn async_cxl(&self, _order: &Order) -> bool {
        self.config.async_cancel
    }
}
