//! Scripted Replay
//!
//! Drives one [`Order`] through a script of inbound steps, the way a
//! transport layer would: filters are consulted before every modify and
//! cancel, continuations are run to completion, and queued requests are
//! optionally confirmed as sent after each step.
//!
//! # Script format
//!
//! A YAML list of steps:
//!
//! ```yaml
//! - EVENT:
//!     NEW_ORDER:
//!       legs: [{ side: BUY, ord_type: LIMIT, px: 100, order_qty: 100 }]
//! - EVENT: { ORDERED: {} }
//! - EVENT: { FILL: { last_px: 100, last_qty: 40 } }
//! - HOLD: { legs: [{ side: SELL, ord_type: MARKET, order_qty: 10 }] }
//! - RELEASE
//! - HOLD_MODIFY: { legs: [{ px: 101 }] }
//! - DENY: { rej_reason: BROKER_REJECT }
//! - SENT
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::ports::App;
use crate::config::ReplayConfig;
use crate::domain::order_state::aggregate::Order;
use crate::domain::order_state::events::{Deny, Modify, NewOrder, Txn};
use crate::domain::order_state::services::OrderMgr;
use crate::domain::order_state::value_objects::EventState;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Failed to read the script.
    #[error("Failed to read replay script: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the script.
    #[error("Failed to parse replay script: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// Failed to encode an outbound record.
    #[error("Failed to encode record: {0}")]
    Json(#[from] serde_json::Error),
}

/// One step of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayStep {
    /// An inbound event, dispatched by kind.
    Event(Txn),
    /// A new order accepted but held.
    Hold(NewOrder),
    /// A modify accepted but held.
    HoldModify(Modify),
    /// Release of the held new order or modify.
    Release,
    /// Denial of the held new order or modify.
    Deny(Deny),
    /// Transport confirmation for every queued request.
    Sent,
}

/// Parses a replay script.
///
/// # Errors
///
/// Returns [`ReplayError::Parse`] if the YAML is not a list of steps.
pub fn parse_script(yaml: &str) -> Result<Vec<ReplayStep>, ReplayError> {
    Ok(serde_yaml_bw::from_str(yaml)?)
}

/// Reads and parses a replay script.
///
/// # Errors
///
/// Returns [`ReplayError::Io`] or [`ReplayError::Parse`].
pub fn load_script(path: &Path) -> Result<Vec<ReplayStep>, ReplayError> {
    let contents = std::fs::read_to_string(path)?;
    parse_script(&contents)
}

/// Encodes an outbound record as one line of JSON.
///
/// # Errors
///
/// Returns [`ReplayError::Json`] if encoding fails.
pub fn to_json_line(txn: &Txn) -> Result<String, ReplayError> {
    Ok(serde_json::to_string(txn)?)
}

// ============================================
// Replayer
// ============================================

/// Replays steps against a single order.
#[derive(Debug)]
pub struct Replayer<A> {
    mgr: OrderMgr<A>,
    order: Order,
    auto_send: bool,
}

impl<A: App> Replayer<A> {
    /// Creates a replayer over a blank order.
    #[must_use]
    pub fn new(app: A, config: &ReplayConfig) -> Self {
        Self {
            mgr: OrderMgr::new(app),
            order: Order::new(),
            auto_send: config.auto_send,
        }
    }

    /// The order being replayed.
    #[must_use]
    pub const fn order(&self) -> &Order {
        &self.order
    }

    /// The order manager.
    #[must_use]
    pub const fn mgr(&self) -> &OrderMgr<A> {
        &self.mgr
    }

    /// Consumes the replayer, returning the manager and the order.
    pub fn into_parts(self) -> (OrderMgr<A>, Order) {
        (self.mgr, self.order)
    }

    /// Runs every step, returning the outbound records in order.
    pub fn run<I>(&mut self, steps: I) -> Vec<Txn>
    where
        I: IntoIterator<Item = ReplayStep>,
    {
        let mut out = Vec::new();
        for step in steps {
            out.extend(self.step(step));
        }
        info!(records = out.len(), state = %self.order.state_code(), "Replay complete");
        out
    }

    /// Runs one step, returning the outbound records it produced.
    pub fn step(&mut self, step: ReplayStep) -> Vec<Txn> {
        let out = match step {
            ReplayStep::Event(txn) => self.apply(txn),
            ReplayStep::Hold(mut input) => {
                let step = self.mgr.order_held(&mut self.order, &mut input);
                self.mgr.drive(&mut self.order, &mut input, step)
            }
            ReplayStep::HoldModify(mut input) => {
                let (mgr, order) = (&mut self.mgr, &mut self.order);
                let step = match mgr.filter_modify(order) {
                    reason if reason.is_ok() => mgr.mod_held(order, &mut input),
                    reason => mgr.mod_filtered(order, &mut input, reason),
                };
                mgr.drive(order, &mut input, step)
            }
            ReplayStep::Release => {
                let step = self.mgr.release(&mut self.order, &mut ());
                self.mgr.drive(&mut self.order, &mut (), step)
            }
            ReplayStep::Deny(mut input) => {
                let step = self.mgr.deny(&mut self.order, &mut input);
                self.mgr.drive(&mut self.order, &mut input, step)
            }
            ReplayStep::Sent => {
                self.send();
                return Vec::new();
            }
        };
        if self.auto_send {
            self.send();
        }
        out
    }

    fn apply(&mut self, mut txn: Txn) -> Vec<Txn> {
        txn.normalize();
        debug!(event_type = %txn.event_type(), "Replaying event");
        let (mgr, order) = (&mut self.mgr, &mut self.order);

        macro_rules! dispatch {
            ($op:ident, $input:ident) => {{
                let step = mgr.$op(order, &mut $input);
                mgr.drive(order, &mut $input, step)
            }};
            ($op:ident, $input:ident, $reason:expr) => {{
                let step = mgr.$op(order, &mut $input, $reason);
                mgr.drive(order, &mut $input, step)
            }};
        }

        match txn {
            Txn::NewOrder(mut r) => dispatch!(new_order, r),
            Txn::Ordered(mut r) => dispatch!(ordered, r),
            Txn::Reject(mut r) => dispatch!(reject, r),
            Txn::Modify(mut r) => match mgr.filter_modify(order) {
                reason if reason.is_ok() => dispatch!(modify, r),
                reason => dispatch!(mod_filtered, r, reason),
            },
            Txn::ModSimulated(mut r) => match mgr.filter_modify(order) {
                reason if reason.is_ok() => dispatch!(mod_simulated, r),
                reason => dispatch!(mod_filtered, r, reason),
            },
            Txn::Modified(mut r) => dispatch!(modified, r),
            Txn::ModReject(mut r) => dispatch!(mod_reject, r),
            Txn::ModRejectCxl(mut r) => dispatch!(mod_reject_cxl, r),
            Txn::Cancel(mut r) => match mgr.filter_cancel(order) {
                reason if reason.is_ok() => dispatch!(cancel, r),
                reason => dispatch!(cxl_filtered, r, reason),
            },
            Txn::Canceled(mut r) => dispatch!(canceled, r),
            Txn::CxlReject(mut r) => dispatch!(cxl_reject, r),
            Txn::Fill(mut r) => dispatch!(fill, r),
            Txn::Closed(mut r) => dispatch!(closed, r),
        }
    }

    /// Confirms transmission of every queued request.
    fn send(&mut self) {
        let order = &mut self.order;
        if order.new_order().event.event_state == EventState::Queued {
            self.mgr.order_sent(order);
        }
        if order.modify().event.event_state == EventState::Queued {
            self.mgr.modify_sent(order);
        }
        if order.cancel().event.event_state == EventState::Queued {
            self.mgr.cancel_sent(order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SessionPolicy;
    use crate::config::PolicyConfig;
    use crate::domain::order_state::value_objects::{EventType, RejReason};

    const LIFECYCLE: &str = r"
- EVENT:
    NEW_ORDER:
      legs:
        - side: BUY
          ord_type: LIMIT
          px: 100
          order_qty: 100
- EVENT:
    ORDERED: {}
- EVENT:
    FILL:
      last_px: 100
      last_qty: 40
- EVENT:
    FILL:
      last_px: 101
      last_qty: 60
";

    fn replayer(auto_send: bool) -> Replayer<SessionPolicy> {
        Replayer::new(
            SessionPolicy::new(PolicyConfig::default()),
            &ReplayConfig { auto_send },
        )
    }

    fn kinds(out: &[Txn]) -> Vec<EventType> {
        out.iter().map(Txn::event_type).collect()
    }

    #[test]
    fn parse_script_reads_every_step_kind() {
        let yaml = r"
- HOLD:
    legs:
      - side: SELL
        ord_type: MARKET
        order_qty: 10
- RELEASE
- DENY:
    rej_reason: BROKER_REJECT
- SENT
";
        let steps = parse_script(yaml).unwrap();
        assert_eq!(steps.len(), 4);
        assert!(matches!(steps[0], ReplayStep::Hold(_)));
        assert_eq!(steps[1], ReplayStep::Release);
        assert!(matches!(steps[2], ReplayStep::Deny(d) if d.rej_reason == RejReason::BrokerReject));
        assert_eq!(steps[3], ReplayStep::Sent);
    }

    #[test]
    fn parse_script_rejects_unknown_step() {
        assert!(matches!(parse_script("- BOGUS"), Err(ReplayError::Parse(_))));
    }

    #[test]
    fn lifecycle_script_fills_order() {
        let mut replayer = replayer(true);
        let out = replayer.run(parse_script(LIFECYCLE).unwrap());

        assert_eq!(
            kinds(&out),
            vec![EventType::NewOrder, EventType::Ordered, EventType::Fill, EventType::Fill]
        );
        let leg = replayer.order().new_order().legs.get(0).copied().unwrap();
        assert_eq!(leg.cum_qty, 100);
        assert_eq!(leg.leaves_qty, 0);
        assert_eq!(leg.cum_value, 100 * 40 + 101 * 60);
        assert_eq!(replayer.order().new_order().event.event_state, EventState::Acknowledged);
    }

    #[test]
    fn cancel_of_closed_order_is_filtered() {
        let mut replayer = replayer(true);
        replayer.run(parse_script(LIFECYCLE).unwrap());
        replayer.step(ReplayStep::Event(Txn::Closed(Default::default())));

        let out = replayer.step(ReplayStep::Event(Txn::Cancel(Default::default())));

        assert_eq!(kinds(&out), vec![EventType::CxlReject]);
        let reject = out[0].as_reject().unwrap();
        assert_eq!(reject.rej_reason, RejReason::OrderClosed);
        assert!(reject.event.event_flags.synthetic());
        assert_eq!(replayer.order().cancel().event.event_state, EventState::Unset);
    }

    #[test]
    fn manual_send_waits_for_sent_step() {
        let mut replayer = replayer(false);
        let steps = parse_script(LIFECYCLE).unwrap();
        replayer.step(steps[0].clone());
        assert_eq!(replayer.order().new_order().event.event_state, EventState::Queued);

        replayer.step(ReplayStep::Sent);
        assert_eq!(replayer.order().new_order().event.event_state, EventState::Sent);
    }

    #[test]
    fn held_order_released_then_denied_is_abnormal() {
        let mut replayer = replayer(true);
        let yaml = r"
- HOLD:
    legs:
      - side: SELL
        ord_type: MARKET
        order_qty: 10
- RELEASE
- DENY:
    rej_reason: BROKER_REJECT
";
        replayer.run(parse_script(yaml).unwrap());

        assert_eq!(replayer.order().new_order().event.event_state, EventState::Sent);
        let (mgr, _) = replayer.into_parts();
        assert_eq!(mgr.app().abnormal_count(), 1);
    }

    #[test]
    fn json_line_is_externally_tagged() {
        let line = to_json_line(&Txn::Ordered(Default::default())).unwrap();
        assert!(line.starts_with("{\"ORDERED\":"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn load_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.yaml");
        std::fs::write(&path, LIFECYCLE).unwrap();
        assert_eq!(load_script(&path).unwrap().len(), 4);
        assert!(matches!(
            load_script(&dir.path().join("missing.yaml")),
            Err(ReplayError::Io(_))
        ));
    }
}
