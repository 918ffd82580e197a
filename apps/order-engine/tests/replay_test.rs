//! Replay Integration Tests
//!
//! Runs YAML fixtures through the `Replayer` with a `SessionPolicy`, the
//! same path the `order-engine` binary takes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use order_engine::application::services::SessionPolicy;
use order_engine::config::{PolicyConfig, ReplayConfig, load_config_from_string};
use order_engine::domain::order_state::{EventState, EventType, RejReason, TimeInForce, Txn};
use order_engine::replay::{ReplayStep, Replayer, load_script, to_json_line};

/// Load a replay fixture from the fixtures directory.
fn load_fixture(name: &str) -> Vec<ReplayStep> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);

    load_script(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {e}", path.display()))
}

fn replayer() -> Replayer<SessionPolicy> {
    Replayer::new(
        SessionPolicy::new(PolicyConfig::default()),
        &ReplayConfig::default(),
    )
}

fn kinds(out: &[Txn]) -> Vec<EventType> {
    out.iter().map(Txn::event_type).collect()
}

#[test]
fn test_cancel_replace_fixture() {
    let mut replayer = replayer();
    let out = replayer.run(load_fixture("cancel_replace.yaml"));

    assert_eq!(
        kinds(&out),
        vec![
            EventType::NewOrder,
            EventType::Ordered,
            EventType::Cancel,
            EventType::NewOrder,
            EventType::Modified,
            EventType::Modified,
            EventType::Fill,
        ]
    );

    let order = replayer.order();
    let leg = order.new_order().legs.get(0).copied().unwrap();
    assert_eq!(leg.px, 10050);
    assert_eq!(leg.cum_qty, 500);
    assert_eq!(leg.leaves_qty, 0);
    assert_eq!(leg.cum_value, 10050 * 500);
    assert_eq!(order.new_order().time_in_force, TimeInForce::Gtc);
    assert_eq!(order.new_order().event.event_state, EventState::Acknowledged);

    let (mgr, _) = replayer.into_parts();
    assert_eq!(mgr.app().abnormal_count(), 0);
}

#[test]
fn test_held_then_denied_fixture() {
    let mut replayer = replayer();
    let out = replayer.run(load_fixture("held_then_denied.yaml"));

    assert_eq!(kinds(&out), vec![EventType::Reject]);
    let reject = out[0].as_reject().unwrap();
    assert_eq!(reject.rej_reason, RejReason::BrokerReject);
    assert_eq!(reject.rej_code, 17);
    assert!(reject.event.event_flags.synthetic());

    let order = replayer.order();
    assert_eq!(order.new_order().event.event_state, EventState::Rejected);
    let leg = order.new_order().legs.get(0).copied().unwrap();
    assert_eq!(leg.leaves_qty, 0);
}

#[test]
fn test_held_then_amended_fixture() {
    let mut replayer = replayer();
    let out = replayer.run(load_fixture("held_then_amended.yaml"));

    // synthetic ack of the amendment, the amended order, then the
    // market's ack answered with the amended terms
    assert_eq!(
        kinds(&out),
        vec![EventType::Ordered, EventType::NewOrder, EventType::Modified]
    );
    assert!(out[0].event().event_flags.pending());
    let sent = out[1].as_new_order().unwrap();
    assert_eq!(sent.legs.get(0).map(|l| l.order_qty), Some(150));

    let order = replayer.order();
    assert_eq!(order.state_code(), "A/U/U");
    assert_eq!(order.new_order().legs.get(0).map(|l| l.leaves_qty), Some(150));
}

#[test]
fn test_held_modify_denied_fixture() {
    let mut replayer = replayer();
    let out = replayer.run(load_fixture("held_modify_denied.yaml"));

    assert_eq!(
        kinds(&out),
        vec![
            EventType::NewOrder,
            EventType::Ordered,
            EventType::Cancel,
            EventType::ModReject,
            EventType::Canceled,
        ]
    );
    assert_eq!(out[3].as_reject().unwrap().rej_reason, RejReason::BrokerReject);

    let order = replayer.order();
    assert_eq!(order.state_code(), "C/X/A");
    assert_eq!(order.new_order().legs.get(0).map(|l| l.px), Some(2500));

    let (mgr, _) = replayer.into_parts();
    assert_eq!(mgr.app().abnormal_count(), 0);
}

#[test]
fn test_policy_from_config_pipelines_cancel() {
    let config = load_config_from_string("policy:\n  async_cancel: true\n").unwrap();
    let mut replayer = Replayer::new(SessionPolicy::new(config.policy), &config.replay);
    let yaml = r"
- EVENT:
    NEW_ORDER:
      legs:
        - side: BUY
          ord_type: LIMIT
          px: 100
          order_qty: 10
- EVENT:
    CANCEL: {}
";
    let out = replayer.run(order_engine::replay::parse_script(yaml).unwrap());

    assert_eq!(kinds(&out), vec![EventType::NewOrder, EventType::Cancel]);
    assert_eq!(replayer.order().cancel().event.event_state, EventState::Sent);
}

#[test]
fn test_output_lines_are_json() {
    let mut replayer = replayer();
    for txn in replayer.run(load_fixture("cancel_replace.yaml")) {
        let line = to_json_line(&txn).unwrap();
        let back: Txn = serde_json::from_str(&line).unwrap();
        assert_eq!(back.event_type(), txn.event_type());
    }
}
