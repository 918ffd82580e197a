//! Order Engine Binary
//!
//! Replays a script of inbound events against one order and prints every
//! outbound record as a line of JSON.
//!
//! # Usage
//!
//! ```bash
//! order-engine <script.yaml> [config.yaml]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `logging.level` from config)

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use order_engine::application::services::SessionPolicy;
use order_engine::config::{DEFAULT_CONFIG_PATH, EngineConfig, load_config};
use order_engine::replay::{Replayer, load_script, to_json_line};
use order_engine::telemetry::init_logging;
use tracing::{info, warn};

const USAGE: &str = "usage: order-engine <script.yaml> [config.yaml]";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next() else {
        bail!(USAGE);
    };
    let config_path = args.next();

    let config = match config_path.as_deref() {
        Some(path) => load_config(Some(path)).with_context(|| format!("loading config {path}"))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(None).context("loading default config")?
        }
        None => EngineConfig::default(),
    };

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    let steps = load_script(Path::new(&script_path))
        .with_context(|| format!("loading script {script_path}"))?;
    info!(script = %script_path, steps = steps.len(), "Replaying script");

    let mut replayer = Replayer::new(SessionPolicy::new(config.policy.clone()), &config.replay);
    let out = replayer.run(steps);

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    for txn in &out {
        writeln!(stdout, "{}", to_json_line(txn)?).context("writing output")?;
    }

    let (mgr, order) = replayer.into_parts();
    let policy = mgr.into_app();
    if policy.abnormal_count() > 0 {
        warn!(
            abnormal = policy.abnormal_count(),
            state = %order.state_code(),
            "Replay finished with abnormal events"
        );
    } else {
        info!(abnormal = 0, state = %order.state_code(), "Replay finished");
    }

    Ok(())
}
