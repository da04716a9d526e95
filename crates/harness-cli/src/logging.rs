//! Tracing subscriber setup. Only the binary installs a subscriber; the
//! core and adapter crates just emit events.

use std::io::IsTerminal as _;

use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::cli::GlobalArgs;

/// Crates whose events pass the default filter.
const HARNESS_TARGETS: [&str; 3] = ["e2e_harness", "harness_core", "harness_adapters"];

/// Install a stderr subscriber. `RUST_LOG`, when set, replaces the
/// verbosity flags entirely.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(args.log_level())));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(args.wants_color(std::io::stderr().is_terminal()))
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))
}

/// `target=level` for each harness crate, comma separated. Dependencies
/// such as the MongoDB driver stay silent.
fn default_directives(level: LevelFilter) -> String {
    HARNESS_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
