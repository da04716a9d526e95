//! Implementation of the `e2e-harness run` command.
//!
//! Builds the plan (selected backends in mongo, postgres, mysql order, each
//! with a random port), runs it, and reports. A failed run is logged and
//! printed but still returns `Ok`: the process exits 0 either way.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use harness_core::{
    application::{RunReport, ports::PhaseListener},
    domain::{Backend, FAST_MODE_ENV, Phase, RunMode, RunPlan},
};

use crate::{
    cli::{GlobalArgs, RunArgs, selected_backends},
    commands::build_runner,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `e2e-harness run` command.
#[instrument(skip_all, fields(fast = args.fast))]
pub fn execute(
    args: RunArgs,
    global: &GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let mode = resolve_mode(args.fast, std::env::var(FAST_MODE_ENV).ok().as_deref());
    let backends = selected_backends(&args.backends);
    let plan = build_plan(
        &config,
        &backends,
        &mut rand::thread_rng(),
        Utc::now().timestamp_millis(),
    )?;

    let runner = build_runner(&config, global, mode)?.with_listener(Box::new(ConsoleListener {
        output: output.clone(),
    }));

    if mode.is_fast() {
        output.info("Fast mode: reusing generated projects")?;
    }
    info!(backends = plan.len(), fast = mode.is_fast(), "Starting run");

    match runner.run(&plan) {
        Ok(report) => print_report(&report, &output)?,
        Err(e) => {
            let err = CliError::from(e);
            err.log();
            output.error(&format!("Run stopped: {err}"))?;
            if !output.is_quiet() {
                for suggestion in err.suggestions() {
                    output.print(&format!("  {suggestion}"))?;
                }
            }
        }
    }

    Ok(())
}

/// `--fast` wins; otherwise the environment decides.
fn resolve_mode(flag: bool, env_value: Option<&str>) -> RunMode {
    if flag {
        RunMode::fast()
    } else {
        RunMode::from_env_value(env_value)
    }
}

/// Plan over `backends` with a random port each.
///
/// The document store gets a `-<stamp>` database name so every run writes
/// to a fresh database that the next run's cleanup will drop.
fn build_plan<R: Rng + ?Sized>(
    config: &AppConfig,
    backends: &[Backend],
    rng: &mut R,
    stamp: i64,
) -> CliResult<RunPlan> {
    let ports = config.port_range()?;
    let databases = backends.iter().map(|&backend| {
        let database = config.database(backend);
        if backend.is_document_store() {
            database.with_unique_suffix(stamp)
        } else {
            database
        }
    });
    let plan = RunPlan::with_random_ports(databases, ports, rng);
    for slot in plan.backends() {
        debug!(
            backend = %slot.backend(),
            port = slot.port,
            database = slot.database.database(),
            "Planned"
        );
    }
    Ok(plan)
}

fn print_report(report: &RunReport, output: &OutputManager) -> CliResult<()> {
    for backend in &report.backends {
        let line = format!(
            "{}: {} suites, {} failed ({}@{})",
            backend.backend,
            backend.suites.total(),
            backend.suites.failed(),
            backend.dir_name,
            backend.port
        );
        if backend.suites.failed() == 0 {
            output.success(&line)?;
        } else {
            output.warning(&line)?;
        }
    }
    Ok(())
}

/// Prints a header whenever a backend enters a new phase.
struct ConsoleListener {
    output: OutputManager,
}

impl PhaseListener for ConsoleListener {
    fn on_phase(&self, backend: Backend, phase: Phase) {
        // Plain output stays ASCII.
        let (arrow, stop) = if self.output.supports_color() {
            ("▶", "■")
        } else {
            (">", "#")
        };
        let line = match phase {
            Phase::Cleaning => format!("\n{arrow} {backend}: cleaning"),
            Phase::Stopped => format!("{stop} {backend}: server stopped"),
            other => format!("{arrow} {backend}: {other}"),
        };
        if let Err(e) = self.output.header(&line) {
            warn!(error = %e, "Could not write phase header");
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn flag_forces_fast_mode() {
        assert!(resolve_mode(true, None).is_fast());
        assert!(resolve_mode(true, Some("false")).is_fast());
    }

    #[test]
    fn env_enables_fast_mode_only_when_true() {
        assert!(resolve_mode(false, Some("true")).is_fast());
        assert!(!resolve_mode(false, Some("1")).is_fast());
        assert!(!resolve_mode(false, None).is_fast());
    }

    #[test]
    fn plan_ports_stay_in_range() {
        let config = AppConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let plan = build_plan(&config, &Backend::ALL, &mut rng, 42).unwrap();

        let range = config.port_range().unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.backends().iter().all(|b| range.contains(b.port)));
    }

    #[test]
    fn only_document_store_gets_a_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan =
            build_plan(&AppConfig::default(), &Backend::ALL, &mut rng, 1_700_000_000_000).unwrap();

        let names: Vec<_> = plan
            .backends()
            .iter()
            .map(|b| (b.backend(), b.database.database().to_owned()))
            .collect();
        assert_eq!(
            names,
            vec![
                (Backend::Mongo, "strapi-test-1700000000000".to_owned()),
                (Backend::Postgres, "strapi-test".to_owned()),
                (Backend::Mysql, "strapi-test".to_owned()),
            ]
        );
    }

    #[test]
    fn invalid_port_range_is_rejected() {
        let mut config = AppConfig::default();
        config.ports.start = 0;
        let mut rng = StdRng::seed_from_u64(1);
        assert!(build_plan(&config, &[Backend::Postgres], &mut rng, 0).is_err());
    }
}
