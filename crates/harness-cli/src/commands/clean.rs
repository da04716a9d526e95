//! Implementation of the `e2e-harness clean` command.

use tracing::instrument;

use harness_core::domain::RunMode;

use crate::{
    cli::{CleanArgs, GlobalArgs, selected_backends},
    commands::build_runner,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// Run the clean step alone for each selected backend.
///
/// Always a full clean: project directories go even when `npm_config_fast`
/// is set.
#[instrument(skip_all)]
pub fn execute(
    args: CleanArgs,
    global: &GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let runner = build_runner(&config, global, RunMode::normal())?;

    for backend in selected_backends(&args.backends) {
        runner.clean(backend, RunMode::normal())?;
        output.success(&format!(
            "{backend}: {} is clean",
            runner.project_dir(backend).display()
        ))?;
    }

    Ok(())
}
