//! Command handlers, one module per subcommand.

pub mod backends;
pub mod clean;
pub mod completions;
pub mod config;
pub mod run;

use std::time::Duration;

use harness_adapters::{LocalFilesystem, LocalSpawner, MongoJanitor};
use harness_core::{application::TestRunner, domain::RunMode};

use crate::{cli::GlobalArgs, config::AppConfig, error::CliResult};

/// Wire the real adapters into a runner.
///
/// Child output is echoed unless `--quiet` or `output.echo_children = false`.
pub(crate) fn build_runner(
    config: &AppConfig,
    global: &GlobalArgs,
    mode: RunMode,
) -> CliResult<TestRunner> {
    let settings = config.runner_settings(mode)?;
    let spawner = LocalSpawner::new().with_echo(config.output.echo_children && !global.quiet);
    let janitor = MongoJanitor::new(&config.mongo.uri)
        .with_timeout(Duration::from_millis(config.mongo.timeout_ms));

    Ok(TestRunner::new(
        Box::new(spawner),
        Box::new(LocalFilesystem::new()),
        Box::new(janitor),
        settings,
    ))
}
