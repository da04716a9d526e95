//! Implementation of the `e2e-harness backends` command.

use serde::Serialize;

use harness_core::domain::{Backend, project_dir_name};

use crate::{
    cli::{BackendsArgs, ListFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// One line of the listing.
#[derive(Debug, Serialize)]
struct BackendRow {
    backend: &'static str,
    label: &'static str,
    directory: String,
    generator_args: Vec<String>,
}

pub fn execute(args: BackendsArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let rows = rows(&config);

    match args.format {
        ListFormat::Table => {
            let ports = config.port_range()?;
            output.header(&format!(
                "Backends (run in this order, ports drawn from {}..{}):",
                ports.start(),
                ports.end()
            ))?;
            for row in &rows {
                output.print(&format!(
                    "  {:<9} {:<16} {}",
                    row.backend,
                    row.directory,
                    row.generator_args.join(" ")
                ))?;
            }
        }

        ListFormat::List => {
            for row in &rows {
                output.print(row.backend)?;
            }
        }

        ListFormat::Json => {
            // Bypasses OutputManager: JSON must stay parseable even with --quiet.
            let json = serde_json::to_string_pretty(&rows).map_err(|e| CliError::ConfigError {
                message: format!("Failed to serialise backends: {e}"),
                source: Some(Box::new(e)),
            })?;
            println!("{json}");
        }
    }

    Ok(())
}

fn rows(config: &AppConfig) -> Vec<BackendRow> {
    Backend::ALL
        .into_iter()
        .map(|backend| BackendRow {
            backend: backend.client(),
            label: backend.label(),
            directory: project_dir_name(&config.app.name, backend),
            generator_args: config.database(backend).generator_args(),
        })
        .collect()
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_run_order() {
        let names: Vec<_> = rows(&AppConfig::default())
            .into_iter()
            .map(|r| r.directory)
            .collect();
        assert_eq!(names, vec!["testApp_mongo", "testApp_pg", "testApp_mysql"]);
    }

    #[test]
    fn rows_carry_generator_flags() {
        let rows = rows(&AppConfig::default());
        let pg = &rows[1];
        assert_eq!(pg.label, "pg");
        assert!(pg.generator_args.iter().any(|a| a == "--dbclient=postgres"));
    }
}
