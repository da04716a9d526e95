//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use clap::{Args, Parser, Subcommand, ValueEnum};

use harness_core::domain::Backend;

pub mod global;
pub use global::GlobalArgs;

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "e2e-harness",
    bin_name = "e2e-harness",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "End-to-end tests for a project generator across database backends",
    long_about = "Generates one project per database backend, boots its server \
                  on a random port and runs the test suites against it. \
                  Backends run one after another: mongo, postgres, mysql.",
    after_help = "EXAMPLES:\n\
        \x20 e2e-harness run\n\
        \x20 e2e-harness run --fast --backend postgres\n\
        \x20 e2e-harness clean\n\
        \x20 e2e-harness completions bash > /usr/share/bash-completion/completions/e2e-harness",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full lifecycle for every selected backend.
    #[command(
        visible_alias = "r",
        about = "Clean, generate, start and test each backend",
        after_help = "EXAMPLES:\n\
            \x20 e2e-harness run\n\
            \x20 e2e-harness run --backend pg --backend mysql\n\
            \x20 npm_config_fast=true e2e-harness run   # reuse generated projects"
    )]
    Run(RunArgs),

    /// Remove generated projects and stale test databases.
    #[command(
        about = "Remove generated projects and test databases",
        after_help = "EXAMPLES:\n\
            \x20 e2e-harness clean\n\
            \x20 e2e-harness clean --backend mongo"
    )]
    Clean(CleanArgs),

    /// Show what a run would do.
    #[command(
        visible_alias = "ls",
        about = "List backends and their generator flags",
        after_help = "EXAMPLES:\n\
            \x20 e2e-harness backends\n\
            \x20 e2e-harness backends --format list"
    )]
    Backends(BackendsArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 e2e-harness completions bash > ~/.local/share/bash-completion/completions/e2e-harness\n\
            \x20 e2e-harness completions zsh  > ~/.zfunc/_e2e-harness\n\
            \x20 e2e-harness completions fish > ~/.config/fish/completions/e2e-harness.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the resolved configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 e2e-harness config show\n\
            \x20 e2e-harness config path"
    )]
    Config(ConfigCommands),
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Arguments for `e2e-harness run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Reuse previously generated projects.
    ///
    /// Also enabled when `npm_config_fast=true` is set in the environment.
    #[arg(long = "fast", help = "Skip generation and keep project directories")]
    pub fast: bool,

    /// Restrict the run to these backends (repeatable).
    #[arg(
        short = 'b',
        long = "backend",
        value_name = "BACKEND",
        value_enum,
        value_delimiter = ',',
        help = "Only run these backends"
    )]
    pub backends: Vec<BackendArg>,
}

// ── clean ─────────────────────────────────────────────────────────────────────

/// Arguments for `e2e-harness clean`.
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Restrict cleanup to these backends (repeatable).
    #[arg(
        short = 'b',
        long = "backend",
        value_name = "BACKEND",
        value_enum,
        value_delimiter = ',',
        help = "Only clean these backends"
    )]
    pub backends: Vec<BackendArg>,
}

// ── backends ──────────────────────────────────────────────────────────────────

/// Arguments for `e2e-harness backends`.
#[derive(Debug, Args)]
pub struct BackendsArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `backends` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One backend per line.
    List,
    /// JSON array.
    Json,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `e2e-harness completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `e2e-harness config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration as TOML.
    Show,
    /// Print the path of the default configuration file.
    Path,
}

// ── value enums ───────────────────────────────────────────────────────────────

/// Backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum BackendArg {
    /// Also accepted as `mongodb`.
    #[value(alias = "mongodb")]
    Mongo,
    /// Also accepted as `pg`.
    #[value(alias = "pg")]
    Postgres,
    Mysql,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Mongo => Backend::Mongo,
            BackendArg::Postgres => Backend::Postgres,
            BackendArg::Mysql => Backend::Mysql,
        }
    }
}

/// Resolve a selection to backends in run order. Empty means all of them.
pub fn selected_backends(args: &[BackendArg]) -> Vec<Backend> {
    if args.is_empty() {
        return Backend::ALL.to_vec();
    }
    let mut backends: Vec<Backend> = args.iter().copied().map(Backend::from).collect();
    backends.sort();
    backends.dedup();
    backends
}

// ── tests ─────────────────────────────────────────────────────────────────────
