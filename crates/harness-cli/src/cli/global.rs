//! Flags shared by every subcommand: verbosity, colour and the config file.

use std::path::PathBuf;

use clap::{Args, ValueEnum, builder::FalseyValueParser};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log more: `-v` lifecycle steps, `-vv` matched markers and cleanup,
    /// `-vvv` every line a child prints.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only errors; child output is not echoed either.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Same as `--color never`.
    ///
    /// `NO_COLOR` counts as set for any value except empty, `0`, `false`,
    /// `no`, `off`, `n` and `f`.
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Read settings from this file only, instead of the user and local files.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// When to colour the harness's own output.
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

impl GlobalArgs {
    /// Level applied to the harness crates when `RUST_LOG` is unset.
    ///
    /// Warnings are on by default so failing suites are never silent.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Whether a stream that is (or isn't) a terminal may receive ANSI codes.
    pub fn wants_color(&self, is_terminal: bool) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Auto => is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Colour when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parsed(args: &[&str]) -> GlobalArgs {
        let argv = ["e2e-harness"].iter().chain(args).chain(&["backends"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn colors(no_color: bool, color: ColorMode) -> GlobalArgs {
        GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color,
            config: None,
            color,
        }
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(parsed(&[]).log_level(), LevelFilter::WARN);
        assert_eq!(parsed(&["-v"]).log_level(), LevelFilter::INFO);
        assert_eq!(parsed(&["-vv"]).log_level(), LevelFilter::DEBUG);
        assert_eq!(parsed(&["-vvvvv"]).log_level(), LevelFilter::TRACE);
        assert_eq!(parsed(&["--quiet"]).log_level(), LevelFilter::ERROR);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["e2e-harness", "-q", "-v", "backends"]).is_err());
    }

    #[test]
    fn color_flag_parses() {
        assert_eq!(parsed(&["--color", "never"]).color, ColorMode::Never);
        assert!(parsed(&["--no-color"]).no_color);
    }

    #[test]
    fn auto_follows_terminal() {
        let args = colors(false, ColorMode::Auto);
        assert!(args.wants_color(true));
        assert!(!args.wants_color(false));
    }

    #[test]
    fn no_color_beats_always() {
        assert!(colors(false, ColorMode::Always).wants_color(false));
        assert!(!colors(true, ColorMode::Always).wants_color(true));
    }
}
