//! hdlmap CLI: maps processor repositories to simulation-ready configuration.
//!
//! Provides `hdlmap analyze` for one project, `hdlmap batch` for many,
//! `hdlmap graph` to inspect the instantiation hierarchy and `hdlmap init` to
//! write a documented default `hdlmap.toml`.

#![warn(missing_docs)]

mod analyze;
mod batch;
mod graph;
mod init;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use hdlmap_common::Dialect;
use tracing_subscriber::prelude::*;

/// hdlmap: find the top module and build configuration of HDL repositories.
#[derive(Parser, Debug)]
#[command(name = "hdlmap", version, about = "HDL repository mapper")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to an `hdlmap.toml` used instead of the project's own.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse one project and print its configuration descriptor.
    Analyze(AnalyzeArgs),
    /// Analyse many projects in parallel, one output set per project.
    Batch(BatchArgs),
    /// Print the instantiation graph of a project.
    Graph(GraphArgs),
    /// Write a documented default `hdlmap.toml`.
    Init {
        /// Directory to write into (default: current directory).
        dir: Option<String>,
    },
}

/// Arguments for `hdlmap analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Project root.
    pub path: String,

    /// Repository name hint (default: the directory name).
    #[arg(long)]
    pub name: Option<String>,

    /// Use this module as the top instead of scoring candidates.
    #[arg(long)]
    pub top: Option<String>,

    /// Skip dialect detection.
    #[arg(long)]
    pub dialect: Option<Dialect>,

    /// Repository URL recorded in the descriptor.
    #[arg(long)]
    pub repository: Option<String>,

    /// Write the JSON here instead of standard output.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Report generated file paths without creating them.
    #[arg(long)]
    pub dry_run: bool,

    /// Print every scored candidate and its signals.
    #[arg(long)]
    pub explain: bool,

    /// Run the `[compile]` command on the result.
    #[arg(long)]
    pub compile: bool,
}

/// Arguments for `hdlmap batch`.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Project roots.
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<String>,

    /// Directory receiving `<name>.json`, `<name>.log` and `<name>.status`.
    #[arg(long)]
    pub out_dir: String,

    /// Worker threads (default: `[batch] jobs`, else available parallelism).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Report generated file paths without creating them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `hdlmap graph`.
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Project root.
    pub path: String,

    /// Skip dialect detection.
    #[arg(long)]
    pub dialect: Option<Dialect>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Output format for `hdlmap graph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable adjacency listing.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::env::var("TERM").is_ok(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(color)
                .with_writer(std::io::stderr),
        )
        .init();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Analyze(ref args) => analyze::run(args, &global),
        Command::Batch(ref args) => batch::run(args, &global),
        Command::Graph(ref args) => graph::run(args, &global),
        Command::Init { dir } => init::run(dir),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_analyze_default() {
        let cli = Cli::parse_from(["hdlmap", "analyze", "repos/picorv32"]);
        match cli.command {
            Command::Analyze(ref args) => {
                assert_eq!(args.path, "repos/picorv32");
                assert!(args.name.is_none());
                assert!(args.top.is_none());
                assert!(args.dialect.is_none());
                assert!(!args.dry_run);
                assert!(!args.explain);
                assert!(!args.compile);
            }
            _ => panic!("expected Analyze command"),
        }
    }

    #[test]
    fn parse_analyze_with_args() {
        let cli = Cli::parse_from([
            "hdlmap",
            "analyze",
            "core",
            "--name",
            "darkriscv",
            "--top",
            "darksocv",
            "--dialect",
            "verilog",
            "--output",
            "out.json",
            "--dry-run",
            "--explain",
        ]);
        match cli.command {
            Command::Analyze(ref args) => {
                assert_eq!(args.name.as_deref(), Some("darkriscv"));
                assert_eq!(args.top.as_deref(), Some("darksocv"));
                assert_eq!(args.dialect, Some(Dialect::Verilog));
                assert_eq!(args.output.as_deref(), Some("out.json"));
                assert!(args.dry_run);
                assert!(args.explain);
            }
            _ => panic!("expected Analyze command"),
        }
    }

    #[test]
    fn parse_dialect_alias() {
        let cli = Cli::parse_from(["hdlmap", "graph", "x", "--dialect", "spinal"]);
        match cli.command {
            Command::Graph(ref args) => {
                assert_eq!(args.dialect, Some(Dialect::SpinalHdl));
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Graph command"),
        }
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        assert!(Cli::try_parse_from(["hdlmap", "analyze", "x", "--dialect", "cobol"]).is_err());
    }

    #[test]
    fn parse_batch() {
        let cli = Cli::parse_from(["hdlmap", "batch", "a", "b", "--out-dir", "results", "-j", "4"]);
        match cli.command {
            Command::Batch(ref args) => {
                assert_eq!(args.paths, vec!["a", "b"]);
                assert_eq!(args.out_dir, "results");
                assert_eq!(args.jobs, Some(4));
                assert!(!args.dry_run);
            }
            _ => panic!("expected Batch command"),
        }
    }

    #[test]
    fn batch_needs_paths() {
        assert!(Cli::try_parse_from(["hdlmap", "batch", "--out-dir", "results"]).is_err());
    }

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["hdlmap", "init"]);
        assert!(matches!(cli.command, Command::Init { dir: None }));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["hdlmap", "--quiet", "--color", "never", "--config", "/etc/hdlmap.toml", "init"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("/etc/hdlmap.toml"));
    }
}
