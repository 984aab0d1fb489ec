//! # CLI Module
//!
//! @title Command Line Interface
//! @author Ramprasad
//!
//! This module defines the command-line interface for Route-Sentinel using
//! the `clap` derive macros for declarative argument parsing.
//!
//! ## Commands
//!
//! - `scan` - Analyze Next.js API routes and optionally verify findings live
//! - `list` - Display the vulnerability rules
//! - `version` - Show version information

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Route-Sentinel command-line interface.
///
/// Finds Next.js API route handlers that reach sensitive operations without
/// authentication or authorization, then optionally confirms them against a
/// running instance of the application.
#[derive(Parser, Debug)]
#[command(name = "route-sentinel")]
#[command(author = "RamprasadGoud")]
#[command(version)]
#[command(about = "Static analysis and live verification of Next.js API route security")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for the final report.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Colorized console output.
    Terminal,
    /// The final report as JSON on stdout.
    Json,
    /// A Markdown document on stdout.
    Markdown,
}

/// Available subcommands for the Route-Sentinel CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a Next.js project for vulnerable API routes.
    ///
    /// Discovers route files under `app/api` and `pages/api`, analyzes every
    /// exported HTTP method handler, and writes `security-report.json` and
    /// `final-report.json` (plus `fuzzing-report.json` with `--fuzz`).
    Scan {
        /// Root directory of the Next.js project.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Verify findings by sending requests to a running instance.
        #[arg(long)]
        fuzz: bool,

        /// Base URL of the running application.
        #[arg(short, long, default_value = crate::fuzz::DEFAULT_BASE_URL)]
        base_url: String,

        /// Security config file.
        ///
        /// Defaults to `security-config.json` in the scanned directory when
        /// present.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Maximum generated requests per method for the missing
        /// authentication fuzzing.
        #[arg(long, default_value_t = crate::fuzz::DEFAULT_MAX_CASES)]
        max_cases: usize,

        /// Levels of same-file helper calls followed from each handler.
        #[arg(short, long, default_value_t = crate::analysis::DEFAULT_CALL_GRAPH_DEPTH)]
        depth: usize,

        /// Output format for the final report.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
        format: OutputFormat,

        /// Directory for the JSON reports (defaults to the scanned directory).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum severity level to include in results.
        ///
        /// Valid values: critical, high, medium, low
        #[arg(short, long)]
        severity: Option<String>,

        /// Fixed seed for fuzz input generation.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List all vulnerability rules.
    ///
    /// Displays the ID, name, severity, and description of each rule.
    List,

    /// Print version information.
    Version,
}
