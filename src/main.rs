//! # Route-Sentinel CLI Entry Point
//!
//! @title Route-Sentinel CLI
//! @author Ramprasad
//!
//! This module provides the main entry point for the Route-Sentinel
//! command-line security scanner.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use route_sentinel::cli::{Commands, OutputFormat};
use route_sentinel::parser::discover_routes;
use route_sentinel::report::{
    save_json, ANALYSIS_REPORT_FILE, FINAL_REPORT_FILE, FUZZ_REPORT_FILE,
};
use route_sentinel::{
    AnalysisReport, Cli, DetectorRegistry, FinalReport, FindingAggregator, FuzzEngine,
    FuzzOptions, FuzzReport, RouteAnalyzer, RouteInfo, SecurityConfig, Severity,
};
use std::path::{Path, PathBuf};

/// ASCII art banner displayed at startup.
const BANNER: &str = r#"
 ____             _             ____             _   _            _
|  _ \ ___  _   _| |_ ___      / ___|  ___ _ __ | |_(_)_ __   ___| |
| |_) / _ \| | | | __/ _ \_____\___ \ / _ \ '_ \| __| | '_ \ / _ \ |
|  _ < (_) | |_| | ||  __/_____|___) |  __/ | | | |_| | | | |  __/ |
|_| \_\___/ \__,_|\__\___|     |____/ \___|_| |_|\__|_|_| |_|\___|_|

              Next.js API Route Security Scanner
"#;

/// Options of a `scan` invocation.
struct ScanArgs {
    path: PathBuf,
    fuzz: bool,
    base_url: String,
    config: Option<PathBuf>,
    max_cases: usize,
    depth: usize,
    format: OutputFormat,
    output: Option<PathBuf>,
    severity: Option<String>,
    seed: Option<u64>,
}

/// Application entry point.
///
/// Initializes the logging system, displays the banner, parses command-line
/// arguments, and dispatches to the appropriate command handler.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Machine-readable formats keep stdout clean.
    let quiet = matches!(
        cli.command,
        Commands::Scan {
            format: OutputFormat::Json | OutputFormat::Markdown,
            ..
        }
    );
    if !quiet {
        println!("{}", BANNER.cyan().bold());
    }

    match cli.command {
        Commands::Scan {
            path,
            fuzz,
            base_url,
            config,
            max_cases,
            depth,
            format,
            output,
            severity,
            seed,
        } => {
            run_scan(ScanArgs {
                path,
                fuzz,
                base_url,
                config,
                max_cases,
                depth,
                format,
                output,
                severity,
                seed,
            })
            .await?;
        }
        Commands::List => {
            list_detectors();
        }
        Commands::Version => {
            println!(
                "{} {}",
                "Route-Sentinel version:".green(),
                env!("CARGO_PKG_VERSION").yellow()
            );
        }
    }

    Ok(())
}

/// Executes the security scan operation.
///
/// This function orchestrates the complete scanning workflow:
/// 1. Discovers API route files below the target directory
/// 2. Analyzes each route file and classifies unprotected sinks
/// 3. Optionally verifies the findings against a running application
/// 4. Merges static and dynamic results into the final report
/// 5. Writes the JSON reports and renders the requested format
async fn run_scan(args: ScanArgs) -> Result<()> {
    let min_severity = match args.severity.as_deref() {
        Some(s) => match Severity::parse(s) {
            Some(severity) => Some(severity),
            None => bail!(
                "invalid severity '{}' (expected critical, high, medium or low)",
                s
            ),
        },
        None => None,
    };

    if !args.path.is_dir() {
        bail!("{} is not a directory", args.path.display());
    }

    let terminal = args.format == OutputFormat::Terminal;
    let output_dir = args.output.clone().unwrap_or_else(|| args.path.clone());

    let config = SecurityConfig::resolve(args.config.as_deref(), &args.path)
        .context("failed to load security config")?;

    if terminal {
        println!(
            "{} {}",
            "[*] Scanning:".green().bold(),
            args.path.display().to_string().yellow()
        );
    }

    let analyzer = RouteAnalyzer::new(&config).with_call_graph_depth(args.depth);
    let routes = analyze_routes(&args.path, &analyzer);

    let registry = DetectorRegistry::new();
    let analysis = AnalysisReport::generate(routes, &registry);
    save_json(&analysis, &output_dir.join(ANALYSIS_REPORT_FILE))?;
    if terminal {
        analysis.print_terminal();
    }

    let fuzz_report = if args.fuzz {
        let report = run_fuzz(&args, &analysis.routes, &config, terminal).await?;
        save_json(&report, &output_dir.join(FUZZ_REPORT_FILE))?;
        Some(report)
    } else {
        None
    };

    let findings =
        FindingAggregator::new(&registry).aggregate(&analysis.vulnerable_routes, fuzz_report.as_ref());
    let report = FinalReport::new(analysis.total_routes, findings);
    save_json(&report, &output_dir.join(FINAL_REPORT_FILE))?;

    let report = match min_severity {
        Some(min) => report.with_min_severity(min),
        None => report,
    };

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Markdown => {
            println!("{}", report.to_markdown());
        }
        OutputFormat::Terminal => {
            report.print_terminal();
            println!("\n{}", "=".repeat(60).cyan());
            report.print_summary();
            println!(
                "{} {}",
                "[+] Reports saved to:".green(),
                output_dir.display().to_string().yellow()
            );
        }
    }

    Ok(())
}

/// Analyzes every discovered route file, skipping files that fail to parse.
fn analyze_routes(root: &Path, analyzer: &RouteAnalyzer) -> Vec<RouteInfo> {
    use indicatif::{ProgressBar, ProgressStyle};

    let files = discover_routes(root);
    if files.is_empty() {
        log::warn!("No API route files found under {}", root.display());
        return Vec::new();
    }

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }

    let mut routes = Vec::with_capacity(files.len());
    for file_path in &files {
        let display = pathdiff::diff_paths(file_path, root).unwrap_or_else(|| file_path.clone());
        pb.set_message(format!("Analyzing {}", display.display()));

        match analyzer.analyze_file(file_path) {
            Ok(route) => routes.push(route),
            Err(e) => {
                log::warn!("Failed to parse {}: {}", display.display(), e);
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    routes
}

/// Runs both fuzz strategies against the configured base URL.
async fn run_fuzz(
    args: &ScanArgs,
    routes: &[RouteInfo],
    config: &SecurityConfig,
    terminal: bool,
) -> Result<FuzzReport> {
    let engine = FuzzEngine::new(FuzzOptions {
        base_url: args.base_url.clone(),
        max_cases: args.max_cases,
        seed: args.seed,
        ..FuzzOptions::default()
    })
    .context("failed to build HTTP client")?;

    if terminal {
        println!(
            "\n{} {}",
            "[*] Fuzzing:".green().bold(),
            engine.options().base_url.yellow()
        );
    }

    let report = engine.run(routes, config).await;

    if terminal {
        println!(
            "    Requests: {} | Confirmed: {} | Rejected: {}",
            report.total_tests, report.vulnerabilities_confirmed, report.vulnerabilities_rejected
        );
    }

    Ok(report)
}

/// Displays all vulnerability rules.
///
/// Prints a formatted list of registered detectors including their
/// IDs, names, severity levels, CWE references, and descriptions.
fn list_detectors() {
    let registry = DetectorRegistry::new();

    println!("{}", "[*] Vulnerability Rules:".green().bold());
    println!("{}", "-".repeat(60).cyan());

    for detector in registry.detectors() {
        println!(
            "  {} {} [{}]",
            detector.id().cyan().bold(),
            detector.name().white(),
            detector.severity().to_string().yellow()
        );
        println!("     {}", detector.description().dimmed());
        if let Some(cwe) = detector.cwe() {
            println!("     {} {}", "Reference:".dimmed(), cwe.blue());
        }
        println!();
    }
}
