//! # Report Generation Module
//!
//! @title Security Report Generator
//! @author Ramprasad
//!
//! Builds the three scan artifacts and renders them to the terminal,
//! Markdown, or JSON files.
//!
//! ## Key Types
//!
//! - [`AnalysisReport`] - Static analysis results (`security-report.json`)
//! - [`crate::fuzz::FuzzReport`] - Live fuzzing results (`fuzzing-report.json`)
//! - [`FinalReport`] - Merged, sorted findings (`final-report.json`)
//! - [`Finding`] / [`Severity`] - Individual findings and their classification

mod aggregate;
mod finding;
mod formatter;

pub use aggregate::FindingAggregator;
pub use finding::{Finding, Severity, VulnerableRoute};
pub use formatter::*;

use crate::analysis::RouteInfo;
use crate::detectors::DetectorRegistry;
use crate::error::{Result, SentinelError};
use colored::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the static analysis report.
pub const ANALYSIS_REPORT_FILE: &str = "security-report.json";

/// File name of the fuzzing report.
pub const FUZZ_REPORT_FILE: &str = "fuzzing-report.json";

/// File name of the merged report.
pub const FINAL_REPORT_FILE: &str = "final-report.json";

/// Current time as an RFC 3339 timestamp.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Result of the static pass over all route files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Number of route files analyzed.
    pub total_routes: usize,

    /// HTTP methods with at least one sink.
    pub routes_with_sinks: usize,

    /// HTTP methods with sinks that are not authenticated.
    pub routes_without_auth: usize,

    pub vulnerable_routes: Vec<VulnerableRoute>,

    pub routes: Vec<RouteInfo>,
}

impl AnalysisReport {
    /// Classifies `routes` and computes the per-method counters.
    pub fn generate(routes: Vec<RouteInfo>, registry: &DetectorRegistry) -> Self {
        let vulnerable_routes = registry.run_all(&routes);

        let methods_with_sinks = routes
            .iter()
            .flat_map(|r| r.method_details.iter())
            .filter(|m| !m.sinks.is_empty());
        let routes_with_sinks = methods_with_sinks.clone().count();
        let routes_without_auth = methods_with_sinks.filter(|m| !m.has_authentication).count();

        Self {
            total_routes: routes.len(),
            routes_with_sinks,
            routes_without_auth,
            vulnerable_routes,
            routes,
        }
    }

    /// Prints the static findings grouped by severity.
    pub fn print_terminal(&self) {
        println!("\n{}", "[*] Static Analysis".cyan().bold());
        println!("    Route files:              {}", self.total_routes);
        println!("    HTTP methods with sinks:  {}", self.routes_with_sinks);
        println!("    HTTP methods without auth: {}", self.routes_without_auth);
        println!(
            "    Vulnerable HTTP methods:  {}",
            self.vulnerable_routes.len()
        );

        if self.vulnerable_routes.is_empty() {
            println!("\n{}", "[+] No vulnerabilities detected.".green().bold());
            return;
        }

        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ] {
            let group: Vec<_> = self
                .vulnerable_routes
                .iter()
                .filter(|v| v.severity == severity)
                .collect();
            if group.is_empty() {
                continue;
            }

            println!("\n{}", severity.colored_label());
            for vuln in group {
                println!(
                    "  {} {} {}",
                    vuln.methods.join(", ").yellow(),
                    vuln.route.blue(),
                    vuln.vulnerability.white().bold()
                );
                println!("     {}", vuln.description.dimmed());
            }
        }
    }
}

/// Summary counters of a [`FinalReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_routes: usize,
    pub total_vulnerabilities: usize,
    pub confirmed_vulnerabilities: usize,
    pub unconfirmed_vulnerabilities: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
}

impl ReportSummary {
    fn from_findings(total_routes: usize, findings: &[Finding]) -> Self {
        let mut summary = ReportSummary {
            total_routes,
            total_vulnerabilities: findings.len(),
            ..Default::default()
        };

        for finding in findings {
            if finding.confirmed {
                summary.confirmed_vulnerabilities += 1;
            } else {
                summary.unconfirmed_vulnerabilities += 1;
            }
            match finding.severity {
                Severity::Critical => summary.critical_count += 1,
                Severity::High => summary.high_count += 1,
                Severity::Medium => summary.medium_count += 1,
                Severity::Low => summary.low_count += 1,
            }
        }

        summary
    }
}

/// Merged static and dynamic findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    pub timestamp: String,
    pub summary: ReportSummary,
    pub findings: Vec<Finding>,
}

impl FinalReport {
    pub fn new(total_routes: usize, findings: Vec<Finding>) -> Self {
        Self {
            timestamp: timestamp(),
            summary: ReportSummary::from_findings(total_routes, &findings),
            findings,
        }
    }

    /// Drops findings below `min` and recomputes the summary.
    pub fn with_min_severity(mut self, min: Severity) -> Self {
        self.findings.retain(|f| f.severity >= min);
        self.summary = ReportSummary::from_findings(self.summary.total_routes, &self.findings);
        self
    }

    /// Prints colorized findings to the terminal.
    pub fn print_terminal(&self) {
        if self.findings.is_empty() {
            println!("\n{}", "[+] No vulnerabilities found.".green().bold());
            return;
        }

        println!("\n{}", "[!] Security Findings:".red().bold());
        println!("{}", "=".repeat(60).cyan());

        for finding in &self.findings {
            finding.print_terminal();
        }
    }

    /// Prints summary statistics to the terminal.
    pub fn print_summary(&self) {
        let s = &self.summary;
        println!(
            "{}",
            format!(
                "[*] Summary: {} Critical | {} High | {} Medium | {} Low",
                s.critical_count, s.high_count, s.medium_count, s.low_count
            )
            .bold()
        );
        println!(
            "    Routes analyzed: {} | Confirmed: {} | Unconfirmed: {}",
            s.total_routes, s.confirmed_vulnerabilities, s.unconfirmed_vulnerabilities
        );

        if s.total_vulnerabilities == 0 {
            println!("{}", "[+] No issues found.".green().bold());
            return;
        }

        let message = format!("[!] Total: {} issue(s) found", s.total_vulnerabilities);
        if s.critical_count > 0 {
            println!("{}", message.red().bold());
        } else if s.high_count > 0 {
            println!("{}", message.yellow().bold());
        } else {
            println!("{}", message.blue().bold());
        }
    }

    /// Converts the report to Markdown format.
    pub fn to_markdown(&self) -> String {
        formatter::to_markdown(self)
    }
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SentinelError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| SentinelError::Write {
        path: path.to_path_buf(),
        source,
    })
}
