//! # Finding and Severity Definitions
//!
//! @title Security Finding Data Structures
//! @author Ramprasad
//!
//! Defines the core data structures for representing security findings
//! and their severity classification.

use colored::*;
use serde::{Deserialize, Serialize};

/// Severity level classification for security findings.
///
/// Ordered from lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity, minimal security impact.
    Low = 0,

    /// Medium severity, moderate security impact.
    Medium = 1,

    /// High severity, significant security impact.
    High = 2,

    /// Critical severity, severe security impact.
    Critical = 3,
}

impl Severity {
    /// Parses a severity level from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of severity
    ///
    /// # Returns
    ///
    /// The corresponding `Severity` variant, or `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    /// Raises the severity one step, saturating at `Critical`.
    ///
    /// Applied when a static finding is confirmed by live fuzzing.
    pub fn escalate(self) -> Self {
        match self {
            Severity::Critical | Severity::High => Severity::Critical,
            Severity::Medium => Severity::High,
            Severity::Low => Severity::Medium,
        }
    }

    /// Sort rank used for report ordering, `0` being the most severe.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// Returns a colored label for terminal output.
    pub fn colored_label(&self) -> ColoredString {
        match self {
            Severity::Critical => "CRITICAL".white().on_red().bold(),
            Severity::High => "HIGH".black().on_yellow().bold(),
            Severity::Medium => "MEDIUM".white().on_bright_blue().bold(),
            Severity::Low => "LOW".black().on_white().bold(),
        }
    }

    /// Returns a Markdown badge for the severity.
    pub fn markdown_badge(&self) -> &'static str {
        match self {
            Severity::Critical => {
                "![Critical](https://img.shields.io/badge/severity-CRITICAL-red)"
            }
            Severity::High => "![High](https://img.shields.io/badge/severity-HIGH-orange)",
            Severity::Medium => "![Medium](https://img.shields.io/badge/severity-MEDIUM-yellow)",
            Severity::Low => "![Low](https://img.shields.io/badge/severity-LOW-blue)",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// A statically detected vulnerability on one route.
///
/// Produced by the detector registry and never edited afterwards; the
/// aggregator derives new [`Finding`] values from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerableRoute {
    /// URL path of the route (e.g. `/api/tasks`).
    pub route: String,

    /// Source file the route was discovered in.
    pub file_path: String,

    /// HTTP methods the finding applies to.
    pub methods: Vec<String>,

    /// Vulnerability name, also used as the key for fuzz confirmation.
    pub vulnerability: String,

    /// Severity before any dynamic confirmation.
    pub severity: Severity,

    /// Human readable description.
    pub description: String,

    /// CWE identifier of the rule that fired, if applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwe: Option<String>,
}

/// A final, possibly fuzz-confirmed, security finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Sequential identifier within the final report (1-based).
    pub id: usize,

    /// URL path of the route.
    pub route: String,

    /// HTTP method.
    pub method: String,

    /// Vulnerability name.
    pub vulnerability: String,

    /// Severity after escalation.
    pub severity: Severity,

    /// Whether a live request demonstrated the issue.
    pub confirmed: bool,

    /// Detailed description of the vulnerability.
    pub description: String,

    /// Remediation guidance.
    pub fix: String,

    /// CWE (Common Weakness Enumeration) identifier if applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwe: Option<String>,
}

impl Finding {
    /// Prints the finding to terminal with color formatting.
    pub fn print_terminal(&self) {
        println!();
        println!(
            "{} {} {}",
            format!("#{}", self.id).cyan().bold(),
            self.severity.colored_label(),
            self.vulnerability.white().bold()
        );

        let status = if self.confirmed {
            "CONFIRMED".red().bold()
        } else {
            "UNCONFIRMED".dimmed()
        };

        println!(
            "   {} {} {}",
            "Route:".dimmed(),
            self.method.yellow(),
            self.route.blue()
        );
        println!("   {} {}", "Status:".dimmed(), status);

        if let Some(ref cwe) = self.cwe {
            println!("   {} {}", "Reference:".dimmed(), cwe.blue());
        }

        for line in self.description.lines() {
            println!("   {}", line.dimmed());
        }

        println!("\n   {}", "Fix:".green());
        for line in self.fix.lines().take(3) {
            println!("   {}", line.green().dimmed());
        }

        println!("{}", "-".repeat(60).dimmed());
    }
}
