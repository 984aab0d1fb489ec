//! Markdown rendering of the final report.

use super::{FinalReport, Finding};
use std::fmt::Write;

/// Renders a [`FinalReport`] as a Markdown document.
pub fn to_markdown(report: &FinalReport) -> String {
    let mut md = String::new();
    let s = &report.summary;

    let _ = writeln!(md, "# Route-Sentinel Security Report\n");
    let _ = writeln!(md, "Generated: `{}`\n", report.timestamp);

    let _ = writeln!(md, "## Summary\n");
    let _ = writeln!(md, "| Metric | Count |");
    let _ = writeln!(md, "|--------|-------|");
    let _ = writeln!(md, "| Routes analyzed | {} |", s.total_routes);
    let _ = writeln!(md, "| Findings | {} |", s.total_vulnerabilities);
    let _ = writeln!(md, "| Confirmed | {} |", s.confirmed_vulnerabilities);
    let _ = writeln!(md, "| Unconfirmed | {} |", s.unconfirmed_vulnerabilities);
    let _ = writeln!(md, "| Critical | {} |", s.critical_count);
    let _ = writeln!(md, "| High | {} |", s.high_count);
    let _ = writeln!(md, "| Medium | {} |", s.medium_count);
    let _ = writeln!(md, "| Low | {} |", s.low_count);

    if report.findings.is_empty() {
        let _ = writeln!(md, "\nNo vulnerabilities found.");
        return md;
    }

    let _ = writeln!(md, "\n## Findings");
    for finding in &report.findings {
        write_finding(&mut md, finding);
    }

    md
}

fn write_finding(md: &mut String, finding: &Finding) {
    let status = if finding.confirmed {
        "**CONFIRMED**"
    } else {
        "unconfirmed"
    };

    let _ = writeln!(md, "\n### #{} {}\n", finding.id, finding.vulnerability);
    let _ = writeln!(md, "{}\n", finding.severity.markdown_badge());
    let _ = writeln!(md, "- **Route:** `{} {}`", finding.method, finding.route);
    let _ = writeln!(md, "- **Status:** {}", status);
    if let Some(ref cwe) = finding.cwe {
        let _ = writeln!(md, "- **Reference:** {}", cwe);
    }
    let _ = writeln!(md, "\n{}\n", finding.description);
    let _ = writeln!(md, "> **Fix:** {}", finding.fix);
}
