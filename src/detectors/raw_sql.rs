//! # R001: Unsafe Raw SQL Execution Detector
//!
//! @title R001 - Unsafe Raw SQL Execution
//! @author Ramprasad
//!
//! Detects handlers that run mutating raw SQL (`DELETE`, `UPDATE`, `DROP`,
//! ...) through `$executeRaw`/`$queryRaw` style calls without an
//! authentication guard.
//!
//! ## Detection Strategy
//!
//! 1. The method has at least one `raw_sql` sink
//! 2. The method is not authenticated (some sink is unguarded and no auth
//!    middleware wraps the route)
//!
//! ## CWE Reference
//!
//! - CWE-89: SQL Injection

use super::{create_finding, VulnerabilityDetector};
use crate::analysis::{MethodAnalysis, RouteInfo, SinkKind};
use crate::report::{Severity, VulnerableRoute};

/// Detector for unauthenticated raw SQL execution.
pub struct RawSqlDetector;

impl VulnerabilityDetector for RawSqlDetector {
    fn id(&self) -> &'static str {
        "R001"
    }

    fn name(&self) -> &'static str {
        "Unsafe Raw SQL Execution"
    }

    fn description(&self) -> &'static str {
        "Detects handlers executing raw SQL with dangerous commands that can be \
         reached without passing an authentication check."
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-89")
    }

    fn requires_missing_auth(&self) -> bool {
        true
    }

    fn remediation(&self) -> &'static str {
        "Make sure the raw SQL is protected by correct authentication and authorization checks."
    }

    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
        if !method.has_sink(&SinkKind::RawSql) || method.has_authentication {
            return Vec::new();
        }

        vec![create_finding(
            self,
            route,
            method,
            self.name(),
            self.severity(),
            format!(
                "{} handler executes raw SQL with dangerous commands without authentication checks",
                method.method
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::*;

    #[test]
    fn test_unauthenticated_raw_sql() {
        let m = method("DELETE", vec![sink(SinkKind::RawSql)], false, vec![]);
        let found = RawSqlDetector.detect(&route(vec![m.clone()]), &m);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        assert_eq!(
            found[0].description,
            "DELETE handler executes raw SQL with dangerous commands without authentication checks"
        );
    }

    #[test]
    fn test_authenticated_raw_sql_is_clean() {
        let m = method("DELETE", vec![sink(SinkKind::RawSql)], true, vec![]);
        assert!(RawSqlDetector.detect(&route(vec![m.clone()]), &m).is_empty());
    }
}
