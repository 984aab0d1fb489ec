//! # R003: Missing Role Check Detector
//!
//! @title R003 - Missing Role Check
//! @author Ramprasad
//!
//! Detects handlers that read the user table without any role-based
//! authorization check.
//!
//! ## Vulnerability Description
//!
//! Being logged in is not enough to list every user. A route reading the
//! user table should verify an admin (or equivalent) role, otherwise any
//! authenticated user can harvest other users' records.
//!
//! Unlike the other fixed rules this one does not look at
//! `has_authentication`: an authenticated handler without a role check is
//! still reported.
//!
//! ## CWE Reference
//!
//! - CWE-285: Improper Authorization

use super::{create_finding, VulnerabilityDetector};
use crate::analysis::{AuthCheckKind, MethodAnalysis, RouteInfo, SinkKind};
use crate::report::{Severity, VulnerableRoute};

/// Detector for user-table reads without a role check.
pub struct MissingRoleDetector;

impl VulnerabilityDetector for MissingRoleDetector {
    fn id(&self) -> &'static str {
        "R003"
    }

    fn name(&self) -> &'static str {
        "Missing Role Check"
    }

    fn description(&self) -> &'static str {
        "Detects handlers reading the user table without a role-based \
         authorization check."
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-285")
    }

    fn remediation(&self) -> &'static str {
        "Implement role-based access control and verify user roles before allowing access to sensitive data or operations."
    }

    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
        if !method.has_sink(&SinkKind::UserTableRead) || method.has_check(AuthCheckKind::RoleCheck)
        {
            return Vec::new();
        }

        vec![create_finding(
            self,
            route,
            method,
            self.name(),
            self.severity(),
            format!(
                "{} handler reads user table without role-based authorization",
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
    fn test_authenticated_read_without_role() {
        let m = method(
            "GET",
            vec![sink(SinkKind::UserTableRead)],
            true,
            vec![check(AuthCheckKind::SessionCheck)],
        );
        let found = MissingRoleDetector.detect(&route(vec![m.clone()]), &m);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].description,
            "GET handler reads user table without role-based authorization"
        );
    }

    #[test]
    fn test_role_check_suppresses() {
        let m = method(
            "GET",
            vec![sink(SinkKind::UserTableRead)],
            false,
            vec![check(AuthCheckKind::RoleCheck)],
        );
        assert!(MissingRoleDetector.detect(&route(vec![m.clone()]), &m).is_empty());
    }
}
