//! # R006: Missing Authorization for Custom Sink Detector
//!
//! @title R006 - Missing Authorization for {custom sink}
//! @author Ramprasad
//!
//! For high and critical custom sinks, authentication alone is not enough:
//! the handler must also check a role or resource ownership.
//!
//! ## Detection Strategy
//!
//! 1. The method is authenticated
//! 2. It reaches a custom sink configured as `high` or `critical`
//! 3. No `role_check` and no `ownership_check` was extracted for the method
//!
//! ## CWE Reference
//!
//! - CWE-862: Missing Authorization

use super::{create_finding, VulnerabilityDetector, GENERIC_REMEDIATION};
use crate::analysis::{AuthCheckKind, MethodAnalysis, RouteInfo};
use crate::report::{Severity, VulnerableRoute};

/// Detector for authenticated but unauthorized custom sinks.
pub struct CustomAuthorizationDetector;

impl VulnerabilityDetector for CustomAuthorizationDetector {
    fn id(&self) -> &'static str {
        "R006"
    }

    fn name(&self) -> &'static str {
        "Missing Authorization for Custom Sink"
    }

    fn description(&self) -> &'static str {
        "Detects high or critical custom sinks behind authentication but \
         without a role or ownership check."
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-862")
    }

    fn remediation(&self) -> &'static str {
        GENERIC_REMEDIATION
    }

    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
        if !method.has_authentication
            || method.has_check(AuthCheckKind::OwnershipCheck)
            || method.has_check(AuthCheckKind::RoleCheck)
        {
            return Vec::new();
        }

        method
            .sinks
            .iter()
            .filter_map(|sink| {
                let severity = sink.custom_severity().filter(|s| *s >= Severity::High)?;
                Some(create_finding(
                    self,
                    route,
                    method,
                    format!("Missing Authorization for {}", sink.kind),
                    severity,
                    format!(
                        "{} handler uses {} with authentication but without proper \
                         authorization checks (role or ownership validation)",
                        method.method, sink.kind
                    ),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::*;

    #[test]
    fn test_high_custom_sink_without_authorization() {
        let m = method(
            "DELETE",
            vec![
                custom("account_purge", Severity::Critical),
                custom("audit_log", Severity::Medium),
            ],
            true,
            vec![check(AuthCheckKind::SessionCheck)],
        );
        let found = CustomAuthorizationDetector.detect(&route(vec![m.clone()]), &m);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vulnerability, "Missing Authorization for account_purge");
        assert_eq!(found[0].severity, Severity::Critical);
    }

    #[test]
    fn test_ownership_or_role_check_suppresses() {
        for kind in [AuthCheckKind::OwnershipCheck, AuthCheckKind::RoleCheck] {
            let m = method(
                "DELETE",
                vec![custom("account_purge", Severity::High)],
                true,
                vec![check(kind)],
            );
            assert!(CustomAuthorizationDetector
                .detect(&route(vec![m.clone()]), &m)
                .is_empty());
        }
    }

    #[test]
    fn test_unauthenticated_left_to_insecure_rule() {
        let m = method("DELETE", vec![custom("account_purge", Severity::High)], false, vec![]);
        assert!(CustomAuthorizationDetector
            .detect(&route(vec![m.clone()]), &m)
            .is_empty());
    }
}
