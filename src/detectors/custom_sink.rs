//! # R005: Insecure Custom Sink Detector
//!
//! @title R005 - Insecure {custom sink}
//! @author Ramprasad
//!
//! Reports every operator-defined sink reached by an unauthenticated
//! handler. The finding is named `Insecure {sink name}` and carries the
//! severity configured for the sink.

use super::{create_finding, VulnerabilityDetector, GENERIC_REMEDIATION};
use crate::analysis::{MethodAnalysis, RouteInfo};
use crate::report::{Severity, VulnerableRoute};

/// Detector for custom sinks without authentication.
pub struct CustomSinkDetector;

impl VulnerabilityDetector for CustomSinkDetector {
    fn id(&self) -> &'static str {
        "R005"
    }

    fn name(&self) -> &'static str {
        "Insecure Custom Sink"
    }

    fn description(&self) -> &'static str {
        "Detects operator-defined sensitive calls reachable without an \
         authentication check."
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn requires_missing_auth(&self) -> bool {
        true
    }

    fn remediation(&self) -> &'static str {
        GENERIC_REMEDIATION
    }

    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
        if method.has_authentication {
            return Vec::new();
        }

        method
            .sinks
            .iter()
            .filter_map(|sink| {
                let severity = sink.custom_severity()?;
                Some(create_finding(
                    self,
                    route,
                    method,
                    format!("Insecure {}", sink.kind),
                    severity,
                    format!(
                        "{} handler uses {} without authentication checks",
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
    use crate::analysis::SinkKind;
    use crate::detectors::test_support::*;

    #[test]
    fn test_one_finding_per_custom_sink() {
        let m = method(
            "POST",
            vec![
                custom("payment_charge", Severity::Critical),
                sink(SinkKind::DatabaseWrite),
                custom("email_send", Severity::Low),
            ],
            false,
            vec![],
        );
        let found = CustomSinkDetector.detect(&route(vec![m.clone()]), &m);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].vulnerability, "Insecure payment_charge");
        assert_eq!(found[0].severity, Severity::Critical);
        assert_eq!(found[1].vulnerability, "Insecure email_send");
        assert_eq!(found[1].severity, Severity::Low);
    }

    #[test]
    fn test_authenticated_is_clean() {
        let m = method("POST", vec![custom("payment_charge", Severity::High)], true, vec![]);
        assert!(CustomSinkDetector.detect(&route(vec![m.clone()]), &m).is_empty());
    }
}
