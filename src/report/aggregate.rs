//! # Finding Aggregation
//!
//! @title Static / Dynamic Finding Merger
//! @author Ramprasad
//!
//! Joins static findings with fuzz results on the
//! `(route, method, vulnerability)` triple, escalates confirmed findings one
//! severity step, appends exploits no static rule predicted, and orders the
//! result most severe first.

use super::{Finding, Severity, VulnerableRoute};
use crate::detectors::DetectorRegistry;
use crate::fuzz::{FuzzReport, FuzzResult};

/// Suffix appended to the description of confirmed findings.
const CONFIRMED_SUFFIX: &str = ". Exploitation confirmed via fuzzing.";

/// Merges static findings with fuzz results.
pub struct FindingAggregator<'r> {
    registry: &'r DetectorRegistry,
}

impl<'r> FindingAggregator<'r> {
    pub fn new(registry: &'r DetectorRegistry) -> Self {
        Self { registry }
    }

    /// Produces the final, sorted finding list.
    ///
    /// Inputs are not modified. Ids are 1-based in emission order (static
    /// findings first, then fuzz-only exploits) and survive the sort.
    pub fn aggregate(
        &self,
        vulnerable: &[VulnerableRoute],
        fuzz: Option<&FuzzReport>,
    ) -> Vec<Finding> {
        let results: &[FuzzResult] = fuzz.map(|r| r.results.as_slice()).unwrap_or(&[]);
        let mut findings: Vec<Finding> = Vec::new();

        for vuln in vulnerable {
            for method in &vuln.methods {
                let confirmed = results.iter().any(|r| {
                    r.exploitable
                        && r.route == vuln.route
                        && &r.method == method
                        && r.vulnerability == vuln.vulnerability
                });

                let (severity, description) = if confirmed {
                    (
                        vuln.severity.escalate(),
                        format!("{}{}", vuln.description, CONFIRMED_SUFFIX),
                    )
                } else {
                    (vuln.severity, vuln.description.clone())
                };

                findings.push(Finding {
                    id: findings.len() + 1,
                    route: vuln.route.clone(),
                    method: method.clone(),
                    vulnerability: vuln.vulnerability.clone(),
                    severity,
                    confirmed,
                    description,
                    fix: self.registry.remediation_for(&vuln.vulnerability).to_string(),
                    cwe: vuln.cwe.clone(),
                });
            }
        }

        for result in results.iter().filter(|r| r.exploitable) {
            let known = findings.iter().any(|f| {
                f.route == result.route
                    && f.method == result.method
                    && f.vulnerability == result.vulnerability
            });
            if known {
                continue;
            }

            log::info!(
                "Fuzzing found {} on {} {} without a static finding",
                result.vulnerability,
                result.method,
                result.route
            );
            findings.push(Finding {
                id: findings.len() + 1,
                route: result.route.clone(),
                method: result.method.clone(),
                vulnerability: result.vulnerability.clone(),
                severity: Severity::High,
                confirmed: true,
                description: result.description.clone(),
                fix: self.registry.remediation_for(&result.vulnerability).to_string(),
                cwe: self
                    .registry
                    .cwe_for(&result.vulnerability)
                    .map(|s| s.to_string()),
            });
        }

        // Stable: insertion order is kept within a severity.
        findings.sort_by_key(|f| f.severity.rank());
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzz::{FuzzRequest, FuzzResponse};
    use std::collections::BTreeMap;

    fn vuln(route: &str, name: &str, severity: Severity) -> VulnerableRoute {
        VulnerableRoute {
            route: route.to_string(),
            file_path: format!("app{}/route.ts", route),
            methods: vec!["POST".to_string()],
            vulnerability: name.to_string(),
            severity,
            description: format!("{} on {}", name, route),
            cwe: None,
        }
    }

    fn fuzz_result(route: &str, name: &str, exploitable: bool) -> FuzzResult {
        FuzzResult {
            route: route.to_string(),
            method: "POST".to_string(),
            vulnerability: name.to_string(),
            request: FuzzRequest {
                url: format!("http://localhost:3000{}", route),
                method: "POST".to_string(),
                headers: BTreeMap::new(),
                body: None,
            },
            response: FuzzResponse {
                status: if exploitable { 201 } else { 401 },
                body: None,
            },
            error: None,
            exploitable,
            description: format!("fuzzed {}", route),
        }
    }

    fn aggregate(vulns: &[VulnerableRoute], results: Vec<FuzzResult>) -> Vec<Finding> {
        let registry = DetectorRegistry::new();
        let report = FuzzReport::from_results(results);
        FindingAggregator::new(&registry).aggregate(vulns, Some(&report))
    }

    #[test]
    fn test_confirmation_escalates() {
        let findings = aggregate(
            &[vuln("/api/tasks", "Missing Authentication", Severity::High)],
            vec![
                fuzz_result("/api/tasks", "Missing Authentication", false),
                fuzz_result("/api/tasks", "Missing Authentication", true),
            ],
        );
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert!(f.confirmed);
        assert_eq!(f.severity, Severity::Critical);
        assert!(f.description.ends_with("Exploitation confirmed via fuzzing."));
        assert_eq!(
            f.fix,
            "Add authentication check to verify user identity before processing requests."
        );
    }

    #[test]
    fn test_unconfirmed_keeps_severity() {
        let findings = aggregate(
            &[vuln("/api/files", "Insecure File Operation", Severity::Medium)],
            vec![fuzz_result("/api/files", "Insecure File Operation", false)],
        );
        assert!(!findings[0].confirmed);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].description, "Insecure File Operation on /api/files");
    }

    #[test]
    fn test_result_for_other_vulnerability_does_not_confirm() {
        let findings = aggregate(
            &[vuln("/api/tasks", "Unsafe Raw SQL Execution", Severity::High)],
            vec![fuzz_result("/api/tasks", "Missing Authentication", true)],
        );
        assert_eq!(findings.len(), 2);
        let raw = findings
            .iter()
            .find(|f| f.vulnerability == "Unsafe Raw SQL Execution")
            .unwrap();
        assert!(!raw.confirmed);
    }

    #[test]
    fn test_fuzz_only_exploit_appended_once() {
        let findings = aggregate(
            &[],
            vec![
                fuzz_result("/api/orphan", "Missing Authentication", true),
                fuzz_result("/api/orphan", "Missing Authentication", true),
                fuzz_result("/api/orphan", "Missing Authentication", false),
            ],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert!(findings[0].confirmed);
        assert_eq!(findings[0].description, "fuzzed /api/orphan");
        assert_eq!(findings[0].cwe.as_deref(), Some("CWE-306"));
    }

    #[test]
    fn test_sorted_by_rank_and_stable() {
        let findings = aggregate(
            &[
                vuln("/api/a", "Insecure File Operation", Severity::Medium),
                vuln("/api/b", "Missing Authentication", Severity::High),
                vuln("/api/c", "Insecure low", Severity::Low),
                vuln("/api/d", "Missing Role Check", Severity::High),
                vuln("/api/e", "Missing Authentication", Severity::High),
            ],
            vec![fuzz_result("/api/e", "Missing Authentication", true)],
        );

        for pair in findings.windows(2) {
            assert!(pair[0].severity.rank() <= pair[1].severity.rank());
        }
        let routes: Vec<_> = findings.iter().map(|f| f.route.as_str()).collect();
        assert_eq!(routes, vec!["/api/e", "/api/b", "/api/d", "/api/a", "/api/c"]);
        assert_eq!(findings[0].id, 5);
    }

    #[test]
    fn test_cwe_carried_from_static_finding() {
        let mut file_op = vuln("/api/upload", "Insecure File Operation", Severity::Medium);
        file_op.cwe = Some("CWE-73".to_string());
        let findings = aggregate(&[file_op], vec![]);
        assert_eq!(findings[0].cwe.as_deref(), Some("CWE-73"));
    }

    #[test]
    fn test_without_fuzz_report() {
        let registry = DetectorRegistry::new();
        let vulns = [vuln("/api/tasks", "Missing Authentication", Severity::High)];
        let findings = FindingAggregator::new(&registry).aggregate(&vulns, None);
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].confirmed);
        assert_eq!(findings[0].severity, Severity::High);
    }
}
