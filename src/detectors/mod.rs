//! # Vulnerability Detector Module
//!
//! @title Vulnerability Classification Framework
//! @author Ramprasad
//!
//! This module provides the rule table that turns analyzed routes into
//! static findings.
//!
//! ## Architecture
//!
//! All rules implement the [`VulnerabilityDetector`] trait and are evaluated
//! independently, in registry order, against every [`MethodAnalysis`]. Several
//! rules may fire for the same method; each match is a separate
//! [`VulnerableRoute`].
//!
//! ## Available Detectors
//!
//! | ID | Name | Severity |
//! |----|------|----------|
//! | R001 | Unsafe Raw SQL Execution | High |
//! | R002 | Missing Authentication | High |
//! | R003 | Missing Role Check | High |
//! | R004 | Insecure File Operation | Medium |
//! | R005 | Insecure {custom sink} | configured |
//! | R006 | Missing Authorization for {custom sink} | configured |

mod custom_authorization;
mod custom_sink;
mod file_operation;
mod missing_auth;
mod missing_role;
mod raw_sql;

pub use custom_authorization::CustomAuthorizationDetector;
pub use custom_sink::CustomSinkDetector;
pub use file_operation::FileOperationDetector;
pub use missing_auth::MissingAuthDetector;
pub use missing_role::MissingRoleDetector;
pub use raw_sql::RawSqlDetector;

use crate::analysis::{MethodAnalysis, RouteInfo};
use crate::report::{Severity, VulnerableRoute};

/// Fix text for vulnerabilities without a dedicated rule.
pub const GENERIC_REMEDIATION: &str =
    "Review the endpoint and implement appropriate security controls.";

/// Trait for implementing vulnerability detectors.
///
/// All detectors must implement this trait to be registered with the
/// [`DetectorRegistry`].
///
/// # Example Implementation
///
/// ```rust,ignore
/// pub struct MyDetector;
///
/// impl VulnerabilityDetector for MyDetector {
///     fn id(&self) -> &'static str { "R999" }
///     fn name(&self) -> &'static str { "My Vulnerability" }
///     fn description(&self) -> &'static str { "Detects my vulnerability" }
///     fn severity(&self) -> Severity { Severity::High }
///     fn remediation(&self) -> &'static str { "Fix the issue" }
///
///     fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
///         Vec::new()
///     }
/// }
/// ```
pub trait VulnerabilityDetector: Send + Sync {
    /// Returns the unique identifier for this detector.
    ///
    /// Format: "Rnnn" where nnn is a zero-padded number (e.g., "R001").
    fn id(&self) -> &'static str;

    /// Returns the vulnerability name carried by findings.
    ///
    /// Rules over custom sinks derive the final name from the sink, so this
    /// is only a label for listings.
    fn name(&self) -> &'static str;

    /// Returns a detailed description of what this detector looks for.
    fn description(&self) -> &'static str;

    /// Returns the default severity level for findings from this detector.
    fn severity(&self) -> Severity;

    /// Evaluates the rule against one analyzed HTTP method.
    ///
    /// # Arguments
    ///
    /// * `route` - The route file the method belongs to
    /// * `method` - The method's analysis
    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute>;

    /// Returns the CWE (Common Weakness Enumeration) ID if applicable.
    fn cwe(&self) -> Option<&'static str> {
        None
    }

    /// Whether the rule only fires on methods without authentication.
    ///
    /// Findings of such rules are what an anonymous request can confirm.
    fn requires_missing_auth(&self) -> bool {
        false
    }

    /// Returns remediation advice for addressing this vulnerability.
    fn remediation(&self) -> &'static str;
}

/// Registry containing all available vulnerability detectors.
///
/// # Example
///
/// ```rust,ignore
/// let registry = DetectorRegistry::new();
/// let vulnerable = registry.run_all(&routes);
/// ```
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn VulnerabilityDetector>>,
}

impl DetectorRegistry {
    /// Creates a new registry with all default detectors, in rule order.
    pub fn new() -> Self {
        let detectors: Vec<Box<dyn VulnerabilityDetector>> = vec![
            Box::new(RawSqlDetector),
            Box::new(MissingAuthDetector),
            Box::new(MissingRoleDetector),
            Box::new(FileOperationDetector),
            Box::new(CustomSinkDetector),
            Box::new(CustomAuthorizationDetector),
        ];

        Self { detectors }
    }

    /// Returns a reference to all registered detectors.
    pub fn detectors(&self) -> &[Box<dyn VulnerabilityDetector>] {
        &self.detectors
    }

    /// Runs all detectors over every method of every route.
    ///
    /// Output order is route, then method, then rule order. No sorting is
    /// applied; the aggregator orders the final list.
    pub fn run_all(&self, routes: &[RouteInfo]) -> Vec<VulnerableRoute> {
        let mut vulnerable = Vec::new();

        for route in routes {
            for method in &route.method_details {
                for detector in &self.detectors {
                    vulnerable.extend(detector.detect(route, method));
                }
            }
        }

        vulnerable
    }

    /// Runs a specific detector by its ID.
    pub fn run_by_id(&self, id: &str, routes: &[RouteInfo]) -> Vec<VulnerableRoute> {
        let Some(detector) = self.get_detector(id) else {
            return Vec::new();
        };

        routes
            .iter()
            .flat_map(|route| {
                route
                    .method_details
                    .iter()
                    .flat_map(move |method| detector.detect(route, method))
            })
            .collect()
    }

    /// Retrieves a detector by its ID.
    pub fn get_detector(&self, id: &str) -> Option<&dyn VulnerabilityDetector> {
        self.detectors
            .iter()
            .find(|d| d.id() == id)
            .map(|d| d.as_ref())
    }

    /// Fix text for a vulnerability name.
    ///
    /// Names produced by a fixed-name rule get that rule's remediation;
    /// anything else gets [`GENERIC_REMEDIATION`].
    pub fn remediation_for(&self, vulnerability: &str) -> &'static str {
        self.detectors
            .iter()
            .find(|d| d.name() == vulnerability)
            .map(|d| d.remediation())
            .unwrap_or(GENERIC_REMEDIATION)
    }

    /// Names of the findings `method` has only because it is unauthenticated.
    ///
    /// Rule order, duplicates removed.
    pub fn unauthenticated_vulnerabilities(
        &self,
        route: &RouteInfo,
        method: &MethodAnalysis,
    ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for detector in self.detectors.iter().filter(|d| d.requires_missing_auth()) {
            for found in detector.detect(route, method) {
                if !names.contains(&found.vulnerability) {
                    names.push(found.vulnerability);
                }
            }
        }
        names
    }

    /// CWE reference for a fixed rule name, if the rule carries one.
    pub fn cwe_for(&self, vulnerability: &str) -> Option<&'static str> {
        self.detectors
            .iter()
            .find(|d| d.name() == vulnerability)
            .and_then(|d| d.cwe())
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper function to create a static finding for one method.
///
/// # Arguments
///
/// * `detector` - The rule that fired (supplies the CWE reference)
/// * `route` - The analyzed route file
/// * `method` - The method the rule fired on
/// * `vulnerability` - Vulnerability name (the confirmation key)
/// * `severity` - Severity before confirmation
/// * `description` - Human readable description
pub fn create_finding(
    detector: &dyn VulnerabilityDetector,
    route: &RouteInfo,
    method: &MethodAnalysis,
    vulnerability: impl Into<String>,
    severity: Severity,
    description: String,
) -> VulnerableRoute {
    VulnerableRoute {
        route: route.route_path.clone(),
        file_path: route.file_path.clone(),
        methods: vec![method.method.clone()],
        vulnerability: vulnerability.into(),
        severity,
        description,
        cwe: detector.cwe().map(|s| s.to_string()),
    }
}
