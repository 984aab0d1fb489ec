//! # R004: Insecure File Operation Detector
//!
//! @title R004 - Insecure File Operation
//! @author Ramprasad
//!
//! Detects handlers that write or delete files on the server without an
//! authentication guard.
//!
//! ## CWE Reference
//!
//! - CWE-73: External Control of File Name or Path

use super::{create_finding, VulnerabilityDetector};
use crate::analysis::{MethodAnalysis, RouteInfo, SinkKind};
use crate::report::{Severity, VulnerableRoute};

/// Detector for unauthenticated file writes.
pub struct FileOperationDetector;

impl VulnerabilityDetector for FileOperationDetector {
    fn id(&self) -> &'static str {
        "R004"
    }

    fn name(&self) -> &'static str {
        "Insecure File Operation"
    }

    fn description(&self) -> &'static str {
        "Detects handlers writing, appending or removing files without an \
         authentication check."
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-73")
    }

    fn requires_missing_auth(&self) -> bool {
        true
    }

    fn remediation(&self) -> &'static str {
        "Make sure the file operation is protected by correct authentication and authorization checks."
    }

    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
        if !method.has_sink(&SinkKind::FileWrite) || method.has_authentication {
            return Vec::new();
        }

        vec![create_finding(
            self,
            route,
            method,
            self.name(),
            self.severity(),
            format!(
                "{} handler performs file writes without authentication",
                method.method
            ),
        )]
    }
}
