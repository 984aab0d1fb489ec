//! # R002: Missing Authentication Detector
//!
//! @title R002 - Missing Authentication
//! @author Ramprasad
//!
//! Detects handlers that write to the database without an authentication
//! guard.
//!
//! ## Vulnerability Description
//!
//! A route that creates, updates or deletes records must first establish
//! who the caller is. Without a session check any anonymous client can
//! mutate application data.
//!
//! ## CWE Reference
//!
//! - CWE-306: Missing Authentication for Critical Function

use super::{create_finding, VulnerabilityDetector};
use crate::analysis::{MethodAnalysis, RouteInfo, SinkKind};
use crate::report::{Severity, VulnerableRoute};

/// Detector for unauthenticated database writes.
pub struct MissingAuthDetector;

impl VulnerabilityDetector for MissingAuthDetector {
    fn id(&self) -> &'static str {
        "R002"
    }

    fn name(&self) -> &'static str {
        "Missing Authentication"
    }

    fn description(&self) -> &'static str {
        "Detects handlers performing database writes that can be reached \
         without passing an authentication check."
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn cwe(&self) -> Option<&'static str> {
        Some("CWE-306")
    }

    fn requires_missing_auth(&self) -> bool {
        true
    }

    fn remediation(&self) -> &'static str {
        "Add authentication check to verify user identity before processing requests."
    }

    fn detect(&self, route: &RouteInfo, method: &MethodAnalysis) -> Vec<VulnerableRoute> {
        if !method.has_sink(&SinkKind::DatabaseWrite) || method.has_authentication {
            return Vec::new();
        }

        vec![create_finding(
            self,
            route,
            method,
            self.name(),
            self.severity(),
            format!(
                "{} handler performs database writes without authentication checks",
                method.method
            ),
        )]
    }
}
