//! # Missing Authentication Fuzzer
//!
//! @title Unauthenticated Request Fuzzer
//! @author Ramprasad
//!
//! Targets every method that is not authenticated and reaches a sensitive
//! sink. Sends randomized bodies without any credentials; a 2xx response
//! proves the route accepts anonymous writes. Results are named after the
//! static rules that fired because the method is unauthenticated, so
//! `Insecure File Operation` or `Insecure {sink}` get confirmed too.

use super::cases::{body_parameters, generate_case};
use super::{FuzzEngine, FuzzReport, FuzzResult};
use crate::analysis::{MethodAnalysis, RouteInfo, SinkKind};
use crate::detectors::DetectorRegistry;
use crate::report::Severity;

/// Fallback result name for targets no auth-dependent rule reported.
pub const MISSING_AUTHENTICATION: &str = "Missing Authentication";

/// Writes and session or file mutations, plus custom sinks of medium
/// severity or above.
fn is_sensitive(kind: &SinkKind) -> bool {
    match kind {
        SinkKind::DatabaseWrite | SinkKind::SessionModify | SinkKind::FileWrite => true,
        SinkKind::Custom { severity, .. } => *severity >= Severity::Medium,
        _ => false,
    }
}

/// Does the method qualify for unauthenticated probing?
pub(crate) fn is_target(method: &MethodAnalysis) -> bool {
    !method.has_authentication && method.sinks.iter().any(|s| is_sensitive(&s.kind))
}

/// Vulnerability names an anonymous request to `method` would confirm.
///
/// The auth-dependent rules that fired for the method, or
/// [`MISSING_AUTHENTICATION`] when none did (a session-only mutation).
pub(crate) fn target_vulnerabilities(
    registry: &DetectorRegistry,
    route: &RouteInfo,
    method: &MethodAnalysis,
) -> Vec<String> {
    let names = registry.unauthenticated_vulnerabilities(route, method);
    if names.is_empty() {
        vec![MISSING_AUTHENTICATION.to_string()]
    } else {
        names
    }
}

impl FuzzEngine {
    /// Fuzzes unauthenticated methods with sensitive sinks.
    ///
    /// Each vulnerability the method carries gets up to `max_cases` cases,
    /// stopping at the first exploitable response. Every attempt is
    /// recorded under that vulnerability's name.
    pub async fn fuzz_missing_authentication(&self, routes: &[RouteInfo]) -> FuzzReport {
        let registry = DetectorRegistry::new();
        let mut results = Vec::new();
        let mut rng = self.rng();

        for route in routes {
            let body_params = body_parameters(&route.parameters);
            let route_path = &route.route_path;

            for method in route.method_details.iter().filter(|m| is_target(m)) {
                for vulnerability in target_vulnerabilities(&registry, route, method) {
                    log::info!("Fuzzing {} {} - {}", method.method, route_path, vulnerability);

                    for _ in 0..self.options.max_cases {
                        let case = generate_case(&body_params, &mut rng);
                        let exchange = self.send(route_path, &method.method, case).await;
                        let status = exchange.response.status;
                        let exploitable = exchange.response.is_success();

                        let description = if exploitable {
                            format!(
                                "Successfully accessed {} {} without authentication. Response: {}",
                                method.method, route_path, status
                            )
                        } else {
                            format!(
                                "Request to {} {} was rejected with status {}",
                                method.method, route_path, status
                            )
                        };

                        results.push(FuzzResult {
                            route: route_path.clone(),
                            method: method.method.clone(),
                            vulnerability: vulnerability.clone(),
                            request: exchange.request,
                            response: exchange.response,
                            error: exchange.error,
                            exploitable,
                            description,
                        });

                        if exploitable {
                            log::info!(
                                "VULN CONFIRMED: {} {} - {} (Status: {})",
                                method.method,
                                route_path,
                                vulnerability,
                                status
                            );
                            break;
                        }
                        log::debug!(
                            "Protected: {} {} (Status: {})",
                            method.method,
                            route_path,
                            status
                        );
                    }
                }
            }
        }

        FuzzReport::from_results(results)
    }
}
