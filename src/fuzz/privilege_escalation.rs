//! # Privilege Escalation Fuzzer
//!
//! @title Non-Admin Session Fuzzer
//! @author Ramprasad
//!
//! Replays user-table reads and high-severity custom sinks with a regular
//! user's session cookie. A 2xx status alone is not enough: the response
//! must also leak sensitive user fields.

use super::{FuzzCase, FuzzEngine, FuzzReport, FuzzResult};
use crate::analysis::{MethodAnalysis, RouteInfo, SinkKind};
use crate::config::SecurityConfig;
use crate::report::Severity;
use serde_json::Value;

/// Keys (compared lower-case) that mark a record as sensitive user data.
const SENSITIVE_FIELDS: &[&str] = &["emailverified", "password", "passwordhash"];

/// True if `body` is an object, or an array containing an object, with a
/// sensitive key.
pub fn contains_user_data(body: &Value) -> bool {
    fn has_sensitive_key(value: &Value) -> bool {
        value.as_object().is_some_and(|object| {
            object
                .keys()
                .any(|key| SENSITIVE_FIELDS.contains(&key.to_lowercase().as_str()))
        })
    }

    match body {
        Value::Array(items) => items.iter().any(has_sensitive_key),
        other => has_sensitive_key(other),
    }
}

/// Name of the static finding a request to `method` verifies, if any.
///
/// User-table reads verify the role-check rule; otherwise the first high or
/// critical custom sink names the authorization rule.
pub(crate) fn target_vulnerability(method: &MethodAnalysis) -> Option<String> {
    if method.has_sink(&SinkKind::UserTableRead) {
        return Some("Missing Role Check".to_string());
    }

    method.sinks.iter().find_map(|sink| match &sink.kind {
        SinkKind::Custom { name, severity } if *severity >= Severity::High => {
            Some(format!("Missing Authorization for {}", name))
        }
        _ => None,
    })
}

impl FuzzEngine {
    /// Tests sensitive reads with a non-admin session.
    ///
    /// Returns an empty report when no user session token is configured.
    pub async fn fuzz_privilege_escalation(
        &self,
        routes: &[RouteInfo],
        config: &SecurityConfig,
    ) -> FuzzReport {
        let Some(token) = config.user_token() else {
            log::info!("No user session token configured. Skipping privilege escalation testing.");
            return FuzzReport::empty();
        };

        let mut results = Vec::new();

        for route in routes {
            for method in &route.method_details {
                let Some(vulnerability) = target_vulnerability(method) else {
                    continue;
                };
                let route_path = &route.route_path;
                log::info!(
                    "Fuzzing {} {} - Privilege Escalation (non-admin session)",
                    method.method,
                    route_path
                );

                let mut case = FuzzCase::json();
                case.headers.insert(
                    "Cookie".to_string(),
                    format!("{}={}", self.options.session_cookie, token),
                );

                let exchange = self.send(route_path, &method.method, case).await;
                let status = exchange.response.status;
                let success = exchange.response.is_success();
                let leaked = exchange
                    .response
                    .body
                    .as_ref()
                    .is_some_and(contains_user_data);
                let exploitable = success && leaked;

                let description = if exploitable {
                    format!(
                        "Non-admin user successfully accessed user table at {} {}. \
                         Sensitive user data exposed in response.",
                        method.method, route_path
                    )
                } else if !success {
                    format!(
                        "Non-admin user was denied access to user table at {} {}. Status: {}",
                        method.method, route_path, status
                    )
                } else {
                    format!(
                        "Request succeeded but no sensitive user data found in response at {} {}. Status: {}",
                        method.method, route_path, status
                    )
                };

                if exploitable {
                    log::info!(
                        "VULNERABILITY CONFIRMED: Non-admin accessed {} {} (Status: {})",
                        method.method,
                        route_path,
                        status
                    );
                } else {
                    log::debug!("Protected: {} {} (Status: {})", method.method, route_path, status);
                }

                results.push(FuzzResult {
                    route: route_path.clone(),
                    method: method.method.clone(),
                    vulnerability,
                    request: exchange.request,
                    response: exchange.response,
                    error: exchange.error,
                    exploitable,
                    description,
                });
            }
        }

        FuzzReport::from_results(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Sink;
    use serde_json::json;

    #[test]
    fn test_contains_user_data() {
        assert!(contains_user_data(&json!([{ "id": 1, "passwordHash": "x" }])));
        assert!(contains_user_data(&json!({ "EmailVerified": true })));
        assert!(contains_user_data(&json!(["a", { "password": "p" }])));
        assert!(!contains_user_data(&json!([
            { "id": "user-123", "name": "Regular User", "email": "user@example.com", "role": "user" }
        ])));
        assert!(!contains_user_data(&json!("password")));
        assert!(!contains_user_data(&json!({ "user": { "password": "nested" } })));
        assert!(!contains_user_data(&Value::Null));
    }

    #[test]
    fn test_target_vulnerability_naming() {
        let with = |kinds: Vec<SinkKind>| MethodAnalysis {
            method: "GET".into(),
            sinks: kinds.into_iter().map(|k| Sink::direct(k, 1, "c")).collect(),
            has_authentication: true,
            authorization_checks: vec![],
        };
        let custom = |name: &str, severity| SinkKind::Custom {
            name: name.into(),
            severity,
        };

        assert_eq!(
            target_vulnerability(&with(vec![SinkKind::UserTableRead])).as_deref(),
            Some("Missing Role Check")
        );
        assert_eq!(
            target_vulnerability(&with(vec![
                custom("audit", Severity::Medium),
                custom("payout", Severity::Critical)
            ]))
            .as_deref(),
            Some("Missing Authorization for payout")
        );
        assert_eq!(target_vulnerability(&with(vec![SinkKind::DatabaseWrite])), None);
    }
}
