//! # Fuzz Module
//!
//! @title Live Exploit Verification Engine
//! @author Ramprasad
//!
//! Re-verifies static findings by sending crafted requests to a running
//! instance of the target application.
//!
//! ## Strategies
//!
//! - **Missing authentication**: randomized bodies, no credentials, stop on
//!   the first 2xx per method.
//! - **Privilege escalation**: one request with a non-admin session cookie,
//!   exploitable only when sensitive user fields come back.
//!
//! Requests are sent strictly one after another. A failed request is
//! recorded as a result with status `0` and never aborts the run.

mod cases;
mod missing_auth;
mod privilege_escalation;

pub use cases::{body_parameters, generate_case};
pub use privilege_escalation::contains_user_data;

use crate::analysis::RouteInfo;
use crate::config::SecurityConfig;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default address of the application under test.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default number of generated cases per method.
pub const DEFAULT_MAX_CASES: usize = 1000;

/// Cookie carrying the session token in privilege-escalation requests.
pub const DEFAULT_SESSION_COOKIE: &str = "sessionToken";

/// Headers and optional JSON body for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzCase {
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl FuzzCase {
    /// A case with only `Content-Type: application/json`.
    pub fn json() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            headers,
            body: None,
        }
    }
}

/// The literal request that was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// The observed response; status `0` when the request failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzResponse {
    pub status: u16,

    /// Parsed JSON when possible, raw text otherwise, `None` when empty.
    pub body: Option<Value>,
}

impl FuzzResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request and its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzResult {
    /// URL path of the route.
    pub route: String,
    pub method: String,

    /// Name of the static vulnerability this request verifies.
    pub vulnerability: String,
    pub request: FuzzRequest,
    pub response: FuzzResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exploitable: bool,
    pub description: String,
}

/// Results of one or more fuzz strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzReport {
    pub timestamp: String,
    pub total_tests: usize,
    pub vulnerabilities_confirmed: usize,
    pub vulnerabilities_rejected: usize,
    pub results: Vec<FuzzResult>,
}

impl FuzzReport {
    /// Builds a report, deriving the counters from `results`.
    pub fn from_results(results: Vec<FuzzResult>) -> Self {
        let confirmed = results.iter().filter(|r| r.exploitable).count();
        Self {
            timestamp: crate::report::timestamp(),
            total_tests: results.len(),
            vulnerabilities_confirmed: confirmed,
            vulnerabilities_rejected: results.len() - confirmed,
            results,
        }
    }

    /// A well-formed report with nothing tested.
    pub fn empty() -> Self {
        Self::from_results(Vec::new())
    }

    /// Concatenates reports, summing their counters.
    pub fn merge<I: IntoIterator<Item = FuzzReport>>(reports: I) -> Self {
        let mut merged = Self::empty();
        for report in reports {
            merged.total_tests += report.total_tests;
            merged.vulnerabilities_confirmed += report.vulnerabilities_confirmed;
            merged.vulnerabilities_rejected += report.vulnerabilities_rejected;
            merged.results.extend(report.results);
        }
        merged
    }
}

/// Settings for a fuzz run.
#[derive(Debug, Clone)]
pub struct FuzzOptions {
    pub base_url: String,

    /// Upper bound on generated cases per method.
    pub max_cases: usize,

    pub session_cookie: String,

    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for FuzzOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_cases: DEFAULT_MAX_CASES,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            seed: None,
        }
    }
}

/// A request together with what came back.
struct Exchange {
    request: FuzzRequest,
    response: FuzzResponse,
    error: Option<String>,
}

/// Sends fuzz requests to the target application.
pub struct FuzzEngine {
    client: Client,
    options: FuzzOptions,
}

impl FuzzEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SentinelError::HttpClient`] if the HTTP
    /// client cannot be built.
    pub fn new(options: FuzzOptions) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &FuzzOptions {
        &self.options
    }

    /// Runs both strategies and merges their reports.
    pub async fn run(&self, routes: &[RouteInfo], config: &SecurityConfig) -> FuzzReport {
        let missing_auth = self.fuzz_missing_authentication(routes).await;
        let privilege = self.fuzz_privilege_escalation(routes, config).await;
        FuzzReport::merge([missing_auth, privilege])
    }

    fn url(&self, route_path: &str) -> String {
        format!("{}{}", self.options.base_url.trim_end_matches('/'), route_path)
    }

    fn rng(&self) -> StdRng {
        match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Sends one case. Network failures become a status-0 response.
    async fn send(&self, route_path: &str, method: &str, case: FuzzCase) -> Exchange {
        let request = FuzzRequest {
            url: self.url(route_path),
            method: method.to_string(),
            headers: case.headers,
            body: case.body,
        };

        match self.execute(&request).await {
            Ok(response) => Exchange {
                request,
                response,
                error: None,
            },
            Err(e) => {
                log::warn!("Request {} {} failed: {}", method, request.url, e);
                Exchange {
                    request,
                    response: FuzzResponse {
                        status: 0,
                        body: None,
                    },
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn execute(&self, request: &FuzzRequest) -> std::result::Result<FuzzResponse, String> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| e.to_string())?;
        let sends_body = method == Method::POST || method == Method::PUT || method == Method::DELETE;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body.as_ref().filter(|_| sends_body) {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| e.to_string())?;

        let body = if text.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };

        Ok(FuzzResponse { status, body })
    }
}
