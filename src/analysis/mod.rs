//! # Analysis Module
//!
//! @title Route Handler Static Analysis Engine
//! @author Ramprasad
//!
//! This module contains the static half of the pipeline: deciding whether a
//! route handler reaches a sensitive operation without first passing an
//! authentication or authorization check.
//!
//! ## Components
//!
//! - **Sink Detection**: classify call sites into sink categories
//! - **Auth Patterns**: lexical auth/role check classification
//! - **Reachability**: is a sink guarded by an auth-flavoured branch?
//! - **Call Graph**: follow same-file helper calls from the handler
//! - **Route Analyzer**: orchestrates the above into a [`RouteInfo`]

pub mod auth;
pub mod call_graph;
pub mod reachability;
pub mod route;
pub mod sinks;

pub use auth::{AuthPatternMatcher, Vocabulary};
pub use call_graph::{CallGraphPropagator, Propagation, DEFAULT_CALL_GRAPH_DEPTH};
pub use reachability::ReachabilityAnalyzer;
pub use route::RouteAnalyzer;
pub use sinks::SinkDetector;

use crate::parser::Parameter;
use crate::report::Severity;
use serde::{Deserialize, Serialize};

/// Category of a sensitive operation.
///
/// Serialized through [`Sink`] as a flat `type` string; custom sinks add a
/// sibling `customSeverity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SinkKind {
    DatabaseWrite,
    DatabaseRead,
    FileWrite,
    SessionModify,
    UserTableRead,
    RawSql,
    /// Operator-defined category from the security config.
    Custom { name: String, severity: Severity },
}

impl SinkKind {
    /// Parses a built-in category name such as `raw_sql`.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "database_write" => Some(SinkKind::DatabaseWrite),
            "database_read" => Some(SinkKind::DatabaseRead),
            "file_write" => Some(SinkKind::FileWrite),
            "session_modify" => Some(SinkKind::SessionModify),
            "user_table_read" => Some(SinkKind::UserTableRead),
            "raw_sql" => Some(SinkKind::RawSql),
            _ => None,
        }
    }

    /// Severity attached by the operator, for custom sinks only.
    pub fn custom_severity(&self) -> Option<Severity> {
        match self {
            SinkKind::Custom { severity, .. } => Some(*severity),
            _ => None,
        }
    }
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::DatabaseWrite => write!(f, "database_write"),
            SinkKind::DatabaseRead => write!(f, "database_read"),
            SinkKind::FileWrite => write!(f, "file_write"),
            SinkKind::SessionModify => write!(f, "session_modify"),
            SinkKind::UserTableRead => write!(f, "user_table_read"),
            SinkKind::RawSql => write!(f, "raw_sql"),
            SinkKind::Custom { name, .. } => write!(f, "{}", name),
        }
    }
}

/// A call site performing a security-sensitive operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SinkRecord", try_from = "SinkRecord")]
pub struct Sink {
    pub kind: SinkKind,

    /// 1-based line of the call.
    pub line: usize,

    /// Function names from the entry handler down to the sink call.
    ///
    /// One element for direct sinks, two or more for sinks reached
    /// through the call graph.
    pub call_path: Vec<String>,

    /// Whether the sink is reached only behind an auth-flavoured guard.
    pub is_protected: bool,
}

impl Sink {
    /// A freshly detected, not yet classified sink.
    pub fn direct(kind: SinkKind, line: usize, callee: &str) -> Self {
        Self {
            kind,
            line,
            call_path: vec![callee.to_string()],
            is_protected: false,
        }
    }

    pub fn custom_severity(&self) -> Option<Severity> {
        self.kind.custom_severity()
    }
}

/// Wire form of a [`Sink`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SinkRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_severity: Option<Severity>,
    line: usize,
    call_path: Vec<String>,
    is_protected: bool,
}

impl From<Sink> for SinkRecord {
    fn from(sink: Sink) -> Self {
        Self {
            kind: sink.kind.to_string(),
            custom_severity: sink.kind.custom_severity(),
            line: sink.line,
            call_path: sink.call_path,
            is_protected: sink.is_protected,
        }
    }
}

impl TryFrom<SinkRecord> for Sink {
    type Error = String;

    fn try_from(record: SinkRecord) -> std::result::Result<Self, Self::Error> {
        let kind = match record.custom_severity {
            Some(severity) => SinkKind::Custom {
                name: record.kind,
                severity,
            },
            None => SinkKind::builtin(&record.kind)
                .ok_or_else(|| format!("unknown sink type '{}'", record.kind))?,
        };

        Ok(Self {
            kind,
            line: record.line,
            call_path: record.call_path,
            is_protected: record.is_protected,
        })
    }
}

/// Kind of an extracted auth check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthCheckKind {
    SessionCheck,
    RoleCheck,
    OwnershipCheck,
}

/// An auth-looking fragment found in a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCheck {
    #[serde(rename = "type")]
    pub kind: AuthCheckKind,

    /// 1-based source line.
    pub line: usize,

    /// Truncated source text of the matching node.
    pub details: String,
}

/// Analysis of a single exported HTTP method handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodAnalysis {
    pub method: String,

    /// Direct sinks followed by sinks reached through helper calls.
    pub sinks: Vec<Sink>,

    /// Computed verdict: every sink is protected, or auth middleware wraps the route.
    pub has_authentication: bool,

    /// Checks found in the handler and in the helpers it calls.
    pub authorization_checks: Vec<AuthCheck>,
}

impl MethodAnalysis {
    /// Placeholder for a declared method whose handler could not be located.
    pub fn unresolved(method: &str) -> Self {
        Self {
            method: method.to_string(),
            sinks: Vec::new(),
            has_authentication: false,
            authorization_checks: Vec::new(),
        }
    }

    pub fn has_sink(&self, kind: &SinkKind) -> bool {
        self.sinks.iter().any(|s| &s.kind == kind)
    }

    pub fn has_check(&self, kind: AuthCheckKind) -> bool {
        self.authorization_checks.iter().any(|c| c.kind == kind)
    }
}

/// Everything learned about one route file.
///
/// Built fresh per file and immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub file_path: String,

    /// URL path served by the file (e.g. `/api/tasks`).
    pub route_path: String,

    /// Exported HTTP methods in source order.
    pub methods: Vec<String>,

    /// Route-wide sinks over the whole file.
    pub sinks: Vec<Sink>,

    /// Route-wide heuristic: any auth-looking node or auth middleware.
    pub has_authentication: bool,

    /// Route-wide auth checks.
    pub authorization_checks: Vec<AuthCheck>,

    pub parameters: Vec<Parameter>,

    pub middleware: Vec<String>,

    pub method_details: Vec<MethodAnalysis>,
}
