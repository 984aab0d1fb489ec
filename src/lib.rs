//! # Route-Sentinel Library
//!
//! @title Route-Sentinel - API Route Security Scanner
//! @author Ramprasad
//!
//! Static analysis and live verification of authentication and
//! authorization gaps in Next.js API route handlers.
//!
//! The static pass parses each route file with tree-sitter, finds sensitive
//! operations (sinks), and decides whether each one is reached only behind an
//! auth check. A rule table turns unprotected sinks into findings, which the
//! fuzz engine can then confirm against a running instance.
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface definitions and argument parsing
//! - [`config`] - Operator security config (custom roles, sinks, session tokens)
//! - [`parser`] - TypeScript parsing, route discovery, parameter extraction
//! - [`analysis`] - Sink detection, auth patterns, reachability, call graph
//! - [`detectors`] - Vulnerability classification rules
//! - [`fuzz`] - Live missing-authentication and privilege-escalation fuzzing
//! - [`report`] - Report types, aggregation, and rendering
//!
//! ## Example
//!
//! ```rust,ignore
//! use route_sentinel::{AnalysisReport, DetectorRegistry, RouteAnalyzer, SecurityConfig};
//! use route_sentinel::parser::discover_routes;
//!
//! let config = SecurityConfig::resolve(None, root)?;
//! let analyzer = RouteAnalyzer::new(&config);
//! let routes = discover_routes(root)
//!     .iter()
//!     .filter_map(|p| analyzer.analyze_file(p).ok())
//!     .collect();
//! let report = AnalysisReport::generate(routes, &DetectorRegistry::new());
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod error;
pub mod fuzz;
pub mod parser;
pub mod report;

pub use analysis::{RouteAnalyzer, RouteInfo};
pub use cli::Cli;
pub use config::SecurityConfig;
pub use detectors::DetectorRegistry;
pub use error::{Result, SentinelError};
pub use fuzz::{FuzzEngine, FuzzOptions, FuzzReport};
pub use report::{AnalysisReport, FinalReport, Finding, FindingAggregator, Severity};
