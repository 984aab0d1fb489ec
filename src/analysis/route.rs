//! # Route Analyzer
//!
//! @title Per-File Route Analysis Orchestrator
//! @author Ramprasad
//!
//! Runs sink detection, auth-check extraction, reachability and call-graph
//! propagation for every exported HTTP method of a route file and assembles
//! the [`RouteInfo`] record.

use super::{
    AuthPatternMatcher, CallGraphPropagator, MethodAnalysis, ReachabilityAnalyzer, RouteInfo,
    SinkDetector, Vocabulary, DEFAULT_CALL_GRAPH_DEPTH,
};
use crate::config::SecurityConfig;
use crate::error::Result;
use crate::parser::{self, ast, SyntaxIndex};
use std::path::Path;

/// Orchestrates the static analysis of route files.
///
/// Holds no per-file state; every call builds a fresh [`SyntaxIndex`].
#[derive(Debug, Clone)]
pub struct RouteAnalyzer {
    sinks: SinkDetector,
    auth: AuthPatternMatcher,
    call_graph_depth: usize,
}

impl RouteAnalyzer {
    /// Creates an analyzer using the custom roles and sinks from `config`.
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            sinks: SinkDetector::new(config.custom_sinks.clone()),
            auth: AuthPatternMatcher::new(
                Vocabulary::builtin().with_custom_roles(&config.custom_roles),
            ),
            call_graph_depth: DEFAULT_CALL_GRAPH_DEPTH,
        }
    }

    /// Sets how many levels of same-file helper calls are followed.
    pub fn with_call_graph_depth(mut self, depth: usize) -> Self {
        self.call_graph_depth = depth;
        self
    }

    /// Reads and analyzes a route file.
    pub fn analyze_file(&self, path: &Path) -> Result<RouteInfo> {
        let index = SyntaxIndex::from_path(path)?;
        Ok(self.analyze_index(&index))
    }

    /// Analyzes route source already in memory.
    ///
    /// # Errors
    ///
    /// Returns a parse error when no syntax tree can be built.
    pub fn analyze_route(&self, file_path: &str, content: String) -> Result<RouteInfo> {
        let index = SyntaxIndex::parse(file_path, content)?;
        Ok(self.analyze_index(&index))
    }

    fn analyze_index(&self, index: &SyntaxIndex) -> RouteInfo {
        let methods = index.http_methods();
        let middleware = self.auth.detect_middleware(index);
        let auth_middleware = AuthPatternMatcher::has_auth_middleware(&middleware);

        let method_details = methods
            .iter()
            .map(|method| self.analyze_method(index, method, auth_middleware))
            .collect();

        let root = index.root();
        let has_authentication = auth_middleware
            || ast::descendants(root).any(|node| self.auth.has_auth_pattern(index, node));

        RouteInfo {
            file_path: index.file_path().to_string(),
            route_path: parser::route_path(index.file_path()),
            methods,
            sinks: self.sinks.detect_sinks(index, root),
            has_authentication,
            authorization_checks: self.auth.extract_auth_checks(index, root),
            parameters: parser::extract_parameters(index),
            middleware,
            method_details,
        }
    }

    fn analyze_method(
        &self,
        index: &SyntaxIndex,
        method: &str,
        auth_middleware: bool,
    ) -> MethodAnalysis {
        let Some(handler) = index.method_handler(method) else {
            log::warn!(
                "Could not find handler for {} method in {}",
                method,
                index.file_path()
            );
            return MethodAnalysis::unresolved(method);
        };

        let reach = ReachabilityAnalyzer::new(&self.auth);

        let mut sinks = self.sinks.detect_sinks(index, handler);
        for sink in &mut sinks {
            sink.is_protected = reach.is_sink_protected(index, handler, sink.line);
        }
        let direct_protected = sinks.iter().all(|s| s.is_protected);

        let propagation = CallGraphPropagator::new(&self.sinks, &self.auth, self.call_graph_depth)
            .propagate(index, handler);
        let indirect_protected = propagation.sinks.iter().all(|s| s.is_protected);

        let mut authorization_checks = self.auth.extract_auth_checks(index, handler);
        authorization_checks.extend(propagation.auth_checks);
        sinks.extend(propagation.sinks);

        // `all` over an empty list is true, which covers the "no sinks" arms.
        let has_authentication = (direct_protected && indirect_protected) || auth_middleware;

        log::debug!(
            "{} {}: {} sink(s), authenticated: {}",
            method,
            index.file_path(),
            sinks.len(),
            has_authentication
        );

        MethodAnalysis {
            method: method.to_string(),
            sinks,
            has_authentication,
            authorization_checks,
        }
    }
}

impl Default for RouteAnalyzer {
    fn default() -> Self {
        Self::new(&SecurityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AuthCheckKind, SinkKind};

    const TASKS_ROUTE: &str = r#"
import { NextRequest, NextResponse } from "next/server";

export async function GET(request: NextRequest) {
  const allTasks = db.task.findMany();
  return NextResponse.json(allTasks);
}

export async function POST(request: NextRequest) {
  const body = await request.json();
  const newTask = db.task.create({
    title: body.title,
    userId: body.userId,
  });
  return NextResponse.json(newTask, { status: 201 });
}
"#;

    const DEBUG_ROUTE: &str = r#"
import { getServerSession } from "next-auth";

function deleteUserData(userId: string) {
  const result = db.$executeRaw`DELETE FROM user_data WHERE user_id = ${userId}`;
  return result;
}

function checkSuperuser(userRole: string) {
  return userRole === "superuser" || userRole === "moderator";
}

export async function DELETE(request: NextRequest) {
  const session = await getServerSession();

  if (!session) {
    return NextResponse.json({ error: "Unauthorized" }, { status: 401 });
  }

  const authToken = cookies().get("auth_token");

  if (!checkSuperuser(session.user.role)) {
    return NextResponse.json({ error: "Forbidden" }, { status: 403 });
  }

  const { userId } = await request.json();
  await deleteUserData(userId);
  return NextResponse.json({ success: true });
}
"#;

    const USER_ROUTE: &str = r#"
export async function GET(request: NextRequest) {
  const session = getServerSession(request);

  if (!session) {
    return NextResponse.json({ error: "Unauthorized" }, { status: 401 });
  }

  // Should check: if (session.role !== "admin") { return 403 }
  const allUsers = db.user.findMany();

  return NextResponse.json(allUsers);
}
"#;

    fn analyze(path: &str, source: &str) -> RouteInfo {
        RouteAnalyzer::default()
            .analyze_route(path, source.to_string())
            .unwrap()
    }

    fn method<'a>(info: &'a RouteInfo, name: &str) -> &'a MethodAnalysis {
        info.method_details
            .iter()
            .find(|m| m.method == name)
            .unwrap()
    }

    #[test]
    fn test_unauthenticated_write() {
        let info = analyze("app/api/tasks/route.ts", TASKS_ROUTE);
        assert_eq!(info.route_path, "/api/tasks");
        assert_eq!(info.methods, vec!["GET", "POST"]);

        let get = method(&info, "GET");
        assert!(get.sinks.is_empty());
        assert!(get.has_authentication);

        let post = method(&info, "POST");
        assert!(post.has_sink(&SinkKind::DatabaseWrite));
        assert!(!post.has_authentication);
        assert!(post.sinks.iter().all(|s| s.call_path.len() == 1));
    }

    #[test]
    fn test_guarded_helper_call() {
        let info = analyze("app/api/debug/route.ts", DEBUG_ROUTE);
        let delete = method(&info, "DELETE");

        let raw = delete
            .sinks
            .iter()
            .find(|s| s.kind == SinkKind::RawSql)
            .unwrap();
        assert_eq!(raw.call_path, vec!["deleteUserData", "db.$executeRaw"]);
        assert!(raw.is_protected);
        assert!(delete.has_authentication);
        assert!(delete.has_check(AuthCheckKind::SessionCheck));
    }

    #[test]
    fn test_user_read_without_role_check() {
        let info = analyze("app/api/tasks/user/route.ts", USER_ROUTE);
        let get = method(&info, "GET");
        assert!(get.has_sink(&SinkKind::UserTableRead));
        assert!(get.has_authentication);
        assert!(!get.has_check(AuthCheckKind::RoleCheck));
    }

    #[test]
    fn test_unguarded_helper_breaks_authentication() {
        let info = analyze(
            "app/api/x/route.ts",
            r#"
function wipe() {
  db.task.deleteMany();
}

export async function POST() {
  if (!session) {
    return deny();
  }
  db.task.create({});
}

export async function DELETE() {
  wipe();
}
"#,
        );
        assert!(method(&info, "POST").has_authentication);

        let delete = method(&info, "DELETE");
        assert_eq!(delete.sinks.len(), 1);
        assert_eq!(delete.sinks[0].call_path, vec!["wipe", "db.task.deleteMany"]);
        assert!(!delete.has_authentication);
    }

    #[test]
    fn test_auth_middleware_overrides() {
        let info = analyze(
            "app/api/x/route.ts",
            "export const POST = withAuth(async () => {\n  db.task.create({});\n});\n",
        );
        assert_eq!(info.middleware, vec!["withAuth"]);
        assert!(info.has_authentication);
        let post = method(&info, "POST");
        assert!(post.has_authentication);
    }

    #[test]
    fn test_missing_handler_placeholder() {
        let info = analyze("app/api/x/route.ts", "export { GET } from './shared';\n");
        assert_eq!(info.methods, vec!["GET"]);
        assert_eq!(info.method_details, vec![MethodAnalysis::unresolved("GET")]);
    }

    #[test]
    fn test_custom_roles_from_config() {
        let source = "export function POST(r) {\n  if (r.moderator) {\n    db.task.create({});\n  }\n}\n";
        let plain = analyze("app/api/x/route.ts", source);
        assert!(!method(&plain, "POST").has_authentication);

        let config = SecurityConfig {
            custom_roles: vec!["moderator".to_string()],
            ..Default::default()
        };
        let info = RouteAnalyzer::new(&config)
            .analyze_route("app/api/x/route.ts", source.to_string())
            .unwrap();
        assert!(method(&info, "POST").has_authentication);
    }

    #[test]
    fn test_depth_zero_skips_helpers() {
        let info = RouteAnalyzer::default()
            .with_call_graph_depth(0)
            .analyze_route("app/api/debug/route.ts", DEBUG_ROUTE.to_string())
            .unwrap();
        let delete = method(&info, "DELETE");
        assert!(delete.sinks.iter().all(|s| s.call_path.len() == 1));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let first = analyze("app/api/debug/route.ts", DEBUG_ROUTE);
        let second = analyze("app/api/debug/route.ts", DEBUG_ROUTE);
        assert_eq!(first, second);
    }

    #[test]
    fn test_analyze_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app/api/tasks/route.ts");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, TASKS_ROUTE).unwrap();

        let info = RouteAnalyzer::default().analyze_file(&path).unwrap();
        assert_eq!(info.route_path, "/api/tasks");
        assert!(!info.parameters.is_empty());

        let missing = RouteAnalyzer::default().analyze_file(&dir.path().join("nope.ts"));
        assert!(missing.is_err());
    }
}
