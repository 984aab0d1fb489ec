//! # Call Graph Propagation
//!
//! @title Same-File Helper Call Propagation
//! @author Ramprasad
//!
//! Follows bare-identifier calls from a handler into same-file helper
//! functions, detects sinks inside them, and folds the results back with an
//! extended call path.
//!
//! ## Protection Rule
//!
//! A helper's sink is protected if the call into the helper is guarded at
//! the call site, or the sink is guarded inside the helper itself.
//!
//! The walk is an iterative worklist bounded by `max_depth` with a visited
//! set keyed by function node, so mutually recursive helpers terminate at
//! any depth.

use super::{AuthCheck, AuthPatternMatcher, ReachabilityAnalyzer, Sink, SinkDetector};
use crate::parser::SyntaxIndex;
use std::collections::{HashSet, VecDeque};
use tree_sitter::Node;

/// Helpers called directly from the handler are followed; nothing deeper.
pub const DEFAULT_CALL_GRAPH_DEPTH: usize = 1;

/// Sinks and checks collected from helper functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Helper sinks, call path prefixed with the helper chain.
    pub sinks: Vec<Sink>,

    /// Auth checks found inside the helpers.
    pub auth_checks: Vec<AuthCheck>,
}

/// A helper call waiting to be resolved.
struct PendingCall<'t> {
    caller: Node<'t>,
    callee: String,
    depth: usize,
    path: Vec<String>,
    caller_guarded: bool,
}

/// Resolves helper calls and re-runs sink detection on their bodies.
#[derive(Debug, Clone, Copy)]
pub struct CallGraphPropagator<'a> {
    detector: &'a SinkDetector,
    auth: &'a AuthPatternMatcher,
    max_depth: usize,
}

impl<'a> CallGraphPropagator<'a> {
    pub fn new(detector: &'a SinkDetector, auth: &'a AuthPatternMatcher, max_depth: usize) -> Self {
        Self {
            detector,
            auth,
            max_depth,
        }
    }

    /// Collects sinks and auth checks reachable from `handler` through
    /// same-file helper calls.
    pub fn propagate<'t>(&self, index: &'t SyntaxIndex, handler: Node<'t>) -> Propagation {
        let mut result = Propagation::default();
        if self.max_depth == 0 {
            return result;
        }

        let functions = index.function_map();
        let reach = ReachabilityAnalyzer::new(self.auth);

        let mut visited: HashSet<usize> = HashSet::new();
        visited.insert(handler.id());

        let mut queue: VecDeque<PendingCall<'t>> = index
            .direct_calls(handler)
            .into_iter()
            .map(|callee| PendingCall {
                caller: handler,
                callee,
                depth: 1,
                path: Vec::new(),
                caller_guarded: false,
            })
            .collect();

        while let Some(pending) = queue.pop_front() {
            let Some(&function) = functions.get(&pending.callee) else {
                continue;
            };
            if !visited.insert(function.id()) {
                continue;
            }

            let call_guarded = pending.caller_guarded
                || reach.is_call_protected(index, pending.caller, &pending.callee);

            let mut path = pending.path;
            path.push(pending.callee);

            for mut sink in self.detector.detect_sinks(index, function) {
                sink.is_protected =
                    call_guarded || reach.is_sink_protected(index, function, sink.line);
                sink.call_path = path.iter().cloned().chain(sink.call_path).collect();
                log::debug!(
                    "helper sink {} via {} (protected: {})",
                    sink.kind,
                    sink.call_path.join(" -> "),
                    sink.is_protected
                );
                result.sinks.push(sink);
            }

            result
                .auth_checks
                .extend(self.auth.extract_auth_checks(index, function));

            if pending.depth < self.max_depth {
                for callee in index.direct_calls(function) {
                    queue.push_back(PendingCall {
                        caller: function,
                        callee,
                        depth: pending.depth + 1,
                        path: path.clone(),
                        caller_guarded: call_guarded,
                    });
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SinkKind;

    fn propagate(source: &str, depth: usize) -> Propagation {
        let idx = SyntaxIndex::parse("app/api/x/route.ts", source.to_string()).unwrap();
        let handler = idx.method_handler("DELETE").unwrap();
        let detector = SinkDetector::default();
        let matcher = AuthPatternMatcher::default();
        CallGraphPropagator::new(&detector, &matcher, depth).propagate(&idx, handler)
    }

    const GUARDED_HELPER: &str = r#"
function deleteUserData(userId) {
  const result = db.$executeRaw`DELETE FROM user_data WHERE user_id = ${userId}`;
  return result;
}

function checkSuperuser(userRole) {
  return userRole === "admin";
}

export async function DELETE(request) {
  const session = await getServerSession();
  if (!session) {
    return NextResponse.json({ error: "Unauthorized" }, { status: 401 });
  }
  const ok = checkSuperuser(session.user.role);
  await deleteUserData(request.id);
  return NextResponse.json({ success: true });
}
"#;

    #[test]
    fn test_helper_sink_guarded_at_call_site() {
        let result = propagate(GUARDED_HELPER, 1);
        assert_eq!(result.sinks.len(), 1);
        let sink = &result.sinks[0];
        assert_eq!(sink.kind, SinkKind::RawSql);
        assert_eq!(sink.call_path, vec!["deleteUserData", "db.$executeRaw"]);
        assert!(sink.is_protected);
        assert!(!result.auth_checks.is_empty());
    }

    #[test]
    fn test_unguarded_helper_sink() {
        let result = propagate(
            r#"
const removeAll = async () => {
  await db.task.deleteMany();
};

export async function DELETE() {
  await removeAll();
  return new Response(null, { status: 204 });
}
"#,
            1,
        );
        assert_eq!(result.sinks.len(), 1);
        assert_eq!(result.sinks[0].call_path, vec!["removeAll", "db.task.deleteMany"]);
        assert!(!result.sinks[0].is_protected);
    }

    #[test]
    fn test_helper_guards_its_own_sink() {
        let result = propagate(
            r#"
function purge(session, id) {
  if (session.user.isAdmin) {
    db.task.delete(id);
  }
}

export async function DELETE(id) {
  purge(currentSession, id);
}
"#,
            1,
        );
        assert_eq!(result.sinks.len(), 1);
        assert!(result.sinks[0].is_protected);
    }

    #[test]
    fn test_depth_limits() {
        let source = r#"
function outer(id) {
  inner(id);
}

function inner(id) {
  db.task.delete(id);
}

export async function DELETE(id) {
  outer(id);
}
"#;
        assert!(propagate(source, 0).sinks.is_empty());
        assert!(propagate(source, 1).sinks.is_empty());

        let deep = propagate(source, 2);
        assert_eq!(deep.sinks.len(), 1);
        assert_eq!(deep.sinks[0].call_path, vec!["outer", "inner", "db.task.delete"]);
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let source = r#"
function ping(n) {
  db.log.create({ n });
  pong(n);
}

function pong(n) {
  ping(n);
}

export async function DELETE(n) {
  ping(n);
}
"#;
        let result = propagate(source, 50);
        assert_eq!(result.sinks.len(), 1);
        assert_eq!(result.sinks[0].call_path, vec!["ping", "db.log.create"]);
    }

    #[test]
    fn test_property_calls_not_followed() {
        let source = r#"
function helper() {
  db.task.create({});
}

export async function DELETE() {
  utils.helper();
}
"#;
        assert!(propagate(source, 1).sinks.is_empty());
    }
}
