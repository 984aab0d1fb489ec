//! # Sink Reachability
//!
//! @title Auth-Guard Reachability Analyzer
//! @author Ramprasad
//!
//! Decides whether a sink (or a helper call) is reached only behind an
//! auth-flavoured guard.
//!
//! ## Algorithm
//!
//! 1. Locate the first pre-order node starting on the sink's line.
//! 2. Walk its ancestors up to the enclosing function.
//! 3. Any `if`/ternary ancestor whose condition mentions auth protects the
//!    sink, whatever the polarity of the condition.
//! 4. At the function boundary, look for a guard clause: a `return` before
//!    the sink's line, inside an `if` whose condition mentions auth and
//!    contains a negation.
//!
//! ```typescript
//! if (!session) {
//!   return unauthorized();   // guard clause
//! }
//! db.user.delete(id);        // protected
//! ```

use super::AuthPatternMatcher;
use crate::parser::{ast, SyntaxIndex};
use tree_sitter::Node;

/// Protection checks over a parsed route file.
#[derive(Debug, Clone, Copy)]
pub struct ReachabilityAnalyzer<'m> {
    auth: &'m AuthPatternMatcher,
}

impl<'m> ReachabilityAnalyzer<'m> {
    pub fn new(auth: &'m AuthPatternMatcher) -> Self {
        Self { auth }
    }

    /// Is the sink starting on `line` inside `scope` protected?
    ///
    /// Returns `false` when no node below `scope` starts on that line.
    pub fn is_sink_protected(&self, index: &SyntaxIndex, scope: Node<'_>, line: usize) -> bool {
        match ast::descendants(scope).find(|n| ast::start_line(*n) == line) {
            Some(target) => self.is_guarded(index, target),
            None => false,
        }
    }

    /// Is any call to `function_name` inside `caller` protected?
    ///
    /// Applies the same guard rules to the call site instead of a sink.
    pub fn is_call_protected(
        &self,
        index: &SyntaxIndex,
        caller: Node<'_>,
        function_name: &str,
    ) -> bool {
        ast::descendants(caller)
            .filter(|n| ast::is_call(*n))
            .filter(|call| {
                ast::callee(*call)
                    .map(|c| ast::is_identifier(c) && index.text(c) == function_name)
                    .unwrap_or(false)
            })
            .any(|call| self.is_guarded(index, call))
    }

    fn is_guarded(&self, index: &SyntaxIndex, target: Node<'_>) -> bool {
        let target_line = ast::start_line(target);

        for ancestor in ast::ancestors(target) {
            if let Some(condition) = ast::branch_condition(ancestor) {
                if self.auth.has_auth_pattern(index, condition) {
                    log::debug!(
                        "line {} guarded by `{}`",
                        target_line,
                        index.text(condition)
                    );
                    return true;
                }
            }

            if ast::is_function_boundary(ancestor) {
                return self.has_early_auth_return(index, ancestor, target_line);
            }
        }

        false
    }

    /// Looks for `if (!<auth>) { return ...; }` before `target_line`.
    fn has_early_auth_return(
        &self,
        index: &SyntaxIndex,
        function: Node<'_>,
        target_line: usize,
    ) -> bool {
        ast::descendants(function)
            .filter(|n| ast::is_return(*n) && ast::start_line(*n) < target_line)
            .any(|ret| self.inside_negated_auth_if(index, function, ret))
    }

    fn inside_negated_auth_if(
        &self,
        index: &SyntaxIndex,
        function: Node<'_>,
        ret: Node<'_>,
    ) -> bool {
        let mut current = ret;
        while let Some(parent) = current.parent() {
            if parent.id() == function.id() {
                break;
            }
            if ast::is_if_statement(parent) {
                if let Some(condition) = parent.child_by_field_name("condition") {
                    if self.auth.has_auth_pattern(index, condition)
                        && index.text(condition).contains('!')
                    {
                        return true;
                    }
                }
            }
            current = parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SinkDetector;

    fn sink_protection(source: &str) -> Vec<bool> {
        let idx = SyntaxIndex::parse("app/api/x/route.ts", source.to_string()).unwrap();
        let handler = idx.method_handler("POST").unwrap();
        let matcher = AuthPatternMatcher::default();
        let reach = ReachabilityAnalyzer::new(&matcher);
        SinkDetector::default()
            .detect_sinks(&idx, handler)
            .iter()
            .map(|s| reach.is_sink_protected(&idx, handler, s.line))
            .collect()
    }

    #[test]
    fn test_guard_clause_protects() {
        let result = sink_protection(
            r#"
export async function POST(id) {
  if (!session) {
    return unauthorized();
  }
  db.user.delete(id);
}
"#,
        );
        assert_eq!(result, vec![true]);
    }

    #[test]
    fn test_non_negated_ancestor_if_protects() {
        let result = sink_protection(
            r#"
export async function POST(id) {
  if (session) {
    db.user.delete(id);
  }
}
"#,
        );
        assert_eq!(result, vec![true]);
    }

    #[test]
    fn test_unguarded_sink() {
        let result = sink_protection(
            r#"
export async function POST(request) {
  const body = await request.json();
  const task = db.task.create({ title: body.title });
  return NextResponse.json(task, { status: 201 });
}
"#,
        );
        assert_eq!(result, vec![false]);
    }

    #[test]
    fn test_non_auth_condition_does_not_protect() {
        let result = sink_protection(
            r#"
export async function POST(id) {
  if (!id) {
    return badRequest();
  }
  if (id > 3) {
    db.task.delete(id);
  }
}
"#,
        );
        assert_eq!(result, vec![false]);
    }

    #[test]
    fn test_positive_guard_return_does_not_protect() {
        let result = sink_protection(
            r#"
export async function POST(id) {
  if (session) {
    return ok();
  }
  db.task.delete(id);
}
"#,
        );
        assert_eq!(result, vec![false]);
    }

    #[test]
    fn test_guard_after_sink_does_not_protect() {
        let result = sink_protection(
            r#"
export async function POST(id) {
  db.task.delete(id);
  if (!session) {
    return unauthorized();
  }
}
"#,
        );
        assert_eq!(result, vec![false]);
    }

    #[test]
    fn test_ternary_guard_protects() {
        let result = sink_protection(
            r#"
export async function POST(id) {
  const r = isAdmin
    ? db.task.delete(id)
    : null;
}
"#,
        );
        assert_eq!(result, vec![true]);
    }

    #[test]
    fn test_walk_stops_at_inner_closure() {
        let result = sink_protection(
            r#"
export async function POST(ids) {
  if (session) {
    ids.forEach((id) => {
      db.task.delete(id);
    });
  }
}
"#,
        );
        assert_eq!(result, vec![false]);
    }

    #[test]
    fn test_call_protection() {
        let idx = SyntaxIndex::parse(
            "app/api/x/route.ts",
            r#"
export async function POST(id) {
  if (session.user) {
    purge(id);
  }
  audit(id);
}
"#
            .to_string(),
        )
        .unwrap();
        let handler = idx.method_handler("POST").unwrap();
        let matcher = AuthPatternMatcher::default();
        let reach = ReachabilityAnalyzer::new(&matcher);
        assert!(reach.is_call_protected(&idx, handler, "purge"));
        assert!(!reach.is_call_protected(&idx, handler, "audit"));
        assert!(!reach.is_call_protected(&idx, handler, "missing"));
    }
}
