//! # Syntax Tree Helpers
//!
//! @title tree-sitter Node Utilities
//! @author Ramprasad
//!
//! Small, allocation-light helpers over `tree_sitter::Node` shared by the
//! analysis passes: pre-order descendant enumeration, a lazy ancestor walk
//! bounded by the enclosing function, and node-kind predicates for the
//! TypeScript grammar.

use tree_sitter::Node;

/// Node kinds that open a new function scope.
const FUNCTION_BOUNDARY_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
    "arrow_function",
];

/// Returns the 1-based line on which the node starts.
pub fn start_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Collects the named, non-comment children of a node.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !is_comment(*child))
        .collect()
}

/// Pre-order enumeration of all named descendants, excluding `node` itself.
pub fn descendants(node: Node<'_>) -> Descendants<'_> {
    let mut stack = named_children(node);
    stack.reverse();
    Descendants { stack }
}

/// Iterator returned by [`descendants`].
pub struct Descendants<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children = named_children(node);
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

/// Walks the parent chain of a node.
///
/// Yields each ancestor in turn and stops after yielding the first function
/// boundary, so a walk never escapes into an outer closure.
pub fn ancestors(node: Node<'_>) -> Ancestors<'_> {
    Ancestors {
        current: Some(node),
        finished: false,
    }
}

/// Iterator returned by [`ancestors`].
pub struct Ancestors<'t> {
    current: Option<Node<'t>>,
    finished: bool,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let parent = self.current?.parent();
        match parent {
            Some(p) => {
                if is_function_boundary(p) {
                    self.finished = true;
                }
                self.current = Some(p);
                Some(p)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

pub fn is_comment(node: Node<'_>) -> bool {
    node.kind() == "comment" || node.is_extra()
}

pub fn is_call(node: Node<'_>) -> bool {
    node.kind() == "call_expression"
}

pub fn is_identifier(node: Node<'_>) -> bool {
    node.kind() == "identifier"
}

pub fn is_member_access(node: Node<'_>) -> bool {
    node.kind() == "member_expression"
}

pub fn is_if_statement(node: Node<'_>) -> bool {
    node.kind() == "if_statement"
}

pub fn is_return(node: Node<'_>) -> bool {
    node.kind() == "return_statement"
}

/// Function declarations, function expressions and arrow functions.
pub fn is_function_boundary(node: Node<'_>) -> bool {
    FUNCTION_BOUNDARY_KINDS.contains(&node.kind())
}

/// Condition of an `if` statement or ternary expression.
///
/// Returns `None` for every other node kind.
pub fn branch_condition<'t>(node: Node<'t>) -> Option<Node<'t>> {
    match node.kind() {
        "if_statement" | "ternary_expression" => node.child_by_field_name("condition"),
        _ => None,
    }
}

/// The callee expression of a call.
pub fn callee<'t>(call: Node<'t>) -> Option<Node<'t>> {
    call.child_by_field_name("function")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SyntaxIndex;

    fn index(source: &str) -> SyntaxIndex {
        SyntaxIndex::parse("route.ts", source.to_string()).unwrap()
    }

    #[test]
    fn test_descendants_are_preorder_and_skip_comments() {
        let idx = index("// session comment\nfoo(bar);\n");
        let kinds: Vec<_> = descendants(idx.root()).map(|n| n.kind()).collect();
        assert!(!kinds.contains(&"comment"));
        let call_pos = kinds.iter().position(|k| *k == "call_expression").unwrap();
        let stmt_pos = kinds.iter().position(|k| *k == "expression_statement").unwrap();
        assert!(stmt_pos < call_pos);
    }

    #[test]
    fn test_ancestors_stop_at_function_boundary() {
        let idx = index(
            "function outer() {\n  const inner = () => {\n    target();\n  };\n}\n",
        );
        let call = descendants(idx.root())
            .find(|n| is_call(*n) && idx.text(*n) == "target()")
            .unwrap();
        let chain: Vec<_> = ancestors(call).collect();
        assert_eq!(chain.last().map(|n| n.kind()), Some("arrow_function"));
        assert!(chain.iter().all(|n| n.kind() != "function_declaration"));
    }

    #[test]
    fn test_branch_condition() {
        let idx = index("if (session) {\n  a();\n}\nconst x = ok ? b() : c();\n");
        let conds: Vec<_> = descendants(idx.root())
            .filter_map(branch_condition)
            .map(|n| idx.text(n).to_string())
            .collect();
        assert_eq!(conds.len(), 2);
        assert!(conds[0].contains("session"));
        assert_eq!(conds[1], "ok");
    }

    #[test]
    fn test_start_line_is_one_based() {
        let idx = index("\n\nfoo();\n");
        let call = descendants(idx.root()).find(|n| is_call(*n)).unwrap();
        assert_eq!(start_line(call), 3);
    }
}
