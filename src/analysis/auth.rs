//! # Auth Pattern Matching
//!
//! @title Authentication and Authorization Pattern Matcher
//! @author Ramprasad
//!
//! Lexical classifier answering "does this fragment look like an auth or
//! role check?". Matching is a heuristic over node text, not data flow.
//!
//! The token tables live in a [`Vocabulary`] so the rule set can be swapped
//! or extended (e.g. with operator-configured role names) without touching
//! any traversal code.

use super::{AuthCheck, AuthCheckKind};
use crate::parser::{ast, SyntaxIndex};
use tree_sitter::Node;

/// Nodes at least this long are never classified as checks.
const MAX_CHECK_TEXT_LEN: usize = 200;

/// Length of the source excerpt kept on an [`AuthCheck`].
const DETAILS_LEN: usize = 100;

const BUILTIN_AUTH_TOKENS: &[&str] = &[
    "session",
    "authenticated",
    "auth()",
    "getserversession",
    "usesession",
    "getsession",
    "nextauth",
    "next-auth",
    "user",
    "token",
];

const BUILTIN_ROLE_TOKENS: &[&str] = &["role", "admin", "permission"];

const BUILTIN_ROLE_KEYWORDS: &[&str] = &["role", "admin"];

const COMPARISON_OPERATORS: &[&str] = &["===", "==", "!==", "!="];

/// Callee-name fragments that mark a wrapper as middleware.
const MIDDLEWARE_MARKERS: &[&str] = &["middleware", "withAuth", "requireAuth"];

/// Lower-case fragments that make a middleware name auth middleware.
const AUTH_MIDDLEWARE_MARKERS: &[&str] = &["withauth", "requireauth", "auth"];

/// Token tables used by the matcher.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Lower-case auth tokens, matched case-insensitively.
    auth_tokens: Vec<String>,

    /// Lower-case role tokens, matched case-insensitively.
    role_tokens: Vec<String>,

    /// Role keywords for check extraction, matched case-sensitively.
    role_keywords: Vec<String>,
}

impl Vocabulary {
    /// The built-in auth and role token sets.
    pub fn builtin() -> Self {
        Self {
            auth_tokens: BUILTIN_AUTH_TOKENS.iter().map(|s| s.to_string()).collect(),
            role_tokens: BUILTIN_ROLE_TOKENS.iter().map(|s| s.to_string()).collect(),
            role_keywords: BUILTIN_ROLE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Adds operator-defined role names.
    pub fn with_custom_roles(mut self, roles: &[String]) -> Self {
        for role in roles.iter().filter(|r| !r.is_empty()) {
            self.role_tokens.push(role.to_lowercase());
            self.role_keywords.push(role.clone());
        }
        self
    }

    /// Case-insensitive test against the auth and role token sets.
    pub fn mentions_auth(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.auth_tokens
            .iter()
            .chain(self.role_tokens.iter())
            .any(|token| lower.contains(token.as_str()))
    }

    /// Case-sensitive test against the role keywords.
    pub fn mentions_role(&self, text: &str) -> bool {
        self.role_keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Classifies syntax nodes as auth-related.
#[derive(Debug, Clone, Default)]
pub struct AuthPatternMatcher {
    vocabulary: Vocabulary,
}

impl AuthPatternMatcher {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// True if the node's text contains any auth, role, or custom role token.
    pub fn has_auth_pattern(&self, index: &SyntaxIndex, node: Node<'_>) -> bool {
        self.vocabulary.mentions_auth(index.text(node))
    }

    /// Extracts session, role and ownership checks below `node`.
    ///
    /// A node may yield several checks; the result keeps only the first
    /// check per source line.
    pub fn extract_auth_checks(&self, index: &SyntaxIndex, node: Node<'_>) -> Vec<AuthCheck> {
        let mut checks: Vec<AuthCheck> = Vec::new();

        for descendant in ast::descendants(node) {
            let text = index.text(descendant);
            if text.chars().count() >= MAX_CHECK_TEXT_LEN {
                continue;
            }
            let line = ast::start_line(descendant);
            let compares = COMPARISON_OPERATORS.iter().any(|op| text.contains(op));

            let mut record = |kind: AuthCheckKind| {
                checks.push(AuthCheck {
                    kind,
                    line,
                    details: text.chars().take(DETAILS_LEN).collect(),
                });
            };

            if text.contains("session") {
                record(AuthCheckKind::SessionCheck);
            }
            if self.vocabulary.mentions_role(text) && (compares || text.contains("if")) {
                record(AuthCheckKind::RoleCheck);
            }
            if text.contains("userId") && compares {
                record(AuthCheckKind::OwnershipCheck);
            }
        }

        let mut seen_lines = std::collections::HashSet::new();
        checks.retain(|check| seen_lines.insert(check.line));
        checks
    }

    /// Callee names that look like middleware wrappers, deduplicated.
    pub fn detect_middleware(&self, index: &SyntaxIndex) -> Vec<String> {
        let mut middleware: Vec<String> = Vec::new();
        for call in ast::descendants(index.root()).filter(|n| ast::is_call(*n)) {
            let name = index.callee_name(call);
            if MIDDLEWARE_MARKERS.iter().any(|m| name.contains(m))
                && !middleware.iter().any(|existing| existing == name)
            {
                middleware.push(name.to_string());
            }
        }
        middleware
    }

    /// True if any middleware name indicates authentication.
    pub fn has_auth_middleware(middleware: &[String]) -> bool {
        middleware.iter().any(|mw| {
            let lower = mw.to_lowercase();
            AUTH_MIDDLEWARE_MARKERS.iter().any(|m| lower.contains(m))
        })
    }
}
