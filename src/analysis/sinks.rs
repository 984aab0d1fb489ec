//! # Sink Detection
//!
//! @title Sensitive Operation (Sink) Detector
//! @author Ramprasad
//!
//! Classifies call sites into sink categories using callee-name pattern
//! tables plus operator-supplied custom sink definitions.
//!
//! ## Detection Strategy
//!
//! Every call below the given node is checked against each family
//! independently. One call may therefore yield several sinks (for example
//! `db.user.deleteMany` is both a write and, through its text, nothing
//! else), and overlapping results are kept on purpose.
//!
//! | Family | Callee contains | Extra condition | Sink |
//! |--------|-----------------|-----------------|------|
//! | Raw SQL | `$queryRaw`, `$executeRaw`, `raw`, ... | mutating SQL keyword | `raw_sql` |
//! | Raw SQL | same | `SELECT` and `user`/`User` | `user_table_read` |
//! | Write | `create`, `update`, `delete`, ... | | `database_write` |
//! | Read | `findMany`, `findUnique`, `findFirst`, `query` | `user`/`User` in call | `user_table_read` |
//! | File | `writeFile`, `unlink`, `rm`, ... | | `file_write` |
//! | Session | `session` | `set` or `update` | `session_modify` |
//! | Custom | configured pattern | | custom name |

use super::{Sink, SinkKind};
use crate::config::CustomSinkDef;
use crate::parser::{ast, SyntaxIndex};
use tree_sitter::Node;

const RAW_SQL_PATTERNS: &[&str] = &["$queryRaw", "$executeRaw", "queryRaw", "executeRaw", "raw"];

const MUTATING_SQL: &[&str] = &["DELETE", "UPDATE", "INSERT", "DROP", "ALTER", "TRUNCATE"];

const DB_WRITE_PATTERNS: &[&str] = &[
    "create",
    "update",
    "delete",
    "insert",
    "save",
    "remove",
    "upsert",
    "deleteMany",
    "updateMany",
];

const DB_READ_PATTERNS: &[&str] = &["findMany", "findUnique", "findFirst", "query"];

const FILE_WRITE_PATTERNS: &[&str] = &[
    "writeFile",
    "writeFileSync",
    "appendFile",
    "unlink",
    "unlinkSync",
    "rmSync",
    "rm",
];

/// Detects sensitive operations in a subtree.
#[derive(Debug, Clone, Default)]
pub struct SinkDetector {
    custom_sinks: Vec<CustomSinkDef>,
}

impl SinkDetector {
    pub fn new(custom_sinks: Vec<CustomSinkDef>) -> Self {
        Self { custom_sinks }
    }

    /// Finds every sink among the call expressions below `node`.
    ///
    /// Each sink starts with a one-element call path (its own callee name)
    /// and `is_protected == false`; protection is decided later.
    pub fn detect_sinks(&self, index: &SyntaxIndex, node: Node<'_>) -> Vec<Sink> {
        let mut sinks = Vec::new();

        for call in ast::descendants(node).filter(|n| ast::is_call(*n)) {
            let callee = index.callee_name(call);
            let line = ast::start_line(call);
            let mut push = |kind: SinkKind| sinks.push(Sink::direct(kind, line, callee));

            if contains_any(callee, RAW_SQL_PATTERNS) {
                let code = index.text(call);
                let upper = code.to_uppercase();
                if MUTATING_SQL.iter().any(|kw| upper.contains(kw)) {
                    push(SinkKind::RawSql);
                } else if upper.contains("SELECT") && mentions_user(code) {
                    push(SinkKind::UserTableRead);
                }
            }

            if contains_any(callee, DB_WRITE_PATTERNS) {
                push(SinkKind::DatabaseWrite);
            }

            if contains_any(callee, DB_READ_PATTERNS) && mentions_user(index.text(call)) {
                push(SinkKind::UserTableRead);
            }

            if contains_any(callee, FILE_WRITE_PATTERNS) {
                push(SinkKind::FileWrite);
            }

            if callee.contains("session") && (callee.contains("set") || callee.contains("update"))
            {
                push(SinkKind::SessionModify);
            }

            for custom in &self.custom_sinks {
                if custom
                    .patterns
                    .iter()
                    .any(|p| !p.is_empty() && callee.contains(p.as_str()))
                {
                    push(SinkKind::Custom {
                        name: custom.name.clone(),
                        severity: custom.severity,
                    });
                }
            }
        }

        sinks
    }
}

fn contains_any(haystack: &str, patterns: &[&str]) -> bool {
    !haystack.is_empty() && patterns.iter().any(|p| haystack.contains(p))
}

fn mentions_user(code: &str) -> bool {
    code.contains("user") || code.contains("User")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    fn detect(source: &str, custom: Vec<CustomSinkDef>) -> Vec<Sink> {
        let idx = SyntaxIndex::parse("app/api/x/route.ts", source.to_string()).unwrap();
        SinkDetector::new(custom).detect_sinks(&idx, idx.root())
    }

    fn kinds(sinks: &[Sink]) -> Vec<SinkKind> {
        sinks.iter().map(|s| s.kind.clone()).collect()
    }

    #[test]
    fn test_database_write() {
        let sinks = detect("db.task.create({ title });\n", vec![]);
        assert_eq!(kinds(&sinks), vec![SinkKind::DatabaseWrite]);
        assert_eq!(sinks[0].call_path, vec!["db.task.create"]);
        assert_eq!(sinks[0].line, 1);
        assert!(!sinks[0].is_protected);
    }

    #[test]
    fn test_user_table_read_requires_user_text() {
        assert_eq!(
            kinds(&detect("db.user.findMany();\n", vec![])),
            vec![SinkKind::UserTableRead]
        );
        assert!(detect("db.task.findMany();\n", vec![]).is_empty());
    }

    #[test]
    fn test_raw_sql_mutation() {
        let sinks = detect(
            "const r = db.$executeRaw`DELETE FROM user_data WHERE user_id = ${id}`;\n",
            vec![],
        );
        assert_eq!(kinds(&sinks), vec![SinkKind::RawSql]);
    }

    #[test]
    fn test_raw_sql_user_select() {
        let sinks = detect("db.$queryRaw`SELECT * FROM User`;\n", vec![]);
        assert!(kinds(&sinks).contains(&SinkKind::UserTableRead));
        assert!(!kinds(&sinks).contains(&SinkKind::RawSql));
    }

    #[test]
    fn test_overlapping_categories_are_kept() {
        // `queryRaw` is both a raw SQL callee and a read-family callee.
        let sinks = detect("db.queryRaw(\"SELECT * FROM users\");\n", vec![]);
        assert_eq!(
            kinds(&sinks),
            vec![SinkKind::UserTableRead, SinkKind::UserTableRead]
        );
    }

    #[test]
    fn test_file_and_session_sinks() {
        let sinks = detect(
            "fs.writeFileSync(path, data);\nsession.set(\"k\", v);\n",
            vec![],
        );
        assert_eq!(kinds(&sinks), vec![SinkKind::FileWrite, SinkKind::SessionModify]);
    }

    #[test]
    fn test_custom_sink() {
        let custom = vec![CustomSinkDef {
            name: "payment_charge".into(),
            patterns: vec!["charges.create".into()],
            severity: Severity::Critical,
            description: String::new(),
        }];
        let sinks = detect("stripe.charges.create({ amount });\n", custom);
        assert_eq!(
            kinds(&sinks),
            vec![
                SinkKind::DatabaseWrite,
                SinkKind::Custom {
                    name: "payment_charge".into(),
                    severity: Severity::Critical
                }
            ]
        );
        assert_eq!(sinks[1].custom_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_non_sink_calls_ignored() {
        assert!(detect("NextResponse.json({ ok: true });\nconsole.log(x);\n", vec![]).is_empty());
    }
}
