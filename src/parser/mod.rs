//! # Parser Module
//!
//! @title TypeScript Route Parser
//! @author Ramprasad
//!
//! This module provides AST parsing utilities for analyzing Next.js API route
//! files. It uses `tree-sitter` with the TypeScript grammar to parse source
//! code and index the declarations the analysis passes need.
//!
//! ## Submodules
//!
//! - [`ast`] - Node helpers (descendants, bounded ancestor walk, kind predicates)
//! - [`routes`] - Route file discovery and URL path derivation
//! - [`parameters`] - Request parameter extraction
//!
//! ## Key Types
//!
//! - [`SyntaxIndex`] - A parsed route file with its exported handlers and function map
//! - [`Parameter`] - A request input read by the route

pub mod ast;
mod parameters;
mod routes;

pub use parameters::*;
pub use routes::*;

use crate::error::{Result, SentinelError};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// HTTP method names recognised as exported route handlers.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// A parsed route file.
///
/// Owns the source text and its syntax tree. Built fresh for every file and
/// dropped before the next one, so identifiers never leak across files.
///
/// # Example
///
/// ```rust,ignore
/// let index = SyntaxIndex::parse("app/api/tasks/route.ts", source)?;
/// for method in index.http_methods() {
///     let handler = index.method_handler(&method);
/// }
/// ```
pub struct SyntaxIndex {
    file_path: String,
    source: String,
    tree: Tree,
}

impl std::fmt::Debug for SyntaxIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxIndex")
            .field("file_path", &self.file_path)
            .field("len", &self.source.len())
            .finish()
    }
}

impl SyntaxIndex {
    /// Parses a route file.
    ///
    /// `.tsx` files use the TSX grammar, everything else the TypeScript one.
    /// A tree containing syntax errors is still returned (tree-sitter
    /// recovers locally); only a missing tree is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Parse`] if the grammar cannot be loaded or
    /// the parser produces no tree.
    pub fn parse(file_path: &str, source: String) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language_for(file_path))
            .map_err(|e| SentinelError::Parse {
                path: file_path.to_string(),
                reason: e.to_string(),
            })?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| SentinelError::Parse {
                path: file_path.to_string(),
                reason: "parser returned no syntax tree".to_string(),
            })?;

        if tree.root_node().has_error() {
            log::warn!("{} contains syntax errors; analysis may be partial", file_path);
        }

        Ok(Self {
            file_path: file_path.to_string(),
            source,
            tree,
        })
    }

    /// Reads and parses a route file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| SentinelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&path.to_string_lossy(), source)
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Full source text of a node.
    pub fn text<'a>(&'a self, node: Node<'_>) -> &'a str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Name of the function a call expression invokes.
    ///
    /// Plain identifiers yield their name, property accesses their whole
    /// chain (`db.user.delete`); any other callee yields an empty string.
    pub fn callee_name<'a>(&'a self, call: Node<'_>) -> &'a str {
        match ast::callee(call) {
            Some(callee) if ast::is_identifier(callee) || ast::is_member_access(callee) => {
                self.text(callee)
            }
            _ => "",
        }
    }

    /// HTTP methods exported by this file, in source order, without duplicates.
    pub fn http_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = Vec::new();
        for (name, _) in self.exported_bindings() {
            if HTTP_METHODS.contains(&name.as_str()) && !methods.contains(&name) {
                methods.push(name);
            }
        }
        methods
    }

    /// Locates the handler bound to an exported HTTP method name.
    ///
    /// Resolves `export function GET`, `export const GET = ...` and
    /// `export { handler as GET }`, then falls back to any top-level
    /// variable with the method's name.
    pub fn method_handler(&self, method: &str) -> Option<Node<'_>> {
        let exported = self
            .exported_bindings()
            .into_iter()
            .find(|(name, _)| name == method)
            .and_then(|(_, node)| node);

        if exported.is_some() {
            return exported;
        }

        self.top_level_variables()
            .into_iter()
            .find(|(name, _)| name == method)
            .and_then(|(_, value)| value)
    }

    /// Top-level functions by name, for same-file call resolution.
    ///
    /// Includes function declarations and variables initialised with a
    /// function or arrow expression.
    pub fn function_map(&self) -> HashMap<String, Node<'_>> {
        let mut map = HashMap::new();

        for decl in self.top_level_declarations() {
            if matches!(
                decl.kind(),
                "function_declaration" | "generator_function_declaration"
            ) {
                if let Some(name) = decl.child_by_field_name("name") {
                    map.insert(self.text(name).to_string(), decl);
                }
            }
        }

        for (name, value) in self.top_level_variables() {
            if let Some(value) = value.filter(|v| ast::is_function_boundary(*v)) {
                map.insert(name, value);
            }
        }

        map
    }

    /// Distinct bare-identifier calls made anywhere inside `node`, in order of
    /// first appearance. Property-access calls such as `obj.fn()` are skipped.
    pub fn direct_calls(&self, node: Node<'_>) -> Vec<String> {
        let mut calls: Vec<String> = Vec::new();
        for call in ast::descendants(node).filter(|n| ast::is_call(*n)) {
            if let Some(callee) = ast::callee(call).filter(|c| ast::is_identifier(*c)) {
                let name = self.text(callee);
                if !calls.iter().any(|c| c == name) {
                    calls.push(name.to_string());
                }
            }
        }
        calls
    }

    /// Program-level declarations, unwrapping `export` statements.
    fn top_level_declarations(&self) -> Vec<Node<'_>> {
        ast::named_children(self.root())
            .into_iter()
            .filter_map(|child| {
                if child.kind() == "export_statement" {
                    child.child_by_field_name("declaration")
                } else {
                    Some(child)
                }
            })
            .collect()
    }

    /// Top-level `const`/`let`/`var` bindings with their initialisers.
    fn top_level_variables(&self) -> Vec<(String, Option<Node<'_>>)> {
        let mut vars = Vec::new();
        for decl in self.top_level_declarations() {
            if matches!(decl.kind(), "lexical_declaration" | "variable_declaration") {
                for declarator in ast::named_children(decl) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(name) = declarator.child_by_field_name("name") {
                        vars.push((
                            self.text(name).to_string(),
                            declarator.child_by_field_name("value"),
                        ));
                    }
                }
            }
        }
        vars
    }

    /// Every exported name with the declaration node it resolves to.
    ///
    /// Names re-exported from another module resolve to `None`.
    fn exported_bindings(&self) -> Vec<(String, Option<Node<'_>>)> {
        let mut bindings = Vec::new();
        let functions = self.function_map();
        let variables = self.top_level_variables();

        for stmt in ast::named_children(self.root()) {
            if stmt.kind() != "export_statement" {
                continue;
            }

            if let Some(decl) = stmt.child_by_field_name("declaration") {
                match decl.kind() {
                    "function_declaration" | "generator_function_declaration" => {
                        if let Some(name) = decl.child_by_field_name("name") {
                            bindings.push((self.text(name).to_string(), Some(decl)));
                        }
                    }
                    "lexical_declaration" | "variable_declaration" => {
                        for declarator in ast::named_children(decl) {
                            if let Some(name) = declarator.child_by_field_name("name") {
                                bindings.push((
                                    self.text(name).to_string(),
                                    declarator.child_by_field_name("value"),
                                ));
                            }
                        }
                    }
                    _ => {}
                }
                continue;
            }

            let reexport = stmt.child_by_field_name("source").is_some();
            for clause in ast::named_children(stmt) {
                if clause.kind() != "export_clause" {
                    continue;
                }
                for specifier in ast::named_children(clause) {
                    let Some(local) = specifier.child_by_field_name("name") else {
                        continue;
                    };
                    let local = self.text(local);
                    let exported = specifier
                        .child_by_field_name("alias")
                        .map(|alias| self.text(alias))
                        .unwrap_or(local);

                    let target = if reexport {
                        None
                    } else {
                        functions.get(local).copied().or_else(|| {
                            variables
                                .iter()
                                .find(|(name, _)| name == local)
                                .and_then(|(_, value)| *value)
                        })
                    };
                    bindings.push((exported.to_string(), target));
                }
            }
        }

        bindings
    }
}

/// Picks the grammar for a file based on its extension.
fn language_for(file_path: &str) -> Language {
    if file_path.ends_with(".tsx") {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }
}
