//! # Parameter Extraction
//!
//! @title Request Parameter Extraction
//! @author Ramprasad
//!
//! Derives the request inputs a route reads (body fields, query, path
//! params, cookies) from property-access chains such as `body.userId` or
//! `request.query.id`. Parameters are extracted once per route file.

use super::{ast, SyntaxIndex};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;
use tree_sitter::Node;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterSource {
    Body,
    Query,
    Params,
    Cookie,
}

/// A request input read by the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Field name; empty when the field could not be determined.
    pub name: String,

    /// Request location.
    pub source: ParameterSource,

    /// Whether the name suggests an object identifier (`id`, `userId`, ...).
    pub contains_object_id: bool,
}

fn object_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z]+Id$").expect("static regex is valid"))
}

/// Returns true if a property name looks like an object identifier.
pub fn looks_like_object_id(name: &str) -> bool {
    name == "id" || object_id_pattern().is_match(name)
}

/// Extracts request parameters from an entire route file.
///
/// Results are deduplicated by `(source, name)`, keeping the first
/// occurrence in source order.
pub fn extract_parameters(index: &SyntaxIndex) -> Vec<Parameter> {
    let mut parameters: Vec<Parameter> = Vec::new();

    let mut push = |param: Parameter| {
        if !parameters
            .iter()
            .any(|p| p.source == param.source && p.name == param.name)
        {
            parameters.push(param);
        }
    };

    for node in ast::descendants(index.root()) {
        if ast::is_member_access(node) {
            let props = property_access_chain(index, node);
            let has_id = props.iter().any(|p| looks_like_object_id(p));

            if let Some(body_index) = props.iter().position(|p| p == "body") {
                push(Parameter {
                    name: props.get(body_index + 1).cloned().unwrap_or_default(),
                    source: ParameterSource::Body,
                    contains_object_id: has_id,
                });
            }

            if props.iter().any(|p| p == "query") {
                push(Parameter {
                    name: "query".to_string(),
                    source: ParameterSource::Query,
                    contains_object_id: has_id,
                });
            }

            if props.iter().any(|p| p == "params") {
                push(Parameter {
                    name: "params".to_string(),
                    source: ParameterSource::Params,
                    contains_object_id: true,
                });
            }
        } else if ast::is_call(node) {
            if let Some(param) = accessor_parameter(index, node) {
                push(param);
            }
        }
    }

    parameters
}

/// Identifier chain of a property access, e.g. `["request", "body", "userId"]`.
///
/// Stops at the first object that is neither a property access nor a plain
/// identifier, so `(await req.json()).title` yields `["title"]`.
fn property_access_chain(index: &SyntaxIndex, node: Node<'_>) -> Vec<String> {
    let mut parts = VecDeque::new();
    let mut current = node;

    while ast::is_member_access(current) {
        if let Some(property) = current.child_by_field_name("property") {
            parts.push_front(index.text(property).to_string());
        }
        match current.child_by_field_name("object") {
            Some(object) if ast::is_identifier(object) => {
                parts.push_front(index.text(object).to_string());
                break;
            }
            Some(object) => current = object,
            None => break,
        }
    }

    parts.into_iter().collect()
}

/// Recognises `cookies().get("x")`, `request.cookies.get("x")` and
/// `searchParams.get("x")` accessor calls.
fn accessor_parameter(index: &SyntaxIndex, call: Node<'_>) -> Option<Parameter> {
    let callee = ast::callee(call).filter(|c| ast::is_member_access(*c))?;
    let property = callee.child_by_field_name("property")?;
    if index.text(property) != "get" {
        return None;
    }

    let object = index.text(callee.child_by_field_name("object")?);
    let source = if object == "cookies()" || object.ends_with(".cookies") || object == "cookies" {
        ParameterSource::Cookie
    } else if object.ends_with("searchParams") {
        ParameterSource::Query
    } else {
        return None;
    };

    let name = first_string_argument(index, call)?;
    Some(Parameter {
        contains_object_id: source == ParameterSource::Query && looks_like_object_id(&name),
        name,
        source,
    })
}

fn first_string_argument(index: &SyntaxIndex, call: Node<'_>) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let first = ast::named_children(args).into_iter().next()?;
    if first.kind() != "string" {
        return None;
    }
    let literal = index.text(first);
    Some(literal.trim_matches(|c| c == '"' || c == '\'').to_string())
}
