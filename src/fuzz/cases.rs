//! # Fuzz Case Generation
//!
//! @title Randomized Request Body Generator
//! @author Ramprasad
//!
//! Builds request bodies from the body parameters found by static analysis.
//! Object-id-looking parameters get a small integer (guessable ids), every
//! other parameter gets either a random alphanumeric string or lorem text.

use super::FuzzCase;
use crate::parser::{Parameter, ParameterSource};
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{Map, Value};

/// Upper bound (inclusive) for guessed object ids.
const MAX_OBJECT_ID: u64 = 1000;

/// Length bounds for random string values.
const MIN_STRING_LEN: usize = 1;
const MAX_STRING_LEN: usize = 100;

const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

/// Body parameters of a route, in extraction order.
pub fn body_parameters(parameters: &[Parameter]) -> Vec<&Parameter> {
    parameters
        .iter()
        .filter(|p| p.source == ParameterSource::Body)
        .collect()
}

/// Generates one fuzz case.
///
/// The body is `None` when the route has no body parameters at all.
/// Parameters with an empty name are skipped. One random string is drawn
/// per case and shared by the string-valued parameters that pick it.
pub fn generate_case<R: Rng + ?Sized>(body_params: &[&Parameter], rng: &mut R) -> FuzzCase {
    let mut case = FuzzCase::json();
    if body_params.is_empty() {
        return case;
    }

    let object_id = rng.random_range(0..=MAX_OBJECT_ID);
    let string_value = random_string(rng);

    let mut body = Map::new();
    for param in body_params.iter().filter(|p| !p.name.is_empty()) {
        let value = if param.contains_object_id {
            Value::from(object_id)
        } else if rng.random_bool(0.5) {
            Value::String(string_value.clone())
        } else {
            Value::String(lorem(rng))
        };
        body.insert(param.name.clone(), value);
    }

    case.body = Some(Value::Object(body));
    case
}

fn random_string<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(MIN_STRING_LEN..=MAX_STRING_LEN);
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

fn lorem<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.random_range(1..=5);
    (0..count)
        .filter_map(|_| LOREM_WORDS.choose(rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}
