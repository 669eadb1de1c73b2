//! Counter-model extraction: parses a solver's `(get-value (name))`
//! response and reinterprets the raw s-expression per the constant's
//! declared sort.

use act_core::types::ActType;
use num_bigint::BigInt;
use regex::Regex;

/// One reinterpreted counter-model value.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValue {
    Int(BigInt),
    Bool(bool),
    ByteStr(String),
}

/// A counter-model: the name each `(get-value ...)` call was issued for,
/// paired with its reinterpreted value, in the order the driver asked for
/// them (spec §4.7: "model extraction lines are issued and read in the
/// order the model fields are enumerated").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub assignments: Vec<(String, ModelValue)>,
}

impl Model {
    pub fn push(&mut self, name: String, value: ModelValue) {
        self.assignments.push((name, value));
    }
}

/// Strips a `((name value))` s-expression down to the raw `value` text,
/// additionally unwrapping a parenthesized negative number like `(- 5)`
/// into `-5`. Returns `None` if `raw` doesn't match the expected shape
/// (surfaced by the caller as [`crate::error::SolverError::UnrecognizedResponse`]).
pub fn strip_get_value_response(raw: &str) -> Option<String> {
    let outer = Regex::new(r"^\(\(\s*\S+\s+(.+)\)\)\s*$").unwrap();
    let inner = outer.captures(raw.trim())?;
    let value = inner.get(1)?.as_str().trim();

    let neg = Regex::new(r"^\(\s*-\s*(\d+)\s*\)$").unwrap();
    if let Some(c) = neg.captures(value) {
        return Some(format!("-{}", &c[1]));
    }
    Some(value.trim_matches('"').to_string())
}

/// Reinterprets a stripped value per act-type (spec §4.7: "integer via
/// numeric read, boolean via {\"true\",\"false\"}, bytestring as literal
/// bytes").
pub fn reinterpret(value: &str, ty: ActType) -> Option<ModelValue> {
    match ty {
        ActType::AInteger | ActType::AContract => value.parse::<BigInt>().ok().map(ModelValue::Int),
        ActType::ABoolean => match value {
            "true" => Some(ModelValue::Bool(true)),
            "false" => Some(ModelValue::Bool(false)),
            _ => None,
        },
        ActType::AByteStr => Some(ModelValue::ByteStr(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_simple_get_value_response() {
        assert_eq!(
            strip_get_value_response("((Token_totalSupply_Post 42))"),
            Some("42".to_string())
        );
    }

    #[test]
    fn unwraps_parenthesized_negative_number() {
        assert_eq!(
            strip_get_value_response("((x (- 5)))"),
            Some("-5".to_string())
        );
    }

    #[test]
    fn reinterprets_integer_and_boolean_values() {
        assert_eq!(reinterpret("42", ActType::AInteger), Some(ModelValue::Int(BigInt::from(42))));
        assert_eq!(reinterpret("true", ActType::ABoolean), Some(ModelValue::Bool(true)));
        assert_eq!(reinterpret("garbage", ActType::ABoolean), None);
    }
}
