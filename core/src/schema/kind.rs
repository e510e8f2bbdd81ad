//! Value kinds and the token coercion rule shared by set, add and search.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;


/// The declared type of a field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Integer,
    Float,
    /// Deduplicated, unordered collection of strings.
    #[serde(rename = "list")]
    StringSet,
}

impl ValueKind {
    /// User-facing type name, as shown in "must be of type" replies.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::StringSet => "list",
        }
    }

    pub fn is_set(self) -> bool {
        matches!(self, ValueKind::StringSet)
    }

    /// Coerce raw text tokens into a value of this kind.
    ///
    /// Sets take the tokens verbatim as members, strings join them with a
    /// single space, numbers parse the joined text. On failure the expected
    /// type name is returned.
    pub fn coerce(self, tokens: &[String]) -> Result<FieldValue, &'static str> {
        match self {
            ValueKind::StringSet => Ok(FieldValue::Set(tokens.iter().cloned().collect())),
            ValueKind::String => Ok(FieldValue::Text(tokens.join(" "))),
            ValueKind::Integer => tokens
                .join(" ")
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| self.type_name()),
            ValueKind::Float => tokens
                .join(" ")
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(FieldValue::Float)
                .ok_or(self.type_name()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}


/// A typed attribute value held by a site record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Set(BTreeSet<String>),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::String,
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::Set(_) => ValueKind::StringSet,
        }
    }

    /// Encode as a document value: scalars as json scalars, sets as an
    /// array of strings.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Set(members) => {
                Value::Array(members.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Decode a document value against the declared kind. Values that do not
    /// fit the kind yield `None` and are treated as unset.
    pub fn from_json(kind: ValueKind, value: &Value) -> Option<FieldValue> {
        match (kind, value) {
            (ValueKind::String, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (ValueKind::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
            (ValueKind::Float, Value::Number(n)) => n.as_f64().map(FieldValue::Float),
            (ValueKind::StringSet, Value::Array(items)) => Some(FieldValue::Set(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }

    /// The members of a set value, or `None` for scalars.
    pub fn members(&self) -> Option<&BTreeSet<String>> {
        match self {
            FieldValue::Set(members) => Some(members),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    /// Sets render sorted ascending and space-joined.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Set(members) => {
                let joined: Vec<&str> = members.iter().map(String::as_str).collect();
                f.write_str(&joined.join(" "))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn string_joins_tokens_with_single_space() {
        let v = ValueKind::String.coerce(&toks(&["fast", "and", "big"])).unwrap();
        assert_eq!(v, FieldValue::Text("fast and big".into()));
    }

    #[test]
    fn set_uses_tokens_verbatim_and_dedups() {
        let v = ValueKind::StringSet.coerce(&toks(&["b", "a", "b"])).unwrap();
        let members: Vec<&String> = v.members().unwrap().iter().collect();
        assert_eq!(members, vec!["a", "b"]);
    }

    #[test]
    fn integer_parse_failure_names_type() {
        assert_eq!(ValueKind::Integer.coerce(&toks(&["abc"])), Err("integer"));
        assert_eq!(ValueKind::Integer.coerce(&toks(&["100"])), Ok(FieldValue::Integer(100)));
    }

    #[test]
    fn float_rejects_text_and_non_finite() {
        assert_eq!(ValueKind::Float.coerce(&toks(&["1.5"])), Ok(FieldValue::Float(1.5)));
        assert_eq!(ValueKind::Float.coerce(&toks(&["x"])), Err("float"));
        assert_eq!(ValueKind::Float.coerce(&toks(&["NaN"])), Err("float"));
    }

    #[test]
    fn integer_with_two_tokens_fails() {
        assert_eq!(ValueKind::Integer.coerce(&toks(&["1", "2"])), Err("integer"));
    }

    #[test]
    fn json_decoding_respects_kind() {
        let v = serde_json::json!(["x", "y"]);
        assert!(FieldValue::from_json(ValueKind::StringSet, &v).is_some());
        assert!(FieldValue::from_json(ValueKind::String, &v).is_none());
        let n = serde_json::json!(3);
        assert_eq!(FieldValue::from_json(ValueKind::Float, &n), Some(FieldValue::Float(3.0)));
    }

    #[test]
    fn kind_serde_names() {
        assert_eq!(serde_json::to_string(&ValueKind::StringSet).unwrap(), "\"list\"");
        assert_eq!(serde_json::to_string(&ValueKind::Integer).unwrap(), "\"integer\"");
    }

    #[test]
    fn display_sorts_set_members() {
        let v = ValueKind::StringSet.coerce(&toks(&["zeta", "alpha"])).unwrap();
        assert_eq!(v.to_string(), "alpha zeta");
    }
}
