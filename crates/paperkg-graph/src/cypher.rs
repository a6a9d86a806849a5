//! Cypher text and parameter building.
//!
//! Builders here are pure so the generated text can be checked without a
//! database; [`CypherQuery::into_query`] turns them into `neo4rs` queries.

use neo4rs::Query;

/// Predicate restricting `var` to the labels this service knows about.
pub fn known_labels(var: &str) -> String {
    format!("({v}:Paper OR {v}:Author OR {v}:Organization)", v = var)
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Convert a scalar JSON property. Nulls have no value; nested values are
    /// stored as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            other => Some(Self::Str(other.to_string())),
        }
    }
}

/// Cypher text plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    pub text: String,
    pub params: Vec<(String, ParamValue)>,
}

impl CypherQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: ParamValue) -> Self {
        self.params.push((name.to_string(), value));
        self
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    pub fn into_query(self) -> Query {
        let mut query = Query::new(self.text);
        for (name, value) in self.params {
            query = match value {
                ParamValue::Int(v) => query.param(&name, v),
                ParamValue::Float(v) => query.param(&name, v),
                ParamValue::Bool(v) => query.param(&name, v),
                ParamValue::Str(v) => query.param(&name, v),
                ParamValue::List(v) => query.param(&name, v),
            };
        }
        query
    }
}

/// Columns projecting a node variable: `{var}_eid`, `{var}_labels`, `{var}_props`.
pub fn node_columns(var: &str) -> String {
    format!(
        "elementId({v}) AS {v}_eid, labels({v}) AS {v}_labels, properties({v}) AS {v}_props",
        v = var
    )
}

/// Columns projecting a relationship variable: `{var}_start`, `{var}_end`,
/// `{var}_type`, `{var}_props`. All null when the variable is null.
pub fn rel_columns(var: &str) -> String {
    format!(
        "elementId(startNode({v})) AS {v}_start, elementId(endNode({v})) AS {v}_end, \
         type({v}) AS {v}_type, properties({v}) AS {v}_props",
        v = var
    )
}

/// Sanitize a property key for interpolation (only alphanumeric + underscore).
pub fn safe_key(key: &str) -> Option<String> {
    let safe: String = key
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if safe.is_empty() || safe.starts_with(|c: char| c.is_ascii_digit()) {
        None
    } else {
        Some(safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_from_json() {
        assert_eq!(ParamValue::from_json(&json!(3)), Some(ParamValue::Int(3)));
        assert_eq!(ParamValue::from_json(&json!(2.5)), Some(ParamValue::Float(2.5)));
        assert_eq!(ParamValue::from_json(&json!(null)), None);
        assert_eq!(
            ParamValue::from_json(&json!(["a", "b"])),
            Some(ParamValue::Str("[\"a\",\"b\"]".to_string()))
        );
    }

    #[test]
    fn test_safe_key() {
        assert_eq!(safe_key("h_index"), Some("h_index".to_string()));
        assert_eq!(safe_key("name}) DETACH DELETE (n"), Some("nameDETACHDELETEn".to_string()));
        assert_eq!(safe_key("`"), None);
        assert_eq!(safe_key("1abc"), None);
    }

    #[test]
    fn test_columns() {
        assert_eq!(
            node_columns("a"),
            "elementId(a) AS a_eid, labels(a) AS a_labels, properties(a) AS a_props"
        );
        assert!(rel_columns("r").contains("type(r) AS r_type"));
    }
}
