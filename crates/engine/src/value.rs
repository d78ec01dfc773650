use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Scalar carried by static properties, feature attributes and expression results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    Text(String),
}

impl PropertyValue {
    pub fn number(n: f64) -> Self {
        PropertyValue::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        PropertyValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Numeric view. Text converts when it parses as a number; NULL and
    /// non-numeric text have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            PropertyValue::Number(n) => Some(n.0),
            PropertyValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Truthiness; NULL has none.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Null => None,
            PropertyValue::Bool(b) => Some(*b),
            PropertyValue::Number(n) => Some(n.0 != 0.0),
            PropertyValue::Text(s) => {
                let upper = s.trim().to_uppercase();
                if upper == "TRUE" {
                    Some(true)
                } else if upper == "FALSE" {
                    Some(false)
                } else {
                    s.trim().parse::<f64>().ok().map(|n| n != 0.0)
                }
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::Text(_) => "text",
        }
    }

    /// Rebuild a value from its persisted type name and text form.
    /// Unknown type names read as text.
    pub fn from_typed_str(type_name: &str, raw: &str) -> Self {
        match type_name {
            "null" => PropertyValue::Null,
            "bool" => PropertyValue::Bool(raw == "1" || raw.eq_ignore_ascii_case("true")),
            "number" => raw
                .trim()
                .parse()
                .map(PropertyValue::number)
                .unwrap_or(PropertyValue::Null),
            _ => PropertyValue::Text(raw.to_string()),
        }
    }

    /// Literal form that parses back to this value as an expression.
    pub fn to_literal(&self) -> String {
        match self {
            PropertyValue::Null => "NULL".to_string(),
            PropertyValue::Bool(true) => "TRUE".to_string(),
            PropertyValue::Bool(false) => "FALSE".to_string(),
            PropertyValue::Number(n) => n.0.to_string(),
            PropertyValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => Ok(()),
            PropertyValue::Bool(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            PropertyValue::Number(n) => write!(f, "{}", n.0),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}
