//! Data-defined property: a static value, a field reference or an expression,
//! switched on and off independently of its definition.

use serde::{Deserialize, Serialize};

use crate::context::ExpressionContext;
use crate::expression::Expression;
use crate::value::PropertyValue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PropertySource {
    /// No definition; reads as absent
    #[default]
    Invalid,
    Static(PropertyValue),
    Field(String),
    Expression(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Invalid,
    Static,
    Field,
    Expression,
}

impl PropertyType {
    /// Stable token used in persisted documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Invalid => "invalid",
            PropertyType::Static => "static",
            PropertyType::Field => "field",
            PropertyType::Expression => "expression",
        }
    }

    pub fn from_str_token(token: &str) -> Option<Self> {
        match token {
            "invalid" => Some(PropertyType::Invalid),
            "static" => Some(PropertyType::Static),
            "field" => Some(PropertyType::Field),
            "expression" => Some(PropertyType::Expression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Property {
    source: PropertySource,
    active: bool,
}

impl Property {
    pub const fn invalid() -> Self {
        Self {
            source: PropertySource::Invalid,
            active: false,
        }
    }

    pub fn from_value(value: impl Into<PropertyValue>) -> Self {
        Self::new(PropertySource::Static(value.into()), true)
    }

    pub fn from_field(field: impl Into<String>) -> Self {
        Self::new(PropertySource::Field(field.into()), true)
    }

    pub fn from_expression(expression: impl Into<String>) -> Self {
        Self::new(PropertySource::Expression(expression.into()), true)
    }

    pub fn new(source: PropertySource, active: bool) -> Self {
        Self { source, active }
    }

    pub fn source(&self) -> &PropertySource {
        &self.source
    }

    pub fn property_type(&self) -> PropertyType {
        match self.source {
            PropertySource::Invalid => PropertyType::Invalid,
            PropertySource::Static(_) => PropertyType::Static,
            PropertySource::Field(_) => PropertyType::Field,
            PropertySource::Expression(_) => PropertyType::Expression,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.source, PropertySource::Invalid)
    }

    /// Invalid properties are never active, whatever the flag says.
    pub fn is_active(&self) -> bool {
        self.active && self.is_valid()
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn static_value(&self) -> Option<&PropertyValue> {
        match &self.source {
            PropertySource::Static(v) => Some(v),
            _ => None,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match &self.source {
            PropertySource::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn expression_string(&self) -> Option<&str> {
        match &self.source {
            PropertySource::Expression(e) => Some(e),
            _ => None,
        }
    }

    /// Expression equivalent of this property. Expression text is returned
    /// verbatim, fields become quoted column references, statics become literals.
    pub fn as_expression(&self) -> String {
        match &self.source {
            PropertySource::Invalid => String::new(),
            PropertySource::Static(v) => v.to_literal(),
            PropertySource::Field(f) => Expression::quoted_column_ref(f),
            PropertySource::Expression(e) => e.clone(),
        }
    }

    pub fn referenced_fields(&self) -> Vec<String> {
        match &self.source {
            PropertySource::Field(f) => vec![f.clone()],
            PropertySource::Expression(e) => Expression::new(e.as_str()).referenced_columns(),
            PropertySource::Invalid | PropertySource::Static(_) => Vec::new(),
        }
    }

    /// Current value for a feature. Inactive, invalid, missing fields and
    /// failed evaluations all read as `None`.
    pub fn value(&self, context: &ExpressionContext) -> Option<PropertyValue> {
        if !self.is_active() {
            return None;
        }

        match &self.source {
            PropertySource::Invalid => None,
            PropertySource::Static(v) => Some(v.clone()),
            PropertySource::Field(f) => context.field(f).cloned(),
            PropertySource::Expression(text) => match Expression::new(text.as_str()).evaluate(context) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::debug!("data-defined expression '{}' failed: {}", text, e);
                    None
                }
            },
        }
    }

    /// Numeric value, or `default` with `false` when none is available.
    pub fn value_as_f64(&self, context: &ExpressionContext, default: f64) -> (f64, bool) {
        match self.value(context).and_then(|v| v.as_f64()) {
            Some(n) => (n, true),
            None => (default, false),
        }
    }
}
