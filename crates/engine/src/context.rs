use std::collections::BTreeMap;

use crate::expression::FieldLookup;
use crate::value::PropertyValue;

/// Attribute values of the feature a property is evaluated for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionContext {
    fields: BTreeMap<String, PropertyValue>,
}

impl ExpressionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn field(&self, name: &str) -> Option<&PropertyValue> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl FieldLookup for ExpressionContext {
    fn field_value(&self, name: &str) -> Option<PropertyValue> {
        self.fields.get(name).cloned()
    }
}
