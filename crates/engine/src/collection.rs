//! Keyed collection of data-defined properties.
//!
//! Keys are small enums implementing [`PropertyKey`]; each owner (elevation
//! settings, symbol layers, ...) brings its own key set and reuses this type.
//!
//! Persisted as:
//!
//! ```xml
//! <data-defined-properties name="">
//!   <property key="zOffset" active="1" type="expression" value="&quot;z&quot; * 2"/>
//!   <property key="extrusionHeight" active="0" type="static" value-type="number" value="4"/>
//! </data-defined-properties>
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use strata_io::{MessageLevel, ReadWriteContext, XmlDocument, XmlElement};

use crate::context::ExpressionContext;
use crate::property::{Property, PropertySource, PropertyType};
use crate::value::PropertyValue;

static INVALID_PROPERTY: Property = Property::invalid();

/// Value shape a property is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardPropertyType {
    Boolean,
    Integer,
    Double,
    /// Double, zero or greater
    DoublePositive,
    String,
    Color,
}

impl StandardPropertyType {
    pub fn help_text(&self) -> &'static str {
        match self {
            StandardPropertyType::Boolean => "bool [1=True|0=False]",
            StandardPropertyType::Integer => "int",
            StandardPropertyType::Double => "double",
            StandardPropertyType::DoublePositive => "double >= 0.0",
            StandardPropertyType::String => "string",
            StandardPropertyType::Color => "string [r,g,b,a] or [#rrggbb]",
        }
    }

    /// Whether a concrete value fits this shape.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match self {
            StandardPropertyType::Boolean => value.as_bool().is_some(),
            StandardPropertyType::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
            StandardPropertyType::Double => value.as_f64().is_some(),
            StandardPropertyType::DoublePositive => value.as_f64().is_some_and(|n| n >= 0.0),
            StandardPropertyType::String | StandardPropertyType::Color => {
                matches!(value, PropertyValue::Text(_))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDefinition {
    /// Stable key used in persisted documents
    pub name: &'static str,
    pub description: &'static str,
    pub standard_type: StandardPropertyType,
}

/// A fixed set of override targets.
pub trait PropertyKey: Copy + Ord + Debug + 'static {
    fn definition(self) -> PropertyDefinition;

    fn all() -> &'static [Self];

    fn name(self) -> &'static str {
        self.definition().name
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCollection<K: PropertyKey> {
    name: String,
    properties: BTreeMap<K, Property>,
}

impl<K: PropertyKey> Default for PropertyCollection<K> {
    fn default() -> Self {
        Self::new("")
    }
}

impl<K: PropertyKey> PropertyCollection<K> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Store a property under `key`. An invalid property removes the key.
    pub fn set_property(&mut self, key: K, property: Property) {
        if property.is_valid() {
            self.properties.insert(key, property);
        } else {
            self.properties.remove(&key);
        }
    }

    /// Property for `key`, or a neutral invalid property when unset.
    pub fn property(&self, key: K) -> &Property {
        self.properties.get(&key).unwrap_or(&INVALID_PROPERTY)
    }

    pub fn property_mut(&mut self, key: K) -> Option<&mut Property> {
        self.properties.get_mut(&key)
    }

    pub fn has_property(&self, key: K) -> bool {
        self.properties.contains_key(&key)
    }

    pub fn is_active(&self, key: K) -> bool {
        self.property(key).is_active()
    }

    pub fn has_active_properties(&self) -> bool {
        self.properties.values().any(Property::is_active)
    }

    pub fn property_keys(&self) -> Vec<K> {
        self.properties.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn clear(&mut self) {
        self.properties.clear();
    }

    pub fn value(&self, key: K, context: &ExpressionContext) -> Option<PropertyValue> {
        self.property(key).value(context)
    }

    pub fn value_as_f64(&self, key: K, context: &ExpressionContext, default: f64) -> (f64, bool) {
        self.property(key).value_as_f64(context, default)
    }

    /// Attribute names needed to evaluate every active property.
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        self.properties
            .values()
            .filter(|p| p.is_active())
            .flat_map(Property::referenced_fields)
            .collect()
    }

    // =========================================================================
    // XML
    // =========================================================================

    /// Append `<element_name>` holding every property, active or not.
    pub fn write_xml(&self, parent: &mut XmlElement, document: &XmlDocument, element_name: &str) -> bool {
        let mut element = document.create_element(element_name);
        element.set_attribute("name", &self.name);

        for (key, property) in &self.properties {
            let mut prop_el = document.create_element("property");
            prop_el.set_attribute("key", key.name());
            prop_el.set_attribute_bool("active", property.is_active());
            prop_el.set_attribute("type", property.property_type().as_str());
            match property.source() {
                PropertySource::Invalid => {}
                PropertySource::Static(value) => {
                    prop_el.set_attribute("value-type", value.type_name());
                    prop_el.set_attribute("value", value);
                }
                PropertySource::Field(field) => prop_el.set_attribute("value", field),
                PropertySource::Expression(text) => prop_el.set_attribute("value", text),
            }
            element.append_child(prop_el);
        }

        parent.append_child(element);
        true
    }

    /// Replace the whole collection from `<element_name>` under `parent`.
    /// A missing element leaves the collection empty and returns false.
    pub fn read_xml(&mut self, parent: &XmlElement, element_name: &str, context: &mut ReadWriteContext) -> bool {
        self.properties.clear();
        self.name.clear();

        let Some(element) = parent.first_child_element(element_name) else {
            return false;
        };
        self.name = element.attribute_or("name", "").to_string();

        for prop_el in element.child_elements("property") {
            let key_name = prop_el.attribute_or("key", "");
            let Some(key) = K::from_name(key_name) else {
                context.push_message(
                    format!("ignoring data-defined property with unknown key '{}'", key_name),
                    MessageLevel::Warning,
                );
                continue;
            };

            let raw = prop_el.attribute_or("value", "");
            let source = match prop_el.attribute("type").and_then(PropertyType::from_str_token) {
                Some(PropertyType::Static) => PropertySource::Static(PropertyValue::from_typed_str(
                    prop_el.attribute_or("value-type", "text"),
                    raw,
                )),
                Some(PropertyType::Field) => PropertySource::Field(raw.to_string()),
                Some(PropertyType::Expression) => PropertySource::Expression(raw.to_string()),
                Some(PropertyType::Invalid) => continue,
                None => {
                    context.push_message(
                        format!("ignoring data-defined property '{}' with unknown type", key_name),
                        MessageLevel::Warning,
                    );
                    continue;
                }
            };

            let active = prop_el.attribute_bool("active", false);
            self.set_property(key, Property::new(source, active));
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum TestKey {
        Size,
        Angle,
    }

    impl PropertyKey for TestKey {
        fn definition(self) -> PropertyDefinition {
            match self {
                TestKey::Size => PropertyDefinition {
                    name: "size",
                    description: "Symbol size",
                    standard_type: StandardPropertyType::DoublePositive,
                },
                TestKey::Angle => PropertyDefinition {
                    name: "angle",
                    description: "Rotation",
                    standard_type: StandardPropertyType::Double,
                },
            }
        }

        fn all() -> &'static [Self] {
            &[TestKey::Size, TestKey::Angle]
        }
    }

    #[test]
    fn test_missing_key_is_neutral() {
        let props: PropertyCollection<TestKey> = PropertyCollection::default();
        assert!(!props.is_active(TestKey::Size));
        assert_eq!(props.property(TestKey::Size).property_type(), PropertyType::Invalid);
        assert_eq!(props.property(TestKey::Size).as_expression(), "");
        assert_eq!(
            props.value_as_f64(TestKey::Size, &ExpressionContext::new(), 3.0),
            (3.0, false)
        );
    }

    #[test]
    fn test_set_invalid_removes() {
        let mut props = PropertyCollection::new("test");
        props.set_property(TestKey::Size, Property::from_value(4.0));
        assert!(props.has_property(TestKey::Size));
        props.set_property(TestKey::Size, Property::invalid());
        assert!(!props.has_property(TestKey::Size));
        assert!(props.is_empty());
    }

    #[test]
    fn test_property_mut_toggles_in_place() {
        let mut props = PropertyCollection::new("test");
        props.set_property(TestKey::Angle, Property::from_expression("45"));
        props.property_mut(TestKey::Angle).unwrap().set_active(false);
        assert!(!props.is_active(TestKey::Angle));
        assert!(!props.has_active_properties());
        assert_eq!(props.property(TestKey::Angle).as_expression(), "45");
    }

    #[test]
    fn test_referenced_fields_only_active() {
        let mut props = PropertyCollection::new("test");
        props.set_property(TestKey::Size, Property::from_expression("\"a\" + \"b\""));
        let mut inactive = Property::from_field("c");
        inactive.set_active(false);
        props.set_property(TestKey::Angle, inactive);

        let fields: Vec<_> = props.referenced_fields().into_iter().collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_xml_round_trip() {
        let mut props = PropertyCollection::new("symbol");
        props.set_property(TestKey::Size, Property::from_expression("\"w\" * 2 > 'x'"));
        let mut angle = Property::from_value(12.5);
        angle.set_active(false);
        props.set_property(TestKey::Angle, angle);

        let doc = XmlDocument::new("testdoc");
        let mut parent = doc.create_element("test");
        assert!(props.write_xml(&mut parent, &doc, "dd"));

        let mut read: PropertyCollection<TestKey> = PropertyCollection::default();
        let mut ctx = ReadWriteContext::new();
        assert!(read.read_xml(&parent, "dd", &mut ctx));
        assert_eq!(read, props);
        assert!(ctx.messages().is_empty());
    }

    #[test]
    fn test_read_missing_element_clears() {
        let mut props = PropertyCollection::new("x");
        props.set_property(TestKey::Size, Property::from_value(1.0));

        let parent = XmlElement::new("test");
        let mut ctx = ReadWriteContext::new();
        assert!(!props.read_xml(&parent, "dd", &mut ctx));
        assert!(props.is_empty());
    }

    #[test]
    fn test_read_skips_unknown_keys() {
        let mut parent = XmlElement::new("test");
        let dd = parent.append_child(XmlElement::new("dd"));
        let unknown = dd.append_child(XmlElement::new("property"));
        unknown.set_attribute("key", "wobble");
        unknown.set_attribute("type", "expression");
        unknown.set_attribute("value", "1");
        let known = dd.append_child(XmlElement::new("property"));
        known.set_attribute("key", "angle");
        known.set_attribute("type", "field");
        known.set_attribute("value", "rot");
        known.set_attribute("active", "1");

        let mut props: PropertyCollection<TestKey> = PropertyCollection::default();
        let mut ctx = ReadWriteContext::new();
        assert!(props.read_xml(&parent, "dd", &mut ctx));
        assert_eq!(props.count(), 1);
        assert_eq!(props.property(TestKey::Angle).field(), Some("rot"));
        assert_eq!(ctx.messages().len(), 1);
    }

    #[test]
    fn test_standard_type_accepts() {
        let positive = StandardPropertyType::DoublePositive;
        assert!(positive.accepts(&PropertyValue::number(0.0)));
        assert!(!positive.accepts(&PropertyValue::number(-1.0)));
        assert!(!positive.accepts(&PropertyValue::Null));
        assert!(StandardPropertyType::Integer.accepts(&PropertyValue::text("3")));
        assert!(!StandardPropertyType::Integer.accepts(&PropertyValue::number(3.5)));
    }
}
