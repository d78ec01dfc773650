//! Profile symbols: a symbol type plus a stack of simple symbol layers whose
//! styling lives in a string property map.
//!
//! Persisted as:
//!
//! ```xml
//! <symbol type="line" alpha="1">
//!   <layer class="SimpleLine" enabled="1">
//!     <prop k="line_color" v="255,68,51,255"/>
//!     <prop k="line_width" v="0.5"/>
//!   </layer>
//! </symbol>
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strata_config::{Color, ProfileSymbolDefaults};
use strata_io::{MessageLevel, ReadWriteContext, XmlDocument, XmlElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Line,
    Fill,
    Marker,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Line => "line",
            SymbolType::Fill => "fill",
            SymbolType::Marker => "marker",
        }
    }

    /// Class name of the single layer a simple symbol of this type carries.
    pub fn simple_layer_class(&self) -> &'static str {
        match self {
            SymbolType::Line => "SimpleLine",
            SymbolType::Fill => "SimpleFill",
            SymbolType::Marker => "SimpleMarker",
        }
    }

    /// Layer property holding the color reported by [`Symbol::color`].
    fn primary_color_key(&self) -> &'static str {
        match self {
            SymbolType::Line => "line_color",
            SymbolType::Fill | SymbolType::Marker => "color",
        }
    }

    fn width_key(&self) -> &'static str {
        match self {
            SymbolType::Line => "line_width",
            SymbolType::Fill | SymbolType::Marker => "outline_width",
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(SymbolType::Line),
            "fill" => Ok(SymbolType::Fill),
            "marker" => Ok(SymbolType::Marker),
            other => Err(format!("unknown symbol type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLayer {
    pub class: String,
    pub enabled: bool,
    pub properties: BTreeMap<String, String>,
}

impl SymbolLayer {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            enabled: true,
            properties: BTreeMap::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    symbol_type: SymbolType,
    opacity: f64,
    layers: Vec<SymbolLayer>,
}

pub type LineSymbol = Symbol;
pub type FillSymbol = Symbol;
pub type MarkerSymbol = Symbol;

impl Symbol {
    pub fn new(symbol_type: SymbolType, layers: Vec<SymbolLayer>) -> Self {
        Self {
            symbol_type,
            opacity: 1.0,
            layers,
        }
    }

    /// Single-layer symbol built from a loose property map.
    ///
    /// Accepted keys: `color`, `outline_color`/`line_color`,
    /// `outline_width`/`line_width`, `size`, `name`. For line symbols every
    /// color key targets the stroke. Anything else is stored verbatim.
    pub fn create_simple(symbol_type: SymbolType, properties: &[(&str, &str)]) -> Self {
        let mut layer = SymbolLayer::new(symbol_type.simple_layer_class());
        for &(key, value) in default_layer_properties(symbol_type) {
            layer.set_property(key, value);
        }

        for &(key, value) in properties {
            let target = match (symbol_type, key) {
                (SymbolType::Line, "color" | "outline_color" | "line_color") => "line_color",
                (SymbolType::Line, "width" | "outline_width" | "line_width") => "line_width",
                (_, "outline_color" | "line_color") => "outline_color",
                (_, "outline_width" | "line_width") => "outline_width",
                (_, other) => other,
            };

            if target.ends_with("color") {
                match Color::parse(value) {
                    Some(color) => layer.set_property(target, color.to_rgba_string()),
                    None => log::warn!("ignoring unparseable {} '{}' for {} symbol", key, value, symbol_type),
                }
            } else {
                layer.set_property(target, value);
            }
        }

        Self::new(symbol_type, vec![layer])
    }

    /// Default profile symbol of the given type.
    pub fn default_for(symbol_type: SymbolType, defaults: &ProfileSymbolDefaults) -> Self {
        match symbol_type {
            SymbolType::Line => Self::create_simple(
                SymbolType::Line,
                &[
                    ("line_color", defaults.line_color.to_rgba_string().as_str()),
                    ("line_width", defaults.line_width.to_string().as_str()),
                ],
            ),
            SymbolType::Fill => Self::create_simple(
                SymbolType::Fill,
                &[
                    ("color", defaults.fill_color.to_rgba_string().as_str()),
                    ("outline_color", defaults.fill_color.to_rgba_string().as_str()),
                    ("outline_width", defaults.fill_outline_width.to_string().as_str()),
                ],
            ),
            SymbolType::Marker => Self::create_simple(
                SymbolType::Marker,
                &[
                    ("color", defaults.marker_color.to_rgba_string().as_str()),
                    ("outline_color", defaults.marker_color.to_rgba_string().as_str()),
                    ("size", defaults.marker_size.to_string().as_str()),
                ],
            ),
        }
    }

    pub fn symbol_type(&self) -> SymbolType {
        self.symbol_type
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity;
    }

    pub fn layers(&self) -> &[SymbolLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Vec<SymbolLayer> {
        &mut self.layers
    }

    /// Primary color of the first layer: stroke for lines, fill otherwise.
    /// Black when no layer defines one.
    pub fn color(&self) -> Color {
        let key = self.symbol_type.primary_color_key();
        self.layers
            .iter()
            .find_map(|layer| layer.property(key).and_then(Color::parse))
            .unwrap_or(Color::BLACK)
    }

    /// Set the primary color on every layer. A symbol without layers gains
    /// an empty simple layer to carry it.
    pub fn set_color(&mut self, color: Color) {
        let key = self.symbol_type.primary_color_key();
        if self.layers.is_empty() {
            self.layers.push(SymbolLayer::new(self.symbol_type.simple_layer_class()));
        }
        for layer in &mut self.layers {
            layer.set_property(key, color.to_rgba_string());
        }
    }

    /// Stroke width for lines, outline width otherwise.
    pub fn width(&self) -> f64 {
        self.first_numeric(self.symbol_type.width_key()).unwrap_or(0.0)
    }

    /// Marker size; `None` for line and fill symbols.
    pub fn size(&self) -> Option<f64> {
        match self.symbol_type {
            SymbolType::Marker => self.first_numeric("size"),
            SymbolType::Line | SymbolType::Fill => None,
        }
    }

    fn first_numeric(&self, key: &str) -> Option<f64> {
        self.layers
            .iter()
            .find_map(|layer| layer.property(key).and_then(|v| v.trim().parse().ok()))
    }

    // =========================================================================
    // XML
    // =========================================================================

    /// Append a `<symbol>` element to `parent`.
    pub fn write_xml(&self, parent: &mut XmlElement, document: &XmlDocument) {
        let mut element = document.create_element("symbol");
        element.set_attribute("type", self.symbol_type.as_str());
        element.set_attribute("alpha", self.opacity);

        for layer in &self.layers {
            let mut layer_el = document.create_element("layer");
            layer_el.set_attribute("class", &layer.class);
            layer_el.set_attribute_bool("enabled", layer.enabled);
            for (k, v) in &layer.properties {
                let mut prop_el = document.create_element("prop");
                prop_el.set_attribute("k", k);
                prop_el.set_attribute("v", v);
                layer_el.append_child(prop_el);
            }
            element.append_child(layer_el);
        }

        parent.append_child(element);
    }

    /// Rebuild a symbol from a `<symbol>` element.
    /// Unknown types are reported and yield `None`. A symbol without layers
    /// reads back as written.
    pub fn read_xml(element: &XmlElement, context: &mut ReadWriteContext) -> Option<Symbol> {
        let type_attr = element.attribute_or("type", "");
        let symbol_type = match type_attr.parse::<SymbolType>() {
            Ok(t) => t,
            Err(e) => {
                context.push_message(e, MessageLevel::Warning);
                return None;
            }
        };

        let layers: Vec<SymbolLayer> = element
            .child_elements("layer")
            .map(|layer_el| SymbolLayer {
                class: layer_el.attribute_or("class", symbol_type.simple_layer_class()).to_string(),
                enabled: layer_el.attribute_bool("enabled", true),
                properties: layer_el
                    .child_elements("prop")
                    .filter_map(|p| Some((p.attribute("k")?.to_string(), p.attribute_or("v", "").to_string())))
                    .collect(),
            })
            .collect();

        let mut symbol = Symbol::new(symbol_type, layers);
        symbol.opacity = element.attribute_f64("alpha", 1.0);
        Some(symbol)
    }
}

fn default_layer_properties(symbol_type: SymbolType) -> &'static [(&'static str, &'static str)] {
    match symbol_type {
        SymbolType::Line => &[
            ("line_color", "0,0,0,255"),
            ("line_style", "solid"),
            ("line_width", "0.26"),
        ],
        SymbolType::Fill => &[
            ("color", "0,0,255,255"),
            ("outline_color", "35,35,35,255"),
            ("outline_style", "solid"),
            ("outline_width", "0.26"),
            ("style", "solid"),
        ],
        SymbolType::Marker => &[
            ("color", "255,0,0,255"),
            ("name", "circle"),
            ("outline_color", "35,35,35,255"),
            ("outline_width", "0"),
            ("size", "2"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_color_aliases() {
        let sym = Symbol::create_simple(SymbolType::Line, &[("outline_color", "#ff4433"), ("outline_width", "0.5")]);
        assert_eq!(sym.color().name(), "#ff4433");
        assert_eq!(sym.width(), 0.5);
        assert_eq!(sym.size(), None);
        assert_eq!(sym.layers()[0].class, "SimpleLine");
    }

    #[test]
    fn test_fill_and_marker_primary_color() {
        let fill = Symbol::create_simple(SymbolType::Fill, &[("color", "#ff4455"), ("outline_width", "0.5")]);
        assert_eq!(fill.color().name(), "#ff4455");
        assert_eq!(fill.width(), 0.5);

        let marker = Symbol::create_simple(SymbolType::Marker, &[("color", "#ff1122"), ("size", "4")]);
        assert_eq!(marker.color().name(), "#ff1122");
        assert_eq!(marker.size(), Some(4.0));
    }

    #[test]
    fn test_bad_color_keeps_default() {
        let sym = Symbol::create_simple(SymbolType::Marker, &[("color", "not-a-color")]);
        assert_eq!(sym.color(), Color::from_rgb(255, 0, 0));
    }

    #[test]
    fn test_set_color_touches_every_layer() {
        let mut sym = Symbol::create_simple(SymbolType::Fill, &[]);
        sym.layers_mut().push(SymbolLayer::new("SimpleFill"));
        sym.set_color(Color::from_hex(0x102030));
        assert!(sym
            .layers()
            .iter()
            .all(|l| l.property("color") == Some("16,32,48,255")));
    }

    #[test]
    fn test_xml_round_trip() {
        let doc = XmlDocument::new("test");
        let mut parent = doc.create_element("parent");
        let mut sym = Symbol::create_simple(SymbolType::Marker, &[("color", "#ff1122"), ("name", "square")]);
        sym.set_opacity(0.5);
        sym.write_xml(&mut parent, &doc);

        let mut ctx = ReadWriteContext::new();
        let el = parent.first_child_element("symbol").unwrap();
        let restored = Symbol::read_xml(el, &mut ctx).unwrap();
        assert_eq!(restored, sym);
        assert!(ctx.messages().is_empty());
    }

    #[test]
    fn test_read_rejects_unknown_type() {
        let mut el = XmlElement::new("symbol");
        el.set_attribute("type", "raster");
        let mut ctx = ReadWriteContext::new();
        assert!(Symbol::read_xml(&el, &mut ctx).is_none());
        assert_eq!(ctx.messages().len(), 1);
    }

    #[test]
    fn test_read_keeps_empty_symbol() {
        let mut el = XmlElement::new("symbol");
        el.set_attribute("type", "line");
        let mut ctx = ReadWriteContext::new();
        let restored = Symbol::read_xml(&el, &mut ctx).unwrap();
        assert_eq!(restored, Symbol::new(SymbolType::Line, vec![]));
        assert!(ctx.messages().is_empty());
    }

    #[test]
    fn test_set_color_on_empty_symbol_adds_layer() {
        let mut sym = Symbol::new(SymbolType::Line, vec![]);
        assert_eq!(sym.color(), Color::BLACK);

        sym.set_color(Color::from_hex(0xff4433));
        assert_eq!(sym.color().name(), "#ff4433");
        assert_eq!(sym.layers().len(), 1);
        assert_eq!(sym.layers()[0].class, "SimpleLine");
    }
}
