// Layer document: one map layer with its elevation settings, stored as XML.
//
// <!DOCTYPE strata>
// <maplayer version="1" id="roads" name="Roads" hasZ="1" color="51,102,153,255">
//   <elevation .../>
// </maplayer>

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use strata_config::{Color, ProfileSymbolDefaults};
use strata_core::{MapLayer, SimpleLayer, VectorLayerElevationProperties};
use strata_io::{ReadWriteContext, ReadWriteMessage, XmlDocument, XmlError, XML_FORMAT_VERSION};

pub const DOC_TYPE: &str = "strata";
const ROOT_ELEMENT: &str = "maplayer";

pub struct LayerDocument {
    pub layer: Arc<SimpleLayer>,
    pub elevation: VectorLayerElevationProperties,
    /// False when the file had no `<elevation>` element and defaults are in use
    pub has_elevation_element: bool,
    /// Recoverable problems found while reading
    pub messages: Vec<ReadWriteMessage>,
}

impl LayerDocument {
    /// Fresh document with elevation defaults derived from the layer.
    pub fn new(layer: SimpleLayer, defaults: &ProfileSymbolDefaults) -> Self {
        let layer = Arc::new(layer);
        let shared: Arc<dyn MapLayer> = layer.clone();
        let mut elevation = VectorLayerElevationProperties::with_symbol_defaults(Some(&shared), defaults);
        elevation.set_defaults_from_layer(layer.as_ref());

        Self {
            layer,
            elevation,
            has_elevation_element: true,
            messages: Vec::new(),
        }
    }

    pub fn load(path: &Path, defaults: &ProfileSymbolDefaults) -> Result<Self> {
        let doc = XmlDocument::load(path).with_context(|| format!("cannot load {}", path.display()))?;
        let Some(root) = doc.root() else {
            bail!(XmlError::NoRoot);
        };
        if root.name() != ROOT_ELEMENT {
            return Err(XmlError::Parse(format!(
                "expected <{}> root element, found <{}>",
                ROOT_ELEMENT,
                root.name()
            )))
            .with_context(|| format!("cannot load {}", path.display()));
        }

        let version: u32 = root.attribute_parsed("version").unwrap_or(XML_FORMAT_VERSION);
        if version > XML_FORMAT_VERSION {
            log::warn!(
                "{} was written with format version {}, this build reads up to {}",
                path.display(),
                version,
                XML_FORMAT_VERSION
            );
        }

        let mut layer = SimpleLayer::new(root.attribute_or("id", ""), root.attribute_or("name", ""));
        layer.has_z = root.attribute_bool("hasZ", false);
        layer.color = root.attribute("color").and_then(Color::parse);

        let layer = Arc::new(layer);
        let shared: Arc<dyn MapLayer> = layer.clone();
        let mut elevation = VectorLayerElevationProperties::with_symbol_defaults(Some(&shared), defaults);

        let mut context = ReadWriteContext::new();
        let has_elevation_element = elevation.read_xml(root, &mut context);
        log::debug!(
            "loaded layer '{}' from {} (elevation element: {})",
            layer.id,
            path.display(),
            has_elevation_element
        );

        Ok(Self {
            layer,
            elevation,
            has_elevation_element,
            messages: context.take_messages(),
        })
    }

    pub fn to_xml_document(&self) -> XmlDocument {
        let mut doc = XmlDocument::new(DOC_TYPE);
        let mut root = doc.create_element(ROOT_ELEMENT);
        root.set_attribute("version", XML_FORMAT_VERSION);
        root.set_attribute("id", &self.layer.id);
        root.set_attribute("name", &self.layer.name);
        root.set_attribute_bool("hasZ", self.layer.has_z);
        if let Some(color) = self.layer.color {
            root.set_attribute("color", color.to_rgba_string());
        }

        self.elevation
            .write_xml(&mut root, &doc, &mut ReadWriteContext::new());
        doc.set_root(root);
        doc
    }

    pub fn save(&self, path: &Path, indent: usize) -> Result<()> {
        self.to_xml_document()
            .save(path, indent)
            .with_context(|| format!("cannot write {}", path.display()))
    }
}
