//! Elevation settings of a vector layer: how features are placed in Z, how
//! they are extruded, and which symbols draw them in elevation profiles.
//!
//! Persisted under the layer element as:
//!
//! ```xml
//! <elevation zscale="2" zoffset="0.5" extrusionEnabled="1" extrusion="10"
//!            clamping="Relative" binding="Vertex" respectLayerSymbol="0"
//!            type="IndividualFeatures" symbology="Line"
//!            showMarkerSymbolInSurfacePlots="0" showByDefaultInProfilePlots="0">
//!   <data-defined-properties name="">...</data-defined-properties>
//!   <profileLineSymbol><symbol type="line" alpha="1">...</symbol></profileLineSymbol>
//!   <profileFillSymbol>...</profileFillSymbol>
//!   <profileMarkerSymbol>...</profileMarkerSymbol>
//! </elevation>
//! ```
//!
//! Reading never fails. Anything missing or unreadable falls back to its
//! default, with a message in the [`ReadWriteContext`] when a value was
//! present but not understood.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use strata_config::ProfileSymbolDefaults;
use strata_engine::{
    ExpressionContext, PropertyCollection, PropertyDefinition, PropertyKey, StandardPropertyType,
};
use strata_io::{MessageLevel, ReadWriteContext, XmlDocument, XmlElement};

use crate::layer::MapLayer;
use crate::range::ZRange;
use crate::symbol::{FillSymbol, LineSymbol, MarkerSymbol, Symbol, SymbolType};

const ELEMENT_NAME: &str = "elevation";
const DATA_DEFINED_ELEMENT: &str = "data-defined-properties";
const LINE_SYMBOL_ELEMENT: &str = "profileLineSymbol";
const FILL_SYMBOL_ELEMENT: &str = "profileFillSymbol";
const MARKER_SYMBOL_ELEMENT: &str = "profileMarkerSymbol";

// ============================================================================
// Enumerations
// ============================================================================

/// Reference surface feature heights are measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AltitudeClamping {
    /// Z values are ignored, features sit on the terrain
    #[default]
    Terrain,
    /// Z values are added to the terrain height
    Relative,
    /// Z values are used as-is
    Absolute,
}

/// Where terrain height is sampled for a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AltitudeBinding {
    Vertex,
    #[default]
    Centroid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorProfileType {
    #[default]
    IndividualFeatures,
    ContinuousSurface,
}

/// How a continuous surface is drawn in a profile plot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileSurfaceSymbology {
    #[default]
    Line,
    FillBelow,
    FillAbove,
}

impl AltitudeClamping {
    pub const ALL: [AltitudeClamping; 3] = [
        AltitudeClamping::Terrain,
        AltitudeClamping::Relative,
        AltitudeClamping::Absolute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AltitudeClamping::Terrain => "Terrain",
            AltitudeClamping::Relative => "Relative",
            AltitudeClamping::Absolute => "Absolute",
        }
    }
}

impl AltitudeBinding {
    pub const ALL: [AltitudeBinding; 2] = [AltitudeBinding::Vertex, AltitudeBinding::Centroid];

    pub fn as_str(&self) -> &'static str {
        match self {
            AltitudeBinding::Vertex => "Vertex",
            AltitudeBinding::Centroid => "Centroid",
        }
    }
}

impl VectorProfileType {
    pub const ALL: [VectorProfileType; 2] = [
        VectorProfileType::IndividualFeatures,
        VectorProfileType::ContinuousSurface,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VectorProfileType::IndividualFeatures => "IndividualFeatures",
            VectorProfileType::ContinuousSurface => "ContinuousSurface",
        }
    }
}

impl ProfileSurfaceSymbology {
    pub const ALL: [ProfileSurfaceSymbology; 3] = [
        ProfileSurfaceSymbology::Line,
        ProfileSurfaceSymbology::FillBelow,
        ProfileSurfaceSymbology::FillAbove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSurfaceSymbology::Line => "Line",
            ProfileSurfaceSymbology::FillBelow => "FillBelow",
            ProfileSurfaceSymbology::FillAbove => "FillAbove",
        }
    }
}

/// Display and case-insensitive parsing through the persisted token.
macro_rules! token_conversions {
    ($ty:ident, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| format!("unknown {} '{}'", $label, s))
            }
        }
    };
}

token_conversions!(AltitudeClamping, "altitude clamping");
token_conversions!(AltitudeBinding, "altitude binding");
token_conversions!(VectorProfileType, "profile type");
token_conversions!(ProfileSurfaceSymbology, "surface symbology");

// ============================================================================
// Data-defined keys
// ============================================================================

/// Elevation settings that can be overridden per feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElevationProperty {
    ZOffset,
    ExtrusionHeight,
}

impl ElevationProperty {
    pub fn definitions() -> Vec<PropertyDefinition> {
        Self::all().iter().map(|k| k.definition()).collect()
    }
}

impl PropertyKey for ElevationProperty {
    fn definition(self) -> PropertyDefinition {
        match self {
            ElevationProperty::ZOffset => PropertyDefinition {
                name: "zOffset",
                description: "Offset",
                standard_type: StandardPropertyType::Double,
            },
            ElevationProperty::ExtrusionHeight => PropertyDefinition {
                name: "extrusionHeight",
                description: "Extrusion height",
                standard_type: StandardPropertyType::DoublePositive,
            },
        }
    }

    fn all() -> &'static [Self] {
        &[ElevationProperty::ZOffset, ElevationProperty::ExtrusionHeight]
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct VectorLayerElevationProperties {
    layer: Option<Weak<dyn MapLayer>>,

    z_scale: f64,
    z_offset: f64,
    clamping: AltitudeClamping,
    binding: AltitudeBinding,
    extrusion_enabled: bool,
    extrusion_height: f64,
    respect_layer_symbology: bool,

    profile_type: VectorProfileType,
    profile_symbology: ProfileSurfaceSymbology,
    show_marker_symbol_in_surface_plots: bool,
    show_by_default_in_elevation_profile_plots: bool,

    profile_line_symbol: LineSymbol,
    profile_fill_symbol: FillSymbol,
    profile_marker_symbol: MarkerSymbol,

    data_defined_properties: PropertyCollection<ElevationProperty>,

    // Used to rebuild symbols missing from a read document
    symbol_defaults: ProfileSymbolDefaults,
}

impl VectorLayerElevationProperties {
    pub fn new(layer: Option<&Arc<dyn MapLayer>>) -> Self {
        Self::with_symbol_defaults(layer, &ProfileSymbolDefaults::default())
    }

    pub fn with_symbol_defaults(layer: Option<&Arc<dyn MapLayer>>, defaults: &ProfileSymbolDefaults) -> Self {
        Self {
            layer: layer.map(Arc::downgrade),
            z_scale: 1.0,
            z_offset: 0.0,
            clamping: AltitudeClamping::default(),
            binding: AltitudeBinding::default(),
            extrusion_enabled: false,
            extrusion_height: 0.0,
            respect_layer_symbology: true,
            profile_type: VectorProfileType::default(),
            profile_symbology: ProfileSurfaceSymbology::default(),
            show_marker_symbol_in_surface_plots: false,
            show_by_default_in_elevation_profile_plots: false,
            profile_line_symbol: Symbol::default_for(SymbolType::Line, defaults),
            profile_fill_symbol: Symbol::default_for(SymbolType::Fill, defaults),
            profile_marker_symbol: Symbol::default_for(SymbolType::Marker, defaults),
            data_defined_properties: PropertyCollection::default(),
            symbol_defaults: *defaults,
        }
    }

    /// Owning layer, if it is still alive.
    pub fn layer(&self) -> Option<Arc<dyn MapLayer>> {
        self.layer.as_ref().and_then(Weak::upgrade)
    }

    /// True when any setting would move features off the plain terrain.
    /// Z scale alone doesn't count.
    pub fn has_elevation(&self) -> bool {
        self.z_offset != 0.0
            || self.clamping != AltitudeClamping::Terrain
            || (self.extrusion_enabled && self.extrusion_height != 0.0)
            || self.data_defined_properties.is_active(ElevationProperty::ZOffset)
            || self.data_defined_properties.is_active(ElevationProperty::ExtrusionHeight)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn z_scale(&self) -> f64 {
        self.z_scale
    }

    pub fn set_z_scale(&mut self, scale: f64) {
        self.z_scale = scale;
    }

    pub fn z_offset(&self) -> f64 {
        self.z_offset
    }

    pub fn set_z_offset(&mut self, offset: f64) {
        self.z_offset = offset;
    }

    pub fn clamping(&self) -> AltitudeClamping {
        self.clamping
    }

    pub fn set_clamping(&mut self, clamping: AltitudeClamping) {
        self.clamping = clamping;
    }

    pub fn binding(&self) -> AltitudeBinding {
        self.binding
    }

    pub fn set_binding(&mut self, binding: AltitudeBinding) {
        self.binding = binding;
    }

    pub fn extrusion_enabled(&self) -> bool {
        self.extrusion_enabled
    }

    pub fn set_extrusion_enabled(&mut self, enabled: bool) {
        self.extrusion_enabled = enabled;
    }

    /// Only used while extrusion is enabled.
    pub fn extrusion_height(&self) -> f64 {
        self.extrusion_height
    }

    pub fn set_extrusion_height(&mut self, height: f64) {
        self.extrusion_height = height;
    }

    pub fn respect_layer_symbology(&self) -> bool {
        self.respect_layer_symbology
    }

    pub fn set_respect_layer_symbology(&mut self, respect: bool) {
        self.respect_layer_symbology = respect;
    }

    pub fn profile_type(&self) -> VectorProfileType {
        self.profile_type
    }

    pub fn set_profile_type(&mut self, profile_type: VectorProfileType) {
        self.profile_type = profile_type;
    }

    pub fn profile_symbology(&self) -> ProfileSurfaceSymbology {
        self.profile_symbology
    }

    pub fn set_profile_symbology(&mut self, symbology: ProfileSurfaceSymbology) {
        self.profile_symbology = symbology;
    }

    pub fn show_marker_symbol_in_surface_plots(&self) -> bool {
        self.show_marker_symbol_in_surface_plots
    }

    pub fn set_show_marker_symbol_in_surface_plots(&mut self, show: bool) {
        self.show_marker_symbol_in_surface_plots = show;
    }

    pub fn show_by_default_in_elevation_profile_plots(&self) -> bool {
        self.show_by_default_in_elevation_profile_plots
    }

    pub fn set_show_by_default_in_elevation_profile_plots(&mut self, show: bool) {
        self.show_by_default_in_elevation_profile_plots = show;
    }

    pub fn profile_line_symbol(&self) -> &LineSymbol {
        &self.profile_line_symbol
    }

    pub fn profile_line_symbol_mut(&mut self) -> &mut LineSymbol {
        &mut self.profile_line_symbol
    }

    pub fn set_profile_line_symbol(&mut self, symbol: LineSymbol) {
        if accepts_symbol(SymbolType::Line, &symbol) {
            self.profile_line_symbol = symbol;
        }
    }

    pub fn profile_fill_symbol(&self) -> &FillSymbol {
        &self.profile_fill_symbol
    }

    pub fn profile_fill_symbol_mut(&mut self) -> &mut FillSymbol {
        &mut self.profile_fill_symbol
    }

    pub fn set_profile_fill_symbol(&mut self, symbol: FillSymbol) {
        if accepts_symbol(SymbolType::Fill, &symbol) {
            self.profile_fill_symbol = symbol;
        }
    }

    pub fn profile_marker_symbol(&self) -> &MarkerSymbol {
        &self.profile_marker_symbol
    }

    pub fn profile_marker_symbol_mut(&mut self) -> &mut MarkerSymbol {
        &mut self.profile_marker_symbol
    }

    pub fn set_profile_marker_symbol(&mut self, symbol: MarkerSymbol) {
        if accepts_symbol(SymbolType::Marker, &symbol) {
            self.profile_marker_symbol = symbol;
        }
    }

    /// Replace all three profile symbols with freshly built defaults.
    pub fn reset_profile_symbols(&mut self, defaults: &ProfileSymbolDefaults) {
        self.symbol_defaults = *defaults;
        self.profile_line_symbol = Symbol::default_for(SymbolType::Line, defaults);
        self.profile_fill_symbol = Symbol::default_for(SymbolType::Fill, defaults);
        self.profile_marker_symbol = Symbol::default_for(SymbolType::Marker, defaults);
    }

    pub fn data_defined_properties(&self) -> &PropertyCollection<ElevationProperty> {
        &self.data_defined_properties
    }

    pub fn data_defined_properties_mut(&mut self) -> &mut PropertyCollection<ElevationProperty> {
        &mut self.data_defined_properties
    }

    /// Replace the whole override set. Keys absent from `properties` are gone
    /// afterwards.
    pub fn set_data_defined_properties(&mut self, properties: PropertyCollection<ElevationProperty>) {
        self.data_defined_properties = properties;
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    /// Seed clamping, binding and symbol colors from the owning layer.
    pub fn set_defaults_from_layer(&mut self, layer: &dyn MapLayer) {
        if layer.has_z_values() {
            self.clamping = AltitudeClamping::Absolute;
            self.binding = AltitudeBinding::Vertex;
        } else {
            self.clamping = AltitudeClamping::Terrain;
            self.binding = AltitudeBinding::Centroid;
        }

        if let Some(color) = layer.renderer_color() {
            self.profile_line_symbol.set_color(color);
            self.profile_fill_symbol.set_color(color);
            self.profile_marker_symbol.set_color(color);
        }
    }

    /// Vector layers are drawn regardless of the requested Z range.
    pub fn is_visible_in_z_range(&self, _range: &ZRange) -> bool {
        true
    }

    /// Z range covered by the layer. Not computed for vector layers.
    pub fn calculate_z_range(&self) -> ZRange {
        ZRange::infinite()
    }

    pub fn apply_to_z(&self, z: f64) -> f64 {
        z * self.z_scale + self.z_offset
    }

    /// Z offset for one feature, the static offset when no override applies.
    pub fn effective_z_offset(&self, context: &ExpressionContext) -> f64 {
        self.data_defined_properties
            .value_as_f64(ElevationProperty::ZOffset, context, self.z_offset)
            .0
    }

    /// Feature Z after scaling and the per-feature offset.
    pub fn effective_z(&self, z: f64, context: &ExpressionContext) -> f64 {
        z * self.z_scale + self.effective_z_offset(context)
    }

    /// Extrusion height for one feature; zero while extrusion is disabled.
    pub fn effective_extrusion_height(&self, context: &ExpressionContext) -> f64 {
        if !self.extrusion_enabled {
            return 0.0;
        }
        self.data_defined_properties
            .value_as_f64(ElevationProperty::ExtrusionHeight, context, self.extrusion_height)
            .0
    }

    /// `<ul>` list of the settings that differ from their defaults.
    pub fn html_summary(&self) -> String {
        let mut items: Vec<String> = Vec::new();

        items.push(format!("<li>Elevation clamping: {}</li>", self.clamping));
        if self.clamping != AltitudeClamping::Absolute {
            items.push(format!("<li>Elevation binding: {}</li>", self.binding));
        }
        if self.z_scale != 1.0 {
            items.push(format!("<li>Scale: {}</li>", self.z_scale));
        }
        if self.z_offset != 0.0 {
            items.push(format!("<li>Offset: {}</li>", self.z_offset));
        }
        if self.extrusion_enabled {
            items.push(format!("<li>Extrusion: {}</li>", self.extrusion_height));
        }
        for key in self.data_defined_properties.property_keys() {
            let property = self.data_defined_properties.property(key);
            if property.is_active() {
                items.push(format!(
                    "<li>{} (data defined): {}</li>",
                    key.definition().description,
                    escape_html(&property.as_expression())
                ));
            }
        }

        format!("<ul>{}</ul>", items.join(""))
    }

    // ========================================================================
    // XML
    // ========================================================================

    /// Append an `<elevation>` element describing every setting to `parent`.
    pub fn write_xml(&self, parent: &mut XmlElement, document: &XmlDocument, _context: &mut ReadWriteContext) -> bool {
        let mut element = document.create_element(ELEMENT_NAME);

        element.set_attribute("zscale", self.z_scale);
        element.set_attribute("zoffset", self.z_offset);
        element.set_attribute_bool("extrusionEnabled", self.extrusion_enabled);
        element.set_attribute("extrusion", self.extrusion_height);
        element.set_attribute("clamping", self.clamping);
        element.set_attribute("binding", self.binding);
        element.set_attribute_bool("respectLayerSymbol", self.respect_layer_symbology);
        element.set_attribute("type", self.profile_type);
        element.set_attribute("symbology", self.profile_symbology);
        element.set_attribute_bool("showMarkerSymbolInSurfacePlots", self.show_marker_symbol_in_surface_plots);
        element.set_attribute_bool("showByDefaultInProfilePlots", self.show_by_default_in_elevation_profile_plots);

        self.data_defined_properties
            .write_xml(&mut element, document, DATA_DEFINED_ELEMENT);

        for (name, symbol) in [
            (LINE_SYMBOL_ELEMENT, &self.profile_line_symbol),
            (FILL_SYMBOL_ELEMENT, &self.profile_fill_symbol),
            (MARKER_SYMBOL_ELEMENT, &self.profile_marker_symbol),
        ] {
            let mut holder = document.create_element(name);
            symbol.write_xml(&mut holder, document);
            element.append_child(holder);
        }

        parent.append_child(element);
        true
    }

    /// Restore every setting from the `<elevation>` child of `parent`.
    ///
    /// Returns false and leaves the store untouched when there is no such
    /// child. Otherwise each setting is replaced, by its default if missing.
    pub fn read_xml(&mut self, parent: &XmlElement, context: &mut ReadWriteContext) -> bool {
        let Some(element) = parent.first_child_element(ELEMENT_NAME) else {
            return false;
        };

        context.enter_category("elevation");

        self.z_scale = element.attribute_f64("zscale", 1.0);
        self.z_offset = element.attribute_f64("zoffset", 0.0);
        self.extrusion_enabled = element.attribute_bool("extrusionEnabled", false);
        self.extrusion_height = element.attribute_f64("extrusion", 0.0);
        self.clamping = read_token(element, "clamping", context);
        self.binding = read_token(element, "binding", context);
        self.respect_layer_symbology = element.attribute_bool("respectLayerSymbol", true);
        self.profile_type = read_token(element, "type", context);
        self.profile_symbology = read_token(element, "symbology", context);
        self.show_marker_symbol_in_surface_plots = element.attribute_bool("showMarkerSymbolInSurfacePlots", false);
        self.show_by_default_in_elevation_profile_plots = element.attribute_bool("showByDefaultInProfilePlots", false);

        self.data_defined_properties
            .read_xml(element, DATA_DEFINED_ELEMENT, context);

        let defaults = self.symbol_defaults;
        self.profile_line_symbol = read_symbol(element, LINE_SYMBOL_ELEMENT, SymbolType::Line, &defaults, context);
        self.profile_fill_symbol = read_symbol(element, FILL_SYMBOL_ELEMENT, SymbolType::Fill, &defaults, context);
        self.profile_marker_symbol =
            read_symbol(element, MARKER_SYMBOL_ELEMENT, SymbolType::Marker, &defaults, context);

        context.leave_category();
        true
    }
}

impl Default for VectorLayerElevationProperties {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Deep copy of every setting. The clone is not attached to any layer.
impl Clone for VectorLayerElevationProperties {
    fn clone(&self) -> Self {
        Self {
            layer: None,
            z_scale: self.z_scale,
            z_offset: self.z_offset,
            clamping: self.clamping,
            binding: self.binding,
            extrusion_enabled: self.extrusion_enabled,
            extrusion_height: self.extrusion_height,
            respect_layer_symbology: self.respect_layer_symbology,
            profile_type: self.profile_type,
            profile_symbology: self.profile_symbology,
            show_marker_symbol_in_surface_plots: self.show_marker_symbol_in_surface_plots,
            show_by_default_in_elevation_profile_plots: self.show_by_default_in_elevation_profile_plots,
            profile_line_symbol: self.profile_line_symbol.clone(),
            profile_fill_symbol: self.profile_fill_symbol.clone(),
            profile_marker_symbol: self.profile_marker_symbol.clone(),
            data_defined_properties: self.data_defined_properties.clone(),
            symbol_defaults: self.symbol_defaults,
        }
    }
}

/// Compares settings only; the owning layer is ignored.
impl PartialEq for VectorLayerElevationProperties {
    fn eq(&self, other: &Self) -> bool {
        self.z_scale == other.z_scale
            && self.z_offset == other.z_offset
            && self.clamping == other.clamping
            && self.binding == other.binding
            && self.extrusion_enabled == other.extrusion_enabled
            && self.extrusion_height == other.extrusion_height
            && self.respect_layer_symbology == other.respect_layer_symbology
            && self.profile_type == other.profile_type
            && self.profile_symbology == other.profile_symbology
            && self.show_marker_symbol_in_surface_plots == other.show_marker_symbol_in_surface_plots
            && self.show_by_default_in_elevation_profile_plots == other.show_by_default_in_elevation_profile_plots
            && self.profile_line_symbol == other.profile_line_symbol
            && self.profile_fill_symbol == other.profile_fill_symbol
            && self.profile_marker_symbol == other.profile_marker_symbol
            && self.data_defined_properties == other.data_defined_properties
    }
}

impl fmt::Debug for VectorLayerElevationProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorLayerElevationProperties")
            .field("layer", &self.layer().map(|l| l.id().to_string()))
            .field("z_scale", &self.z_scale)
            .field("z_offset", &self.z_offset)
            .field("clamping", &self.clamping)
            .field("binding", &self.binding)
            .field("extrusion_enabled", &self.extrusion_enabled)
            .field("extrusion_height", &self.extrusion_height)
            .field("respect_layer_symbology", &self.respect_layer_symbology)
            .field("profile_type", &self.profile_type)
            .field("profile_symbology", &self.profile_symbology)
            .field("show_marker_symbol_in_surface_plots", &self.show_marker_symbol_in_surface_plots)
            .field(
                "show_by_default_in_elevation_profile_plots",
                &self.show_by_default_in_elevation_profile_plots,
            )
            .field("profile_line_symbol", &self.profile_line_symbol)
            .field("profile_fill_symbol", &self.profile_fill_symbol)
            .field("profile_marker_symbol", &self.profile_marker_symbol)
            .field("data_defined_properties", &self.data_defined_properties)
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn accepts_symbol(slot: SymbolType, symbol: &Symbol) -> bool {
    if symbol.symbol_type() == slot {
        return true;
    }
    log::warn!(
        "ignoring {} symbol assigned to the profile {} symbol",
        symbol.symbol_type(),
        slot
    );
    false
}

/// Enum attribute, default when missing. Unknown tokens are reported.
fn read_token<T>(element: &XmlElement, name: &str, context: &mut ReadWriteContext) -> T
where
    T: FromStr<Err = String> + Default,
{
    let Some(raw) = element.attribute(name) else {
        return T::default();
    };
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            context.push_message(format!("{}, using default", e), MessageLevel::Warning);
            T::default()
        }
    }
}

fn read_symbol(
    element: &XmlElement,
    holder_name: &str,
    symbol_type: SymbolType,
    defaults: &ProfileSymbolDefaults,
    context: &mut ReadWriteContext,
) -> Symbol {
    let restored = element
        .first_child_element(holder_name)
        .and_then(|holder| holder.first_child_element("symbol"))
        .and_then(|symbol_el| Symbol::read_xml(symbol_el, context));

    match restored {
        Some(symbol) if symbol.symbol_type() == symbol_type => symbol,
        Some(symbol) => {
            context.push_message(
                format!("{} holds a {} symbol, using default", holder_name, symbol.symbol_type()),
                MessageLevel::Warning,
            );
            Symbol::default_for(symbol_type, defaults)
        }
        None => Symbol::default_for(symbol_type, defaults),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
