// Subcommand implementations

use std::path::{Path, PathBuf};

use serde_json::json;
use strata_config::{Color, Settings};
use strata_core::{
    AltitudeBinding, AltitudeClamping, ElevationProperty, ProfileSurfaceSymbology, SimpleLayer, Symbol,
    VectorLayerElevationProperties, VectorProfileType,
};
use strata_engine::{Expression, ExpressionContext, Property, PropertyKey, PropertySource, PropertyValue};
use strata_io::ReadWriteMessage;

use crate::document::LayerDocument;
use crate::exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_NO_ELEVATION, EXIT_PARSE};
use crate::{CliError, SetKey};

// =============================================================================
// init
// =============================================================================

pub fn cmd_init(
    settings: &Settings,
    file: PathBuf,
    id: String,
    name: Option<String>,
    has_z: bool,
    color: Option<String>,
    force: bool,
) -> Result<(), CliError> {
    if file.exists() && !force {
        return Err(CliError::new(EXIT_IO, format!("{} already exists", file.display()))
            .with_hint("pass --force to overwrite"));
    }

    let name = name.unwrap_or_else(|| id.clone());
    let mut layer = SimpleLayer::new(id, name).with_z(has_z);
    if let Some(raw) = color {
        layer = layer.with_color(parse_color(&raw)?);
    }

    let doc = LayerDocument::new(layer, &settings.profile_symbol_defaults());
    doc.save(&file, settings.output_indent)?;
    eprintln!(
        "created {} (clamping {}, binding {})",
        file.display(),
        doc.elevation.clamping(),
        doc.elevation.binding()
    );
    Ok(())
}

// =============================================================================
// show
// =============================================================================

pub fn cmd_show(settings: &Settings, file: PathBuf, json: bool, html: bool) -> Result<(), CliError> {
    let doc = load_with_elevation(settings, &file)?;
    let props = &doc.elevation;

    if html {
        println!("{}", props.html_summary());
        return Ok(());
    }

    if json {
        print_json(&show_json(&doc))?;
        return Ok(());
    }

    let layer_label = props
        .layer()
        .map(|l| format!("{} ({})", l.id(), l.name()))
        .unwrap_or_default();

    println!("layer:              {}", layer_label);
    println!("has elevation:      {}", yes_no(props.has_elevation()));
    println!("z scale:            {}", props.z_scale());
    println!("z offset:           {}", props.z_offset());
    println!("clamping:           {}", props.clamping());
    println!("binding:            {}", props.binding());
    println!(
        "extrusion:          {} ({})",
        props.extrusion_height(),
        if props.extrusion_enabled() { "enabled" } else { "disabled" }
    );
    println!("respect symbology:  {}", yes_no(props.respect_layer_symbology()));
    println!("profile type:       {}", props.profile_type());
    println!("surface symbology:  {}", props.profile_symbology());
    println!("line symbol:        {}", describe_symbol(props.profile_line_symbol()));
    println!("fill symbol:        {}", describe_symbol(props.profile_fill_symbol()));
    println!("marker symbol:      {}", describe_symbol(props.profile_marker_symbol()));

    let overrides = props.data_defined_properties();
    if overrides.is_empty() {
        println!("overrides:          none");
    } else {
        println!("overrides:");
        for key in overrides.property_keys() {
            let prop = overrides.property(key);
            println!(
                "  {:<18}{} {} ({})",
                key.name(),
                prop.property_type().as_str(),
                prop.as_expression(),
                if prop.is_active() { "active" } else { "inactive" }
            );
        }
    }

    Ok(())
}

fn show_json(doc: &LayerDocument) -> serde_json::Value {
    let props = &doc.elevation;
    let overrides = props.data_defined_properties();

    let overrides_json: serde_json::Map<String, serde_json::Value> = overrides
        .property_keys()
        .into_iter()
        .map(|key| {
            let prop = overrides.property(key);
            (
                key.name().to_string(),
                json!({
                    "type": prop.property_type(),
                    "active": prop.is_active(),
                    "expression": prop.as_expression(),
                }),
            )
        })
        .collect();

    json!({
        "layer": {
            "id": doc.layer.id,
            "name": doc.layer.name,
            "has_z": doc.layer.has_z,
        },
        "has_elevation": props.has_elevation(),
        "z_scale": props.z_scale(),
        "z_offset": props.z_offset(),
        "clamping": props.clamping(),
        "binding": props.binding(),
        "extrusion_enabled": props.extrusion_enabled(),
        "extrusion_height": props.extrusion_height(),
        "respect_layer_symbology": props.respect_layer_symbology(),
        "profile_type": props.profile_type(),
        "profile_symbology": props.profile_symbology(),
        "show_marker_symbol_in_surface_plots": props.show_marker_symbol_in_surface_plots(),
        "show_by_default_in_elevation_profile_plots": props.show_by_default_in_elevation_profile_plots(),
        "symbols": {
            "line": symbol_json(props.profile_line_symbol()),
            "fill": symbol_json(props.profile_fill_symbol()),
            "marker": symbol_json(props.profile_marker_symbol()),
        },
        "overrides": overrides_json,
    })
}

fn symbol_json(symbol: &Symbol) -> serde_json::Value {
    json!({
        "type": symbol.symbol_type(),
        "color": symbol.color().name(),
        "opacity": symbol.opacity(),
        "width": symbol.width(),
        "size": symbol.size(),
    })
}

// =============================================================================
// set
// =============================================================================

pub fn cmd_set(settings: &Settings, file: PathBuf, key: SetKey, value: String) -> Result<(), CliError> {
    let mut doc = load_document(settings, &file)?;
    apply_setting(&mut doc.elevation, key, &value)?;
    doc.save(&file, settings.output_indent)?;
    Ok(())
}

fn apply_setting(props: &mut VectorLayerElevationProperties, key: SetKey, value: &str) -> Result<(), CliError> {
    match key {
        SetKey::ZScale => props.set_z_scale(parse_number(value)?),
        SetKey::ZOffset => props.set_z_offset(parse_number(value)?),
        SetKey::Clamping => props.set_clamping(parse_token::<AltitudeClamping>(value)?),
        SetKey::Binding => props.set_binding(parse_token::<AltitudeBinding>(value)?),
        SetKey::Extrusion => props.set_extrusion_height(parse_number(value)?),
        SetKey::ExtrusionEnabled => props.set_extrusion_enabled(parse_flag(value)?),
        SetKey::RespectSymbology => props.set_respect_layer_symbology(parse_flag(value)?),
        SetKey::ProfileType => props.set_profile_type(parse_token::<VectorProfileType>(value)?),
        SetKey::Symbology => props.set_profile_symbology(parse_token::<ProfileSurfaceSymbology>(value)?),
        SetKey::ShowMarker => props.set_show_marker_symbol_in_surface_plots(parse_flag(value)?),
        SetKey::ShowByDefault => props.set_show_by_default_in_elevation_profile_plots(parse_flag(value)?),
        SetKey::LineColor => props.profile_line_symbol_mut().set_color(parse_color(value)?),
        SetKey::FillColor => props.profile_fill_symbol_mut().set_color(parse_color(value)?),
        SetKey::MarkerColor => props.profile_marker_symbol_mut().set_color(parse_color(value)?),
    }
    Ok(())
}

// =============================================================================
// override
// =============================================================================

pub struct OverrideArgs {
    pub property: String,
    pub expression: Option<String>,
    pub field: Option<String>,
    pub value: Option<f64>,
    pub clear: bool,
    pub enable: bool,
    pub disable: bool,
}

pub fn cmd_override(settings: &Settings, file: PathBuf, args: OverrideArgs) -> Result<(), CliError> {
    let key = ElevationProperty::from_name(&args.property).ok_or_else(|| {
        let names: Vec<&str> = ElevationProperty::all().iter().map(|k| k.name()).collect();
        CliError::args(format!("unknown property '{}'", args.property))
            .with_hint(format!("valid properties: {}", names.join(", ")))
    })?;

    let source = if let Some(text) = args.expression {
        let expr = Expression::new(text.as_str());
        if let Some(err) = expr.parser_error() {
            return Err(CliError::new(EXIT_PARSE, format!("invalid expression '{}': {}", text, err)));
        }
        Some(PropertySource::Expression(text))
    } else if let Some(field) = args.field {
        Some(PropertySource::Field(field))
    } else {
        args.value.map(|v| PropertySource::Static(PropertyValue::number(v)))
    };

    let mut doc = load_document(settings, &file)?;
    let overrides = doc.elevation.data_defined_properties_mut();

    if args.clear {
        overrides.set_property(key, Property::invalid());
    } else if let Some(source) = source {
        overrides.set_property(key, Property::new(source, !args.disable));
    } else if args.enable || args.disable {
        let Some(prop) = overrides.property_mut(key) else {
            return Err(CliError::args(format!("no override set for '{}'", key.name()))
                .with_hint("pass --expression, --field or --value to define one"));
        };
        prop.set_active(args.enable);
    } else {
        return Err(CliError::args("nothing to do")
            .with_hint("pass --expression, --field, --value, --clear, --enable or --disable"));
    }

    doc.save(&file, settings.output_indent)?;
    Ok(())
}

// =============================================================================
// eval
// =============================================================================

pub fn cmd_eval(
    settings: &Settings,
    file: PathBuf,
    fields: Vec<String>,
    z: Option<f64>,
    json: bool,
) -> Result<(), CliError> {
    let doc = load_with_elevation(settings, &file)?;
    let props = &doc.elevation;

    let mut context = ExpressionContext::new();
    for raw in &fields {
        let (name, value) = parse_field_assignment(raw)?;
        context.set_field(name, value);
    }

    for missing in props
        .data_defined_properties()
        .referenced_fields()
        .iter()
        .filter(|f| context.field(f).is_none())
    {
        log::warn!("field '{}' is referenced by an override but was not given", missing);
    }

    let z_offset = props.effective_z_offset(&context);
    let extrusion = props.effective_extrusion_height(&context);
    let feature_z = z.map(|z| props.effective_z(z, &context));

    if json {
        let output = json!({
            "z_offset": z_offset,
            "extrusion_height": extrusion,
            "z": feature_z,
        });
        print_json(&output)?;
    } else {
        println!("z offset:          {}", z_offset);
        println!("extrusion height:  {}", extrusion);
        if let Some(fz) = feature_z {
            println!("z:                 {}", fz);
        }
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn load_document(settings: &Settings, file: &Path) -> Result<LayerDocument, CliError> {
    let doc = LayerDocument::load(file, &settings.profile_symbol_defaults())?;
    report_messages(&doc.messages);
    Ok(doc)
}

fn load_with_elevation(settings: &Settings, file: &Path) -> Result<LayerDocument, CliError> {
    let doc = load_document(settings, file)?;
    if !doc.has_elevation_element {
        return Err(CliError::new(
            EXIT_NO_ELEVATION,
            format!("{} has no elevation settings", file.display()),
        )
        .with_hint("use `strata set` to create them"));
    }
    Ok(doc)
}

fn report_messages(messages: &[ReadWriteMessage]) {
    for message in messages {
        eprintln!("warning: {}", message.text);
    }
}

fn describe_symbol(symbol: &Symbol) -> String {
    let mut out = format!("{} width {}", symbol.color().name(), symbol.width());
    if let Some(size) = symbol.size() {
        out.push_str(&format!(" size {}", size));
    }
    if symbol.opacity() < 1.0 {
        out.push_str(&format!(" opacity {}", symbol.opacity()));
    }
    out
}

fn render_json(value: &serde_json::Value) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("failed to serialize output: {}", e)))
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", render_json(value)?);
    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn parse_number(raw: &str) -> Result<f64, CliError> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::args(format!("'{}' is not a number", raw)))
}

fn parse_flag(raw: &str) -> Result<bool, CliError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CliError::args(format!("'{}' is not a boolean", raw)).with_hint("use true/false, yes/no or 1/0")),
    }
}

fn parse_token<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T, CliError> {
    raw.parse().map_err(CliError::args)
}

fn parse_color(raw: &str) -> Result<Color, CliError> {
    Color::parse(raw).ok_or_else(|| {
        CliError::args(format!("'{}' is not a color", raw)).with_hint("use #rrggbb, #aarrggbb or r,g,b[,a]")
    })
}

/// `name=value`; numeric values become numbers, everything else text.
fn parse_field_assignment(raw: &str) -> Result<(String, PropertyValue), CliError> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(CliError::args(format!("expected NAME=VALUE, got '{}'", raw)));
    };
    let value = match value.trim().parse::<f64>() {
        Ok(n) => PropertyValue::number(n),
        Err(_) => PropertyValue::text(value),
    };
    Ok((name.trim().to_string(), value))
}
