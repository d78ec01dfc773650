use strata_config::Color;

/// The map layer an elevation store belongs to.
///
/// Stores only hold a weak reference, so the layer must be shareable across
/// threads for the store to stay `Send`.
pub trait MapLayer: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Whether the layer geometries carry Z coordinates.
    fn has_z_values(&self) -> bool;

    /// Main color of the layer renderer, if it has a single one.
    fn renderer_color(&self) -> Option<Color> {
        None
    }
}

/// Plain in-memory layer description.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleLayer {
    pub id: String,
    pub name: String,
    pub has_z: bool,
    pub color: Option<Color>,
}

impl SimpleLayer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            has_z: false,
            color: None,
        }
    }

    pub fn with_z(mut self, has_z: bool) -> Self {
        self.has_z = has_z;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl MapLayer for SimpleLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_z_values(&self) -> bool {
        self.has_z
    }

    fn renderer_color(&self) -> Option<Color> {
        self.color
    }
}
