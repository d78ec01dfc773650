// Core types shared by the CLI and any host application

pub mod elevation;
pub mod layer;
pub mod range;
pub mod symbol;

pub use elevation::{
    AltitudeBinding, AltitudeClamping, ElevationProperty, ProfileSurfaceSymbology,
    VectorLayerElevationProperties, VectorProfileType,
};
pub use layer::{MapLayer, SimpleLayer};
pub use range::ZRange;
pub use symbol::{FillSymbol, LineSymbol, MarkerSymbol, Symbol, SymbolLayer, SymbolType};
