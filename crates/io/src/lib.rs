// XML persistence primitives shared by the elevation, symbol and property layers

pub mod codec;
pub mod context;
pub mod error;
pub mod xml;

pub use context::{MessageLevel, ReadWriteContext, ReadWriteMessage};
pub use error::XmlError;
pub use xml::{XmlDocument, XmlElement};

/// Version stamped on persisted layer documents.
/// Increment when the layout changes in a way older readers can't follow.
pub const XML_FORMAT_VERSION: u32 = 1;
