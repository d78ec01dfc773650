pub mod collection;
pub mod context;
pub mod expression;
pub mod property;
pub mod value;

pub use collection::{PropertyCollection, PropertyDefinition, PropertyKey, StandardPropertyType};
pub use context::ExpressionContext;
pub use expression::{Expression, ExpressionError};
pub use property::{Property, PropertySource, PropertyType};
pub use value::PropertyValue;
