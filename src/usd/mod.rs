//! USD authoring surface.
//!
//! A small in-memory model of the parts of a USD layer that look export
//! writes: prims, typed attributes with connections, relationships,
//! payload/reference arcs, and the UsdShade conventions layered on top.
//! Layers are written as usda text.
//!
//! - [`SdfPath`] - Validated prim paths
//! - [`Value`] / [`ValueType`] - Typed attribute values
//! - [`Prim`] - Prim specs
//! - [`Stage`] - Layer authoring, including the shading helpers in `shade`

mod path;
mod prim;
mod shade;
mod stage;
mod usda;
mod value;

pub use path::SdfPath;
pub use prim::{Attribute, Prim, Relationship, Specifier};
pub use shade::{material_binding_target, MATERIAL_BIND_FAMILY};
pub use stage::Stage;
pub use usda::UsdaStream;
pub use value::{quote, Value, ValueType};
