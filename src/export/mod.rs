//! Shading network to USD export.
//!
//! - [`walker`] - Finds the image nodes feeding shader inputs
//! - [`ExportItemResolver`] - One hidden export item per material, shader and input
//! - [`Registry`] - Renderer plugins keyed by shader model id
//! - [`WriteContext`] - State handed to renderer network writers
//! - [`export_usd_shade_look`] - Look and assembly export
//! - [`ExportJob`] - JSON batch jobs for the command line tool

mod binding;
mod job;
mod look;
mod params;
mod registry;
mod resolver;
mod source;
mod values;
pub mod walker;
mod writer;

pub use binding::*;
pub use job::*;
pub use look::*;
pub use params::*;
pub use registry::*;
pub use resolver::*;
pub use source::*;
pub use values::*;
pub use walker::{exportable_inputs, find_upstream_image_node};
pub use writer::*;
