//! Utility types and functions shared by the exporter.
//!
//! - [`ExportError`] / [`Result`] - Error handling
//! - [`MetaData`] - String key/value storage carried by export items
//! - [`sanitize_name`] - Prim name sanitizing
//! - [`relative_path`] - Relative asset paths for composition arcs

mod error;
mod metadata;
mod names;
mod paths;

pub use error::*;
pub use metadata::*;
pub use names::*;
pub use paths::*;
