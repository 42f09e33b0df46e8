//! # usdlook
//!
//! Exports the shader networks of a texture painting application as a USD
//! look file: one `Material` per exported material, a renderer specific
//! shading network per shader, baked textures wired into texture nodes, and
//! material bindings on the geometry. An optional assembly layer pulls the
//! geometry payload and the look file together.
//!
//! ## Modules
//!
//! - [`util`] - Errors, metadata, name and path helpers
//! - [`usd`] - Layer authoring and usda output
//! - [`host`] - Host application interfaces and an in-memory host
//! - [`export`] - Export item resolution, renderer registry, look export
//! - [`renderers`] - Built-in renderer plugins
//! - [`settings`] - User preferences and project metadata
//!
//! ## Example
//!
//! ```ignore
//! use usdlook::prelude::*;
//!
//! let mut registry = Registry::new();
//! register_builtin(&mut registry)?;
//! let prefs = Preferences::load();
//!
//! let job = ExportJob::load("chair_job.json")?;
//! let (_host, report) = job.run(&registry, &prefs)?;
//! println!("{} materials in {}", report.materials, report.look_file.display());
//! ```

pub mod util;
pub mod usd;
pub mod host;
pub mod export;
pub mod renderers;
pub mod settings;

pub use util::{ExportError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::export::{
        export_usd_shade_look, ExportItemResolver, ExportJob, ExportReport, Registry,
        UsdExportParameters, UsdMaterialSource, UsdShaderSource, WriteContext,
    };
    pub use crate::host::memory::MemoryHost;
    pub use crate::host::{ExportItem, ExportItemStore, GeometryQuery, Host, ShadingGraph, TextureBaker};
    pub use crate::renderers::register_builtin;
    pub use crate::settings::Preferences;
    pub use crate::usd::{SdfPath, Stage};
    pub use crate::util::{ExportError, Result};
}
