//! Host application interfaces.
//!
//! The exporter never talks to the painting application directly. It reads
//! the shading graph, the export item list, the bake call and the geometry
//! through the traits below; [`memory::MemoryHost`] implements all of them
//! in memory for the command line tool and the tests.

mod export_item;
mod ids;
pub mod memory;
mod model;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::Vec4;

pub use export_item::*;
pub use ids::*;
pub use model::*;

use crate::util::Result;

/// Read access to the host node graph and shader objects.
pub trait ShadingGraph {
    /// Node connected to `input` on `node`, classified by kind.
    fn input_connection(&self, node: NodeId, input: &str) -> Option<UpstreamNode>;

    /// Internal output boundary node of `group` for its output `port`.
    fn group_output_node(&self, group: NodeId, port: &str) -> Option<NodeId>;

    fn node_name(&self, node: NodeId) -> Option<String>;

    /// Native bit depth of the pixels a node produces.
    fn node_depth(&self, node: NodeId) -> BitDepth;

    fn shader(&self, id: ShaderId) -> Option<Arc<SourceShader>>;

    fn shader_by_name(&self, name: &str) -> Option<Arc<SourceShader>>;

    /// Name of the geometry entity being exported.
    fn entity_name(&self) -> String;
}

/// The host's export item list for the current geometry entity.
pub trait ExportItemStore {
    fn export_item_ids(&self) -> Vec<ExportItemId>;
    fn export_item(&self, id: ExportItemId) -> Option<&ExportItem>;
    fn export_item_mut(&mut self, id: ExportItemId) -> Option<&mut ExportItem>;
    /// Register a new item; it stays in the project until removed by the user.
    fn add_export_item(&mut self, item: ExportItem) -> ExportItemId;
}

/// Result of a bake call.
#[derive(Clone, Debug, Default)]
pub struct BakeReport {
    /// Items whose baked images all came out as one flat color.
    pub uniform_colors: HashMap<ExportItemId, Vec4>,
}

/// Blocking texture bake.
pub trait TextureBaker {
    fn export_textures(
        &mut self,
        items: &[ExportItemId],
        root: &Path,
        overrides: &ExportOverrides,
        show_progress: bool,
    ) -> Result<BakeReport>;
}

/// Selection groups and mesh topology.
pub trait GeometryQuery {
    fn selection_group(&self, id: SelectionGroupId) -> Option<&SelectionGroup>;
    fn selection_group_by_name(&self, name: &str) -> Option<&SelectionGroup>;
    /// Number of faces of the mesh at `location`, when known.
    fn face_count(&self, location: &str) -> Option<usize>;
}

/// Everything the exporter needs from the host.
pub trait Host: ShadingGraph + ExportItemStore + TextureBaker + GeometryQuery {}

impl<T: ShadingGraph + ExportItemStore + TextureBaker + GeometryQuery + ?Sized> Host for T {}
