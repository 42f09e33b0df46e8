//! In-memory host.
//!
//! Holds a shading graph, shaders, export items and geometry queries in plain
//! collections. Node and shader ids are derived from their names, so a scene
//! loaded twice produces the same ids.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec4;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::*;
use crate::util::{ExportError, Result};

/// Kind of a graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Channel,
    #[serde(alias = "bake_point")]
    BakePoint,
    Group,
    Shader,
    Other,
}

#[derive(Clone, Debug)]
struct NodeRecord {
    name: String,
    kind: NodeKind,
    depth: BitDepth,
    uniform_color: Option<Vec4>,
}

/// A recorded bake call.
#[derive(Clone, Debug, PartialEq)]
pub struct BakeCall {
    pub items: Vec<ExportItemId>,
    pub root: PathBuf,
    pub overrides: ExportOverrides,
    pub show_progress: bool,
}

/// Host state kept in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    entity: String,
    nodes: HashMap<NodeId, NodeRecord>,
    connections: HashMap<(NodeId, String), (NodeId, String)>,
    group_outputs: HashMap<(NodeId, String), NodeId>,
    models: HashMap<String, Arc<ShaderModel>>,
    shaders: Vec<Arc<SourceShader>>,
    items: Vec<(ExportItemId, ExportItem)>,
    selection_groups: Vec<SelectionGroup>,
    face_counts: HashMap<String, usize>,
    bake_calls: Vec<BakeCall>,
    fail_bake: Option<String>,
}

/// Default output port name of graph nodes.
pub const DEFAULT_PORT: &str = "Output";

impl MemoryHost {
    /// Create an empty host for a geometry entity.
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            ..Self::default()
        }
    }

    // === Graph building ===

    /// Register a shader model.
    pub fn add_model(&mut self, model: ShaderModel) -> Arc<ShaderModel> {
        let model = Arc::new(model);
        self.models.insert(model.id.clone(), model.clone());
        model
    }

    /// Add (or replace) a node.
    pub fn add_node(&mut self, name: &str, kind: NodeKind, depth: BitDepth) -> NodeId {
        let id = NodeId::from_name(name);
        self.nodes.insert(
            id,
            NodeRecord {
                name: name.to_string(),
                kind,
                depth,
                uniform_color: None,
            },
        );
        id
    }

    /// Find a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        let id = NodeId::from_name(name);
        self.nodes.contains_key(&id).then_some(id)
    }

    /// Make bakes of `node` report a flat color.
    pub fn set_uniform_color(&mut self, node: NodeId, color: Vec4) {
        if let Some(rec) = self.nodes.get_mut(&node) {
            rec.uniform_color = Some(color);
        }
    }

    /// Connect `source`'s default output to `input` on `node`.
    pub fn connect(&mut self, node: NodeId, input: &str, source: NodeId) {
        self.connect_port(node, input, source, DEFAULT_PORT);
    }

    /// Connect a named output `port` of `source` to `input` on `node`.
    pub fn connect_port(&mut self, node: NodeId, input: &str, source: NodeId, port: &str) {
        self.connections
            .insert((node, input.to_string()), (source, port.to_string()));
    }

    /// Expose `inner` through the group output `port`.
    ///
    /// Creates the group's output boundary node and wires `inner` into its
    /// `Input` port.
    pub fn set_group_output(&mut self, group: NodeId, port: &str, inner: NodeId) -> NodeId {
        let group_name = self.nodes.get(&group).map(|n| n.name.clone()).unwrap_or_default();
        let boundary = self.add_node(&format!("{}:{}", group_name, port), NodeKind::Other, BitDepth::Byte);
        self.group_outputs.insert((group, port.to_string()), boundary);
        self.connect(boundary, "Input", inner);
        boundary
    }

    /// Add a shader of a registered model; creates its shading node too.
    pub fn add_shader(
        &mut self,
        name: &str,
        model_id: &str,
        parameters: BTreeMap<String, ParamValue>,
    ) -> Result<ShaderId> {
        let model = self
            .models
            .get(model_id)
            .cloned()
            .ok_or_else(|| ExportError::other(format!("Unknown shader model '{}'", model_id)))?;
        let node = self.add_node(name, NodeKind::Shader, BitDepth::Byte);
        let id = ShaderId::from_name(name);
        self.shaders.retain(|s| s.id != id);
        self.shaders.push(Arc::new(SourceShader {
            id,
            name: name.to_string(),
            node,
            model,
            parameters,
        }));
        Ok(id)
    }

    /// Add a selection group.
    pub fn add_selection_group<I, L>(&mut self, name: &str, faces: I) -> SelectionGroupId
    where
        I: IntoIterator<Item = (L, Vec<u32>)>,
        L: Into<String>,
    {
        let id = SelectionGroupId::from_name(name);
        let faces = faces
            .into_iter()
            .map(|(loc, f)| (loc.into(), f.into_iter().collect()))
            .collect();
        self.selection_groups.retain(|g| g.id != id);
        self.selection_groups.push(SelectionGroup {
            id,
            name: name.to_string(),
            faces,
        });
        id
    }

    /// Record the face count of the mesh at `location`.
    pub fn set_face_count(&mut self, location: &str, count: usize) {
        self.face_counts.insert(location.to_string(), count);
    }

    /// Make every following bake call fail.
    pub fn set_fail_bake(&mut self, message: Option<String>) {
        self.fail_bake = message;
    }

    // === Inspection ===

    /// All bake calls so far.
    pub fn bake_calls(&self) -> &[BakeCall] {
        &self.bake_calls
    }

    /// All export items in insertion order.
    pub fn export_items(&self) -> impl Iterator<Item = (ExportItemId, &ExportItem)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    /// Number of export items.
    pub fn export_item_count(&self) -> usize {
        self.items.len()
    }

    // === Scene files ===

    /// Build a host from a scene description.
    pub fn from_scene(scene: &SceneDescription) -> Result<Self> {
        let mut host = Self::new(&scene.entity);
        for model in &scene.models {
            host.add_model(model.clone());
        }
        for node in &scene.nodes {
            let id = host.add_node(&node.name, node.kind, node.depth);
            if let Some(color) = node.uniform_color {
                host.set_uniform_color(id, color);
            }
        }
        for shader in &scene.shaders {
            host.add_shader(&shader.name, &shader.model, shader.parameters.clone())?;
        }
        for group in &scene.groups {
            let group_id = host.require_node(&group.name)?;
            for (port, inner) in &group.outputs {
                let inner = host.require_node(inner)?;
                host.set_group_output(group_id, port, inner);
            }
        }
        for conn in &scene.connections {
            let node = host.require_node(&conn.node)?;
            let source = host.require_node(&conn.source)?;
            let port = conn.port.as_deref().unwrap_or(DEFAULT_PORT);
            host.connect_port(node, &conn.input, source, port);
        }
        for group in &scene.selection_groups {
            host.add_selection_group(&group.name, group.faces.clone());
        }
        for (location, count) in &scene.face_counts {
            host.set_face_count(location, *count);
        }
        for desc in &scene.export_items {
            let mut item = desc.item.clone();
            item.source_node = Some(host.require_node(&desc.source)?);
            host.add_export_item(item);
        }
        debug!(
            "Loaded scene '{}': {} nodes, {} shaders, {} export items",
            host.entity,
            host.nodes.len(),
            host.shaders.len(),
            host.items.len()
        );
        Ok(host)
    }

    fn require_node(&self, name: &str) -> Result<NodeId> {
        self.node_by_name(name)
            .ok_or_else(|| ExportError::NodeNotFound(name.to_string()))
    }
}

impl ShadingGraph for MemoryHost {
    fn input_connection(&self, node: NodeId, input: &str) -> Option<UpstreamNode> {
        let (source, port) = self.connections.get(&(node, input.to_string()))?;
        let kind = self.nodes.get(source).map(|n| n.kind).unwrap_or(NodeKind::Other);
        Some(match kind {
            NodeKind::Channel => UpstreamNode::Channel(*source),
            NodeKind::BakePoint => UpstreamNode::BakePoint(*source),
            NodeKind::Group => UpstreamNode::Group {
                node: *source,
                output_port: port.clone(),
            },
            NodeKind::Shader | NodeKind::Other => UpstreamNode::Other(*source),
        })
    }

    fn group_output_node(&self, group: NodeId, port: &str) -> Option<NodeId> {
        self.group_outputs.get(&(group, port.to_string())).copied()
    }

    fn node_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|n| n.name.clone())
    }

    fn node_depth(&self, node: NodeId) -> BitDepth {
        self.nodes.get(&node).map(|n| n.depth).unwrap_or_default()
    }

    fn shader(&self, id: ShaderId) -> Option<Arc<SourceShader>> {
        self.shaders.iter().find(|s| s.id == id).cloned()
    }

    fn shader_by_name(&self, name: &str) -> Option<Arc<SourceShader>> {
        self.shaders.iter().find(|s| s.name == name).cloned()
    }

    fn entity_name(&self) -> String {
        self.entity.clone()
    }
}

impl ExportItemStore for MemoryHost {
    fn export_item_ids(&self) -> Vec<ExportItemId> {
        self.items.iter().map(|(id, _)| *id).collect()
    }

    fn export_item(&self, id: ExportItemId) -> Option<&ExportItem> {
        self.items.iter().find(|(i, _)| *i == id).map(|(_, item)| item)
    }

    fn export_item_mut(&mut self, id: ExportItemId) -> Option<&mut ExportItem> {
        self.items.iter_mut().find(|(i, _)| *i == id).map(|(_, item)| item)
    }

    fn add_export_item(&mut self, item: ExportItem) -> ExportItemId {
        let id = ExportItemId::new();
        self.items.push((id, item));
        id
    }
}

impl TextureBaker for MemoryHost {
    fn export_textures(
        &mut self,
        items: &[ExportItemId],
        root: &Path,
        overrides: &ExportOverrides,
        show_progress: bool,
    ) -> Result<BakeReport> {
        if let Some(msg) = &self.fail_bake {
            return Err(ExportError::Bake(msg.clone()));
        }
        let mut report = BakeReport::default();
        for id in items {
            let item = self
                .export_item(*id)
                .ok_or_else(|| ExportError::ExportItemNotFound(id.to_string()))?;
            let color = item
                .source_node
                .and_then(|n| self.nodes.get(&n))
                .and_then(|n| n.uniform_color);
            if let Some(color) = color {
                report.uniform_colors.insert(*id, color);
            }
        }
        info!("Baking {} export items to {}", items.len(), root.display());
        self.bake_calls.push(BakeCall {
            items: items.to_vec(),
            root: root.to_path_buf(),
            overrides: overrides.clone(),
            show_progress,
        });
        Ok(report)
    }
}

impl GeometryQuery for MemoryHost {
    fn selection_group(&self, id: SelectionGroupId) -> Option<&SelectionGroup> {
        self.selection_groups.iter().find(|g| g.id == id)
    }

    fn selection_group_by_name(&self, name: &str) -> Option<&SelectionGroup> {
        self.selection_groups.iter().find(|g| g.name == name)
    }

    fn face_count(&self, location: &str) -> Option<usize> {
        self.face_counts.get(location).copied()
    }
}

/// JSON description of a host scene.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub entity: String,
    pub models: Vec<ShaderModel>,
    pub nodes: Vec<NodeDescription>,
    pub groups: Vec<GroupDescription>,
    pub connections: Vec<ConnectionDescription>,
    pub shaders: Vec<ShaderDescription>,
    pub selection_groups: Vec<SelectionGroupDescription>,
    pub face_counts: BTreeMap<String, usize>,
    /// Items already present in the project.
    pub export_items: Vec<ExportItemDescription>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub depth: BitDepth,
    #[serde(default)]
    pub uniform_color: Option<Vec4>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupDescription {
    pub name: String,
    /// Group output port -> inner node feeding it.
    pub outputs: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub node: String,
    pub input: String,
    pub source: String,
    #[serde(default)]
    pub port: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShaderDescription {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionGroupDescription {
    pub name: String,
    pub faces: BTreeMap<String, Vec<u32>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportItemDescription {
    /// Name of the source node.
    pub source: String,
    #[serde(flatten)]
    pub item: ExportItem,
}
