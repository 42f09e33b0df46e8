//! Per-export data containers: shader sources and material sources.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::{ExportItemId, MaterialId, SelectionGroupId, ShaderModel, SourceShader};

/// UV set read when nothing else is configured.
pub const DEFAULT_UV_SET: &str = "st";

/// A shader plus the export items bound to its inputs.
#[derive(Clone, Debug)]
pub struct UsdShaderSource {
    shader: Arc<SourceShader>,
    inputs: BTreeMap<String, ExportItemId>,
    uv_set_name: String,
}

impl UsdShaderSource {
    pub fn new(shader: Arc<SourceShader>) -> Self {
        Self {
            shader,
            inputs: BTreeMap::new(),
            uv_set_name: DEFAULT_UV_SET.to_string(),
        }
    }

    pub fn shader(&self) -> &SourceShader {
        &self.shader
    }

    pub fn shader_model(&self) -> &ShaderModel {
        &self.shader.model
    }

    pub fn shader_model_id(&self) -> &str {
        &self.shader.model.id
    }

    /// Bind an export item to an input, replacing any previous one.
    pub fn set_input_export_item(&mut self, input: &str, item: ExportItemId) {
        self.inputs.insert(input.to_string(), item);
    }

    pub fn input_export_item(&self, input: &str) -> Option<ExportItemId> {
        self.inputs.get(input).copied()
    }

    /// Bound export items keyed by input name.
    pub fn input_export_items(&self) -> &BTreeMap<String, ExportItemId> {
        &self.inputs
    }

    pub fn uv_set_name(&self) -> &str {
        &self.uv_set_name
    }

    /// Set the UV set; an empty name restores the default.
    pub fn set_uv_set_name(&mut self, name: &str) {
        self.uv_set_name = if name.is_empty() {
            DEFAULT_UV_SET.to_string()
        } else {
            name.to_string()
        };
    }
}

/// A material to export: shader sources, binding locations and the
/// selection groups that restrict those bindings.
#[derive(Clone, Debug)]
pub struct UsdMaterialSource {
    id: MaterialId,
    name: String,
    shader_sources: Vec<UsdShaderSource>,
    binding_locations: Vec<String>,
    selection_groups: Vec<SelectionGroupId>,
}

impl UsdMaterialSource {
    /// New material; its id is derived from the name.
    pub fn new(name: &str) -> Self {
        Self::with_id(MaterialId::from_name(name), name)
    }

    pub fn with_id(id: MaterialId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            shader_sources: Vec::new(),
            binding_locations: Vec::new(),
            selection_groups: Vec::new(),
        }
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a shader source. A source of the same shader model is replaced.
    pub fn set_shader_source(&mut self, source: UsdShaderSource) {
        match self
            .shader_sources
            .iter_mut()
            .find(|s| s.shader_model_id() == source.shader_model_id())
        {
            Some(slot) => *slot = source,
            None => self.shader_sources.push(source),
        }
    }

    pub fn shader_source(&self, shader_model_id: &str) -> Option<&UsdShaderSource> {
        self.shader_sources
            .iter()
            .find(|s| s.shader_model_id() == shader_model_id)
    }

    pub fn shader_sources(&self) -> &[UsdShaderSource] {
        &self.shader_sources
    }

    pub fn add_binding_location(&mut self, location: &str) {
        if !self.binding_locations.iter().any(|l| l == location) {
            self.binding_locations.push(location.to_string());
        }
    }

    pub fn binding_locations(&self) -> &[String] {
        &self.binding_locations
    }

    pub fn add_selection_group(&mut self, group: SelectionGroupId) {
        if !self.selection_groups.contains(&group) {
            self.selection_groups.push(group);
        }
    }

    pub fn selection_groups(&self) -> &[SelectionGroupId] {
        &self.selection_groups
    }
}

/// Persisted description of a material in the export list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDefinition {
    pub name: String,
    /// Unchecked materials are kept in the list but not exported.
    pub enabled: bool,
    /// Shader names, at most one per shader model.
    pub shaders: Vec<String>,
    pub locations: Vec<String>,
    /// Selection group names.
    pub selection_groups: Vec<String>,
    pub uv_set: Option<String>,
}

impl Default for MaterialDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            shaders: Vec::new(),
            locations: Vec::new(),
            selection_groups: Vec::new(),
            uv_set: None,
        }
    }
}
