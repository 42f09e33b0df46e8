//! Host object model as seen by the exporter.
//!
//! Shader models, live shaders and graph node classifications. The host owns
//! all of these; the exporter only reads them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::ids::{NodeId, SelectionGroupId, ShaderId};

/// Semantic type of a shader model input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Color,
    Float,
    Bool,
    Int,
    Normal,
    Vector,
    String,
}

/// One declared input of a shader model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShaderModelInput {
    pub name: String,
    /// Default as an RGBA color; scalars live in the red channel.
    #[serde(default)]
    pub default: Vec4,
    pub kind: InputKind,
}

/// A renderer's parameter schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShaderModel {
    pub id: String,
    pub inputs: Vec<ShaderModelInput>,
}

impl ShaderModel {
    /// Create an empty model.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            inputs: Vec::new(),
        }
    }

    /// Builder: declare an input.
    pub fn with_input(mut self, name: &str, kind: InputKind, default: Vec4) -> Self {
        self.inputs.push(ShaderModelInput {
            name: name.to_string(),
            default,
            kind,
        });
        self
    }

    /// Look up an input by name.
    pub fn input(&self, name: &str) -> Option<&ShaderModelInput> {
        self.inputs.iter().find(|i| i.name == name)
    }

    /// Input names in declared order.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.name.as_str())
    }
}

/// Literal parameter value stored on a shader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vector(Vec3),
    Color(Vec4),
    String(String),
}

/// A live shader object.
#[derive(Clone, Debug)]
pub struct SourceShader {
    pub id: ShaderId,
    pub name: String,
    /// The shading node that represents this shader in the graph.
    pub node: NodeId,
    pub model: Arc<ShaderModel>,
    pub parameters: BTreeMap<String, ParamValue>,
}

impl SourceShader {
    /// Literal value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Whether the shader stores a value for `name`.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
}

/// Native bit depth of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    #[default]
    Byte,
    Half,
    Float,
}

impl BitDepth {
    /// Name used in export override maps.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "8",
            Self::Half => "16f",
            Self::Float => "32f",
        }
    }
}

/// The node connected to a graph input, classified by kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpstreamNode {
    /// Per-channel baked texture node.
    Channel(NodeId),
    /// Multi-channel bake point.
    BakePoint(NodeId),
    /// Group container; `output_port` is the group output that is connected.
    Group { node: NodeId, output_port: String },
    /// Anything else (procedurals, adjustments, ...).
    Other(NodeId),
}

/// A node whose pixels can be baked into an export item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageNode {
    Channel(NodeId),
    BakePoint(NodeId),
}

impl ImageNode {
    pub fn node_id(self) -> NodeId {
        match self {
            Self::Channel(id) | Self::BakePoint(id) => id,
        }
    }

    pub fn is_bake_point(self) -> bool {
        matches!(self, Self::BakePoint(_))
    }
}

/// Named set of faces, per mesh location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionGroup {
    pub id: SelectionGroupId,
    pub name: String,
    pub faces: BTreeMap<String, BTreeSet<u32>>,
}
