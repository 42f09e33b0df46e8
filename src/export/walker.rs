//! Upstream image node discovery.
//!
//! Follows the connection on a shader input through any number of group
//! containers, one group level per hop, until an image producing node or a
//! dead end is found.

use tracing::trace;

use crate::host::{ImageNode, NodeId, ShadingGraph, SourceShader, UpstreamNode};

/// Input port on a group's output boundary node.
pub const GROUP_BOUNDARY_INPUT: &str = "Input";

/// Find the channel or bake point node feeding `input` on `shader_node`.
///
/// Unconnected inputs, procedural sources and dangling group outputs all
/// yield `None`.
pub fn find_upstream_image_node<G>(graph: &G, shader_node: NodeId, input: &str) -> Option<ImageNode>
where
    G: ShadingGraph + ?Sized,
{
    let mut current = graph.input_connection(shader_node, input)?;
    loop {
        match current {
            UpstreamNode::Channel(id) => return Some(ImageNode::Channel(id)),
            UpstreamNode::BakePoint(id) => return Some(ImageNode::BakePoint(id)),
            UpstreamNode::Other(id) => {
                trace!("Input '{}' is fed by non-image node {}", input, id);
                return None;
            }
            UpstreamNode::Group { node, output_port } => {
                let boundary = graph.group_output_node(node, &output_port)?;
                current = graph.input_connection(boundary, GROUP_BOUNDARY_INPUT)?;
            }
        }
    }
}

/// Shader model inputs that reach an image node, in declared order.
pub fn exportable_inputs<G>(graph: &G, shader: &SourceShader) -> Vec<(String, ImageNode)>
where
    G: ShadingGraph + ?Sized,
{
    shader
        .model
        .input_names()
        .filter_map(|name| {
            find_upstream_image_node(graph, shader.node, name).map(|node| (name.to_string(), node))
        })
        .collect()
}
