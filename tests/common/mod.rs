//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec4;
use usdlook::export::{ExportItemResolver, Registry, UsdExportParameters, UsdShaderSource, WriteContext};
use usdlook::host::memory::{MemoryHost, NodeKind};
use usdlook::host::{BitDepth, InputKind, MaterialId, ParamValue, ShaderModel, ShadingGraph};
use usdlook::renderers::{arnold, preview, principled, prman, register_builtin};
use usdlook::settings::Preferences;
use usdlook::usd::{SdfPath, Stage};
use usdlook::util::sanitize_name;

pub fn grey(v: f32) -> Vec4 {
    Vec4::new(v, v, v, 1.0)
}

pub fn registry() -> Registry {
    let mut registry = Registry::new();
    register_builtin(&mut registry).unwrap();
    registry
}

pub fn prman_model() -> ShaderModel {
    ShaderModel::new(prman::SHADER_MODEL_ID)
        .with_input("diffuseGain", InputKind::Float, grey(1.0))
        .with_input("diffuseColor", InputKind::Color, grey(0.18))
        .with_input("specularRoughness", InputKind::Float, grey(0.2))
        .with_input("presence", InputKind::Float, grey(1.0))
        .with_input("Bump", InputKind::Float, grey(0.0))
        .with_input("Normal", InputKind::Normal, Vec4::new(0.0, 0.0, 1.0, 1.0))
        .with_input("BumpWeight", InputKind::Float, grey(1.0))
}

pub fn arnold_model() -> ShaderModel {
    ShaderModel::new(arnold::SHADER_MODEL_ID)
        .with_input("DiffuseWeight", InputKind::Float, grey(0.8))
        .with_input("DiffuseColor", InputKind::Color, grey(1.0))
        .with_input("Metalness", InputKind::Float, grey(0.0))
        .with_input("SpecularRoughness", InputKind::Float, grey(0.2))
}

pub fn principled_model() -> ShaderModel {
    ShaderModel::new(principled::SHADER_MODEL_ID)
        .with_input("BaseColor", InputKind::Color, grey(0.8))
        .with_input("metallic", InputKind::Float, grey(0.0))
        .with_input("roughness", InputKind::Float, grey(0.5))
        .with_input("Normal", InputKind::Normal, Vec4::new(0.0, 0.0, 1.0, 1.0))
}

/// Host with one model per built-in renderer.
pub fn host() -> MemoryHost {
    let mut host = MemoryHost::new("chair");
    host.add_model(preview::shader_model());
    host.add_model(prman_model());
    host.add_model(arnold_model());
    host.add_model(principled_model());
    host
}

/// Add a channel node and connect it to `input` of `shader`.
pub fn paint(host: &mut MemoryHost, shader: &str, input: &str, channel: &str, depth: BitDepth) {
    let node = host.node_by_name(shader).unwrap();
    let chan = host.add_node(channel, NodeKind::Channel, depth);
    host.connect(node, input, chan);
}

pub fn params(root: &Path) -> UsdExportParameters {
    let mut params = UsdExportParameters::new();
    params.set_export_root_path(root).unwrap();
    params
}

pub fn floats(pairs: &[(&str, f32)]) -> BTreeMap<String, ParamValue> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ParamValue::Float(*v)))
        .collect()
}

pub fn p(s: &str) -> SdfPath {
    SdfPath::parse(s).unwrap()
}

/// Resolve the shader source of `shader` for a material.
pub fn source(
    host: &mut MemoryHost,
    registry: &Registry,
    prefs: &Preferences,
    material: &str,
    shader: &str,
    uv_set: &str,
) -> UsdShaderSource {
    let arc = host.shader_by_name(shader).unwrap();
    let mut resolver = ExportItemResolver::new(host, registry, prefs);
    resolver.shader_source(MaterialId::from_name(material), &arc, uv_set)
}

/// Run the registered writer for `source` into an in-memory stage under
/// `/Root/Mat`. Returns the stage and the shader prim path.
pub fn write_network(
    host: &mut MemoryHost,
    registry: &Registry,
    prefs: &Preferences,
    params: &UsdExportParameters,
    source: &UsdShaderSource,
) -> (Stage, SdfPath) {
    let mut stage = Stage::create_in_memory();
    stage.define_prim(&p("/Root"), "").unwrap();
    let material = p("/Root/Mat");
    stage.define_material(&material).unwrap();

    let model = source.shader_model_id();
    let shader_path = material.append_child(&sanitize_name(&source.shader().name)).unwrap();
    stage
        .define_shader(&shader_path, registry.usd_type_for(model))
        .unwrap();

    let writer = registry.writer_for(model).unwrap();
    let mut ctx = WriteContext::new(
        &mut stage,
        material,
        shader_path.clone(),
        params,
        source,
        host,
        registry,
        prefs,
    );
    writer(&mut ctx).unwrap();
    (stage, shader_path)
}
