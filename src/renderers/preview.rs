//! USD Preview Surface.

use glam::{Vec3, Vec4};
use tracing::instrument;

use super::define_sampler;
use crate::export::{mapped_input, InputMap, Registry, WriteContext};
use crate::host::{InputKind, ShaderModel};
use crate::usd::{SdfPath, Value, ValueType};
use crate::util::{sanitize_name, Result};

pub const SHADER_MODEL_ID: &str = "USD Preview Surface";
pub const USD_SHADER_ID: &str = "UsdPreviewSurface";
pub const TERMINAL: &str = "surface";
pub const RENDER_CONTEXT: &str = "glslfx";

const UV_READER_ID: &str = "UsdPrimvarReader_float2";
const TEXTURE_ID: &str = "UsdUVTexture";

const INPUTS: InputMap = &[
    ("diffuseColor", Some(("diffuseColor", ValueType::Color3f))),
    ("emissiveColor", Some(("emissiveColor", ValueType::Color3f))),
    ("useSpecularWorkflow", Some(("useSpecularWorkflow", ValueType::Bool))),
    ("specularColor", Some(("specularColor", ValueType::Color3f))),
    ("metallic", Some(("metallic", ValueType::Float))),
    ("roughness", Some(("roughness", ValueType::Float))),
    ("clearcoat", Some(("clearcoat", ValueType::Float))),
    ("clearcoatRoughness", Some(("clearcoatRoughness", ValueType::Float))),
    ("opacity", Some(("opacity", ValueType::Float))),
    ("opacityThreshold", Some(("opacityThreshold", ValueType::Float))),
    ("ior", Some(("ior", ValueType::Float))),
    ("Normal", Some(("normal", ValueType::Normal3f))),
    ("occlusion", Some(("occlusion", ValueType::Float))),
    ("Bump", None),
    ("Vector", None),
    ("Displacement", Some(("displacement", ValueType::Float))),
];

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        SHADER_MODEL_ID,
        USD_SHADER_ID,
        write_network,
        TERMINAL,
        Some(RENDER_CONTEXT),
        None,
    )
}

/// The shader model as the painting application declares it.
pub fn shader_model() -> ShaderModel {
    let grey = |v: f32| Vec4::new(v, v, v, 1.0);
    ShaderModel::new(SHADER_MODEL_ID)
        .with_input("diffuseColor", InputKind::Color, grey(0.18))
        .with_input("emissiveColor", InputKind::Color, grey(0.0))
        .with_input("useSpecularWorkflow", InputKind::Bool, grey(0.0))
        .with_input("specularColor", InputKind::Color, grey(0.0))
        .with_input("metallic", InputKind::Float, grey(0.0))
        .with_input("roughness", InputKind::Float, grey(0.5))
        .with_input("clearcoat", InputKind::Float, grey(0.0))
        .with_input("clearcoatRoughness", InputKind::Float, grey(0.01))
        .with_input("opacity", InputKind::Float, grey(1.0))
        .with_input("opacityThreshold", InputKind::Float, grey(0.0))
        .with_input("ior", InputKind::Float, grey(1.5))
        .with_input("Normal", InputKind::Normal, Vec3::Z.extend(1.0))
        .with_input("occlusion", InputKind::Float, grey(1.0))
        .with_input("Bump", InputKind::Float, grey(0.0))
        .with_input("Vector", InputKind::Vector, grey(0.0))
        .with_input("Displacement", InputKind::Float, grey(0.0))
}

fn sampler_output(ty: ValueType) -> &'static str {
    if ty == ValueType::Float {
        "r"
    } else {
        "rgb"
    }
}

/// Primvar reader for the shader's UV set, shared by all its textures.
fn uv_reader(ctx: &mut WriteContext<'_>) -> Result<SdfPath> {
    let source = ctx.source;
    let uv_set = source.uv_set_name();
    let path = ctx.node_path(&format!("{}_reader", sanitize_name(uv_set)))?;
    if ctx.stage.prim(&path).is_none() {
        ctx.stage.define_shader(&path, Some(UV_READER_ID))?;
        ctx.stage
            .set_input(&path, "varname", Value::Token(uv_set.to_string()))?;
    }
    Ok(path)
}

#[instrument(skip_all, fields(shader = %ctx.shader_path))]
pub fn write_network(ctx: &mut WriteContext<'_>) -> Result<()> {
    let mut items = Vec::new();
    for input in ctx.model_inputs() {
        let Some((target, ty)) = mapped_input(INPUTS, &input) else {
            continue;
        };
        match ctx.enabled_export_item(&input) {
            Some(item) => {
                let reader = uv_reader(ctx)?;
                let texture = ctx.texture_node_path(&input)?;
                define_sampler(ctx, &texture, TEXTURE_ID, "file", item)?;
                ctx.stage
                    .connect_input(&texture, "st", ValueType::Float2, &reader, "result")?;
                ctx.stage
                    .connect_input(&ctx.shader_path, target, ty, &texture, sampler_output(ty))?;
                items.push(item);
            }
            None => {
                ctx.write_literal(&input, target, ty)?;
            }
        }
    }
    ctx.bake(&items)?;
    Ok(())
}
