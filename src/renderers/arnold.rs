//! Arnold Standard Surface.
//!
//! Textures are baked before the network is written: a texture that came
//! out as one flat color matching the model default carries no
//! information, so the input is written as a literal instead.

use glam::Vec4;
use tracing::{debug, instrument};

use super::{define_sampler, post_process_field, set_post_processed_extension};
use crate::export::{
    colors_fuzzy_equal, mapped_input, InputMap, Registry, RendererCallbacks, SettingField,
    WriteContext, DEFAULT_UV_SET,
};
use crate::host::{ExportItem, ExportItemId};
use crate::settings::Preferences;
use crate::usd::{Value, ValueType};
use crate::util::Result;

pub const SHADER_MODEL_ID: &str = "Arnold Standard Surface";
pub const USD_SHADER_ID: &str = "standard_surface";
pub const TERMINAL: &str = "out";
pub const SETTINGS_GROUP: &str = "ArnoldUSDExportSettings";
pub const DEFAULT_POST_PROCESS: &str = "maketx $EXPORTED $POSTPROCESSED";

const TEXTURE_ID: &str = "image";

const INPUTS: InputMap = &[
    ("DiffuseWeight", Some(("base", ValueType::Float))),
    ("DiffuseColor", Some(("base_color", ValueType::Color3f))),
    ("CoatWeight", Some(("coat", ValueType::Float))),
    ("CoatColor", Some(("coat_color", ValueType::Color3f))),
    ("CoatIOR", Some(("coat_IOR", ValueType::Float))),
    ("CoatRoughness", Some(("coat_roughness", ValueType::Float))),
    ("DiffuseRoughness", Some(("diffuse_roughness", ValueType::Float))),
    ("EmissionWeight", Some(("emission", ValueType::Float))),
    ("EmissionColor", Some(("emission_color", ValueType::Color3f))),
    ("Metalness", Some(("metalness", ValueType::Float))),
    ("Normal", Some(("normal", ValueType::Normal3f))),
    ("Opacity", Some(("opacity", ValueType::Color3f))),
    ("SheenWeight", Some(("sheen", ValueType::Float))),
    ("SheenColor", Some(("sheen_color", ValueType::Color3f))),
    ("SheenRoughness", Some(("sheen_roughness", ValueType::Float))),
    ("SpecularWeight", Some(("specular", ValueType::Float))),
    ("Anisotropy", Some(("specular_anisotropy", ValueType::Float))),
    ("SpecularColor", Some(("specular_color", ValueType::Color3f))),
    ("SpecularIOR", Some(("specular_IOR", ValueType::Float))),
    ("Rotation", Some(("specular_rotation", ValueType::Float))),
    ("SpecularRoughness", Some(("specular_roughness", ValueType::Float))),
    ("SSSWeight", Some(("subsurface", ValueType::Float))),
    ("SSSColor", Some(("subsurface_color", ValueType::Color3f))),
    ("SSSRadius", Some(("subsurface_radius", ValueType::Color3f))),
    ("SSSScale", Some(("subsurface_scale", ValueType::Float))),
    ("ThinIOR", Some(("thin_film_IOR", ValueType::Float))),
    ("ThinThick", Some(("thin_film_thickness", ValueType::Float))),
    ("TransmissionWeight", Some(("transmission", ValueType::Float))),
    ("TransmissionColor", Some(("transmission_color", ValueType::Color3f))),
    ("TransmissionDepth", Some(("transmission_depth", ValueType::Float))),
    ("TransmissionDisp", Some(("transmission_dispersion", ValueType::Float))),
    ("TransmissionRoughness", Some(("transmission_extra_roughness", ValueType::Float))),
    ("TransmissionScatter", Some(("transmission_scatter", ValueType::Color3f))),
    ("TransmissionScatAnis", Some(("transmission_scatter_anisotropy", ValueType::Float))),
    ("Bump", None),
    ("Vector", None),
    ("Displacement", None),
];

pub fn register(registry: &mut Registry) -> Result<()> {
    let callbacks = RendererCallbacks {
        settings_panel: Some(settings_panel),
        on_export_item_created: Some(on_export_item_created),
        on_export_item_exported: None,
    };
    registry.register(
        SHADER_MODEL_ID,
        USD_SHADER_ID,
        write_network,
        TERMINAL,
        None,
        Some(callbacks),
    )
}

fn settings_panel() -> Vec<SettingField> {
    vec![post_process_field(SETTINGS_GROUP, DEFAULT_POST_PROCESS)]
}

/// Convert baked textures to `.tx` with the configured command.
fn on_export_item_created(item: &mut ExportItem, prefs: &Preferences) {
    item.post_process_command = post_process_field(SETTINGS_GROUP, DEFAULT_POST_PROCESS).value(prefs);
    set_post_processed_extension(item, "tx");
}

fn sampler_output(ty: ValueType) -> &'static str {
    if ty == ValueType::Float {
        "r"
    } else {
        "rgb"
    }
}

/// Whether a bake result is worth a texture node.
fn carries_texture(uniform: Option<Vec4>, default: Vec4) -> bool {
    match uniform {
        None => true,
        Some(color) => color != Vec4::ZERO && !colors_fuzzy_equal(color, default),
    }
}

#[instrument(skip_all, fields(shader = %ctx.shader_path))]
pub fn write_network(ctx: &mut WriteContext<'_>) -> Result<()> {
    let inputs = ctx.model_inputs();

    let items: Vec<ExportItemId> = inputs
        .iter()
        .filter(|input| mapped_input(INPUTS, input).is_some())
        .filter_map(|input| ctx.enabled_export_item(input))
        .collect();
    let report = ctx.bake(&items)?;

    let source = ctx.source;
    let model = source.shader_model();
    for input in &inputs {
        let Some((target, ty)) = mapped_input(INPUTS, input) else {
            continue;
        };
        let default = model.input(input).map(|i| i.default).unwrap_or(Vec4::ZERO);
        let item = ctx.enabled_export_item(input).filter(|id| {
            let keep = carries_texture(report.uniform_colors.get(id).copied(), default);
            if !keep {
                debug!("Export item for '{}' baked to a flat default, writing a literal", input);
            }
            keep
        });
        match item {
            Some(item) => {
                let texture = ctx.texture_node_path(input)?;
                define_sampler(ctx, &texture, TEXTURE_ID, "filename", item)?;
                let uv_set = source.uv_set_name();
                if uv_set != DEFAULT_UV_SET {
                    ctx.stage
                        .set_input(&texture, "uvset", Value::String(uv_set.to_string()))?;
                }
                ctx.stage
                    .connect_input(&ctx.shader_path, target, ty, &texture, sampler_output(ty))?;
            }
            None => {
                ctx.write_literal(input, target, ty)?;
            }
        }
    }
    Ok(())
}
