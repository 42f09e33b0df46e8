//! RenderMan PxrSurface.
//!
//! Bump and Normal both drive `bumpNormal`. A bump texture goes through a
//! `PxrBumpMixer`; when a normal map is present too, the mixer feeds the
//! normal map's `bumpOverlay` and the normal map drives the surface.

use tracing::{instrument, warn};

use super::{define_sampler, post_process_field, set_post_processed_extension};
use crate::export::{
    mapped_input, value_as_shader_parameter, InputMap, Registry, RendererCallbacks, SettingField,
    WriteContext, DEFAULT_UV_SET,
};
use crate::host::ExportItem;
use crate::settings::Preferences;
use crate::usd::{SdfPath, Value, ValueType};
use crate::util::{sanitize_name, Result};

pub const SHADER_MODEL_ID: &str = "PxrSurface";
pub const USD_SHADER_ID: &str = "PxrSurface";
pub const TERMINAL: &str = "out";
pub const RENDER_CONTEXT: &str = "ri";
pub const SETTINGS_GROUP: &str = "PRManUSDExportSettings";
pub const DEFAULT_POST_PROCESS: &str = "txmake $EXPORTED $POSTPROCESSED";

/// Item metadata remembering the default command last applied.
pub const PREVIOUS_DEFAULT_KEY: &str = "PreviousDefaultPostProcessCommand";

pub(crate) const TEXTURE_ID: &str = "PxrTexture";
pub(crate) const NORMAL_MAP_ID: &str = "PxrNormalMap";
const BUMP_MIXER_ID: &str = "PxrBumpMixer";
const MANIFOLD_ID: &str = "PxrManifold2D";

const BUMP_INPUT: &str = "Bump";
const NORMAL_INPUT: &str = "Normal";
const BUMP_WEIGHT: &str = "BumpWeight";
const BUMP_NORMAL: &str = "bumpNormal";

const INPUTS: InputMap = &[
    ("inputMaterial", Some(("inputMaterial", ValueType::String))),
    ("diffuseGain", Some(("diffuseGain", ValueType::Float))),
    ("diffuseColor", Some(("diffuseColor", ValueType::Vector3f))),
    ("diffuseRoughness", Some(("diffuseRoughness", ValueType::Float))),
    ("diffuseExponent", Some(("diffuseExponent", ValueType::Float))),
    ("diffuseDoubleSided", Some(("diffuseDoubleSided", ValueType::Int))),
    ("diffuseBackUseDiffuseColor", Some(("diffuseBackUseDiffuseColor", ValueType::Int))),
    ("diffuseBackColor", Some(("diffuseBackColor", ValueType::Vector3f))),
    ("diffuseTransmitGain", Some(("diffuseTransmitGain", ValueType::Float))),
    ("diffuseTransmitColor", Some(("diffuseTransmitColor", ValueType::Vector3f))),
    ("specularFresnelMode", Some(("specularFresnelMode", ValueType::Int))),
    ("specularFaceColor", Some(("specularFaceColor", ValueType::Vector3f))),
    ("specularEdgeColor", Some(("specularEdgeColor", ValueType::Vector3f))),
    ("specularFresnelShape", Some(("specularFresnelShape", ValueType::Float))),
    ("specularIor", Some(("specularIor", ValueType::Vector3f))),
    ("specularExtinctionCoeff", Some(("specularExtinctionCoeff", ValueType::Vector3f))),
    ("specularRoughness", Some(("specularRoughness", ValueType::Float))),
    ("specularModelType", Some(("specularModelType", ValueType::Int))),
    ("specularAnisotropy", Some(("specularAnisotropy", ValueType::Float))),
    ("specularAnisotropyDirection", Some(("specularAnisotropyDirection", ValueType::Vector3f))),
    ("specularDoubleSided", Some(("specularDoubleSided", ValueType::Int))),
    ("roughSpecularFresnelMode", Some(("roughSpecularFresnelMode", ValueType::Int))),
    ("roughSpecularFaceColor", Some(("roughSpecularFaceColor", ValueType::Vector3f))),
    ("roughSpecularEdgeColor", Some(("roughSpecularEdgeColor", ValueType::Vector3f))),
    ("roughSpecularFresnelShape", Some(("roughSpecularFresnelShape", ValueType::Float))),
    ("roughSpecularIor", Some(("roughSpecularIor", ValueType::Vector3f))),
    ("roughSpecularExtinctionCoeff", Some(("roughSpecularExtinctionCoeff", ValueType::Vector3f))),
    ("roughSpecularRoughness", Some(("roughSpecularRoughness", ValueType::Float))),
    ("roughSpecularModelType", Some(("roughSpecularModelType", ValueType::Int))),
    ("roughSpecularAnisotropy", Some(("roughSpecularAnisotropy", ValueType::Float))),
    ("roughSpecularAnisotropyDirection", Some(("roughSpecularAnisotropyDirection", ValueType::Vector3f))),
    ("roughSpecularDoubleSided", Some(("roughSpecularDoubleSided", ValueType::Int))),
    ("clearcoatFresnelMode", Some(("clearcoatFresnelMode", ValueType::Int))),
    ("clearcoatFaceColor", Some(("clearcoatFaceColor", ValueType::Vector3f))),
    ("clearcoatEdgeColor", Some(("clearcoatEdgeColor", ValueType::Vector3f))),
    ("clearcoatFresnelShape", Some(("clearcoatFresnelShape", ValueType::Float))),
    ("clearcoatIor", Some(("clearcoatIor", ValueType::Vector3f))),
    ("clearcoatExtinctionCoeff", Some(("clearcoatExtinctionCoeff", ValueType::Vector3f))),
    ("clearcoatThickness", Some(("clearcoatThickness", ValueType::Float))),
    ("clearcoatAbsorptionTint", Some(("clearcoatAbsorptionTint", ValueType::Vector3f))),
    ("clearcoatRoughness", Some(("clearcoatRoughness", ValueType::Float))),
    ("clearcoatModelType", Some(("clearcoatModelType", ValueType::Int))),
    ("clearcoatAnisotropy", Some(("clearcoatAnisotropy", ValueType::Float))),
    ("clearcoatAnisotropyDirection", Some(("clearcoatAnisotropyDirection", ValueType::Vector3f))),
    ("clearcoatDoubleSided", Some(("clearcoatDoubleSided", ValueType::Int))),
    ("specularEnergyCompensation", Some(("specularEnergyCompensation", ValueType::Float))),
    ("clearcoatEnergyCompensation", Some(("clearcoatEnergyCompensation", ValueType::Float))),
    ("iridescenceFaceGain", Some(("iridescenceFaceGain", ValueType::Float))),
    ("iridescenceEdgeGain", Some(("iridescenceEdgeGain", ValueType::Float))),
    ("iridescenceFresnelShape", Some(("iridescenceFresnelShape", ValueType::Float))),
    ("iridescenceMode", Some(("iridescenceMode", ValueType::Int))),
    ("iridescencePrimaryColor", Some(("iridescencePrimaryColor", ValueType::Vector3f))),
    ("iridescenceSecondaryColor", Some(("iridescenceSecondaryColor", ValueType::Vector3f))),
    ("iridescenceRoughness", Some(("iridescenceRoughness", ValueType::Float))),
    ("iridescenceAnisotropy", Some(("iridescenceAnisotropy", ValueType::Float))),
    ("iridescenceAnisotropyDirection", Some(("iridescenceAnisotropyDirection", ValueType::Vector3f))),
    ("iridescenceCurve", Some(("iridescenceCurve", ValueType::Float))),
    ("iridescenceScale", Some(("iridescenceScale", ValueType::Float))),
    ("iridescenceFlip", Some(("iridescenceFlip", ValueType::Int))),
    ("iridescenceThickness", Some(("iridescenceThickness", ValueType::Float))),
    ("iridescenceDoubleSided", Some(("iridescenceDoubleSided", ValueType::Int))),
    ("fuzzGain", Some(("fuzzGain", ValueType::Float))),
    ("fuzzColor", Some(("fuzzColor", ValueType::Vector3f))),
    ("fuzzConeAngle", Some(("fuzzConeAngle", ValueType::Float))),
    ("fuzzDoubleSided", Some(("fuzzDoubleSided", ValueType::Int))),
    ("subsurfaceType", Some(("subsurfaceType", ValueType::Int))),
    ("subsurfaceGain", Some(("subsurfaceGain", ValueType::Float))),
    ("subsurfaceColor", Some(("subsurfaceColor", ValueType::Vector3f))),
    ("subsurfaceDmfp", Some(("subsurfaceDmfp", ValueType::Float))),
    ("subsurfaceDmfpColor", Some(("subsurfaceDmfpColor", ValueType::Vector3f))),
    ("shortSubsurfaceGain", Some(("shortSubsurfaceGain", ValueType::Float))),
    ("shortSubsurfaceColor", Some(("shortSubsurfaceColor", ValueType::Vector3f))),
    ("shortSubsurfaceDmfp", Some(("shortSubsurfaceDmfp", ValueType::Float))),
    ("longSubsurfaceGain", Some(("longSubsurfaceGain", ValueType::Float))),
    ("longSubsurfaceColor", Some(("longSubsurfaceColor", ValueType::Vector3f))),
    ("longSubsurfaceDmfp", Some(("longSubsurfaceDmfp", ValueType::Float))),
    ("subsurfaceDirectionality", Some(("subsurfaceDirectionality", ValueType::Float))),
    ("subsurfaceBleed", Some(("subsurfaceBleed", ValueType::Float))),
    ("subsurfaceDiffuseBlend", Some(("subsurfaceDiffuseBlend", ValueType::Float))),
    ("subsurfaceResolveSelfIntersections", Some(("subsurfaceResolveSelfIntersections", ValueType::Int))),
    ("subsurfaceIor", Some(("subsurfaceIor", ValueType::Float))),
    ("subsurfacePostTint", Some(("subsurfacePostTint", ValueType::Vector3f))),
    ("subsurfaceDiffuseSwitch", Some(("subsurfaceDiffuseSwitch", ValueType::Float))),
    ("subsurfaceDoubleSided", Some(("subsurfaceDoubleSided", ValueType::Int))),
    ("subsurfaceTransmitGain", Some(("subsurfaceTransmitGain", ValueType::Float))),
    ("singlescatterGain", Some(("singlescatterGain", ValueType::Float))),
    ("singlescatterColor", Some(("singlescatterColor", ValueType::Vector3f))),
    ("singlescatterMfp", Some(("singlescatterMfp", ValueType::Float))),
    ("singlescatterMfpColor", Some(("singlescatterMfpColor", ValueType::Vector3f))),
    ("singlescatterDirectionality", Some(("singlescatterDirectionality", ValueType::Float))),
    ("singlescatterIor", Some(("singlescatterIor", ValueType::Float))),
    ("singlescatterBlur", Some(("singlescatterBlur", ValueType::Float))),
    ("singlescatterDirectGain", Some(("singlescatterDirectGain", ValueType::Float))),
    ("singlescatterDirectGainTint", Some(("singlescatterDirectGainTint", ValueType::Vector3f))),
    ("singlescatterDoubleSided", Some(("singlescatterDoubleSided", ValueType::Int))),
    ("singlescatterConsiderBackside", Some(("singlescatterConsiderBackside", ValueType::Int))),
    ("singlescatterContinuationRayMode", Some(("singlescatterContinuationRayMode", ValueType::Int))),
    ("singlescatterMaxContinuationHits", Some(("singlescatterMaxContinuationHits", ValueType::Int))),
    ("singlescatterDirectGainMode", Some(("singlescatterDirectGainMode", ValueType::Int))),
    ("singlescatterSubset", Some(("singlescatterSubset", ValueType::String))),
    ("irradianceTint", Some(("irradianceTint", ValueType::Vector3f))),
    ("irradianceRoughness", Some(("irradianceRoughness", ValueType::Float))),
    ("refractionGain", Some(("refractionGain", ValueType::Float))),
    ("reflectionGain", Some(("reflectionGain", ValueType::Float))),
    ("refractionColor", Some(("refractionColor", ValueType::Vector3f))),
    ("glassRoughness", Some(("glassRoughness", ValueType::Float))),
    ("glassRefractionRoughness", Some(("glassRefractionRoughness", ValueType::Float))),
    ("glassAnisotropy", Some(("glassAnisotropy", ValueType::Float))),
    ("glassAnisotropyDirection", Some(("glassAnisotropyDirection", ValueType::Vector3f))),
    ("glassIor", Some(("glassIor", ValueType::Float))),
    ("ssAlbedo", Some(("ssAlbedo", ValueType::Vector3f))),
    ("extinction", Some(("extinction", ValueType::Vector3f))),
    ("glowGain", Some(("glowGain", ValueType::Float))),
    ("glowColor", Some(("glowColor", ValueType::Vector3f))),
    ("shadowColor", Some(("shadowColor", ValueType::Vector3f))),
    ("presence", Some(("presence", ValueType::Float))),
    ("Bump", Some(("bumpNormal", ValueType::Normal3f))),
    ("Normal", Some(("bumpNormal", ValueType::Normal3f))),
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
        Some(RENDER_CONTEXT),
        Some(callbacks),
    )
}

fn settings_panel() -> Vec<SettingField> {
    vec![post_process_field(SETTINGS_GROUP, DEFAULT_POST_PROCESS)]
}

/// Apply the default `.tex` conversion unless the user customized the
/// item's command since the default was last applied.
fn on_export_item_created(item: &mut ExportItem, prefs: &Preferences) {
    let command = post_process_field(SETTINGS_GROUP, DEFAULT_POST_PROCESS).value(prefs);
    let customized = match item.metadata.get(PREVIOUS_DEFAULT_KEY) {
        Some(previous) => previous != item.post_process_command,
        None => false,
    };
    if !customized {
        item.post_process_command = command.clone();
        set_post_processed_extension(item, "tex");
    }
    item.metadata.set(PREVIOUS_DEFAULT_KEY, command);
}

/// Output of a `PxrTexture` for a target type.
pub(crate) fn result_output(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Float => "resultR",
        ValueType::Normal3f => "resultN",
        _ => "resultRGB",
    }
}

/// Feed `texture` from a `PxrManifold2D` when a non-default UV set is used.
pub(crate) fn connect_manifold(ctx: &mut WriteContext<'_>, texture: &SdfPath, input: &str) -> Result<()> {
    let source = ctx.source;
    let uv_set = source.uv_set_name();
    if uv_set == DEFAULT_UV_SET {
        return Ok(());
    }
    let manifold = ctx.node_path(&format!("{}TextureManifold", sanitize_name(input)))?;
    ctx.stage.define_shader(&manifold, Some(MANIFOLD_ID))?;
    ctx.stage
        .set_input(&manifold, "name_uvSet", Value::String(uv_set.to_string()))?;
    ctx.stage
        .connect_input(texture, "manifold", ValueType::Token, &manifold, "result")
}

/// Texture plus `PxrBumpMixer` for the bump input. Returns the mixer.
fn write_bump(ctx: &mut WriteContext<'_>, texture: &SdfPath) -> Result<SdfPath> {
    let mixer = ctx.node_path("BumpMixer")?;
    ctx.stage.define_shader(&mixer, Some(BUMP_MIXER_ID))?;
    let source = ctx.source;
    if let Some(weight) = source
        .shader()
        .parameter(BUMP_WEIGHT)
        .and_then(|w| value_as_shader_parameter(w, ValueType::Float))
    {
        ctx.stage.set_input(&mixer, "amount1", weight)?;
    }
    ctx.stage
        .connect_input(&mixer, "surfaceGradient1", ValueType::Vector3f, texture, "resultNG")?;
    Ok(mixer)
}

#[instrument(skip_all, fields(shader = %ctx.shader_path))]
pub fn write_network(ctx: &mut WriteContext<'_>) -> Result<()> {
    let mut items = Vec::new();
    let mut bump_mixer = None;
    let mut normal_map = None;

    for input in ctx.model_inputs() {
        let Some((target, ty)) = mapped_input(INPUTS, &input) else {
            continue;
        };
        let Some(item) = ctx.enabled_export_item(&input) else {
            ctx.write_literal(&input, target, ty)?;
            continue;
        };

        let texture = ctx.texture_node_path(&input)?;
        if ty == ValueType::Normal3f {
            match input.as_str() {
                BUMP_INPUT => {
                    define_sampler(ctx, &texture, TEXTURE_ID, "filename", item)?;
                    bump_mixer = Some(write_bump(ctx, &texture)?);
                }
                NORMAL_INPUT => {
                    define_sampler(ctx, &texture, NORMAL_MAP_ID, "filename", item)?;
                    normal_map = Some(texture.clone());
                }
                _ => {
                    warn!("Unsupported normal input '{}' on {}", input, ctx.shader_path);
                    continue;
                }
            }
        } else {
            define_sampler(ctx, &texture, TEXTURE_ID, "filename", item)?;
            ctx.stage
                .connect_input(&ctx.shader_path, target, ty, &texture, result_output(ty))?;
        }
        connect_manifold(ctx, &texture, &input)?;
        items.push(item);
    }

    let shader = ctx.shader_path.clone();
    match (bump_mixer, normal_map) {
        (Some(mixer), Some(normal)) => {
            ctx.stage
                .connect_input(&shader, BUMP_NORMAL, ValueType::Normal3f, &normal, "resultN")?;
            ctx.stage
                .connect_input(&normal, "bumpOverlay", ValueType::Normal3f, &mixer, "resultN")?;
        }
        (Some(only), None) | (None, Some(only)) => {
            ctx.stage
                .connect_input(&shader, BUMP_NORMAL, ValueType::Normal3f, &only, "resultN")?;
        }
        (None, None) => {}
    }

    ctx.bake(&items)?;
    Ok(())
}
