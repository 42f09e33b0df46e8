//! Principled BRDF, written as a RenderMan `PxrDisney`.

use tracing::instrument;

use super::prman::{connect_manifold, result_output, NORMAL_MAP_ID, TEXTURE_ID};
use super::{define_sampler, post_process_field};
use crate::export::{mapped_input, InputMap, Registry, RendererCallbacks, SettingField, WriteContext};
use crate::host::ExportItem;
use crate::settings::Preferences;
use crate::usd::ValueType;
use crate::util::Result;

pub const SHADER_MODEL_ID: &str = "Principled BRDF";
pub const USD_SHADER_ID: &str = "PxrDisney";
pub const TERMINAL: &str = "out";
pub const SETTINGS_GROUP: &str = "PrincipledBRDFUSDExportSettings";
pub const DEFAULT_POST_PROCESS: &str = "txmake $EXPORTED $EXPORTDIR/$EXPORTBASE.tx";

const INPUTS: InputMap = &[
    ("BaseColor", Some(("baseColor", ValueType::Color3f))),
    ("EmissiveColor", Some(("emitColor", ValueType::Color3f))),
    ("subsurface", Some(("subsurface", ValueType::Float))),
    ("metallic", Some(("metallic", ValueType::Float))),
    ("specular", Some(("specular", ValueType::Float))),
    ("specularTint", Some(("specularTint", ValueType::Float))),
    ("roughness", Some(("roughness", ValueType::Float))),
    ("anisotropic", Some(("anisotropic", ValueType::Float))),
    ("sheen", Some(("sheen", ValueType::Float))),
    ("sheenTint", Some(("sheenTint", ValueType::Float))),
    ("clearcoat", Some(("clearcoat", ValueType::Float))),
    ("clearcoatGloss", Some(("clearcoatGloss", ValueType::Float))),
    ("Normal", Some(("bumpNormal", ValueType::Normal3f))),
    ("Bump", None),
    ("Vector", None),
    ("Displacement", None),
];

pub fn register(registry: &mut Registry) -> Result<()> {
    let callbacks = RendererCallbacks {
        settings_panel: Some(settings_panel),
        on_export_item_created: Some(apply_post_process),
        on_export_item_exported: Some(apply_post_process),
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

/// The command names its own output, so the referenced template stays as is.
fn apply_post_process(item: &mut ExportItem, prefs: &Preferences) {
    item.post_process_command = post_process_field(SETTINGS_GROUP, DEFAULT_POST_PROCESS).value(prefs);
}

#[instrument(skip_all, fields(shader = %ctx.shader_path))]
pub fn write_network(ctx: &mut WriteContext<'_>) -> Result<()> {
    let mut items = Vec::new();
    for input in ctx.model_inputs() {
        let Some((target, ty)) = mapped_input(INPUTS, &input) else {
            continue;
        };
        let Some(item) = ctx.enabled_export_item(&input) else {
            ctx.write_literal(&input, target, ty)?;
            continue;
        };
        let texture = ctx.texture_node_path(&input)?;
        let node_id = if ty == ValueType::Normal3f { NORMAL_MAP_ID } else { TEXTURE_ID };
        define_sampler(ctx, &texture, node_id, "filename", item)?;
        ctx.stage
            .connect_input(&ctx.shader_path, target, ty, &texture, result_output(ty))?;
        connect_manifold(ctx, &texture, &input)?;
        items.push(item);
    }
    ctx.bake(&items)?;
    Ok(())
}
