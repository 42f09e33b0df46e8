//! Built-in renderer plugins.
//!
//! | Shader model              | USD shader          | Terminal | Context  |
//! |---------------------------|---------------------|----------|----------|
//! | `USD Preview Surface`     | `UsdPreviewSurface` | surface  | glslfx   |
//! | `Arnold Standard Surface` | `standard_surface`  | out      | -        |
//! | `PxrSurface`              | `PxrSurface`        | out      | ri       |
//! | `Principled BRDF`         | `PxrDisney`         | out      | -        |

pub mod arnold;
pub mod preview;
pub mod principled;
pub mod prman;

use crate::export::{Registry, SettingField, WriteContext};
use crate::host::{ExportItem, ExportItemId};
use crate::usd::{SdfPath, Value};
use crate::util::Result;

/// UDIM token understood by the supported renderers.
pub const UDIM_TILE_TOKEN: &str = "<UDIM>";

/// Settings key of the default post-process command.
pub const POST_PROCESS_KEY: &str = "PostProcessCommand";

/// Register every built-in renderer.
pub fn register_builtin(registry: &mut Registry) -> Result<()> {
    preview::register(registry)?;
    arnold::register(registry)?;
    prman::register(registry)?;
    principled::register(registry)?;
    Ok(())
}

/// Define a texture reading node and point its file input at `item`.
pub(crate) fn define_sampler(
    ctx: &mut WriteContext<'_>,
    path: &SdfPath,
    shader_id: &str,
    file_input: &str,
    item: ExportItemId,
) -> Result<()> {
    let file = ctx.texture_file_path(item, UDIM_TILE_TOKEN)?;
    ctx.stage.define_shader(path, Some(shader_id))?;
    ctx.stage.set_input(path, file_input, Value::Asset(file))
}

/// Post-process settings field of a renderer group.
pub(crate) fn post_process_field(group: &'static str, default: &'static str) -> SettingField {
    SettingField {
        group,
        key: POST_PROCESS_KEY,
        label: "Default Post Process Command",
        default,
    }
}

/// Point the post-processed template at a converted copy with extension `ext`.
pub(crate) fn set_post_processed_extension(item: &mut ExportItem, ext: &str) {
    item.post_processed_file_template = ExportItem::template_with_extension(&item.file_template, ext);
}
