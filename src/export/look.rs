//! Look and assembly export.
//!
//! Validates a batch of materials, writes one `Material` with its shader
//! networks per material into the look file, binds the materials and
//! optionally writes an assembly layer that pulls in the payload and the
//! look file.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::binding::bind_material_locations;
use super::params::UsdExportParameters;
use super::registry::Registry;
use super::source::{UsdMaterialSource, UsdShaderSource};
use super::writer::WriteContext;
use crate::host::Host;
use crate::settings::Preferences;
use crate::usd::{SdfPath, Stage};
use crate::util::{asset_path_string, relative_path, sanitize_name, ExportError, Result};

/// Export progress, logged as it advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportPhase {
    Validating,
    WritingLook,
    BindingMaterials,
    SavingLook,
    WritingAssembly,
    SavingAssembly,
    Done,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::WritingLook => "writing look",
            Self::BindingMaterials => "binding materials",
            Self::SavingLook => "saving look",
            Self::WritingAssembly => "writing assembly",
            Self::SavingAssembly => "saving assembly",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a finished export.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub look_file: PathBuf,
    pub assembly_file: Option<PathBuf>,
    pub materials: usize,
    pub shaders: usize,
    pub bindings: usize,
    pub baked_items: usize,
}

fn enter(phase: ExportPhase) {
    debug!("Export phase: {}", phase);
}

/// Export `materials` as a USD look file.
///
/// Nothing touches the filesystem until validation passes. After that there
/// is no rollback: a failure leaves whatever was written so far.
#[tracing::instrument(skip_all)]
pub fn export_usd_shade_look(
    registry: &Registry,
    prefs: &Preferences,
    host: &mut dyn Host,
    params: &UsdExportParameters,
    materials: &[UsdMaterialSource],
) -> Result<ExportReport> {
    enter(ExportPhase::Validating);
    let look_path = validate(registry, params, materials)?.to_path_buf();

    enter(ExportPhase::WritingLook);
    if look_path.exists() {
        fs::remove_file(&look_path)?;
    }
    let root = params.stage_root_path().clone();
    let mut stage = Stage::create_new(&look_path)?;
    begin_stage(&mut stage, &root)?;

    let mut report = ExportReport {
        look_file: look_path.clone(),
        ..ExportReport::default()
    };
    let mut material_paths = Vec::with_capacity(materials.len());
    for material in materials {
        let material_path = root.append_child(&sanitize_name(material.name()))?;
        stage.define_material(&material_path)?;
        for source in material.shader_sources() {
            report.baked_items +=
                write_shader(&mut stage, registry, prefs, &mut *host, params, &material_path, source)?;
            report.shaders += 1;
        }
        material_paths.push(material_path);
        report.materials += 1;
    }

    enter(ExportPhase::BindingMaterials);
    for (material, path) in materials.iter().zip(&material_paths) {
        report.bindings += bind_material_locations(&mut stage, &*host, material, path);
    }

    enter(ExportPhase::SavingLook);
    stage.save()?;
    info!(
        "Wrote {} materials to {}",
        report.materials,
        look_path.display()
    );

    if let Some(assembly_path) = params.assembly_target_path() {
        let payload = params
            .payload_source_path()
            .ok_or(ExportError::MissingPayloadFile)?;
        write_assembly(assembly_path, payload, &look_path, &root)?;
        report.assembly_file = Some(assembly_path.to_path_buf());
    }

    enter(ExportPhase::Done);
    Ok(report)
}

/// Check the batch before anything is written. Returns the look file path.
fn validate<'p>(
    registry: &Registry,
    params: &'p UsdExportParameters,
    materials: &[UsdMaterialSource],
) -> Result<&'p Path> {
    let look_path = params
        .look_file_target_path()
        .ok_or(ExportError::LookFileUndefined)?;

    let root = params.stage_root_path();
    let mut material_names = HashSet::new();
    for material in materials {
        let sanitized = sanitize_name(material.name());
        root.append_child(&sanitized)?;
        if !material_names.insert(sanitized.clone()) {
            return Err(ExportError::MaterialNameConflict {
                material: material.name().to_string(),
                sanitized,
            });
        }
    }

    let sources = || materials.iter().flat_map(|m| m.shader_sources());

    let mut shader_names = HashSet::new();
    for source in sources() {
        let shader = source.shader();
        let sanitized = sanitize_name(&shader.name);
        if !shader_names.insert(sanitized.clone()) {
            return Err(ExportError::ShaderNameConflict {
                shader: shader.name.clone(),
                sanitized,
            });
        }
    }

    for source in sources() {
        if !registry.contains(source.shader_model_id()) {
            return Err(ExportError::NoExporter {
                shader: source.shader().name.clone(),
                shader_model: source.shader_model_id().to_string(),
            });
        }
    }

    if params.assembly_target_path().is_some() && params.payload_source_path().is_none() {
        return Err(ExportError::MissingPayloadFile);
    }
    Ok(look_path)
}

/// Define the root prim, comment and default prim of a new layer.
fn begin_stage(stage: &mut Stage, root: &SdfPath) -> Result<()> {
    stage.set_comment(generated_comment()?);
    stage.define_prim(root, "")?;
    stage.set_default_prim(root)
}

fn generated_comment() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = now
        .format(format_description!(
            "[day]/[month repr:short]/[year] [hour]:[minute]:[second]"
        ))
        .map_err(|e| ExportError::other(e.to_string()))?;
    Ok(format!(
        "Generated by usdlook {} on {}",
        env!("CARGO_PKG_VERSION"),
        stamp
    ))
}

/// Define the shader prim, wire the material terminal and run the writer.
/// Returns the number of baked items.
fn write_shader(
    stage: &mut Stage,
    registry: &Registry,
    prefs: &Preferences,
    host: &mut dyn Host,
    params: &UsdExportParameters,
    material_path: &SdfPath,
    source: &UsdShaderSource,
) -> Result<usize> {
    let shader = source.shader();
    let plugin = registry
        .plugin(source.shader_model_id())
        .ok_or_else(|| ExportError::NoExporter {
            shader: shader.name.clone(),
            shader_model: source.shader_model_id().to_string(),
        })?;

    let shader_path = material_path.append_child(&sanitize_name(&shader.name))?;
    stage.define_shader(&shader_path, Some(&plugin.usd_shader_id))?;
    stage.connect_surface_output(
        material_path,
        plugin.terminal.render_context.as_deref(),
        &shader_path,
        &plugin.terminal.name,
    )?;

    debug!(
        "Writing {} network for {}",
        plugin.usd_shader_id, shader.name
    );
    let mut ctx = WriteContext::new(
        stage,
        material_path.clone(),
        shader_path,
        params,
        source,
        host,
        registry,
        prefs,
    );
    (plugin.writer)(&mut ctx)?;
    Ok(ctx.baked_count())
}

/// Asset path of `target` as seen from `base`, absolute when no relative
/// form exists.
fn arc_asset_path(target: &Path, base: &Path) -> String {
    match relative_path(target, base) {
        Some(rel) => asset_path_string(&rel),
        None => asset_path_string(target),
    }
}

fn write_assembly(assembly_path: &Path, payload: &Path, look_path: &Path, root: &SdfPath) -> Result<()> {
    enter(ExportPhase::WritingAssembly);
    if assembly_path.exists() {
        fs::remove_file(assembly_path)?;
    }
    let mut stage = Stage::create_new(assembly_path)?;
    begin_stage(&mut stage, root)?;

    let base = assembly_path.parent().unwrap_or_else(|| Path::new(""));
    let prim = stage.existing_prim_mut(root)?;
    prim.payloads.push(arc_asset_path(payload, base));
    prim.references.push(arc_asset_path(look_path, base));

    enter(ExportPhase::SavingAssembly);
    stage.save()?;
    info!("Wrote assembly {}", assembly_path.display());
    Ok(())
}
