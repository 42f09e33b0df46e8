//! Batch export jobs described in JSON.
//!
//! A job bundles a host scene, the material list and the export settings,
//! so the command line tool can run a complete export without a painting
//! application attached.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::look::{export_usd_shade_look, ExportReport};
use super::params::UsdExportParameters;
use super::registry::Registry;
use super::resolver::ExportItemResolver;
use super::source::{MaterialDefinition, UsdMaterialSource};
use crate::host::memory::{MemoryHost, SceneDescription};
use crate::host::{ExportOverrides, GeometryQuery, Host, ShadingGraph};
use crate::settings::Preferences;
use crate::util::{ExportError, Result};

/// Export destination and options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub export_root: Option<PathBuf>,
    pub look_file: Option<PathBuf>,
    pub assembly_file: Option<PathBuf>,
    pub payload_file: Option<PathBuf>,
    /// Stage root prim path; defaults to `/<root name>` from preferences.
    pub stage_root: Option<String>,
    pub overrides: ExportOverrides,
    /// UV set for materials that do not name one.
    pub uv_set: Option<String>,
}

/// A complete export job.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportJob {
    pub scene: SceneDescription,
    pub materials: Vec<MaterialDefinition>,
    pub export: ExportSettings,
}

impl ExportJob {
    /// Load a job file. A relative export root resolves against the job
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut job: Self = serde_json::from_str(&text)?;
        if let (Some(root), Some(dir)) = (&job.export.export_root, path.parent()) {
            if root.is_relative() {
                job.export.export_root = Some(dir.join(root));
            }
        }
        debug!("Loaded job {} with {} materials", path.display(), job.materials.len());
        Ok(job)
    }

    /// Validated export parameters.
    pub fn parameters(&self, prefs: &Preferences) -> Result<UsdExportParameters> {
        let settings = &self.export;
        let mut params = UsdExportParameters::new();
        if let Some(root) = &settings.export_root {
            params.set_export_root_path(root)?;
        }
        if let Some(look) = &settings.look_file {
            params.set_look_file_target_path(look)?;
        }
        if let Some(assembly) = &settings.assembly_file {
            params.set_assembly_target_path(assembly)?;
        }
        if let Some(payload) = &settings.payload_file {
            params.set_payload_source_path(payload)?;
        }
        let stage_root = match &settings.stage_root {
            Some(root) => root.clone(),
            None => format!("/{}", prefs.root_name),
        };
        params.set_stage_root_path(&stage_root)?;
        params.set_export_overrides(settings.overrides.clone());
        Ok(params)
    }

    /// Build the material sources of every enabled material, creating
    /// export items in `host` as needed.
    pub fn material_sources(
        &self,
        host: &mut dyn Host,
        registry: &Registry,
        prefs: &Preferences,
    ) -> Result<Vec<UsdMaterialSource>> {
        let mut resolver = ExportItemResolver::new(host, registry, prefs);
        let mut out = Vec::new();
        for def in self.materials.iter().filter(|d| d.enabled) {
            let mut material = UsdMaterialSource::new(&def.name);
            let uv_set = def
                .uv_set
                .as_deref()
                .or(self.export.uv_set.as_deref())
                .unwrap_or(&prefs.uv_set_name);

            for name in &def.shaders {
                let shader = resolver
                    .host()
                    .shader_by_name(name)
                    .ok_or_else(|| ExportError::NodeNotFound(name.clone()))?;
                let source = resolver.shader_source(material.id(), &shader, uv_set);
                material.set_shader_source(source);
            }
            for location in &def.locations {
                material.add_binding_location(location);
            }
            for group in &def.selection_groups {
                match resolver.host().selection_group_by_name(group) {
                    Some(g) => material.add_selection_group(g.id),
                    None => warn!("Selection group '{}' of {} not found", group, def.name),
                }
            }
            out.push(material);
        }
        Ok(out)
    }

    /// Run the job against an in-memory host built from the scene.
    pub fn run(&self, registry: &Registry, prefs: &Preferences) -> Result<(MemoryHost, ExportReport)> {
        let mut host = MemoryHost::from_scene(&self.scene)?;
        let params = self.parameters(prefs)?;
        let materials = self.material_sources(&mut host, registry, prefs)?;
        let report = export_usd_shade_look(registry, prefs, &mut host, &params, &materials)?;
        Ok((host, report))
    }
}
