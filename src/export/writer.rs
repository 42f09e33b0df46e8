//! Shared state and helpers for renderer network writers.

use tracing::{debug, trace};

use super::params::UsdExportParameters;
use super::registry::{Hook, Registry};
use super::source::UsdShaderSource;
use super::values::{is_value_default, value_as_shader_parameter};
use crate::host::{
    BakeReport, ExportItemId, ExportItemStore, Host, ShadingGraph, TemplateVars, TextureBaker,
    UDIM_TOKEN,
};
use crate::settings::Preferences;
use crate::usd::{SdfPath, Stage, Value, ValueType};
use crate::util::{asset_path_string, sanitize_name, ExportError, Result};

/// Writes the USD shading network of one shader source.
pub type WriterFn = fn(&mut WriteContext<'_>) -> Result<()>;

/// Target of a source input on the USD shader; `None` marks an input the
/// renderer deliberately leaves out.
pub type InputMapping = Option<(&'static str, ValueType)>;

/// Source input name -> USD input mapping.
pub type InputMap = &'static [(&'static str, InputMapping)];

/// Look up `input` in `map`. Unknown and unmapped inputs yield `None`.
pub fn mapped_input(map: InputMap, input: &str) -> Option<(&'static str, ValueType)> {
    map.iter()
        .find(|(name, _)| *name == input)
        .and_then(|(_, target)| *target)
}

/// Everything a writer needs for one shader source.
pub struct WriteContext<'a> {
    pub stage: &'a mut Stage,
    /// Material prim the shader lives under.
    pub material_path: SdfPath,
    /// The USD shader prim.
    pub shader_path: SdfPath,
    pub params: &'a UsdExportParameters,
    pub source: &'a UsdShaderSource,
    pub host: &'a mut dyn Host,
    pub registry: &'a Registry,
    pub prefs: &'a Preferences,
    baked: usize,
}

impl<'a> WriteContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stage: &'a mut Stage,
        material_path: SdfPath,
        shader_path: SdfPath,
        params: &'a UsdExportParameters,
        source: &'a UsdShaderSource,
        host: &'a mut dyn Host,
        registry: &'a Registry,
        prefs: &'a Preferences,
    ) -> Self {
        Self {
            stage,
            material_path,
            shader_path,
            params,
            source,
            host,
            registry,
            prefs,
            baked: 0,
        }
    }

    /// Model input names in declared order.
    pub fn model_inputs(&self) -> Vec<String> {
        self.source
            .shader_model()
            .input_names()
            .map(str::to_string)
            .collect()
    }

    /// Prefix of helper nodes: the sanitized shader name.
    pub fn node_prefix(&self) -> &str {
        self.shader_path.name()
    }

    /// Path of a helper node `<prefix>_<suffix>` under the material.
    pub fn node_path(&self, suffix: &str) -> Result<SdfPath> {
        self.material_path
            .append_child(&format!("{}_{}", self.node_prefix(), suffix))
    }

    /// Path of the texture node feeding `input`.
    pub fn texture_node_path(&self, input: &str) -> Result<SdfPath> {
        self.node_path(&format!("{}Texture", sanitize_name(input)))
    }

    /// Export item bound to `input`, when it exists and is enabled.
    pub fn enabled_export_item(&self, input: &str) -> Option<ExportItemId> {
        let id = self.source.input_export_item(input)?;
        match self.host.export_item(id) {
            Some(item) if item.enabled => Some(id),
            Some(_) => {
                trace!("Export item for '{}' is disabled", input);
                None
            }
            None => None,
        }
    }

    /// Absolute texture path of an item, `$UDIM` replaced by `udim_token`.
    pub fn texture_file_path(&self, item: ExportItemId, udim_token: &str) -> Result<String> {
        let export_item = self
            .host
            .export_item(item)
            .ok_or_else(|| ExportError::ExportItemNotFound(item.to_string()))?;
        let template = export_item.reference_template();
        let root = self
            .params
            .export_root_path()
            .ok_or_else(|| ExportError::ExportRootUndefined(template.to_string()))?;

        let entity = self.host.entity_name();
        let node = export_item
            .source_node
            .and_then(|n| self.host.node_name(n))
            .unwrap_or_default();
        let vars = TemplateVars {
            entity: &entity,
            node: &node,
        };
        let resolved = export_item
            .resolve(template, &vars)
            .replace(UDIM_TOKEN, udim_token);
        Ok(asset_path_string(&root.join(resolved)))
    }

    /// Literal value of `input` converted to `ty`, unless it is the model
    /// default or the shader stores none.
    pub fn literal_value(&self, input: &str, ty: ValueType) -> Option<Value> {
        let shader = self.source.shader();
        let value = shader.parameter(input)?;
        let model_input = self.source.shader_model().input(input)?;
        if is_value_default(value, model_input) {
            return None;
        }
        value_as_shader_parameter(value, ty)
    }

    /// Author the literal value of `input` on `target`. Returns whether
    /// anything was written.
    pub fn write_literal(&mut self, input: &str, target: &str, ty: ValueType) -> Result<bool> {
        match self.literal_value(input, ty) {
            Some(value) => {
                self.stage.set_input(&self.shader_path, target, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Bake `items` in one host call.
    ///
    /// The renderer's exported hook runs on each item first.
    pub fn bake(&mut self, items: &[ExportItemId]) -> Result<BakeReport> {
        if items.is_empty() {
            return Ok(BakeReport::default());
        }
        let hook = self
            .registry
            .export_item_hook(self.source.shader_model_id(), Hook::ExportItemExported);
        if let Some(hook) = hook {
            for id in items {
                if let Some(item) = self.host.export_item_mut(*id) {
                    hook(item, self.prefs);
                }
            }
        }
        let root = self
            .params
            .export_root_path()
            .ok_or_else(|| ExportError::ExportRootUndefined(self.node_prefix().to_string()))?;
        debug!(
            "Exporting {} export items for {} to {}",
            items.len(),
            self.source.shader().name,
            root.display()
        );
        let report = self
            .host
            .export_textures(items, root, self.params.export_overrides(), true)?;
        self.baked += items.len();
        Ok(report)
    }

    /// Number of items baked through this context.
    pub fn baked_count(&self) -> usize {
        self.baked
    }
}
