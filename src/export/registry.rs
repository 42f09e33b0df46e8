//! Renderer plugin registry.
//!
//! Maps a shader model id to the renderer plugin that knows how to write it:
//! the USD shader id, the material terminal, the network writer and optional
//! lifecycle hooks. The registry is an ordinary value, filled once by
//! [`crate::renderers::register_builtin`] (or by hand) and passed to the
//! exporter.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::writer::WriterFn;
use crate::host::ExportItem;
use crate::settings::Preferences;
use crate::util::{sanitize_name, ExportError, Result};

/// Hook run on an export item, with access to user preferences.
pub type ExportItemHook = fn(&mut ExportItem, &Preferences);

/// Describes the renderer's settings fields.
pub type SettingsPanelFn = fn() -> Vec<SettingField>;

/// One user-editable renderer setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettingField {
    pub group: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub default: &'static str,
}

impl SettingField {
    /// Current value from preferences, or the default.
    pub fn value(&self, prefs: &Preferences) -> String {
        prefs
            .renderer_setting(self.group, self.key)
            .unwrap_or(self.default)
            .to_string()
    }
}

/// Lifecycle hooks a plugin may provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    SettingsPanel,
    ExportItemCreated,
    ExportItemExported,
}

/// Optional plugin callbacks.
#[derive(Clone, Copy, Default)]
pub struct RendererCallbacks {
    pub settings_panel: Option<SettingsPanelFn>,
    /// Runs once when the exporter creates an item for this renderer.
    pub on_export_item_created: Option<ExportItemHook>,
    /// Runs on every item right before it is baked.
    pub on_export_item_exported: Option<ExportItemHook>,
}

impl RendererCallbacks {
    pub fn has(&self, hook: Hook) -> bool {
        match hook {
            Hook::SettingsPanel => self.settings_panel.is_some(),
            Hook::ExportItemCreated => self.on_export_item_created.is_some(),
            Hook::ExportItemExported => self.on_export_item_exported.is_some(),
        }
    }
}

impl fmt::Debug for RendererCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererCallbacks")
            .field("settings_panel", &self.settings_panel.is_some())
            .field("on_export_item_created", &self.on_export_item_created.is_some())
            .field("on_export_item_exported", &self.on_export_item_exported.is_some())
            .finish()
    }
}

/// Material output the shader connects to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terminal {
    /// Render context of the material surface output, `None` for universal.
    pub render_context: Option<String>,
    /// Shader output name.
    pub name: String,
}

/// A registered renderer.
#[derive(Clone)]
pub struct RendererPlugin {
    pub shader_model_id: String,
    pub usd_shader_id: String,
    pub writer: WriterFn,
    pub terminal: Terminal,
    pub callbacks: RendererCallbacks,
}

impl fmt::Debug for RendererPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererPlugin")
            .field("shader_model_id", &self.shader_model_id)
            .field("usd_shader_id", &self.usd_shader_id)
            .field("terminal", &self.terminal)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Shader model id -> renderer plugin.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    plugins: HashMap<String, RendererPlugin>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer plugin for a shader model.
    ///
    /// The terminal name is sanitized into an identifier. Registering the
    /// same shader model again replaces the earlier plugin.
    pub fn register(
        &mut self,
        shader_model_id: &str,
        usd_shader_id: &str,
        writer: WriterFn,
        terminal_name: &str,
        surface_context: Option<&str>,
        callbacks: Option<RendererCallbacks>,
    ) -> Result<()> {
        if shader_model_id.is_empty() {
            return Err(ExportError::InvalidPluginRegistration(
                "shader model id is empty".into(),
            ));
        }
        if usd_shader_id.is_empty() {
            return Err(ExportError::InvalidPluginRegistration(format!(
                "USD shader id for '{}' is empty",
                shader_model_id
            )));
        }
        let terminal = sanitize_name(terminal_name);
        if terminal.is_empty() {
            return Err(ExportError::InvalidPluginRegistration(format!(
                "terminal name for '{}' is empty",
                shader_model_id
            )));
        }
        let render_context = surface_context
            .filter(|c| !c.is_empty())
            .map(sanitize_name);

        let plugin = RendererPlugin {
            shader_model_id: shader_model_id.to_string(),
            usd_shader_id: usd_shader_id.to_string(),
            writer,
            terminal: Terminal {
                render_context,
                name: terminal,
            },
            callbacks: callbacks.unwrap_or_default(),
        };
        if self.plugins.insert(shader_model_id.to_string(), plugin).is_some() {
            debug!("Replaced renderer plugin for '{}'", shader_model_id);
        } else {
            debug!("Registered renderer plugin for '{}'", shader_model_id);
        }
        Ok(())
    }

    pub fn plugin(&self, shader_model_id: &str) -> Option<&RendererPlugin> {
        self.plugins.get(shader_model_id)
    }

    pub fn contains(&self, shader_model_id: &str) -> bool {
        self.plugins.contains_key(shader_model_id)
    }

    pub fn writer_for(&self, shader_model_id: &str) -> Option<WriterFn> {
        self.plugins.get(shader_model_id).map(|p| p.writer)
    }

    pub fn usd_type_for(&self, shader_model_id: &str) -> Option<&str> {
        self.plugins
            .get(shader_model_id)
            .map(|p| p.usd_shader_id.as_str())
    }

    pub fn terminal_for(&self, shader_model_id: &str) -> Option<&Terminal> {
        self.plugins.get(shader_model_id).map(|p| &p.terminal)
    }

    /// Shader model ids whose plugin provides `hook`, sorted.
    pub fn callbacks_with_hook(&self, hook: Hook) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .plugins
            .values()
            .filter(|p| p.callbacks.has(hook))
            .map(|p| p.shader_model_id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Export item hook of a plugin. `Hook::SettingsPanel` never matches.
    pub fn export_item_hook(&self, shader_model_id: &str, hook: Hook) -> Option<ExportItemHook> {
        let callbacks = &self.plugins.get(shader_model_id)?.callbacks;
        match hook {
            Hook::ExportItemCreated => callbacks.on_export_item_created,
            Hook::ExportItemExported => callbacks.on_export_item_exported,
            Hook::SettingsPanel => None,
        }
    }

    pub fn settings_panel(&self, shader_model_id: &str) -> Option<SettingsPanelFn> {
        self.plugins.get(shader_model_id)?.callbacks.settings_panel
    }

    /// All registered shader model ids, sorted.
    pub fn shader_model_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::WriteContext;

    fn noop(_: &mut WriteContext<'_>) -> Result<()> {
        Ok(())
    }

    fn other(_: &mut WriteContext<'_>) -> Result<()> {
        Err(ExportError::other("second"))
    }

    fn mark(item: &mut ExportItem, _: &Preferences) {
        item.post_process_command = "marked".into();
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = Registry::new();
        reg.register("Model A", "ShaderA", noop, "out put", Some("ri"), None).unwrap();
        assert_eq!(reg.usd_type_for("Model A"), Some("ShaderA"));
        let terminal = reg.terminal_for("Model A").unwrap();
        assert_eq!(terminal.name, "out_put");
        assert_eq!(terminal.render_context.as_deref(), Some("ri"));
        assert!(reg.writer_for("Model B").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut reg = Registry::new();
        reg.register("M", "First", noop, "out", None, None).unwrap();
        reg.register("M", "Second", other, "surface", Some(""), None).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.usd_type_for("M"), Some("Second"));
        assert_eq!(reg.terminal_for("M").unwrap().render_context, None);
    }

    #[test]
    fn test_invalid_registration() {
        let mut reg = Registry::new();
        assert!(reg.register("", "S", noop, "out", None, None).is_err());
        assert!(reg.register("M", "", noop, "out", None, None).is_err());
        let err = reg.register("M", "S", noop, "", None, None).unwrap_err();
        assert_eq!(err.title(), "Invalid Plugin Registration");
        assert!(reg.is_empty());
    }

    #[test]
    fn test_hooks() {
        let mut reg = Registry::new();
        let callbacks = RendererCallbacks {
            on_export_item_created: Some(mark),
            ..Default::default()
        };
        reg.register("B", "S", noop, "out", None, Some(callbacks)).unwrap();
        reg.register("A", "S", noop, "out", None, Some(callbacks)).unwrap();
        reg.register("C", "S", noop, "out", None, None).unwrap();

        assert_eq!(reg.callbacks_with_hook(Hook::ExportItemCreated), vec!["A", "B"]);
        assert!(reg.callbacks_with_hook(Hook::ExportItemExported).is_empty());

        let hook = reg.export_item_hook("A", Hook::ExportItemCreated).unwrap();
        let mut item = ExportItem::default();
        hook(&mut item, &Preferences::default());
        assert_eq!(item.post_process_command, "marked");
        assert!(reg.export_item_hook("C", Hook::ExportItemCreated).is_none());
    }
}
