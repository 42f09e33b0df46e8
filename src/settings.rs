//! Persistent user preferences and per-project metadata.
//!
//! Preferences live in `<config dir>/usdlook/settings.json`. Values saved
//! with a project take precedence over the preferences when both exist.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::export::MaterialDefinition;
use crate::util::Result;

/// Longest path history kept per field.
pub const MAX_PATH_HISTORY: usize = 10;

/// Root prim name used when nothing is configured.
pub const DEFAULT_ROOT_NAME: &str = "Root";

/// Project metadata key holding the material list.
pub const MATERIALS_KEY: &str = "_USDMultiShaderExport_Materials";

const ROOT_NAME_KEY: &str = "UsdRootName";

/// Path fields with a remembered history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathHistory {
    TargetDir,
    Texture,
    Look,
    Assembly,
    Payload,
}

impl PathHistory {
    /// Key used in preferences and project metadata.
    pub fn key(self) -> &'static str {
        match self {
            Self::TargetDir => "UsdTargetDirPaths",
            Self::Texture => "UsdTexturePaths",
            Self::Look => "UsdLookPaths",
            Self::Assembly => "UsdAssemblyPaths",
            Self::Payload => "UsdPayloadPaths",
        }
    }
}

/// User preferences that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    // Path histories, most recent first
    pub path_history: BTreeMap<String, Vec<String>>,

    // Stage
    pub root_name: String,
    pub uv_set_name: String,

    // Textures
    pub default_texture_format: String,

    // Renderer settings: group -> key -> value
    pub renderer_settings: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            path_history: BTreeMap::new(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            uv_set_name: "st".to_string(),
            default_texture_format: "png".to_string(),
            renderer_settings: BTreeMap::new(),
        }
    }
}

impl Preferences {
    /// Preferences file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("usdlook");
            p.push("settings.json");
            p
        })
    }

    /// Load preferences, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save preferences to the config directory
    pub fn save(&self) -> Result<()> {
        match Self::path() {
            Some(path) => self.save_to(&path),
            None => {
                warn!("No config directory, preferences not saved");
                Ok(())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    // === Renderer settings ===

    pub fn renderer_setting(&self, group: &str, key: &str) -> Option<&str> {
        self.renderer_settings
            .get(group)?
            .get(key)
            .map(String::as_str)
    }

    pub fn set_renderer_setting(&mut self, group: &str, key: &str, value: impl Into<String>) {
        self.renderer_settings
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Setting value, or `default` when unset.
    pub fn setting_or(&self, group: &str, key: &str, default: &str) -> String {
        self.renderer_setting(group, key).unwrap_or(default).to_string()
    }

    // === Path histories ===

    /// Path history of a field, the project's value first.
    ///
    /// An empty history, or an empty first entry, yields `default`.
    pub fn load_paths(
        &self,
        kind: PathHistory,
        project: Option<&ProjectMetadata>,
        default: &str,
    ) -> Vec<String> {
        let mut paths = self.path_history.get(kind.key()).cloned().unwrap_or_default();

        let project_path = project.and_then(|p| p.get(kind.key())).filter(|p| !p.is_empty());
        if let Some(project_path) = project_path {
            match paths.iter().position(|p| p == project_path) {
                Some(idx) => {
                    let p = paths.remove(idx);
                    paths.insert(0, p);
                }
                None => paths.insert(0, project_path.to_string()),
            }
        }

        if paths.is_empty() {
            paths.push(default.to_string());
        } else if paths[0].is_empty() {
            paths[0] = default.to_string();
        }
        paths
    }

    /// Remember a path history, capped at [`MAX_PATH_HISTORY`].
    ///
    /// The first value is also stored with the project when the project
    /// already tracks the field or the value is not empty.
    pub fn save_paths(&mut self, kind: PathHistory, values: &[String], project: Option<&mut ProjectMetadata>) {
        if let Some(project) = project {
            let first = values.first().map(String::as_str).unwrap_or("");
            if project.contains(kind.key()) || !first.is_empty() {
                project.set(kind.key(), first);
            }
        }
        self.path_history.insert(
            kind.key().to_string(),
            values.iter().take(MAX_PATH_HISTORY).cloned().collect(),
        );
    }

    /// Add one path to the front of a history.
    pub fn add_path(&mut self, kind: PathHistory, path: &str) {
        let paths = self.path_history.entry(kind.key().to_string()).or_default();
        paths.retain(|p| p != path);
        paths.insert(0, path.to_string());
        paths.truncate(MAX_PATH_HISTORY);
    }

    // === Root name ===

    /// Root prim name, the project's value first.
    pub fn load_root_name(&self, project: Option<&ProjectMetadata>) -> String {
        if let Some(name) = project.and_then(|p| p.get(ROOT_NAME_KEY)).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if self.root_name.is_empty() {
            DEFAULT_ROOT_NAME.to_string()
        } else {
            self.root_name.clone()
        }
    }

    pub fn save_root_name(&mut self, name: &str, project: Option<&mut ProjectMetadata>) {
        if let Some(project) = project {
            if project.contains(ROOT_NAME_KEY) || !name.is_empty() {
                project.set(ROOT_NAME_KEY, name);
            }
        }
        self.root_name = name.to_string();
    }
}

/// String metadata saved with a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectMetadata {
    values: BTreeMap<String, String>,
}

impl ProjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Saved material list; empty when none was saved.
    pub fn materials(&self) -> Result<Vec<MaterialDefinition>> {
        match self.get(MATERIALS_KEY) {
            Some(json) if !json.is_empty() => Ok(serde_json::from_str(json)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn set_materials(&mut self, materials: &[MaterialDefinition]) -> Result<()> {
        let json = serde_json::to_string(materials)?;
        self.set(MATERIALS_KEY, json);
        Ok(())
    }
}
