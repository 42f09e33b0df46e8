//! Export items: texture bake descriptors.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ids::NodeId;
use super::model::BitDepth;
use crate::util::MetaData;

/// Token in file templates replaced by the UDIM tile number.
pub const UDIM_TOKEN: &str = "$UDIM";

/// A texture bake job kept in the host project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportItem {
    pub source_node: Option<NodeId>,
    /// File name template, relative to the export root.
    pub file_template: String,
    pub resolution: Option<String>,
    pub depth: Option<BitDepth>,
    pub colorspace: Option<String>,
    pub enabled: bool,
    pub post_process_command: String,
    /// Template of the post-processed file; preferred over `file_template`
    /// when referencing the texture.
    pub post_processed_file_template: String,
    pub metadata: MetaData,
}

impl Default for ExportItem {
    fn default() -> Self {
        Self {
            source_node: None,
            file_template: String::new(),
            resolution: None,
            depth: None,
            colorspace: None,
            enabled: true,
            post_process_command: String::new(),
            post_processed_file_template: String::new(),
            metadata: MetaData::new(),
        }
    }
}

/// Values substituted into file templates.
#[derive(Clone, Debug, Default)]
pub struct TemplateVars<'a> {
    pub entity: &'a str,
    pub node: &'a str,
}

impl ExportItem {
    /// Create an item baking `source`.
    pub fn new(source: NodeId, file_template: impl Into<String>) -> Self {
        Self {
            source_node: Some(source),
            file_template: file_template.into(),
            ..Self::default()
        }
    }

    /// Template used when referencing the texture from a layer.
    pub fn reference_template(&self) -> &str {
        if self.post_processed_file_template.is_empty() {
            &self.file_template
        } else {
            &self.post_processed_file_template
        }
    }

    /// Expand `$ENTITY`, `$CHANNEL`, `$NODE` and `$STREAM` in `template`.
    /// `$UDIM` is kept for the caller.
    pub fn resolve(&self, template: &str, vars: &TemplateVars<'_>) -> String {
        template
            .replace("$ENTITY", vars.entity)
            .replace("$CHANNEL", vars.node)
            .replace("$NODE", vars.node)
            .replace("$STREAM", self.metadata.stream().unwrap_or(""))
    }

    /// Same template with its extension replaced.
    pub fn template_with_extension(template: &str, ext: &str) -> String {
        let path = Path::new(template);
        match path.extension() {
            Some(old) => {
                let cut = template.len() - old.len() - 1;
                format!("{}.{}", &template[..cut], ext)
            }
            None => format!("{}.{}", template, ext),
        }
    }
}

/// Overrides applied to every item at bake time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOverrides {
    pub resolution: Option<String>,
    pub depth: Option<BitDepth>,
}

impl ExportOverrides {
    pub const RESOLUTION_KEY: &'static str = "RESOLUTION";
    pub const DEPTH_KEY: &'static str = "DEPTH";

    pub fn is_empty(&self) -> bool {
        self.resolution.is_none() && self.depth.is_none()
    }

    /// Override map in the form the host bake call expects.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(res) = &self.resolution {
            map.insert(Self::RESOLUTION_KEY.to_string(), res.clone());
        }
        if let Some(depth) = self.depth {
            map.insert(Self::DEPTH_KEY.to_string(), depth.as_str().to_string());
        }
        map
    }
}
