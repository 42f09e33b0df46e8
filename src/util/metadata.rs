//! Metadata attached to export items.
//!
//! Metadata is stored as key-value pairs of strings. The exporter uses it to
//! mark the items it creates on its own and to record which shader input an
//! item was made for, so the association survives a project reload.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Metadata storage - key-value pairs of strings.
///
/// Uses SmallVec optimization for common case of few entries.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct MetaData {
    entries: SmallVec<[(String, String); 4]>,
}

impl MetaData {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // === Common metadata keys ===

    /// Marks an item created automatically for a shader input.
    pub const HIDDEN_KEY: &'static str = "_HIDDEN";

    /// Name of the shader input the item bakes.
    pub const STREAM_KEY: &'static str = "_STREAM";

    /// Id of the shader the item was created for.
    pub const SHADER_KEY: &'static str = "_SHADER";

    /// Id of the material the item was created for.
    pub const MATERIAL_KEY: &'static str = "_MATERIAL";

    /// Whether the hidden marker is set to a truthy value.
    pub fn is_hidden(&self) -> bool {
        matches!(self.get(Self::HIDDEN_KEY), Some("True" | "true" | "1"))
    }

    /// Set the hidden marker.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.set(Self::HIDDEN_KEY, if hidden { "True" } else { "False" });
    }

    /// Get the stream (input) name.
    pub fn stream(&self) -> Option<&str> {
        self.get(Self::STREAM_KEY)
    }
}

impl From<BTreeMap<String, String>> for MetaData {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl From<MetaData> for BTreeMap<String, String> {
    fn from(md: MetaData) -> Self {
        md.entries.into_iter().collect()
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_replace() {
        let mut md = MetaData::new();
        md.set("a", "1");
        md.set("b", "2");
        md.set("a", "3");
        assert_eq!(md.len(), 2);
        assert_eq!(md.get("a"), Some("3"));
        assert_eq!(md.remove("b"), Some("2".to_string()));
        assert!(!md.contains("b"));
    }

    #[test]
    fn test_hidden_marker() {
        let mut md = MetaData::new();
        assert!(!md.is_hidden());
        md.set_hidden(true);
        assert!(md.is_hidden());
        md.set_hidden(false);
        assert!(!md.is_hidden());
    }

    #[test]
    fn test_json_form() {
        let mut md = MetaData::new();
        md.set(MetaData::STREAM_KEY, "diffuseColor");
        let json = serde_json::to_string(&md).unwrap();
        assert_eq!(json, r#"{"_STREAM":"diffuseColor"}"#);
        let back: MetaData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stream(), Some("diffuseColor"));
    }
}
