//! Export item resolution.
//!
//! Every (material, shader, input) triple owns a hidden export item per
//! image node it has been wired to in the host project. The association is recorded in the item's metadata,
//! so an index rebuilt from the project finds the same items on the next
//! export.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::registry::{Hook, Registry};
use super::source::UsdShaderSource;
use super::walker::exportable_inputs;
use crate::host::{
    BitDepth, ExportItem, ExportItemId, ExportItemStore, Host, ImageNode, MaterialId, ShaderId,
    ShadingGraph, SourceShader, UDIM_TOKEN,
};
use crate::settings::Preferences;
use crate::util::{sanitize_name, MetaData};

/// Formats that only store 8 bits per channel.
const BYTE_ONLY_FORMATS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp"];

/// Format used when the preferred one cannot hold the node's depth.
const HIGH_DEPTH_FORMAT: &str = "exr";

/// Identity of an exporter-owned item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationKey {
    pub material: MaterialId,
    pub shader: ShaderId,
    pub input: String,
}

impl CorrelationKey {
    pub fn new(material: MaterialId, shader: ShaderId, input: &str) -> Self {
        Self {
            material,
            shader,
            input: input.to_string(),
        }
    }

    /// Read the key back from item metadata.
    pub fn from_metadata(metadata: &MetaData) -> Option<Self> {
        Some(Self {
            material: metadata.get(MetaData::MATERIAL_KEY)?.parse().ok()?,
            shader: metadata.get(MetaData::SHADER_KEY)?.parse().ok()?,
            input: metadata.stream()?.to_string(),
        })
    }

    /// Record the key plus the hidden marker on `metadata`.
    pub fn tag(&self, metadata: &mut MetaData) {
        metadata.set_hidden(true);
        metadata.set(MetaData::STREAM_KEY, self.input.as_str());
        metadata.set(MetaData::SHADER_KEY, self.shader.to_string());
        metadata.set(MetaData::MATERIAL_KEY, self.material.to_string());
    }
}

/// Correlation key -> export items, oldest first.
///
/// A key can own several items when an input was rewired to a different
/// image node; each keeps its own source.
#[derive(Clone, Debug, Default)]
pub struct ExportItemIndex {
    entries: HashMap<CorrelationKey, Vec<ExportItemId>>,
}

impl ExportItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every hidden, fully tagged item of `store`.
    pub fn scan<S: ExportItemStore + ?Sized>(store: &S) -> Self {
        let mut index = Self::new();
        for id in store.export_item_ids() {
            let Some(item) = store.export_item(id) else {
                continue;
            };
            if !item.metadata.is_hidden() {
                continue;
            }
            if let Some(key) = CorrelationKey::from_metadata(&item.metadata) {
                index.insert(key, id);
            }
        }
        debug!("Indexed {} exporter-owned export items", index.len());
        index
    }

    /// Items indexed under `key`.
    pub fn get(&self, key: &CorrelationKey) -> &[ExportItemId] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, key: CorrelationKey, id: ExportItemId) {
        let ids = self.entries.entry(key).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds or creates the export item of each shader input.
pub struct ExportItemResolver<'a> {
    host: &'a mut dyn Host,
    registry: &'a Registry,
    prefs: &'a Preferences,
    index: ExportItemIndex,
}

impl<'a> ExportItemResolver<'a> {
    /// Create a resolver, indexing the items already in the host project.
    pub fn new(host: &'a mut dyn Host, registry: &'a Registry, prefs: &'a Preferences) -> Self {
        let index = ExportItemIndex::scan(&*host);
        Self {
            host,
            registry,
            prefs,
            index,
        }
    }

    /// The host being resolved against.
    pub fn host(&self) -> &dyn Host {
        &*self.host
    }

    pub fn index(&self) -> &ExportItemIndex {
        &self.index
    }

    /// Export item for `input` of `shader` in `material`.
    ///
    /// An indexed item is reused only while it still bakes `image_node`,
    /// is hidden and carries the same correlation tags. Otherwise a new
    /// item is created, registered with the host and handed to the
    /// renderer's created hook.
    pub fn get_or_create(
        &mut self,
        material: MaterialId,
        shader: &SourceShader,
        image_node: ImageNode,
        input: &str,
    ) -> ExportItemId {
        let key = CorrelationKey::new(material, shader.id, input);
        if let Some(id) = self.reusable(&key, image_node) {
            return id;
        }

        let mut item = ExportItem::new(image_node.node_id(), self.default_template(shader, input, image_node));
        key.tag(&mut item.metadata);
        info!(
            "Creating export item '{}' for {}.{}",
            item.file_template, shader.name, input
        );
        let id = self.host.add_export_item(item);
        self.index.insert(key, id);

        if let Some(hook) = self
            .registry
            .export_item_hook(&shader.model.id, Hook::ExportItemCreated)
        {
            if let Some(item) = self.host.export_item_mut(id) {
                hook(item, self.prefs);
            }
        }
        id
    }

    /// Shader source with an export item for every input that reaches an
    /// image node.
    pub fn shader_source(
        &mut self,
        material: MaterialId,
        shader: &Arc<SourceShader>,
        uv_set: &str,
    ) -> UsdShaderSource {
        let mut source = UsdShaderSource::new(shader.clone());
        source.set_uv_set_name(uv_set);
        for (input, node) in exportable_inputs(&*self.host, shader) {
            let id = self.get_or_create(material, shader, node, &input);
            source.set_input_export_item(&input, id);
        }
        source
    }

    fn reusable(&self, key: &CorrelationKey, image_node: ImageNode) -> Option<ExportItemId> {
        self.index.get(key).iter().copied().find(|id| {
            self.host.export_item(*id).is_some_and(|item| {
                item.source_node == Some(image_node.node_id())
                    && item.metadata.is_hidden()
                    && CorrelationKey::from_metadata(&item.metadata).as_ref() == Some(key)
            })
        })
    }

    fn default_template(&self, shader: &SourceShader, input: &str, image_node: ImageNode) -> String {
        let preferred = self
            .prefs
            .default_texture_format
            .trim_start_matches('.')
            .to_ascii_lowercase();
        let depth = self.host.node_depth(image_node.node_id());
        let format = if depth != BitDepth::Byte && BYTE_ONLY_FORMATS.contains(&preferred.as_str()) {
            HIGH_DEPTH_FORMAT.to_string()
        } else {
            preferred
        };
        format!(
            "{}.{}.{}.{}",
            sanitize_name(&shader.name),
            sanitize_name(input),
            UDIM_TOKEN,
            format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryHost, NodeKind};
    use crate::host::{InputKind, ShaderModel};
    use glam::Vec4;
    use std::collections::BTreeMap;

    fn scene() -> (MemoryHost, Arc<SourceShader>, ImageNode) {
        let mut host = MemoryHost::new("chair");
        host.add_model(ShaderModel::new("M").with_input("Base Color", InputKind::Color, Vec4::ONE));
        let paint = host.add_node("paint", NodeKind::Channel, BitDepth::Half);
        let sid = host.add_shader("Shader 1", "M", BTreeMap::new()).unwrap();
        let shader = host.shader(sid).unwrap();
        host.connect(shader.node, "Base Color", paint);
        (host, shader, ImageNode::Channel(paint))
    }

    #[test]
    fn test_reuse_across_resolvers() {
        let (mut host, shader, node) = scene();
        let registry = Registry::new();
        let prefs = Preferences::default();
        let material = MaterialId::from_name("Metal01");

        let first = {
            let mut resolver = ExportItemResolver::new(&mut host, &registry, &prefs);
            resolver.get_or_create(material, &shader, node, "Base Color")
        };
        let second = {
            let mut resolver = ExportItemResolver::new(&mut host, &registry, &prefs);
            assert_eq!(resolver.index().len(), 1);
            resolver.get_or_create(material, &shader, node, "Base Color")
        };
        assert_eq!(first, second);
        assert_eq!(host.export_item_count(), 1);

        let item = host.export_item(first).unwrap();
        assert!(item.metadata.is_hidden());
        assert_eq!(item.metadata.stream(), Some("Base Color"));
        // half depth cannot go to png
        assert_eq!(item.file_template, "Shader_1.Base_Color.$UDIM.exr");
    }

    #[test]
    fn test_materials_do_not_share_items() {
        let (mut host, shader, node) = scene();
        let registry = Registry::new();
        let prefs = Preferences::default();
        let mut resolver = ExportItemResolver::new(&mut host, &registry, &prefs);
        let a = resolver.get_or_create(MaterialId::from_name("A"), &shader, node, "Base Color");
        let b = resolver.get_or_create(MaterialId::from_name("B"), &shader, node, "Base Color");
        assert_ne!(a, b);
    }

    #[test]
    fn test_rewired_source_creates_new_item() {
        let (mut host, shader, node) = scene();
        let other = host.add_node("other", NodeKind::BakePoint, BitDepth::Byte);
        let registry = Registry::new();
        let prefs = Preferences::default();
        let material = MaterialId::from_name("A");
        let mut resolver = ExportItemResolver::new(&mut host, &registry, &prefs);
        let a = resolver.get_or_create(material, &shader, node, "Base Color");
        let b = resolver.get_or_create(material, &shader, ImageNode::BakePoint(other), "Base Color");
        assert_ne!(a, b);
        drop(resolver);
        assert_eq!(host.export_item(b).unwrap().file_template, "Shader_1.Base_Color.$UDIM.png");
    }

    #[test]
    fn test_rewiring_back_reuses_first_item() {
        let (mut host, shader, node) = scene();
        let other = ImageNode::BakePoint(host.add_node("other", NodeKind::BakePoint, BitDepth::Byte));
        let registry = Registry::new();
        let prefs = Preferences::default();
        let material = MaterialId::from_name("A");

        let first = ExportItemResolver::new(&mut host, &registry, &prefs)
            .get_or_create(material, &shader, node, "Base Color");
        let rewired = ExportItemResolver::new(&mut host, &registry, &prefs)
            .get_or_create(material, &shader, other, "Base Color");
        let back = ExportItemResolver::new(&mut host, &registry, &prefs)
            .get_or_create(material, &shader, node, "Base Color");

        assert_ne!(first, rewired);
        assert_eq!(back, first);
        assert_eq!(host.export_item_count(), 2);
        assert_eq!(ExportItemIndex::scan(&host).len(), 2);
    }

    #[test]
    fn test_unhidden_item_is_not_reused() {
        let (mut host, shader, node) = scene();
        let registry = Registry::new();
        let prefs = Preferences::default();
        let material = MaterialId::from_name("A");
        let first = ExportItemResolver::new(&mut host, &registry, &prefs)
            .get_or_create(material, &shader, node, "Base Color");
        host.export_item_mut(first).unwrap().metadata.set_hidden(false);
        let second = ExportItemResolver::new(&mut host, &registry, &prefs)
            .get_or_create(material, &shader, node, "Base Color");
        assert_ne!(first, second);
    }

    #[test]
    fn test_shader_source_walks_inputs() {
        let (mut host, shader, _) = scene();
        let registry = Registry::new();
        let prefs = Preferences::default();
        let mut resolver = ExportItemResolver::new(&mut host, &registry, &prefs);
        let source = resolver.shader_source(MaterialId::from_name("A"), &shader, "uv2");
        assert_eq!(source.uv_set_name(), "uv2");
        assert!(source.input_export_item("Base Color").is_some());
        assert_eq!(source.input_export_items().len(), 1);
    }
}
