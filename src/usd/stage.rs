//! Stage: a single layer being authored.
//!
//! Reference: `pxr/usd/usd/stage.h` (`CreateNew`, `DefinePrim`,
//! `OverridePrim`, `SetDefaultPrim`, `Save`).

use std::path::{Path, PathBuf};

use tracing::debug;

use super::path::SdfPath;
use super::prim::{Prim, Specifier};
use super::usda::UsdaStream;
use crate::util::{ExportError, Result};

/// An editable stage backed by one usda layer.
#[derive(Clone, Debug)]
pub struct Stage {
    identifier: Option<PathBuf>,
    pseudo_root: Prim,
    default_prim: Option<String>,
    comment: Option<String>,
}

impl Stage {
    /// Create a stage for a new layer at `path`.
    ///
    /// Fails when a file already exists there; nothing is written until
    /// [`Stage::save`].
    pub fn create_new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ExportError::LayerExists(path.to_path_buf()));
        }
        let mut stage = Self::create_in_memory();
        stage.identifier = Some(path.to_path_buf());
        Ok(stage)
    }

    /// Create an anonymous stage.
    pub fn create_in_memory() -> Self {
        Self {
            identifier: None,
            pseudo_root: Prim::new("", Specifier::Def),
            default_prim: None,
            comment: None,
        }
    }

    /// Layer path, `None` for anonymous stages.
    pub fn identifier(&self) -> Option<&Path> {
        self.identifier.as_deref()
    }

    /// The pseudo root; its children are the root prims.
    pub fn pseudo_root(&self) -> &Prim {
        &self.pseudo_root
    }

    /// Look up a prim.
    pub fn prim(&self, path: &SdfPath) -> Option<&Prim> {
        let mut cur = &self.pseudo_root;
        for seg in path.segments() {
            cur = cur.child(seg)?;
        }
        Some(cur)
    }

    /// Look up a prim (mutable).
    pub fn prim_mut(&mut self, path: &SdfPath) -> Option<&mut Prim> {
        let mut cur = &mut self.pseudo_root;
        for seg in path.segments() {
            cur = cur.child_mut(seg)?;
        }
        Some(cur)
    }

    /// Look up a prim, failing when it does not exist.
    pub fn existing_prim_mut(&mut self, path: &SdfPath) -> Result<&mut Prim> {
        self.prim_mut(path)
            .ok_or_else(|| ExportError::PrimNotFound(path.to_string()))
    }

    /// Define a prim and any missing ancestors.
    ///
    /// Defining an existing prim keeps its contents; a non-empty `type_name`
    /// replaces the previous type.
    pub fn define_prim(&mut self, path: &SdfPath, type_name: &str) -> Result<&mut Prim> {
        let prim = self.author_spec(path, Specifier::Def)?;
        if !type_name.is_empty() {
            prim.type_name = type_name.to_string();
        }
        Ok(prim)
    }

    /// Get or create an `over` for `path`. Existing specs are left as they are.
    pub fn override_prim(&mut self, path: &SdfPath) -> Result<&mut Prim> {
        self.author_spec(path, Specifier::Over)
    }

    fn author_spec(&mut self, path: &SdfPath, specifier: Specifier) -> Result<&mut Prim> {
        if path.is_absolute_root() {
            return Err(ExportError::invalid_path(path.as_str(), "cannot author the absolute root"));
        }
        let mut cur = &mut self.pseudo_root;
        for seg in path.segments() {
            let idx = match cur.children.iter().position(|c| c.name == seg) {
                Some(idx) => idx,
                None => {
                    cur.children.push(Prim::new(seg, specifier));
                    cur.children.len() - 1
                }
            };
            cur = &mut cur.children[idx];
            if specifier == Specifier::Def {
                cur.specifier = Specifier::Def;
            }
        }
        Ok(cur)
    }

    /// Set the default prim.
    ///
    /// Only root prims can be the default prim, so a nested path selects its
    /// top-level ancestor.
    pub fn set_default_prim(&mut self, path: &SdfPath) -> Result<()> {
        if self.prim(path).is_none() {
            return Err(ExportError::PrimNotFound(path.to_string()));
        }
        self.default_prim = path.segments().next().map(str::to_string);
        Ok(())
    }

    /// Default prim name.
    pub fn default_prim(&self) -> Option<&str> {
        self.default_prim.as_deref()
    }

    /// Default prim spec.
    pub fn default_prim_spec(&self) -> Option<&Prim> {
        let name = self.default_prim.as_deref()?;
        self.pseudo_root.child(name)
    }

    /// Set the layer comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    /// Layer comment.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Paths of all prims, depth first.
    pub fn traverse(&self) -> Vec<SdfPath> {
        fn walk(prim: &Prim, parent: &SdfPath, out: &mut Vec<SdfPath>) {
            for child in &prim.children {
                if let Ok(path) = parent.append_child(&child.name) {
                    walk(child, &path, out);
                    out.push(path);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.pseudo_root, &SdfPath::absolute_root(), &mut out);
        out.sort();
        out
    }

    /// Serialize the layer as usda text.
    pub fn to_usda(&self) -> Result<String> {
        let mut stream = UsdaStream::new(Vec::new());
        stream.write_stage(self)?;
        let bytes = stream.finish()?;
        String::from_utf8(bytes).map_err(|e| ExportError::other(e.to_string()))
    }

    /// Write the layer to its identifier path.
    pub fn save(&self) -> Result<()> {
        let path = self
            .identifier
            .as_deref()
            .ok_or_else(|| ExportError::other("cannot save an anonymous stage"))?;
        self.export(path)
    }

    /// Write the layer to `path`.
    pub fn export(&self, path: &Path) -> Result<()> {
        let mut stream = UsdaStream::create(path)?;
        stream.write_stage(self)?;
        stream.finish()?;
        debug!("Saved layer {}", path.display());
        Ok(())
    }
}
