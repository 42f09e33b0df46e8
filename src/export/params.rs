//! Validated export configuration.
//!
//! Every setter checks its input before storing it and reports whether the
//! stored value changed. A rejected value leaves the previous one in place.

use std::path::{Path, PathBuf};

use crate::host::ExportOverrides;
use crate::usd::SdfPath;
use crate::util::{normalize_path, ExportError, Result};

/// Root prim path used when none is configured.
pub const DEFAULT_STAGE_ROOT: &str = "/Root";

/// Export configuration shared by the orchestrator and the writers.
#[derive(Clone, Debug, PartialEq)]
pub struct UsdExportParameters {
    export_root_path: Option<PathBuf>,
    look_file_target_path: Option<PathBuf>,
    assembly_target_path: Option<PathBuf>,
    payload_source_path: Option<PathBuf>,
    stage_root_path: SdfPath,
    export_overrides: ExportOverrides,
}

impl Default for UsdExportParameters {
    fn default() -> Self {
        Self {
            export_root_path: None,
            look_file_target_path: None,
            assembly_target_path: None,
            payload_source_path: None,
            stage_root_path: SdfPath::parse(DEFAULT_STAGE_ROOT)
                .unwrap_or_else(|_| SdfPath::absolute_root()),
            export_overrides: ExportOverrides::default(),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl UsdExportParameters {
    pub fn new() -> Self {
        Self::default()
    }

    // === Getters ===

    /// Directory textures are baked into and relative files resolve against.
    pub fn export_root_path(&self) -> Option<&Path> {
        self.export_root_path.as_deref()
    }

    pub fn look_file_target_path(&self) -> Option<&Path> {
        self.look_file_target_path.as_deref()
    }

    pub fn assembly_target_path(&self) -> Option<&Path> {
        self.assembly_target_path.as_deref()
    }

    pub fn payload_source_path(&self) -> Option<&Path> {
        self.payload_source_path.as_deref()
    }

    pub fn stage_root_path(&self) -> &SdfPath {
        &self.stage_root_path
    }

    pub fn export_overrides(&self) -> &ExportOverrides {
        &self.export_overrides
    }

    // === Setters ===

    /// Set the export root. The directory must exist; an empty path clears it.
    pub fn set_export_root_path(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(replace(&mut self.export_root_path, None));
        }
        if !path.is_dir() {
            return Err(ExportError::ExportRootMissing(path.to_path_buf()));
        }
        Ok(replace(&mut self.export_root_path, Some(normalize_path(path))))
    }

    /// Set the look file. Relative names resolve against the export root.
    pub fn set_look_file_target_path(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let resolved = self.resolve_target(path.as_ref())?;
        Ok(replace(&mut self.look_file_target_path, resolved))
    }

    /// Set the assembly file. Relative names resolve against the export root.
    pub fn set_assembly_target_path(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let resolved = self.resolve_target(path.as_ref())?;
        Ok(replace(&mut self.assembly_target_path, resolved))
    }

    /// Set the payload referenced by the assembly. The file must exist.
    pub fn set_payload_source_path(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Ok(replace(&mut self.payload_source_path, None));
        }
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(ExportError::PayloadMissing(resolved));
        }
        Ok(replace(&mut self.payload_source_path, Some(resolved)))
    }

    /// Set the stage root prim path, e.g. `/Root`.
    pub fn set_stage_root_path(&mut self, path: &str) -> Result<bool> {
        if !path.starts_with('/') {
            return Err(ExportError::invalid_root(path, "the path must start with '/'"));
        }
        if path.ends_with('/') {
            return Err(ExportError::invalid_root(path, "the path must not end with '/'"));
        }
        let parsed = SdfPath::parse(path).map_err(|e| match e {
            ExportError::InvalidPrimPath { reason, .. } => ExportError::invalid_root(path, reason),
            other => other,
        })?;
        Ok(replace(&mut self.stage_root_path, parsed))
    }

    /// Set the bake overrides.
    pub fn set_export_overrides(&mut self, overrides: ExportOverrides) -> bool {
        replace(&mut self.export_overrides, overrides)
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(normalize_path(path));
        }
        let root = self
            .export_root_path
            .as_deref()
            .ok_or_else(|| ExportError::ExportRootUndefined(path.display().to_string()))?;
        Ok(normalize_path(&root.join(path)))
    }

    fn resolve_target(&self, path: &Path) -> Result<Option<PathBuf>> {
        if path.as_os_str().is_empty() {
            return Ok(None);
        }
        let resolved = self.resolve(path)?;
        let dir = resolved.parent().unwrap_or_else(|| Path::new("/"));
        if !dir.is_dir() {
            return Err(ExportError::TargetDirectoryMissing(dir.to_path_buf()));
        }
        Ok(Some(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_validation_keeps_old_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = UsdExportParameters::new();
        assert!(params.set_export_root_path(dir.path()).unwrap());
        assert!(!params.set_export_root_path(dir.path()).unwrap());

        let err = params.set_export_root_path("/nonexistent/usdlook/root").unwrap_err();
        assert_eq!(err.title(), "Export Root Path does not Exist");
        assert_eq!(params.export_root_path(), Some(normalize_path(dir.path()).as_path()));
    }

    #[test]
    fn test_bare_filename_needs_root() {
        let mut params = UsdExportParameters::new();
        let err = params.set_look_file_target_path("look.usda").unwrap_err();
        assert_eq!(err.title(), "Export Root Path Undefined");

        let dir = tempfile::tempdir().unwrap();
        params.set_export_root_path(dir.path()).unwrap();
        assert!(params.set_look_file_target_path("look.usda").unwrap());
        assert_eq!(
            params.look_file_target_path(),
            Some(normalize_path(&dir.path().join("look.usda")).as_path())
        );
    }

    #[test]
    fn test_target_directory_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = UsdExportParameters::new();
        params.set_export_root_path(dir.path()).unwrap();
        let err = params.set_assembly_target_path("missing/asm.usda").unwrap_err();
        assert_eq!(err.title(), "Target Directory does not Exist");
        assert!(params.assembly_target_path().is_none());
    }

    #[test]
    fn test_payload_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = UsdExportParameters::new();
        params.set_export_root_path(dir.path()).unwrap();
        let err = params.set_payload_source_path("geo.usd").unwrap_err();
        assert_eq!(err.title(), "Payload File does not Exist");

        std::fs::write(dir.path().join("geo.usd"), "#usda 1.0\n").unwrap();
        assert!(params.set_payload_source_path("geo.usd").unwrap());
        assert!(params.set_payload_source_path("").unwrap());
        assert!(params.payload_source_path().is_none());
    }

    #[test]
    fn test_stage_root_path() {
        let mut params = UsdExportParameters::new();
        assert_eq!(params.stage_root_path().as_str(), "/Root");
        assert!(!params.set_stage_root_path("/Root").unwrap());
        assert!(params.set_stage_root_path("/Asset/Looks").unwrap());
        for bad in ["Root", "/Root/", "/", "/Ro ot"] {
            let err = params.set_stage_root_path(bad).unwrap_err();
            assert_eq!(err.title(), "Invalid Stage Root Path");
        }
        assert_eq!(params.stage_root_path().as_str(), "/Asset/Looks");
    }
}
