//! Error types for look export.
//!
//! Every error carries a short user-facing title, a message (its `Display`
//! form) and optional details, so a front end can present it directly.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for look export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A relative path was given before the export root was configured
    #[error("Cannot resolve '{0}' without an export root path")]
    ExportRootUndefined(String),

    /// The export root directory does not exist
    #[error("Export root path '{}' does not exist", .0.display())]
    ExportRootMissing(PathBuf),

    /// The directory a file would be written into does not exist
    #[error("Target directory '{}' does not exist", .0.display())]
    TargetDirectoryMissing(PathBuf),

    /// The payload file does not exist on disk
    #[error("Payload file '{}' does not exist", .0.display())]
    PayloadMissing(PathBuf),

    /// Stage root prim path is malformed
    #[error("Invalid stage root path '{path}': {reason}")]
    InvalidStageRoot { path: String, reason: String },

    /// No look file target was configured before export
    #[error("No look file has been specified")]
    LookFileUndefined,

    /// Two shaders sanitize to the same prim name
    #[error("Shader '{shader}' conflicts with another shader named '{sanitized}'")]
    ShaderNameConflict { shader: String, sanitized: String },

    /// Two materials sanitize to the same prim name
    #[error("Material '{material}' conflicts with another material named '{sanitized}'")]
    MaterialNameConflict { material: String, sanitized: String },

    /// Shader model has no registered exporter
    #[error("Shader '{shader}' of type '{shader_model}' has no USD exporter")]
    NoExporter { shader: String, shader_model: String },

    /// An assembly was requested without a payload
    #[error("An assembly file was requested but no payload file has been specified")]
    MissingPayloadFile,

    /// Renderer plugin registration rejected
    #[error("Invalid renderer plugin registration: {0}")]
    InvalidPluginRegistration(String),

    /// Texture bake reported a failure
    #[error("Texture export failed: {0}")]
    Bake(String),

    /// Export item id is not known to the host
    #[error("Export item not found: {0}")]
    ExportItemNotFound(String),

    /// Node or shader id is not known to the host
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Malformed scene graph path
    #[error("Invalid prim path '{path}': {reason}")]
    InvalidPrimPath { path: String, reason: String },

    /// Prim does not exist on the stage
    #[error("Prim not found: {0}")]
    PrimNotFound(String),

    /// Stage cannot be created because the layer already exists
    #[error("Layer '{}' already exists", .0.display())]
    LayerExists(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ExportError {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid prim path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPrimPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid stage root error.
    pub fn invalid_root(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStageRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Short title suitable for a dialog caption.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ExportRootUndefined(_) => "Export Root Path Undefined",
            Self::ExportRootMissing(_) => "Export Root Path does not Exist",
            Self::TargetDirectoryMissing(_) => "Target Directory does not Exist",
            Self::PayloadMissing(_) => "Payload File does not Exist",
            Self::InvalidStageRoot { .. } => "Invalid Stage Root Path",
            Self::LookFileUndefined => "Look File Undefined",
            Self::ShaderNameConflict { .. } => "Shader Name Conflict",
            Self::MaterialNameConflict { .. } => "Material Name Conflict",
            Self::NoExporter { .. } => "No Exporter for Shader Type",
            Self::MissingPayloadFile => "Missing Payload File",
            Self::InvalidPluginRegistration(_) => "Invalid Plugin Registration",
            Self::Bake(_) => "Texture Export Failed",
            Self::ExportItemNotFound(_) => "Export Item Not Found",
            Self::NodeNotFound(_) => "Node Not Found",
            Self::InvalidPrimPath { .. } => "Invalid Prim Path",
            Self::PrimNotFound(_) => "Prim Not Found",
            Self::LayerExists(_) => "Layer Already Exists",
            Self::Io(_) => "File Error",
            Self::Json(_) => "Data Error",
            Self::Other(_) => "Export Error",
        }
    }

    /// User-facing message, same as the `Display` form.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Extra guidance for the user, empty when there is nothing to add.
    pub fn details(&self) -> String {
        match self {
            Self::ExportRootUndefined(_) => {
                "Set the export root path before specifying relative file names.".into()
            }
            Self::ExportRootMissing(_) | Self::TargetDirectoryMissing(_) => {
                "Directories are never created by the exporter. Create it first.".into()
            }
            Self::InvalidStageRoot { .. } => {
                "The root path must start with '/' and must not end with '/', e.g. '/Root'.".into()
            }
            Self::ShaderNameConflict { .. } => {
                "Shader names must be unique within an export once characters other than letters, digits and underscores are replaced by underscores. Rename one of the shaders.".into()
            }
            Self::MaterialNameConflict { .. } => {
                "Material names must be unique within an export once characters other than letters, digits and underscores are replaced by underscores. Rename one of the materials.".into()
            }
            Self::NoExporter { .. } => {
                "Only shaders with a registered renderer exporter can be written to USD.".into()
            }
            Self::MissingPayloadFile => {
                "Specify a payload file to reference from the assembly.".into()
            }
            _ => String::new(),
        }
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ExportError::ShaderNameConflict {
            shader: "Metal 01".into(),
            sanitized: "Metal_01".into(),
        };
        assert_eq!(e.title(), "Shader Name Conflict");
        assert!(e.message().contains("Metal_01"));
        assert!(!e.details().is_empty());

        let e = ExportError::MaterialNameConflict {
            material: "Rust-Red".into(),
            sanitized: "Rust_Red".into(),
        };
        assert_eq!(e.title(), "Material Name Conflict");
        assert!(e.message().contains("Rust_Red"));

        let e = ExportError::MissingPayloadFile;
        assert_eq!(e.title(), "Missing Payload File");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(err.details().is_empty());
    }
}
