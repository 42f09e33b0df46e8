//! Absolute prim paths.
//!
//! Reference: `pxr/usd/sdf/path.h` (prim path subset only).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::{is_valid_identifier, ExportError, Result};

/// Absolute path to a prim, e.g. `/Root/Metal01/Shader`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SdfPath(String);

impl SdfPath {
    /// The absolute root path `/`.
    pub fn absolute_root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate an absolute prim path.
    pub fn parse(s: &str) -> Result<Self> {
        if s == "/" {
            return Ok(Self::absolute_root());
        }
        let Some(rest) = s.strip_prefix('/') else {
            return Err(ExportError::invalid_path(s, "path must be absolute"));
        };
        if rest.ends_with('/') {
            return Err(ExportError::invalid_path(s, "path must not end with '/'"));
        }
        for segment in rest.split('/') {
            if !is_valid_identifier(segment) {
                return Err(ExportError::invalid_path(
                    s,
                    format!("'{}' is not a valid prim name", segment),
                ));
            }
        }
        Ok(Self(s.to_string()))
    }

    /// Path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the absolute root.
    pub fn is_absolute_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last path element, empty for the absolute root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Iterate prim names from the top down.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Parent path, `None` for the absolute root.
    pub fn parent(&self) -> Option<SdfPath> {
        if self.is_absolute_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::absolute_root()),
            Some(pos) => Some(Self(self.0[..pos].to_string())),
            None => None,
        }
    }

    /// Append a child prim name.
    pub fn append_child(&self, name: &str) -> Result<SdfPath> {
        if !is_valid_identifier(name) {
            return Err(ExportError::invalid_path(
                format!("{}/{}", self.0.trim_end_matches('/'), name),
                format!("'{}' is not a valid prim name", name),
            ));
        }
        if self.is_absolute_root() {
            Ok(Self(format!("/{}", name)))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    /// Path to a property on this prim, e.g. `/Root/Shader.outputs:out`.
    pub fn property(&self, name: &str) -> String {
        format!("{}.{}", self.0, name)
    }

    /// Whether `self` is `other` or one of its descendants.
    pub fn has_prefix(&self, other: &SdfPath) -> bool {
        other.is_absolute_root()
            || self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/'))
    }
}

impl TryFrom<String> for SdfPath {
    type Error = ExportError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<SdfPath> for String {
    fn from(p: SdfPath) -> Self {
        p.0
    }
}

impl fmt::Display for SdfPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SdfPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert!(SdfPath::parse("/Root").is_ok());
        assert!(SdfPath::parse("/Root/Looks/Metal_01").is_ok());
        assert!(SdfPath::parse("Root").is_err());
        assert!(SdfPath::parse("/Root/").is_err());
        assert!(SdfPath::parse("/Ro ot").is_err());
        assert!(SdfPath::parse("//Root").is_err());
    }

    #[test]
    fn test_navigation() {
        let p = SdfPath::parse("/Root/Metal01").unwrap();
        assert_eq!(p.name(), "Metal01");
        assert_eq!(p.parent().unwrap().as_str(), "/Root");
        assert_eq!(p.parent().unwrap().parent().unwrap(), SdfPath::absolute_root());
        assert_eq!(p.append_child("Shader").unwrap().as_str(), "/Root/Metal01/Shader");
        assert!(p.append_child("bad name").is_err());
        assert_eq!(p.property("outputs:surface"), "/Root/Metal01.outputs:surface");
        assert!(p.has_prefix(&SdfPath::parse("/Root").unwrap()));
        assert!(!SdfPath::parse("/RootX").unwrap().has_prefix(&SdfPath::parse("/Root").unwrap()));
    }
}
