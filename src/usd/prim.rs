//! In-memory prim tree.
//!
//! A prim owns its attributes, relationships, composition arcs and children
//! in authoring order, so a layer written from it is deterministic.
//!
//! Reference: `pxr/usd/sdf/primSpec.h`, `pxr/usd/sdf/attributeSpec.h`.

use super::value::{Value, ValueType};

/// How a prim spec is introduced in its layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Specifier {
    Def,
    Over,
}

impl Specifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Over => "over",
        }
    }
}

/// Attribute spec.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// Full namespaced name, e.g. `inputs:diffuseColor`.
    pub name: String,
    /// Declared value type.
    pub value_type: ValueType,
    /// Uniform (non-varying) attribute.
    pub uniform: bool,
    /// Authored default value.
    pub value: Option<Value>,
    /// Connection targets as property paths.
    pub connections: Vec<String>,
}

impl Attribute {
    /// Create an attribute with no value.
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            uniform: false,
            value: None,
            connections: Vec::new(),
        }
    }

    /// Mark as uniform.
    pub fn uniform(mut self) -> Self {
        self.uniform = true;
        self
    }
}

/// Relationship spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub targets: Vec<String>,
}

/// Prim spec.
#[derive(Clone, Debug, PartialEq)]
pub struct Prim {
    /// Prim name.
    pub name: String,
    /// def / over.
    pub specifier: Specifier,
    /// Schema type name, empty for typeless prims.
    pub type_name: String,
    /// Applied API schemas.
    pub api_schemas: Vec<String>,
    /// Payload asset paths, in append order.
    pub payloads: Vec<String>,
    /// Reference asset paths, in append order.
    pub references: Vec<String>,
    /// Attributes.
    pub attributes: Vec<Attribute>,
    /// Relationships.
    pub relationships: Vec<Relationship>,
    /// Child prims.
    pub children: Vec<Prim>,
}

impl Prim {
    /// Create a new prim spec.
    pub fn new(name: &str, specifier: Specifier) -> Self {
        Self {
            name: name.to_string(),
            specifier,
            type_name: String::new(),
            api_schemas: Vec::new(),
            payloads: Vec::new(),
            references: Vec::new(),
            attributes: Vec::new(),
            relationships: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Prim> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Find a direct child by name (mutable).
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Prim> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Add a child prim.
    pub fn add_child(&mut self, child: Prim) -> &mut Prim {
        let idx = self.children.len();
        self.children.push(child);
        &mut self.children[idx]
    }

    /// Find an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get an attribute, creating it with `value_type` when missing.
    ///
    /// An existing attribute keeps its declared type.
    pub fn ensure_attribute(&mut self, name: &str, value_type: ValueType) -> &mut Attribute {
        match self.attributes.iter().position(|a| a.name == name) {
            Some(idx) => &mut self.attributes[idx],
            None => {
                let idx = self.attributes.len();
                self.attributes.push(Attribute::new(name, value_type));
                &mut self.attributes[idx]
            }
        }
    }

    /// Find a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Replace the targets of a relationship, creating it when missing.
    pub fn set_relationship_targets(&mut self, name: &str, targets: Vec<String>) {
        match self.relationships.iter_mut().find(|r| r.name == name) {
            Some(rel) => rel.targets = targets,
            None => self.relationships.push(Relationship {
                name: name.to_string(),
                targets,
            }),
        }
    }

    /// Apply an API schema once.
    pub fn apply_api_schema(&mut self, schema: &str) {
        if !self.api_schemas.iter().any(|s| s == schema) {
            self.api_schemas.push(schema.to_string());
        }
    }

    /// Names of shader inputs authored on this prim.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter_map(|a| a.name.strip_prefix("inputs:"))
    }

    /// Number of prims in this subtree, including self.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Prim::subtree_len).sum::<usize>()
    }
}
