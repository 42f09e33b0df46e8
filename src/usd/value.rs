//! Typed attribute values.
//!
//! Reference: `pxr/usd/sdf/types.h` (`SdfValueTypeNames`).

use std::fmt;

use glam::{Vec2, Vec3};

/// Attribute value type names used by shading networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Float2,
    Color3f,
    Normal3f,
    Vector3f,
    Token,
    String,
    Asset,
    IntArray,
}

impl ValueType {
    /// Type name as written in a usda layer.
    pub fn usda_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Float2 => "float2",
            Self::Color3f => "color3f",
            Self::Normal3f => "normal3f",
            Self::Vector3f => "vector3f",
            Self::Token => "token",
            Self::String => "string",
            Self::Asset => "asset",
            Self::IntArray => "int[]",
        }
    }

    /// Three-component types.
    pub fn is_triple(self) -> bool {
        matches!(self, Self::Color3f | Self::Normal3f | Self::Vector3f)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.usda_name())
    }
}

/// Attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Float2(Vec2),
    Color3f(Vec3),
    Normal3f(Vec3),
    Vector3f(Vec3),
    Token(String),
    String(String),
    Asset(String),
    IntArray(Vec<i32>),
}

impl Value {
    /// Type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Float2(_) => ValueType::Float2,
            Self::Color3f(_) => ValueType::Color3f,
            Self::Normal3f(_) => ValueType::Normal3f,
            Self::Vector3f(_) => ValueType::Vector3f,
            Self::Token(_) => ValueType::Token,
            Self::String(_) => ValueType::String,
            Self::Asset(_) => ValueType::Asset,
            Self::IntArray(_) => ValueType::IntArray,
        }
    }

    /// Asset path payload, if this is an asset value.
    pub fn as_asset(&self) -> Option<&str> {
        match self {
            Self::Asset(s) => Some(s),
            _ => None,
        }
    }

    /// Value literal as written in a usda layer.
    pub fn to_usda(&self) -> String {
        match self {
            Self::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => fmt_float(*f),
            Self::Float2(v) => format!("({}, {})", fmt_float(v.x), fmt_float(v.y)),
            Self::Color3f(v) | Self::Normal3f(v) | Self::Vector3f(v) => format!(
                "({}, {}, {})",
                fmt_float(v.x),
                fmt_float(v.y),
                fmt_float(v.z)
            ),
            Self::Token(s) | Self::String(s) => quote(s),
            Self::Asset(s) => format!("@{}@", s),
            Self::IntArray(v) => {
                let items: Vec<String> = v.iter().map(|i| i.to_string()).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

fn fmt_float(f: f32) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        (if f > 0.0 { "inf" } else { "-inf" }).to_string()
    } else {
        format!("{}", f)
    }
}

/// Quote a string literal, escaping backslashes, quotes and newlines.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(Value::Float(0.5).to_usda(), "0.5");
        assert_eq!(Value::Float(1.0).to_usda(), "1");
        assert_eq!(Value::Bool(true).to_usda(), "1");
        assert_eq!(Value::Color3f(Vec3::new(1.0, 0.25, 0.0)).to_usda(), "(1, 0.25, 0)");
        assert_eq!(Value::Asset("tex/a.<UDIM>.png".into()).to_usda(), "@tex/a.<UDIM>.png@");
        assert_eq!(Value::Token("face".into()).to_usda(), "\"face\"");
        assert_eq!(Value::IntArray(vec![0, 1, 2]).to_usda(), "[0, 1, 2]");
        assert_eq!(Value::String("a\"b".into()).to_usda(), "\"a\\\"b\"");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ValueType::IntArray.usda_name(), "int[]");
        assert_eq!(Value::Normal3f(Vec3::Z).value_type(), ValueType::Normal3f);
        assert!(ValueType::Vector3f.is_triple());
        assert!(!ValueType::Float2.is_triple());
    }
}
