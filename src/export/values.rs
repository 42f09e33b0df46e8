//! Literal shader values: default elision and coercion to USD types.

use glam::{Vec3, Vec4};

use crate::host::{ParamValue, ShaderModelInput};
use crate::usd::{Value, ValueType};

/// Per-channel tolerance when comparing baked uniform colors.
pub const UNIFORM_COLOR_TOLERANCE: f32 = 0.003;

/// Whether `value` equals the model default of `input`.
///
/// Colors and vectors compare componentwise on RGB, scalars compare against
/// the red channel, booleans by truthiness of the red channel. Strings have
/// no default and count as default only when empty.
pub fn is_value_default(value: &ParamValue, input: &ShaderModelInput) -> bool {
    let default = input.default;
    match value {
        ParamValue::Color(c) => c.truncate() == default.truncate(),
        ParamValue::Vector(v) => *v == default.truncate(),
        ParamValue::Float(f) => *f == default.x,
        ParamValue::Int(i) => *i as f32 == default.x,
        ParamValue::Bool(b) => *b == (default.x != 0.0),
        ParamValue::String(s) => s.is_empty(),
    }
}

/// Coerce a shader parameter into a USD value of type `ty`.
///
/// Returns `None` when the value has no sensible representation.
pub fn value_as_shader_parameter(value: &ParamValue, ty: ValueType) -> Option<Value> {
    let out = match ty {
        ValueType::Color3f => Value::Color3f(as_vec3(value)?),
        ValueType::Normal3f => Value::Normal3f(as_vec3(value)?),
        ValueType::Vector3f => Value::Vector3f(as_vec3(value)?),
        ValueType::Float => Value::Float(as_scalar(value)?),
        ValueType::Int => Value::Int(as_scalar(value)?.round() as i32),
        ValueType::Bool => Value::Bool(as_scalar(value)? != 0.0),
        ValueType::Float2 => Value::Float2(as_vec3(value)?.truncate()),
        ValueType::String => Value::String(as_text(value)?),
        ValueType::Token => Value::Token(as_text(value)?),
        ValueType::Asset => Value::Asset(as_text(value)?),
        ValueType::IntArray => return None,
    };
    Some(out)
}

/// Whether two RGBA colors match within [`UNIFORM_COLOR_TOLERANCE`].
pub fn colors_fuzzy_equal(a: Vec4, b: Vec4) -> bool {
    a.abs_diff_eq(b, UNIFORM_COLOR_TOLERANCE)
}

fn as_vec3(value: &ParamValue) -> Option<Vec3> {
    match value {
        ParamValue::Color(c) => Some(c.truncate()),
        ParamValue::Vector(v) => Some(*v),
        ParamValue::Float(f) => Some(Vec3::splat(*f)),
        ParamValue::Int(i) => Some(Vec3::splat(*i as f32)),
        ParamValue::Bool(_) | ParamValue::String(_) => None,
    }
}

fn as_scalar(value: &ParamValue) -> Option<f32> {
    match value {
        ParamValue::Float(f) => Some(*f),
        ParamValue::Int(i) => Some(*i as f32),
        ParamValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        ParamValue::Color(c) => Some(c.x),
        ParamValue::Vector(v) => Some(v.x),
        ParamValue::String(_) => None,
    }
}

fn as_text(value: &ParamValue) -> Option<String> {
    match value {
        ParamValue::String(s) => Some(s.clone()),
        _ => None,
    }
}
