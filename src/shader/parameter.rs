//! Named shader inputs.

use std::collections::btree_map::{self, BTreeMap};

use glamx::Mat4;

use crate::resource::TextureHandle;

/// A value bound to a named shader input.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// A scalar float.
    Float(f32),
    /// A scalar integer.
    Int(i32),
    /// A texture, or `None` for a null texture slot.
    Texture(Option<TextureHandle>),
    /// A 4x4 matrix.
    Matrix(Mat4),
}

impl ParamValue {
    /// Whether this is a null texture.
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Texture(None))
    }

    /// The value as a float, converting integers.
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            ParamValue::Float(v) => Some(v),
            ParamValue::Int(v) => Some(v as f32),
            _ => None,
        }
    }

    /// The value as an integer, truncating floats.
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            ParamValue::Int(v) => Some(v),
            ParamValue::Float(v) => Some(v as i32),
            _ => None,
        }
    }

    /// The texture handle, if this is a non-null texture.
    pub fn as_texture(&self) -> Option<TextureHandle> {
        match *self {
            ParamValue::Texture(t) => t,
            _ => None,
        }
    }

    /// The matrix, if this is a matrix.
    pub fn as_matrix(&self) -> Option<Mat4> {
        match *self {
            ParamValue::Matrix(m) => Some(m),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Float(if v { 1.0 } else { 0.0 })
    }
}

impl From<TextureHandle> for ParamValue {
    fn from(v: TextureHandle) -> Self {
        ParamValue::Texture(Some(v))
    }
}

impl From<Option<TextureHandle>> for ParamValue {
    fn from(v: Option<TextureHandle>) -> Self {
        ParamValue::Texture(v)
    }
}

impl From<Mat4> for ParamValue {
    fn from(v: Mat4) -> Self {
        ParamValue::Matrix(v)
    }
}

/// The set of named inputs handed to a shader for one invocation.
///
/// Iteration is ordered by name so binding is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterBlock {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterBlock {
    /// Creates an empty parameter block.
    pub fn new() -> ParameterBlock {
        ParameterBlock::default()
    }

    /// Sets (or replaces) a named value.
    pub fn set<V: Into<ParamValue>>(&mut self, name: &str, value: V) {
        let _ = self.values.insert(name.to_string(), value.into());
    }

    /// The value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Whether a value is bound to `name`, null textures included.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Shortcut for a float (or integer) value.
    pub fn float(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(ParamValue::as_float)
    }

    /// Shortcut for an integer (or float) value.
    pub fn int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(ParamValue::as_int)
    }

    /// Shortcut for a non-null texture.
    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.get(name).and_then(ParamValue::as_texture)
    }

    /// Shortcut for a matrix value.
    pub fn matrix(&self, name: &str) -> Option<Mat4> {
        self.get(name).and_then(ParamValue::as_matrix)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.values.iter()
    }

    /// Names of the bound values, in name order.
    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies every value of `other` into `self`, replacing existing names.
    pub fn merge(&mut self, other: &ParameterBlock) {
        for (name, value) in other.iter() {
            let _ = self.values.insert(name.clone(), *value);
        }
    }
}

impl<'a> IntoIterator for &'a ParameterBlock {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
