//! The shader and parameters of one effect instance.

use glamx::Mat4;

use crate::resource::{FilterMode, ShaderHandle, TextureHandle};
use crate::scheduler::InsertionPoint;
use crate::shader::{ParamValue, ParameterBlock};

/// A shader reference, its parameter values and the preconditions of the effect.
///
/// Only the parameter values change once the descriptor is built.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectDescriptor {
    shader: Option<ShaderHandle>,
    parameters: ParameterBlock,
    required: Vec<String>,
    filter: FilterMode,
    insertion_point: InsertionPoint,
}

impl EffectDescriptor {
    /// A descriptor for `shader`, with point filtering, running after transparent geometry.
    pub fn new(shader: Option<ShaderHandle>) -> EffectDescriptor {
        EffectDescriptor {
            shader,
            parameters: ParameterBlock::new(),
            required: Vec::new(),
            filter: FilterMode::Point,
            insertion_point: InsertionPoint::AfterRenderingTransparents,
        }
    }

    /// Marks `name` as required: the effect is not ready while it is absent or null.
    pub fn with_required(mut self, name: &str) -> Self {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    /// Sets the filter of the scratch buffer.
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the insertion point.
    pub fn at(mut self, point: InsertionPoint) -> Self {
        self.insertion_point = point;
        self
    }

    /// Sets a parameter. Any name is accepted.
    pub fn set_parameter<V: Into<ParamValue>>(&mut self, name: &str, value: V) {
        self.parameters.set(name, value);
    }

    /// Sets a float parameter.
    pub fn set_float(&mut self, name: &str, value: f32) {
        self.parameters.set(name, value);
    }

    /// Sets an integer parameter.
    pub fn set_int(&mut self, name: &str, value: i32) {
        self.parameters.set(name, value);
    }

    /// Sets a texture parameter; `None` binds a null texture.
    pub fn set_texture(&mut self, name: &str, texture: Option<TextureHandle>) {
        self.parameters.set(name, texture);
    }

    /// Sets a matrix parameter.
    pub fn set_matrix(&mut self, name: &str, value: Mat4) {
        self.parameters.set(name, value);
    }

    /// The value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Every parameter.
    pub fn parameters(&self) -> &ParameterBlock {
        &self.parameters
    }

    /// The shader.
    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    /// Names of the required parameters.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Filter of the scratch buffer.
    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Insertion point of the effect.
    pub fn insertion_point(&self) -> InsertionPoint {
        self.insertion_point
    }

    /// The first required parameter that is missing or null.
    pub fn missing_input(&self) -> Option<&str> {
        self.required
            .iter()
            .find(|name| self.parameters.get(name).map_or(true, ParamValue::is_null))
            .map(String::as_str)
    }

    /// Whether the shader is set and every required parameter is present and non-null.
    pub fn is_ready(&self) -> bool {
        self.shader.is_some() && self.missing_input().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_descriptor_without_shader_is_never_ready() {
        let mut desc = EffectDescriptor::new(None);
        desc.set_int("_Radius", 3);
        assert!(!desc.is_ready());
    }

    #[test]
    fn required_textures_must_be_non_null() {
        let mut desc = EffectDescriptor::new(Some(ShaderHandle(0))).with_required("_ProjectorTex");
        assert!(!desc.is_ready());
        assert_eq!(desc.missing_input(), Some("_ProjectorTex"));

        desc.set_texture("_ProjectorTex", None);
        assert!(!desc.is_ready());

        desc.set_texture("_ProjectorTex", Some(TextureHandle(7)));
        assert!(desc.is_ready());
    }

    #[test]
    fn unknown_parameters_are_accepted() {
        let mut desc = EffectDescriptor::new(Some(ShaderHandle(0)));
        desc.set_parameter("_NotInTheShader", 1.0f32);
        assert!(desc.is_ready());
        assert_eq!(desc.parameter("_NotInTheShader"), Some(&ParamValue::Float(1.0)));
    }
}
