//! Declared inputs of a WGSL effect shader.

use crate::shader::ParameterBlock;

/// Type of a uniform slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// `f32`.
    Float,
    /// `i32`.
    Int,
    /// `mat4x4<f32>`.
    Matrix,
}

impl UniformKind {
    fn size(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int => 4,
            UniformKind::Matrix => 64,
        }
    }

    fn align(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int => 4,
            UniformKind::Matrix => 16,
        }
    }
}

/// A named uniform slot.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformSlot {
    /// Parameter name, e.g. `_Radius`.
    pub name: String,
    /// Slot type.
    pub kind: UniformKind,
}

/// What a WGSL effect shader consumes.
///
/// The shader is bound as bind group 0 with the following layout:
///
/// * binding 0: the source color texture (`texture_2d<f32>`),
/// * binding 1: the source sampler,
/// * binding 2: a uniform buffer whose struct lists [`ShaderInterface::uniforms`] in
///   declaration order with WGSL alignment rules,
/// * bindings `3 + 2 * i` and `4 + 2 * i`: texture and sampler of the i-th entry of
///   [`ShaderInterface::textures`].
///
/// Fragment entry point `fragment_entries[pass]` implements pass `pass`. The vertex stage
/// is the crate's full-screen quad, which outputs `@location(0) uv: vec2<f32>`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderInterface {
    /// Debug label.
    pub label: String,
    /// One fragment entry point per shader pass.
    pub fragment_entries: Vec<String>,
    /// Uniform slots, in struct order.
    pub uniforms: Vec<UniformSlot>,
    /// Texture slot names, in binding order.
    pub textures: Vec<String>,
}

impl ShaderInterface {
    /// A single-pass interface with a `fs_main` fragment entry point.
    pub fn new(label: &str) -> ShaderInterface {
        ShaderInterface {
            label: label.to_string(),
            fragment_entries: vec!["fs_main".to_string()],
            uniforms: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Replaces the fragment entry points.
    pub fn with_passes(mut self, entries: &[&str]) -> Self {
        self.fragment_entries = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Appends a float uniform.
    pub fn float(mut self, name: &str) -> Self {
        self.uniforms.push(UniformSlot {
            name: name.to_string(),
            kind: UniformKind::Float,
        });
        self
    }

    /// Appends an integer uniform.
    pub fn int(mut self, name: &str) -> Self {
        self.uniforms.push(UniformSlot {
            name: name.to_string(),
            kind: UniformKind::Int,
        });
        self
    }

    /// Appends a matrix uniform.
    pub fn matrix(mut self, name: &str) -> Self {
        self.uniforms.push(UniformSlot {
            name: name.to_string(),
            kind: UniformKind::Matrix,
        });
        self
    }

    /// Appends a texture slot.
    pub fn texture(mut self, name: &str) -> Self {
        self.textures.push(name.to_string());
        self
    }

    /// Number of shader passes.
    pub fn pass_count(&self) -> u32 {
        self.fragment_entries.len() as u32
    }

    /// Byte offsets of each uniform slot, and the padded struct size.
    pub fn uniform_layout(&self) -> (Vec<usize>, usize) {
        let mut offsets = Vec::with_capacity(self.uniforms.len());
        let mut cursor = 0;

        for slot in &self.uniforms {
            let align = slot.kind.align();
            cursor = (cursor + align - 1) / align * align;
            offsets.push(cursor);
            cursor += slot.kind.size();
        }

        // Uniform buffers bound with a struct are sized to a multiple of 16, never empty.
        let size = ((cursor + 15) / 16 * 16).max(16);
        (offsets, size)
    }

    /// Packs the values of `block` into the uniform buffer layout.
    ///
    /// Slots without a value, or with a value of an incompatible kind, are zeroed. Names of
    /// `block` that are not declared are ignored.
    pub fn pack_uniforms(&self, block: &ParameterBlock) -> Vec<u8> {
        let (offsets, size) = self.uniform_layout();
        let mut bytes = vec![0u8; size];

        for (slot, offset) in self.uniforms.iter().zip(offsets) {
            match slot.kind {
                UniformKind::Float => {
                    if let Some(v) = block.float(&slot.name) {
                        bytes[offset..offset + 4].copy_from_slice(bytemuck::bytes_of(&v));
                    }
                }
                UniformKind::Int => {
                    if let Some(v) = block.int(&slot.name) {
                        bytes[offset..offset + 4].copy_from_slice(bytemuck::bytes_of(&v));
                    }
                }
                UniformKind::Matrix => {
                    if let Some(m) = block.matrix(&slot.name) {
                        let cols = m.to_cols_array();
                        bytes[offset..offset + 64].copy_from_slice(bytemuck::cast_slice(&cols));
                    }
                }
            }
        }

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::Mat4;

    #[test]
    fn matrices_are_aligned_to_16_bytes() {
        let interface = ShaderInterface::new("projector")
            .float("_Blend")
            .matrix("_ProjectorVP")
            .int("_Radius");
        let (offsets, size) = interface.uniform_layout();
        assert_eq!(offsets, vec![0, 16, 80]);
        assert_eq!(size, 96);
    }

    #[test]
    fn empty_interfaces_still_have_a_uniform_buffer() {
        let (offsets, size) = ShaderInterface::new("empty").uniform_layout();
        assert!(offsets.is_empty());
        assert_eq!(size, 16);
    }

    #[test]
    fn packing_converts_and_ignores_undeclared_names() {
        let interface = ShaderInterface::new("kuwahara").int("_Radius").float("_Scale");
        let mut block = ParameterBlock::new();
        block.set("_Radius", 3.0f32);
        block.set("_Unused", 42.0f32);
        block.set("_Scale", Mat4::IDENTITY);

        let bytes = interface.pack_uniforms(&block);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytemuck::pod_read_unaligned::<i32>(&bytes[0..4]), 3);
        assert_eq!(bytemuck::pod_read_unaligned::<f32>(&bytes[4..8]), 0.0);
    }
}
