//! Shader inputs: parameter blocks and WGSL shader interfaces.

pub use self::parameter::{ParamValue, ParameterBlock};
pub use self::shader_interface::{ShaderInterface, UniformKind, UniformSlot};

mod parameter;
mod shader_interface;
