//! Errors reported by render features and render devices.

use crate::resource::{ColorFormat, ScratchHandle, ShaderHandle, TargetId, TextureHandle};

/// Failure raised while preparing or recording a render feature pass.
///
/// None of these are fatal to a frame: passes that hit one are skipped and the rest of the
/// frame renders normally.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FeatureError {
    /// The feature was created without a shader and stays inactive.
    #[error("{feature}: missing shader")]
    MissingShader { feature: String },

    /// A parameter the effect requires is absent or null this frame.
    #[error("missing required input `{name}`")]
    MissingRequiredInput { name: String },

    /// The allocator could not provide a scratch buffer.
    #[error("scratch buffer {width}x{height} {format:?} unavailable: {reason}")]
    BufferAcquisition {
        width: u32,
        height: u32,
        format: ColorFormat,
        reason: String,
    },

    /// The shader has no usable program for the requested pass on this device.
    #[error("shader {shader:?} pass {pass} failed to bind: {reason}")]
    ShaderBind {
        shader: ShaderHandle,
        pass: u32,
        reason: String,
    },

    /// The shader handle is not registered on the device.
    #[error("unknown shader {0:?}")]
    UnknownShader(ShaderHandle),

    /// A texture asset without any texel.
    #[error("texture {width}x{height} is empty")]
    EmptyTexture { width: u32, height: u32 },

    /// The texture handle is not registered on the device.
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureHandle),

    /// The target is not registered on the device.
    #[error("unknown render target {0}")]
    UnknownTarget(TargetId),

    /// The scratch handle is not currently acquired.
    #[error("scratch buffer {0:?} is not acquired")]
    UnknownScratch(ScratchHandle),

    /// An operation would read and write the same target.
    #[error("source and destination are the same target {0}")]
    Aliasing(TargetId),

    /// A straight copy between targets of different size or format.
    #[error("cannot copy {from} into {to}: size or format differ")]
    CopyMismatch { from: TargetId, to: TargetId },

    /// An error reported by wgpu.
    #[error("wgpu: {0}")]
    Gpu(String),

    /// A settings file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FeatureError {
    /// Builds a `BufferAcquisition` error for the given target descriptor.
    pub fn buffer_acquisition<T: ToString>(
        descriptor: &crate::resource::TargetDescriptor,
        reason: T,
    ) -> Self {
        FeatureError::BufferAcquisition {
            width: descriptor.width,
            height: descriptor.height,
            format: descriptor.format,
            reason: reason.to_string(),
        }
    }
}
