//! Render devices: the engine-side collaborators render features record their work on.

pub use self::gpu::GpuDevice;
pub use self::software::{CpuShader, FragmentInput, SampledImage, SoftwareDevice};

use crate::error::FeatureError;
use crate::resource::{FilterMode, ScratchHandle, ShaderHandle, TargetDescriptor, TargetId};
use crate::shader::ParameterBlock;

mod gpu;
mod software;

/// The operations a full-screen pass needs from the rendering engine.
///
/// Every scratch buffer obtained with [`RenderDevice::acquire_scratch`] must be given back
/// with [`RenderDevice::release_scratch`] before the pass that acquired it returns.
pub trait RenderDevice {
    /// Writes `parameters` into the parameter block of `shader`.
    ///
    /// Names the shader does not declare are accepted and ignored.
    fn bind_parameters(
        &mut self,
        shader: ShaderHandle,
        parameters: &ParameterBlock,
    ) -> Result<(), FeatureError>;

    /// Allocates, or reuses, a temporary color buffer.
    fn acquire_scratch(
        &mut self,
        descriptor: &TargetDescriptor,
        filter: FilterMode,
    ) -> Result<ScratchHandle, FeatureError>;

    /// Returns a scratch buffer to the allocator.
    fn release_scratch(&mut self, handle: ScratchHandle) -> Result<(), FeatureError>;

    /// Runs pass `pass` of `shader` over the whole of `destination`, sampling `source` as the
    /// input image.
    fn draw_fullscreen(
        &mut self,
        shader: ShaderHandle,
        pass: u32,
        source: TargetId,
        destination: TargetId,
    ) -> Result<(), FeatureError>;

    /// Copies `source` onto `destination`, resampling if the sizes differ.
    fn blit(&mut self, source: TargetId, destination: TargetId) -> Result<(), FeatureError>;

    /// Copies `source` onto `destination` texel for texel. Both must share size and format.
    fn copy_texture(&mut self, source: TargetId, destination: TargetId)
        -> Result<(), FeatureError>;

    /// Submits the recorded work. Called once per camera by the frame renderer.
    fn flush(&mut self) -> Result<(), FeatureError> {
        Ok(())
    }

    /// Closes the frame. Scratch buffers left unused during the frame may be freed.
    fn end_frame(&mut self) {}
}

/// A device operation, as recorded by [`SoftwareDevice`].
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCommand {
    /// `bind_parameters` with the names of the bound values.
    BindParameters {
        shader: ShaderHandle,
        names: Vec<String>,
    },
    /// `acquire_scratch`.
    AcquireScratch {
        handle: ScratchHandle,
        descriptor: TargetDescriptor,
        filter: FilterMode,
    },
    /// `release_scratch`.
    ReleaseScratch { handle: ScratchHandle },
    /// `draw_fullscreen`.
    Draw {
        shader: ShaderHandle,
        pass: u32,
        source: TargetId,
        destination: TargetId,
    },
    /// `blit`.
    Blit {
        source: TargetId,
        destination: TargetId,
    },
    /// `copy_texture`.
    CopyTexture {
        source: TargetId,
        destination: TargetId,
    },
}
