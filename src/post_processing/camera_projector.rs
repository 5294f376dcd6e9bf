//! Projects a texture over the scene from the rendering camera.

use crate::camera::ClipConvention;
use crate::device::RenderDevice;
use crate::frame::FrameContext;
use crate::post_processing::{
    CopyBack, EffectDescriptor, FullScreenEffect, FullScreenPass, OptionalEffect, PassOutcome,
    RenderFeature, RenderPass,
};
use crate::resource::{FilterMode, ShaderHandle, TargetDescriptor, TextureHandle};
use crate::scheduler::InsertionPoint;

/// Name of the projected texture parameter.
pub const PROJECTOR_TEX: &str = "_ProjectorTex";
/// Name of the projector's world to clip matrix parameter.
pub const PROJECTOR_VP: &str = "_ProjectorVP";

/// Settings of the [`CameraProjectorFeature`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProjectorSettings {
    /// The projector shader.
    pub shader: Option<ShaderHandle>,
    /// The projected texture. The pass is not scheduled while this is `None`.
    pub texture: Option<TextureHandle>,
    /// Where the pass runs.
    pub insertion_point: InsertionPoint,
    /// Clip space of the device the pass runs on.
    pub clip_convention: ClipConvention,
}

impl ProjectorSettings {
    /// Default settings projecting `texture` with `shader`.
    pub fn new(shader: Option<ShaderHandle>, texture: Option<TextureHandle>) -> Self {
        ProjectorSettings {
            shader,
            texture,
            ..Default::default()
        }
    }
}

impl Default for ProjectorSettings {
    fn default() -> Self {
        ProjectorSettings {
            shader: None,
            texture: None,
            insertion_point: InsertionPoint::AfterRenderingOpaques,
            clip_convention: ClipConvention::ZeroToOne,
        }
    }
}

/// Overlays a texture projected with the camera's own view and projection.
///
/// The scene is sampled bilinearly into a scratch buffer by the projector shader, then
/// blitted back onto the color target.
pub struct CameraProjectorFeature {
    settings: ProjectorSettings,
    insertion_point: InsertionPoint,
    effect: Option<FullScreenEffect>,
}

impl CameraProjectorFeature {
    /// Label of the pass.
    pub const NAME: &'static str = "CameraProjector";

    /// Creates the feature.
    ///
    /// Without a shader the feature stays inactive for its whole lifetime. The insertion
    /// point is also fixed here.
    pub fn new(settings: ProjectorSettings) -> CameraProjectorFeature {
        let effect = match settings.shader {
            Some(shader) => {
                let descriptor = EffectDescriptor::new(Some(shader))
                    .with_required(PROJECTOR_TEX)
                    .with_filter(FilterMode::Bilinear)
                    .at(settings.insertion_point);
                let pass = FullScreenPass::new(Self::NAME, CopyBack::Blit);
                Some(FullScreenEffect::new(descriptor, pass))
            }
            None => {
                log::warn!("{}: missing shader", Self::NAME);
                None
            }
        };

        CameraProjectorFeature {
            insertion_point: settings.insertion_point,
            settings,
            effect,
        }
    }

    /// The current settings.
    pub fn settings(&self) -> &ProjectorSettings {
        &self.settings
    }

    /// The settings, to be modified between frames.
    ///
    /// The texture is read every frame; the shader and insertion point only at creation.
    pub fn settings_mut(&mut self) -> &mut ProjectorSettings {
        &mut self.settings
    }

    /// Whether the feature was created with a shader.
    pub fn is_active(&self) -> bool {
        self.effect.is_some()
    }

    /// The underlying effect, if active.
    pub fn effect(&self) -> Option<&FullScreenEffect> {
        self.effect.as_ref()
    }
}

impl RenderFeature for CameraProjectorFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn insertion_point(&self) -> InsertionPoint {
        self.insertion_point
    }

    fn prepare_frame(&mut self, frame: &FrameContext) -> bool {
        let effect = match self.effect.as_mut() {
            Some(effect) => effect,
            None => return false,
        };

        let descriptor = effect.descriptor_mut();
        descriptor.set_texture(PROJECTOR_TEX, self.settings.texture);

        if self.settings.texture.is_some() {
            let view_projection = frame.camera.view_projection(self.settings.clip_convention);
            descriptor.set_matrix(PROJECTOR_VP, view_projection);
        }

        descriptor.is_ready()
    }

    fn pass_mut(&mut self) -> &mut dyn RenderPass {
        self
    }
}

impl RenderPass for CameraProjectorFeature {
    fn configure(&mut self, descriptor: &TargetDescriptor) {
        self.effect.configure_effect(descriptor);
    }

    fn execute(&mut self, frame: &FrameContext, device: &mut dyn RenderDevice) -> PassOutcome {
        self.effect.execute_effect(Self::NAME, frame, device)
    }
}
