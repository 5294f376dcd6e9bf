//! A render feature made of an effect descriptor and a full-screen pass.

use crate::device::RenderDevice;
use crate::error::FeatureError;
use crate::frame::FrameContext;
use crate::post_processing::{
    CopyBack, EffectDescriptor, FullScreenPass, PassOutcome, RenderFeature, RenderPass,
};
use crate::resource::TargetDescriptor;
use crate::scheduler::InsertionPoint;

/// Runs an arbitrary effect shader over the color target.
///
/// The named features of this crate wrap one of these and fill its parameters from their
/// settings each frame; it can also be registered directly for custom shaders.
#[derive(Clone, Debug)]
pub struct FullScreenEffect {
    descriptor: EffectDescriptor,
    pass: FullScreenPass,
}

impl FullScreenEffect {
    /// Creates an effect from its descriptor and pass.
    pub fn new(descriptor: EffectDescriptor, pass: FullScreenPass) -> FullScreenEffect {
        FullScreenEffect { descriptor, pass }
    }

    /// A single-stage effect copied back texel for texel.
    pub fn copy_back(label: &str, descriptor: EffectDescriptor) -> FullScreenEffect {
        FullScreenEffect::new(descriptor, FullScreenPass::new(label, CopyBack::CopyTexture))
    }

    /// The effect's descriptor.
    pub fn descriptor(&self) -> &EffectDescriptor {
        &self.descriptor
    }

    /// The effect's descriptor, to update parameter values.
    pub fn descriptor_mut(&mut self) -> &mut EffectDescriptor {
        &mut self.descriptor
    }

    /// The effect's pass.
    pub fn pass(&self) -> &FullScreenPass {
        &self.pass
    }
}

impl RenderPass for FullScreenEffect {
    fn configure(&mut self, descriptor: &TargetDescriptor) {
        self.pass.configure(descriptor);
    }

    fn execute(&mut self, frame: &FrameContext, device: &mut dyn RenderDevice) -> PassOutcome {
        self.pass.execute(frame, &self.descriptor, device)
    }
}

impl RenderFeature for FullScreenEffect {
    fn name(&self) -> &str {
        self.pass.label()
    }

    fn insertion_point(&self) -> InsertionPoint {
        self.descriptor.insertion_point()
    }

    fn prepare_frame(&mut self, _: &FrameContext) -> bool {
        self.descriptor.is_ready()
    }

    fn pass_mut(&mut self) -> &mut dyn RenderPass {
        self
    }
}

/// The pass of a named feature, absent when the feature was created without a shader.
pub(crate) trait OptionalEffect {
    fn configure_effect(&mut self, descriptor: &TargetDescriptor);

    /// Executes the effect, or reports the missing shader of `feature`.
    fn execute_effect(
        &mut self,
        feature: &str,
        frame: &FrameContext,
        device: &mut dyn RenderDevice,
    ) -> PassOutcome;
}

impl OptionalEffect for Option<FullScreenEffect> {
    fn configure_effect(&mut self, descriptor: &TargetDescriptor) {
        if let Some(effect) = self.as_mut() {
            effect.configure(descriptor);
        }
    }

    fn execute_effect(
        &mut self,
        feature: &str,
        frame: &FrameContext,
        device: &mut dyn RenderDevice,
    ) -> PassOutcome {
        match self.as_mut() {
            Some(effect) => effect.execute(frame, device),
            None => PassOutcome::Skipped(FeatureError::MissingShader {
                feature: feature.to_string(),
            }),
        }
    }
}
