//! Painterly Kuwahara filter.

use std::ops::RangeInclusive;

use crate::device::RenderDevice;
use crate::frame::FrameContext;
use crate::post_processing::{
    EffectDescriptor, FullScreenEffect, OptionalEffect, PassOutcome, RenderFeature, RenderPass,
};
use crate::resource::{FilterMode, ShaderHandle, TargetDescriptor};
use crate::scheduler::InsertionPoint;

/// Name of the sector radius parameter.
pub const RADIUS: &str = "_Radius";

/// Settings of the [`KuwaharaFeature`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KuwaharaSettings {
    /// The Kuwahara shader.
    pub shader: Option<ShaderHandle>,
    /// Radius of the filter sectors, in pixels. Clamped to [`KuwaharaSettings::RADIUS_RANGE`].
    pub radius: i32,
}

impl KuwaharaSettings {
    /// Accepted sector radii.
    pub const RADIUS_RANGE: RangeInclusive<i32> = 1..=10;

    /// Default settings for `shader`.
    pub fn new(shader: Option<ShaderHandle>) -> Self {
        KuwaharaSettings {
            shader,
            ..Default::default()
        }
    }
}

impl Default for KuwaharaSettings {
    fn default() -> Self {
        KuwaharaSettings {
            shader: None,
            radius: 3,
        }
    }
}

/// Applies a Kuwahara filter after transparent geometry.
///
/// The filter result is drawn into a scratch buffer and copied back onto the color target.
pub struct KuwaharaFeature {
    settings: KuwaharaSettings,
    effect: Option<FullScreenEffect>,
}

impl KuwaharaFeature {
    /// Label of the pass.
    pub const NAME: &'static str = "KuwaharaFilter";

    /// Creates the feature.
    ///
    /// Without a shader the feature stays inactive for its whole lifetime.
    pub fn new(settings: KuwaharaSettings) -> KuwaharaFeature {
        let effect = match settings.shader {
            Some(shader) => {
                let descriptor = EffectDescriptor::new(Some(shader))
                    .with_filter(FilterMode::Point)
                    .at(InsertionPoint::AfterRenderingTransparents);
                Some(FullScreenEffect::copy_back(Self::NAME, descriptor))
            }
            None => {
                log::warn!("{}: missing shader", Self::NAME);
                None
            }
        };

        KuwaharaFeature { settings, effect }
    }

    /// The current settings.
    pub fn settings(&self) -> &KuwaharaSettings {
        &self.settings
    }

    /// The settings, to be modified between frames.
    ///
    /// Changing the shader here has no effect: it is read when the feature is created.
    pub fn settings_mut(&mut self) -> &mut KuwaharaSettings {
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

impl RenderFeature for KuwaharaFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn insertion_point(&self) -> InsertionPoint {
        InsertionPoint::AfterRenderingTransparents
    }

    fn prepare_frame(&mut self, _: &FrameContext) -> bool {
        let effect = match self.effect.as_mut() {
            Some(effect) => effect,
            None => return false,
        };

        let radius = self.settings.radius.clamp(
            *KuwaharaSettings::RADIUS_RANGE.start(),
            *KuwaharaSettings::RADIUS_RANGE.end(),
        );
        effect.descriptor_mut().set_int(RADIUS, radius);
        effect.descriptor().is_ready()
    }

    fn pass_mut(&mut self) -> &mut dyn RenderPass {
        self
    }
}

impl RenderPass for KuwaharaFeature {
    fn configure(&mut self, descriptor: &TargetDescriptor) {
        self.effect.configure_effect(descriptor);
    }

    fn execute(&mut self, frame: &FrameContext, device: &mut dyn RenderDevice) -> PassOutcome {
        self.effect.execute_effect(Self::NAME, frame, device)
    }
}
