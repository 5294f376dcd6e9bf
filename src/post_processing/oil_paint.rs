//! Oil-paint post-process: brush strokes, colour quantization, canvas grain and grading.

use std::ops::RangeInclusive;

use bitflags::bitflags;

use crate::device::RenderDevice;
use crate::frame::FrameContext;
use crate::post_processing::{
    EffectDescriptor, FullScreenEffect, OptionalEffect, PassOutcome, RenderFeature, RenderPass,
};
use crate::resource::{FilterMode, ShaderHandle, TargetDescriptor, TextureHandle};
use crate::scheduler::InsertionPoint;

/// Parameter names bound by the [`OilPaintFeature`].
pub mod names {
    /// Int flag switching the brush stroke stage.
    pub const ENABLE_OIL_PAINT: &str = "_EnableOilPaint";
    /// Int flag switching colour quantization.
    pub const ENABLE_QUANTIZE: &str = "_EnableQuantize";
    /// Int flag switching the canvas grain stage.
    pub const ENABLE_GRAIN: &str = "_EnableGrain";
    /// Int flag switching bump mapping and grain noise.
    pub const ENABLE_BUMP_NOISE: &str = "_EnableBumpNoise";
    /// Int flag switching contrast and grading.
    pub const ENABLE_CONTRAST: &str = "_EnableContrast";
    /// Int flag switching highlight attenuation.
    pub const ENABLE_REFLECTION: &str = "_EnableReflection";

    /// Brush size in pixels.
    pub const BRUSH_SIZE: &str = "_BrushSize";
    /// Quantization steps per channel.
    pub const COLOR_STEPS: &str = "_ColorSteps";
    /// Stroke jitter.
    pub const PAINTER_NOISE: &str = "_PainterNoise";

    /// Canvas bump map texture.
    pub const BUMP_MAP: &str = "_BumpMap";
    /// Bump map tiling.
    pub const BUMP_TILING: &str = "_BumpTiling";
    /// Bump map influence.
    pub const BUMP_INFLUENCE: &str = "_BumpInfluence";
    /// Grain noise frequency.
    pub const NOISE_FREQ: &str = "_NoiseFreq";
    /// Grain noise influence.
    pub const NOISE_INFLUENCE: &str = "_NoiseInfluence";
    /// Overall grain strength.
    pub const GRAIN_STRENGTH: &str = "_GrainStrength";

    /// Contrast.
    pub const CONTRAST: &str = "_Contrast";
    /// Luminance above which highlights are attenuated.
    pub const REFLECT_THRESHOLD: &str = "_ReflectThreshold";
    /// Highlight attenuation.
    pub const REFLECT_ATTENUATION: &str = "_ReflectAttenuation";
    /// Shadow lift.
    pub const LIFT: &str = "_Lift";
    /// Midtone gamma.
    pub const GAMMA: &str = "_Gamma";
    /// Highlight gain.
    pub const GAIN: &str = "_Gain";
    /// Saturation.
    pub const SATURATION: &str = "_Saturation";
}

bitflags! {
    /// The stages of the oil-paint shader that are switched on.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PaintToggles: u8 {
        const OIL_PAINT = 1 << 0;
        const COLOR_QUANTIZE = 1 << 1;
        const CANVAS_GRAIN = 1 << 2;
        const BUMP_AND_NOISE = 1 << 3;
        const CONTRAST = 1 << 4;
        const REFLECTION = 1 << 5;
    }
}

impl Default for PaintToggles {
    fn default() -> Self {
        PaintToggles::all()
    }
}

/// Settings of the [`OilPaintFeature`].
///
/// Values outside their documented range are clamped when bound.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OilPaintSettings {
    /// The oil-paint shader.
    pub shader: Option<ShaderHandle>,
    /// Enabled shader stages.
    pub toggles: PaintToggles,

    /// Brush size, in `[1, 10]`.
    pub brush_size: f32,
    /// Number of quantization steps per channel.
    pub color_steps: f32,
    /// Stroke jitter, in `[0, 0.5]`.
    pub painter_noise: f32,

    /// Canvas bump map. Grain parameters are only bound when this is set.
    pub bump_map: Option<TextureHandle>,
    /// Bump map tiling, in `[1, 50]`.
    pub bump_tiling: f32,
    /// Bump map influence, in `[0, 1]`.
    pub bump_influence: f32,
    /// Grain noise frequency, in `[1, 16384]`.
    pub noise_frequency: f32,
    /// Grain noise influence, in `[0, 1]`.
    pub noise_influence: f32,
    /// Overall grain strength, in `[0, 0.2]`.
    pub grain_strength: f32,

    /// Contrast, in `[0.5, 2]`.
    pub contrast: f32,
    /// Luminance above which highlights are attenuated, in `[0, 1]`.
    pub reflect_threshold: f32,
    /// Highlight attenuation, in `[0, 1]`.
    pub reflect_attenuation: f32,
    /// Shadow lift, in `[0, 0.5]`.
    pub lift: f32,
    /// Midtone gamma, in `[0.5, 2]`.
    pub gamma: f32,
    /// Highlight gain, in `[0.5, 1.5]`.
    pub gain: f32,
    /// Saturation, in `[0, 2]`.
    pub saturation: f32,
}

impl OilPaintSettings {
    /// Accepted brush sizes.
    pub const BRUSH_SIZE_RANGE: RangeInclusive<f32> = 1.0..=10.0;
    /// Accepted stroke jitters.
    pub const PAINTER_NOISE_RANGE: RangeInclusive<f32> = 0.0..=0.5;
    /// Accepted bump map tilings.
    pub const BUMP_TILING_RANGE: RangeInclusive<f32> = 1.0..=50.0;
    /// Accepted bump map influences.
    pub const BUMP_INFLUENCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    /// Accepted grain noise frequencies.
    pub const NOISE_FREQUENCY_RANGE: RangeInclusive<f32> = 1.0..=16384.0;
    /// Accepted grain noise influences.
    pub const NOISE_INFLUENCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    /// Accepted grain strengths.
    pub const GRAIN_STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=0.2;
    /// Accepted contrasts.
    pub const CONTRAST_RANGE: RangeInclusive<f32> = 0.5..=2.0;
    /// Accepted highlight thresholds.
    pub const REFLECT_THRESHOLD_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    /// Accepted highlight attenuations.
    pub const REFLECT_ATTENUATION_RANGE: RangeInclusive<f32> = 0.0..=1.0;
    /// Accepted shadow lifts.
    pub const LIFT_RANGE: RangeInclusive<f32> = 0.0..=0.5;
    /// Accepted midtone gammas.
    pub const GAMMA_RANGE: RangeInclusive<f32> = 0.5..=2.0;
    /// Accepted highlight gains.
    pub const GAIN_RANGE: RangeInclusive<f32> = 0.5..=1.5;
    /// Accepted saturations.
    pub const SATURATION_RANGE: RangeInclusive<f32> = 0.0..=2.0;

    /// Default settings for `shader`.
    pub fn new(shader: Option<ShaderHandle>) -> Self {
        OilPaintSettings {
            shader,
            ..Default::default()
        }
    }

    /// Writes the parameters selected by the toggles into `descriptor`.
    ///
    /// Parameters of disabled stages are left untouched.
    pub fn bind(&self, descriptor: &mut EffectDescriptor) {
        use self::names::*;

        let toggles = self.toggles;
        descriptor.set_parameter(ENABLE_OIL_PAINT, toggles.contains(PaintToggles::OIL_PAINT));
        descriptor.set_parameter(ENABLE_QUANTIZE, toggles.contains(PaintToggles::COLOR_QUANTIZE));
        descriptor.set_parameter(ENABLE_GRAIN, toggles.contains(PaintToggles::CANVAS_GRAIN));
        descriptor.set_parameter(ENABLE_BUMP_NOISE, toggles.contains(PaintToggles::BUMP_AND_NOISE));
        descriptor.set_parameter(ENABLE_CONTRAST, toggles.contains(PaintToggles::CONTRAST));
        descriptor.set_parameter(ENABLE_REFLECTION, toggles.contains(PaintToggles::REFLECTION));

        if toggles.contains(PaintToggles::OIL_PAINT) {
            descriptor.set_float(BRUSH_SIZE, clamped(self.brush_size, Self::BRUSH_SIZE_RANGE));
            descriptor.set_float(COLOR_STEPS, self.color_steps);
            descriptor.set_float(
                PAINTER_NOISE,
                clamped(self.painter_noise, Self::PAINTER_NOISE_RANGE),
            );
        }

        if toggles.contains(PaintToggles::CANVAS_GRAIN) {
            if let Some(bump_map) = self.bump_map {
                descriptor.set_texture(BUMP_MAP, Some(bump_map));
                descriptor.set_float(BUMP_TILING, clamped(self.bump_tiling, Self::BUMP_TILING_RANGE));
                descriptor.set_float(
                    BUMP_INFLUENCE,
                    clamped(self.bump_influence, Self::BUMP_INFLUENCE_RANGE),
                );
                descriptor.set_float(
                    NOISE_FREQ,
                    clamped(self.noise_frequency, Self::NOISE_FREQUENCY_RANGE),
                );
                descriptor.set_float(
                    NOISE_INFLUENCE,
                    clamped(self.noise_influence, Self::NOISE_INFLUENCE_RANGE),
                );
                descriptor.set_float(
                    GRAIN_STRENGTH,
                    clamped(self.grain_strength, Self::GRAIN_STRENGTH_RANGE),
                );
            }
        }

        descriptor.set_float(CONTRAST, clamped(self.contrast, Self::CONTRAST_RANGE));
        descriptor.set_float(
            REFLECT_THRESHOLD,
            clamped(self.reflect_threshold, Self::REFLECT_THRESHOLD_RANGE),
        );
        descriptor.set_float(
            REFLECT_ATTENUATION,
            clamped(self.reflect_attenuation, Self::REFLECT_ATTENUATION_RANGE),
        );
        descriptor.set_float(LIFT, clamped(self.lift, Self::LIFT_RANGE));
        descriptor.set_float(GAMMA, clamped(self.gamma, Self::GAMMA_RANGE));
        descriptor.set_float(GAIN, clamped(self.gain, Self::GAIN_RANGE));
        descriptor.set_float(SATURATION, clamped(self.saturation, Self::SATURATION_RANGE));
    }
}

impl Default for OilPaintSettings {
    fn default() -> Self {
        OilPaintSettings {
            shader: None,
            toggles: PaintToggles::all(),
            brush_size: 3.0,
            color_steps: 8.0,
            painter_noise: 0.15,
            bump_map: None,
            bump_tiling: 10.0,
            bump_influence: 0.5,
            noise_frequency: 8192.0,
            noise_influence: 0.05,
            grain_strength: 0.08,
            contrast: 1.0,
            reflect_threshold: 0.9,
            reflect_attenuation: 0.2,
            lift: 0.05,
            gamma: 1.0,
            gain: 1.0,
            saturation: 1.0,
        }
    }
}

fn clamped(value: f32, range: RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

/// Renders the color target as an oil painting after transparent geometry.
pub struct OilPaintFeature {
    settings: OilPaintSettings,
    effect: Option<FullScreenEffect>,
}

impl OilPaintFeature {
    /// Label of the pass.
    pub const NAME: &'static str = "OilPaintEffect";

    /// Creates the feature.
    ///
    /// Without a shader the feature stays inactive for its whole lifetime.
    pub fn new(settings: OilPaintSettings) -> OilPaintFeature {
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

        OilPaintFeature { settings, effect }
    }

    /// The current settings.
    pub fn settings(&self) -> &OilPaintSettings {
        &self.settings
    }

    /// The settings, to be modified between frames.
    pub fn settings_mut(&mut self) -> &mut OilPaintSettings {
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

impl RenderFeature for OilPaintFeature {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn insertion_point(&self) -> InsertionPoint {
        InsertionPoint::AfterRenderingTransparents
    }

    fn prepare_frame(&mut self, _: &FrameContext) -> bool {
        match self.effect.as_mut() {
            Some(effect) => {
                self.settings.bind(effect.descriptor_mut());
                effect.descriptor().is_ready()
            }
            None => false,
        }
    }

    fn pass_mut(&mut self) -> &mut dyn RenderPass {
        self
    }
}

impl RenderPass for OilPaintFeature {
    fn configure(&mut self, descriptor: &TargetDescriptor) {
        self.effect.configure_effect(descriptor);
    }

    fn execute(&mut self, frame: &FrameContext, device: &mut dyn RenderDevice) -> PassOutcome {
        self.effect.execute_effect(Self::NAME, frame, device)
    }
}
