//! The bind, acquire, draw, copy back, release sequence shared by every effect.

use crate::device::RenderDevice;
use crate::error::FeatureError;
use crate::frame::FrameContext;
use crate::post_processing::{EffectDescriptor, PassOutcome};
use crate::resource::{ScratchHandle, TargetDescriptor, TargetId};

/// How the result of the last shader stage is written back onto the color target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CopyBack {
    /// Texel-exact copy; scratch and color target share size and format.
    CopyTexture,
    /// Plain blit through the device's copy shader.
    Blit,
}

/// Executes an [`EffectDescriptor`] over a frame's color target.
#[derive(Clone, Debug)]
pub struct FullScreenPass {
    label: String,
    stages: Vec<u32>,
    copy_back: CopyBack,
    configured: Option<TargetDescriptor>,
}

impl FullScreenPass {
    /// A pass running shader pass 0 once, then `copy_back`.
    pub fn new(label: &str, copy_back: CopyBack) -> FullScreenPass {
        FullScreenPass {
            label: label.to_string(),
            stages: vec![0],
            copy_back,
            configured: None,
        }
    }

    /// Runs the given shader passes in sequence, each reading the output of the previous one.
    ///
    /// # Panics
    /// Panics if `stages` is empty.
    pub fn with_stages(mut self, stages: &[u32]) -> Self {
        assert!(!stages.is_empty(), "a full-screen pass needs at least one stage");
        self.stages = stages.to_vec();
        self
    }

    /// Debug label of the pass.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Shader passes run by this pass.
    pub fn stages(&self) -> &[u32] {
        &self.stages
    }

    /// Copy-back strategy.
    pub fn copy_back(&self) -> CopyBack {
        self.copy_back
    }

    /// Remembers the target descriptor of the coming execution.
    pub fn configure(&mut self, descriptor: &TargetDescriptor) {
        if self.configured.as_ref() != Some(descriptor) {
            log::debug!(
                "{}: target is now {}x{} {:?}",
                self.label,
                descriptor.width,
                descriptor.height,
                descriptor.format
            );
            self.configured = Some(*descriptor);
        }
    }

    /// Applies `effect` onto `frame.color_target`.
    ///
    /// Every scratch buffer acquired here is released before returning, including when a
    /// step fails.
    pub fn execute(
        &mut self,
        frame: &FrameContext,
        effect: &EffectDescriptor,
        device: &mut dyn RenderDevice,
    ) -> PassOutcome {
        if !effect.is_ready() {
            let err = match effect.missing_input() {
                Some(name) => FeatureError::MissingRequiredInput {
                    name: name.to_string(),
                },
                None => FeatureError::MissingShader {
                    feature: self.label.clone(),
                },
            };
            log::debug!("{}: skipped, {}", self.label, err);
            return PassOutcome::Skipped(err);
        }

        let mut acquired = Vec::with_capacity(2);
        let result = self.record(frame, effect, device, &mut acquired);

        for handle in acquired {
            if let Err(err) = device.release_scratch(handle) {
                log::error!("{}: failed to release {:?}: {}", self.label, handle, err);
            }
        }

        match result {
            Ok(()) => PassOutcome::Completed,
            Err(err) => {
                log::error!("{}: {}", self.label, err);
                PassOutcome::Skipped(err)
            }
        }
    }

    fn record(
        &self,
        frame: &FrameContext,
        effect: &EffectDescriptor,
        device: &mut dyn RenderDevice,
        acquired: &mut Vec<ScratchHandle>,
    ) -> Result<(), FeatureError> {
        let shader = effect.shader().ok_or_else(|| FeatureError::MissingShader {
            feature: self.label.clone(),
        })?;

        device.bind_parameters(shader, effect.parameters())?;

        let primary = device.acquire_scratch(&frame.descriptor, effect.filter())?;
        acquired.push(primary);

        let mut source = frame.color_target;
        let mut destination = primary.target();
        let mut secondary: Option<TargetId> = None;

        for (i, &stage) in self.stages.iter().enumerate() {
            device.draw_fullscreen(shader, stage, source, destination)?;

            if i + 1 < self.stages.len() {
                // Ping-pong between two scratch buffers for chained stages.
                let next = match secondary {
                    Some(target) => target,
                    None => {
                        let handle = device.acquire_scratch(&frame.descriptor, effect.filter())?;
                        acquired.push(handle);
                        let target = handle.target();
                        secondary = Some(target);
                        target
                    }
                };
                source = destination;
                destination = if next == destination {
                    primary.target()
                } else {
                    next
                };
            }
        }

        match self.copy_back {
            CopyBack::CopyTexture => device.copy_texture(destination, frame.color_target),
            CopyBack::Blit => device.blit(destination, frame.color_target),
        }
    }
}
