//! Traits implemented by render features and their passes.

use crate::device::RenderDevice;
use crate::error::FeatureError;
use crate::frame::FrameContext;
use crate::resource::TargetDescriptor;
use crate::scheduler::InsertionPoint;

/// What happened when a pass was executed.
#[derive(Clone, Debug, PartialEq)]
pub enum PassOutcome {
    /// The effect was drawn and copied back onto the color target.
    Completed,
    /// Nothing was written to the color target this frame.
    Skipped(FeatureError),
}

impl PassOutcome {
    /// Whether the pass completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, PassOutcome::Completed)
    }
}

/// A pass the frame renderer can execute.
pub trait RenderPass {
    /// Called before `execute` with the descriptor of the target the pass will run on.
    fn configure(&mut self, _descriptor: &TargetDescriptor) {}

    /// Records the pass for one camera.
    ///
    /// Failures are reported in the returned outcome; the pass never leaves scratch buffers
    /// acquired.
    fn execute(&mut self, frame: &FrameContext, device: &mut dyn RenderDevice) -> PassOutcome;

    /// Called once all the passes of the camera have executed.
    fn cleanup(&mut self, _device: &mut dyn RenderDevice) {}
}

/// A render feature: the settings, effect and pass of one full-screen effect.
pub trait RenderFeature {
    /// A name used in logs and frame reports.
    fn name(&self) -> &str;

    /// Where the pass of this feature runs in the frame.
    fn insertion_point(&self) -> InsertionPoint;

    /// Writes the per-frame parameters of the effect and tells whether the pass must run for
    /// this camera.
    fn prepare_frame(&mut self, frame: &FrameContext) -> bool;

    /// The pass of this feature.
    fn pass_mut(&mut self) -> &mut dyn RenderPass;
}
