use crate::device::RenderDevice;
use crate::error::FeatureError;
use crate::frame::FrameContext;
use crate::post_processing::{PassOutcome, RenderFeature};
use crate::scheduler::{FrameQueue, InsertionPoint, PassId, PassScheduler};

/// What a single pass did during a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PassRecord {
    /// The pass.
    pub id: PassId,
    /// Name of the feature owning the pass.
    pub name: String,
    /// Where the pass ran.
    pub point: InsertionPoint,
    /// The result of its execution.
    pub outcome: PassOutcome,
}

/// The passes executed for one camera, in execution order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Executed passes.
    pub passes: Vec<PassRecord>,
    /// Set if submitting the recorded work failed.
    pub flush_error: Option<FeatureError>,
}

impl FrameReport {
    /// Names of the executed passes, in order.
    pub fn names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name.as_str()).collect()
    }

    /// Number of passes that completed.
    pub fn completed(&self) -> usize {
        self.passes.iter().filter(|p| p.outcome.is_completed()).count()
    }

    /// The record of the first pass named `name`.
    pub fn pass(&self, name: &str) -> Option<&PassRecord> {
        self.passes.iter().find(|p| p.name == name)
    }
}

/// Drives the registered features of a [`PassScheduler`] for every camera of a frame.
///
/// Stands in for the host renderer: it collects the enqueued passes, runs them in insertion
/// order and gives each executed pass its cleanup call.
#[derive(Default)]
pub struct FrameRenderer {
    scheduler: PassScheduler,
    queue: FrameQueue,
}

impl FrameRenderer {
    /// A renderer without any feature.
    pub fn new() -> FrameRenderer {
        FrameRenderer::default()
    }

    /// A renderer executing the features of `scheduler`.
    pub fn with_scheduler(scheduler: PassScheduler) -> FrameRenderer {
        FrameRenderer {
            scheduler,
            queue: FrameQueue::new(),
        }
    }

    /// Registers a feature. See [`PassScheduler::register`].
    pub fn register(&mut self, feature: Box<dyn RenderFeature>) -> PassId {
        self.scheduler.register(feature)
    }

    /// The registered features.
    pub fn scheduler(&self) -> &PassScheduler {
        &self.scheduler
    }

    /// Mutable access to the registered features, e.g. to update their settings between frames.
    pub fn scheduler_mut(&mut self) -> &mut PassScheduler {
        &mut self.scheduler
    }

    /// Renders the passes of one camera onto `frame.color_target`.
    pub fn render_camera(
        &mut self,
        frame: &FrameContext,
        device: &mut dyn RenderDevice,
    ) -> FrameReport {
        let mut report = FrameReport::default();

        self.queue.clear();
        let _ = self.scheduler.on_frame(frame, &mut self.queue);

        for (point, id) in self.queue.drain_ordered() {
            let feature = match self.scheduler.feature_mut(id) {
                Some(feature) => feature,
                None => continue,
            };
            let name = feature.name().to_string();
            let pass = feature.pass_mut();

            pass.configure(&frame.descriptor);
            let outcome = pass.execute(frame, device);

            report.passes.push(PassRecord {
                id,
                name,
                point,
                outcome,
            });
        }

        for record in &report.passes {
            if let Some(feature) = self.scheduler.feature_mut(record.id) {
                feature.pass_mut().cleanup(device);
            }
        }

        if let Err(err) = device.flush() {
            log::error!("failed to submit the frame: {}", err);
            report.flush_error = Some(err);
        }

        report
    }

    /// Renders every camera of a frame, in the given order, then closes the frame.
    pub fn render(
        &mut self,
        frames: &[FrameContext],
        device: &mut dyn RenderDevice,
    ) -> Vec<FrameReport> {
        let mut reports = Vec::with_capacity(frames.len());
        for frame in frames {
            reports.push(self.render_camera(frame, device));
        }
        self.end_frame(device);
        reports
    }

    /// Closes the frame on `device`, letting it free scratch buffers no camera used.
    ///
    /// Hosts driving [`FrameRenderer::render_camera`] themselves call this once per frame,
    /// after the last camera.
    pub fn end_frame(&mut self, device: &mut dyn RenderDevice) {
        device.end_frame();
    }
}
