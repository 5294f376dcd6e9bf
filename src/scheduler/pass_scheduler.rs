use crate::frame::FrameContext;
use crate::post_processing::RenderFeature;
use crate::scheduler::{InsertionPoint, PassId, PassQueue};

struct Registration {
    feature: Box<dyn RenderFeature>,
    point: InsertionPoint,
}

/// Registers render features and enqueues the ready ones every frame.
#[derive(Default)]
pub struct PassScheduler {
    registrations: Vec<Registration>,
}

impl PassScheduler {
    /// Creates a scheduler without any feature.
    pub fn new() -> PassScheduler {
        PassScheduler::default()
    }

    /// Registers a feature at its insertion point.
    ///
    /// The insertion point is read once here and stays fixed for the session.
    pub fn register(&mut self, feature: Box<dyn RenderFeature>) -> PassId {
        let point = feature.insertion_point();
        let id = PassId(self.registrations.len());
        log::debug!("registered `{}` at {}", feature.name(), point);
        self.registrations.push(Registration { feature, point });
        id
    }

    /// Gives every registered feature a chance to prepare the frame, and enqueues those that
    /// are ready, in registration order. Returns the number of enqueued passes.
    pub fn on_frame(&mut self, frame: &FrameContext, queue: &mut dyn PassQueue) -> usize {
        let mut enqueued = 0;

        for (i, registration) in self.registrations.iter_mut().enumerate() {
            if !registration.feature.prepare_frame(frame) {
                log::trace!("`{}` not ready, skipped", registration.feature.name());
                continue;
            }
            queue.enqueue_pass(PassId(i), registration.point);
            enqueued += 1;
        }

        enqueued
    }

    /// The insertion point a pass was registered at.
    pub fn insertion_point(&self, id: PassId) -> Option<InsertionPoint> {
        self.registrations.get(id.0).map(|r| r.point)
    }

    /// The registered feature behind `id`.
    pub fn feature(&self, id: PassId) -> Option<&dyn RenderFeature> {
        self.registrations.get(id.0).map(|r| &*r.feature)
    }

    /// The registered feature behind `id`, mutably.
    pub fn feature_mut(&mut self, id: PassId) -> Option<&mut (dyn RenderFeature + 'static)> {
        self.registrations.get_mut(id.0).map(|r| &mut *r.feature)
    }

    /// Number of registered features.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether no feature is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
