use crate::scheduler::InsertionPoint;

/// Identifies a pass registered on a [`PassScheduler`](crate::scheduler::PassScheduler).
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassId(pub(crate) usize);

impl PassId {
    /// Registration index of the pass.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The host's ordered per-frame execution list.
pub trait PassQueue {
    /// Schedules `pass` to run at `point` during the current frame.
    fn enqueue_pass(&mut self, pass: PassId, point: InsertionPoint);
}

/// A [`PassQueue`] that orders passes by insertion point, keeping enqueue order among passes
/// sharing a point.
#[derive(Clone, Debug, Default)]
pub struct FrameQueue {
    entries: Vec<(InsertionPoint, PassId)>,
}

impl FrameQueue {
    /// Creates an empty queue.
    pub fn new() -> FrameQueue {
        FrameQueue::default()
    }

    /// Number of enqueued passes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no pass is enqueued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The enqueued passes in execution order.
    pub fn ordered(&self) -> Vec<(InsertionPoint, PassId)> {
        let mut ordered = self.entries.clone();
        // `sort_by_key` is stable.
        ordered.sort_by_key(|(point, _)| point.order());
        ordered
    }

    /// Empties the queue, returning the passes in execution order.
    pub fn drain_ordered(&mut self) -> Vec<(InsertionPoint, PassId)> {
        let ordered = self.ordered();
        self.entries.clear();
        ordered
    }

    /// Removes every enqueued pass.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl PassQueue for FrameQueue {
    fn enqueue_pass(&mut self, pass: PassId, point: InsertionPoint) {
        self.entries.push((point, pass));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_stable_within_a_point() {
        let mut queue = FrameQueue::new();
        queue.enqueue_pass(PassId(2), InsertionPoint::AfterRenderingTransparents);
        queue.enqueue_pass(PassId(0), InsertionPoint::AfterRenderingOpaques);
        queue.enqueue_pass(PassId(1), InsertionPoint::AfterRenderingTransparents);

        let ids: Vec<_> = queue.drain_ordered().into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec![PassId(0), PassId(2), PassId(1)]);
        assert!(queue.is_empty());
    }
}
