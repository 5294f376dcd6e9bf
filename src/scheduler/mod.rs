//! Ordered insertion of render feature passes into a frame.

pub use self::insertion_point::InsertionPoint;
pub use self::pass_queue::{FrameQueue, PassId, PassQueue};
pub use self::pass_scheduler::PassScheduler;

mod insertion_point;
mod pass_queue;
mod pass_scheduler;
