//! Host-side loop executing the scheduled passes of each camera.

pub use self::frame_renderer::{FrameRenderer, FrameReport, PassRecord};

mod frame_renderer;
