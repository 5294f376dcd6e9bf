//! Per-camera frame data handed to render features.

use crate::camera::CameraMatrices;
use crate::resource::{TargetDescriptor, TargetId};

/// Read-only data describing the camera currently being rendered.
///
/// Owned by the host; features only borrow it for the duration of one pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameContext {
    /// Camera view and projection.
    pub camera: CameraMatrices,
    /// The camera's primary color target.
    pub color_target: TargetId,
    /// Resolution and format of `color_target`.
    pub descriptor: TargetDescriptor,
}

impl FrameContext {
    /// Creates a frame context.
    pub fn new(
        camera: CameraMatrices,
        color_target: TargetId,
        descriptor: TargetDescriptor,
    ) -> Self {
        FrameContext {
            camera,
            color_target,
            descriptor,
        }
    }
}
