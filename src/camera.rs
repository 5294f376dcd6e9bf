//! Camera matrices supplied with each frame.

use glamx::{Mat4, Vec4};

/// Depth range convention of the clip space a projection matrix targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClipConvention {
    /// OpenGL style clip space, depth in [-1, 1].
    OpenGl,
    /// wgpu/Vulkan/Metal/D3D style clip space, depth in [0, 1].
    #[default]
    ZeroToOne,
}

/// View and projection matrices of the camera being rendered.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraMatrices {
    /// World to camera transform.
    pub view: Mat4,
    /// Camera projection, in OpenGL convention (as produced by `Mat4::perspective_rh_gl`).
    pub projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        CameraMatrices {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl CameraMatrices {
    /// Creates camera matrices.
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        CameraMatrices { view, projection }
    }

    /// The world to clip transform for the given clip convention.
    pub fn view_projection(&self, convention: ClipConvention) -> Mat4 {
        gpu_projection(self.projection, convention) * self.view
    }
}

/// Converts an OpenGL style projection matrix to the clip space of the target backend.
///
/// For [`ClipConvention::ZeroToOne`], depth is remapped with `z' = 0.5 * z + 0.5 * w`.
pub fn gpu_projection(projection: Mat4, convention: ClipConvention) -> Mat4 {
    match convention {
        ClipConvention::OpenGl => projection,
        ClipConvention::ZeroToOne => {
            let remap = Mat4::from_cols(
                Vec4::new(1.0, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 1.0, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 0.5, 0.0),
                Vec4::new(0.0, 0.0, 0.5, 1.0),
            );
            remap * projection
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::Vec3;

    #[test]
    fn zero_to_one_maps_the_depth_range() {
        let proj = Mat4::perspective_rh_gl(1.0, 1.5, 0.1, 100.0);
        let gpu = gpu_projection(proj, ClipConvention::ZeroToOne);

        let near = gpu * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = gpu * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1.0e-4);
        assert!((far.z / far.w - 1.0).abs() < 1.0e-4);
    }

    #[test]
    fn opengl_convention_is_unchanged() {
        let camera = CameraMatrices::new(
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 10.0),
        );
        assert_eq!(
            camera.view_projection(ClipConvention::OpenGl),
            camera.projection * camera.view
        );
    }
}
