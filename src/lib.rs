/*!
# canvasfx

Full-screen render features for frame pipelines built on [wgpu](https://wgpu.rs).

A render feature owns an effect shader and its settings. Every frame, for every camera, it
writes its parameters, tells the scheduler whether it is ready, and if so gets a pass inserted
at a fixed point of the frame. The pass draws the effect into a scratch buffer and writes the
result back onto the camera's color target.

Three features are provided:

* a Kuwahara painterly filter ([`KuwaharaFeature`](post_processing::KuwaharaFeature)),
* an oil-paint post-process with grain and grading ([`OilPaintFeature`](post_processing::OilPaintFeature)),
* a camera projector overlaying a texture ([`CameraProjectorFeature`](post_processing::CameraProjectorFeature)).

Any other effect shader can be wrapped in a [`FullScreenEffect`](post_processing::FullScreenEffect).

Passes are recorded on a [`RenderDevice`](device::RenderDevice): either the wgpu backed
[`GpuDevice`](device::GpuDevice), or the [`SoftwareDevice`](device::SoftwareDevice) which shades
on the CPU and records every operation it performs.

```no_run
use canvasfx::prelude::*;

fn kuwahara(_pass: u32, input: &FragmentInput<'_>) -> Color {
    input.source().sample(input.uv)
}

let mut device = SoftwareDevice::new();
let kuwahara = device.register_shader(kuwahara);
let target = device
    .create_color_target(TargetDescriptor::new(640, 480, ColorFormat::Rgba8Unorm))
    .unwrap();

let mut renderer = FrameRenderer::new();
let _ = renderer.register(Box::new(KuwaharaFeature::new(KuwaharaSettings::new(Some(kuwahara)))));

let frame = FrameContext::new(
    CameraMatrices::default(),
    target,
    TargetDescriptor::new(640, 480, ColorFormat::Rgba8Unorm),
);
let report = renderer.render_camera(&frame, &mut device);
assert_eq!(report.completed(), 1);
```

The GPU device needs a global [`Context`](context::Context), created by the host with
`Context::init` or headlessly with `Context::init_headless`.
*/
#![allow(missing_copy_implementations)]
#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

#[cfg(feature = "serde")]
extern crate serde;

pub use glamx;

#[cfg(not(target_arch = "wasm32"))]
#[doc(hidden)]
pub use pollster;

pub mod camera;
pub mod color;
#[cfg(feature = "serde")]
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod frame;
pub mod post_processing;
pub mod renderer;
pub mod resource;
pub mod scheduler;
pub mod shader;

pub mod prelude {
    pub use crate::camera::*;
    pub use crate::color::*;
    #[cfg(feature = "serde")]
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::device::*;
    pub use crate::error::*;
    pub use crate::frame::*;
    pub use crate::post_processing::*;
    pub use crate::renderer::*;
    pub use crate::resource::*;
    pub use crate::scheduler::*;
    pub use crate::shader::*;
    pub use glamx::{Mat4, Vec2, Vec3, Vec4};
}
