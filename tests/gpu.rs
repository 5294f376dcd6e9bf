#![cfg(not(target_arch = "wasm32"))]

mod common;

use canvasfx::prelude::*;

const OFFSET_RED: &str = r#"
struct Params {
    v: f32,
};

@group(0) @binding(0)
var source_texture: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;
@group(0) @binding(2)
var<uniform> params: Params;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let c = textureSample(source_texture, source_sampler, in.uv);
    return vec4<f32>(c.r + params.v, c.g, c.b, 1.0);
}
"#;

/// A device on a headless adapter, or `None` on machines without one.
fn headless_device() -> Option<GpuDevice> {
    common::init_logger();
    if !Context::is_initialized() {
        if let Err(err) = Context::init_headless() {
            log::warn!("no wgpu adapter available, skipping: {}", err);
            return None;
        }
    }
    Some(GpuDevice::new())
}

fn black_frame(device: &mut GpuDevice, width: u32, height: u32) -> FrameContext {
    let desc = common::descriptor(width, height);
    let target = device.create_color_target(desc).unwrap();
    device
        .write_target(target, &common::opaque_black(width, height))
        .unwrap();
    FrameContext::new(CameraMatrices::default(), target, desc)
}

fn offset_effect(name: &str, shader: ShaderHandle, v: f32) -> Box<FullScreenEffect> {
    let mut descriptor = EffectDescriptor::new(Some(shader)).at(InsertionPoint::AfterRendering);
    descriptor.set_float("_V", v);
    Box::new(FullScreenEffect::copy_back(name, descriptor))
}

#[test]
fn recorded_draws_keep_the_parameters_they_were_bound_with() {
    let mut device = match headless_device() {
        Some(device) => device,
        None => return,
    };
    let shader = device
        .register_shader(OFFSET_RED, ShaderInterface::new("offset_red").float("_V"))
        .unwrap();
    let frame = black_frame(&mut device, 4, 4);

    let mut renderer = FrameRenderer::new();
    let _ = renderer.register(offset_effect("Quarter", shader, 0.25));
    let _ = renderer.register(offset_effect("Half", shader, 0.5));

    let reports = renderer.render(&[frame], &mut device);
    assert_eq!(reports[0].completed(), 2);
    assert!(reports[0].flush_error.is_none());

    // Both draws were submitted together: each must still see its own offset.
    let out = device.read_target(frame.color_target).unwrap();
    for px in out.pixels() {
        assert!((189..=193).contains(&px[0]), "red is {}", px[0]);
        assert_eq!(&px.0[1..], &[0, 0, 255]);
    }
}

#[test]
fn resized_targets_free_their_scratch_textures() {
    let mut device = match headless_device() {
        Some(device) => device,
        None => return,
    };
    let shader = device
        .register_shader(OFFSET_RED, ShaderInterface::new("offset_red").float("_V"))
        .unwrap();

    let mut renderer = FrameRenderer::new();
    let _ = renderer.register(offset_effect("Offset", shader, 0.1));

    for width in 1..=8 {
        let frame = black_frame(&mut device, width, 2);
        let reports = renderer.render(&[frame], &mut device);
        assert_eq!(reports[0].completed(), 1);
    }

    assert_eq!(device.held_scratch(), 1);
    assert_eq!(device.scratch_stats().evicted, 7);
}

#[test]
fn empty_textures_are_rejected() {
    let mut device = match headless_device() {
        Some(device) => device,
        None => return,
    };
    assert_eq!(
        device.register_texture(&image::RgbaImage::new(0, 0), FilterMode::Bilinear),
        Err(FeatureError::EmptyTexture {
            width: 0,
            height: 0
        })
    );
}
