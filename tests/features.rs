mod common;

use canvasfx::post_processing::{camera_projector, oil_paint};
use canvasfx::prelude::*;
use image::RgbaImage;

#[test]
fn radius_effect_binds_draws_copies_and_releases() {
    common::init_logger();
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(common::kuwahara);
    let frame = common::frame_with(&mut device, &common::random_image(1, 6, 6));

    let mut descriptor = EffectDescriptor::new(Some(shader));
    descriptor.set_int("_Radius", 3);
    let mut effect = FullScreenEffect::copy_back("Radius", descriptor);

    let outcome = effect.execute(&frame, &mut device);
    assert_eq!(outcome, PassOutcome::Completed);

    let commands = device.take_commands();
    assert_eq!(commands.len(), 5);
    assert_eq!(
        commands[0],
        DeviceCommand::BindParameters {
            shader,
            names: vec!["_Radius".to_string()],
        }
    );
    let scratch = match commands[1] {
        DeviceCommand::AcquireScratch {
            handle,
            descriptor,
            filter,
        } => {
            assert_eq!(descriptor, frame.descriptor);
            assert_eq!(filter, FilterMode::Point);
            handle
        }
        ref other => panic!("expected an acquisition, got {:?}", other),
    };
    assert_eq!(
        &commands[2..],
        &[
            DeviceCommand::Draw {
                shader,
                pass: 0,
                source: frame.color_target,
                destination: scratch.target(),
            },
            DeviceCommand::CopyTexture {
                source: scratch.target(),
                destination: frame.color_target,
            },
            DeviceCommand::ReleaseScratch { handle: scratch },
        ]
    );
    assert_eq!(device.shader_parameters(shader).unwrap().int("_Radius"), Some(3));
}

#[test]
fn executions_from_the_same_input_are_identical() {
    common::init_logger();
    let input = common::random_image(42, 16, 12);
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(common::kuwahara);
    let frame = common::frame_with(&mut device, &input);

    let mut feature = KuwaharaFeature::new(KuwaharaSettings {
        shader: Some(shader),
        radius: 2,
    });

    let mut run = |device: &mut SoftwareDevice| {
        device.write_target(frame.color_target, &input).unwrap();
        assert!(feature.prepare_frame(&frame));
        let pass = feature.pass_mut();
        pass.configure(&frame.descriptor);
        assert!(pass.execute(&frame, device).is_completed());
        device.read_target(frame.color_target).unwrap().clone()
    };

    let first = run(&mut device);
    let second = run(&mut device);
    assert_eq!(first.as_raw(), second.as_raw());
    assert_ne!(first.as_raw(), input.as_raw());
}

#[test]
fn failed_draws_still_release_their_scratch_buffers() {
    common::init_logger();
    let input = common::random_image(7, 4, 4);
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(common::invert);
    device.set_backend_support(shader, false);
    let frame = common::frame_with(&mut device, &input);

    let mut renderer = FrameRenderer::new();
    let _ = renderer.register(Box::new(OilPaintFeature::new(OilPaintSettings::new(Some(
        shader,
    )))));

    let report = renderer.render_camera(&frame, &mut device);
    let record = report.pass(OilPaintFeature::NAME).unwrap();
    assert!(matches!(
        record.outcome,
        PassOutcome::Skipped(FeatureError::ShaderBind { .. })
    ));

    let stats = device.scratch_stats();
    assert_eq!(stats.acquired, 1);
    assert_eq!(stats.released, 1);
    assert_eq!(device.outstanding_scratch(), 0);
    assert_eq!(device.read_target(frame.color_target).unwrap(), &input);
    assert!(!device
        .commands()
        .iter()
        .any(|c| matches!(c, DeviceCommand::CopyTexture { .. })));
}

#[test]
fn unavailable_scratch_buffers_skip_the_pass() {
    common::init_logger();
    let input = common::random_image(9, 4, 4);
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(common::invert);
    let frame = common::frame_with(&mut device, &input);
    let hdr_frame = FrameContext::new(
        frame.camera,
        frame.color_target,
        TargetDescriptor::new(4, 4, ColorFormat::Rgba16Float),
    );

    let mut effect = FullScreenEffect::copy_back("Hdr", EffectDescriptor::new(Some(shader)));
    let outcome = effect.execute(&hdr_frame, &mut device);

    assert!(matches!(
        outcome,
        PassOutcome::Skipped(FeatureError::BufferAcquisition { .. })
    ));
    assert_eq!(device.outstanding_scratch(), 0);
    assert_eq!(device.read_target(frame.color_target).unwrap(), &input);
}

fn contrast(_: u32, input: &FragmentInput<'_>) -> Color {
    let c = input.source().sample(input.uv);
    let k = input.float(oil_paint::names::CONTRAST);
    Color::new(c.r * k, c.g * k, c.b * k, c.a)
}

#[test]
fn grain_is_left_unbound_without_a_bump_map() {
    common::init_logger();
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(contrast);
    let frame = common::frame_with(&mut device, &common::random_image(5, 4, 4));

    let mut settings = OilPaintSettings::new(Some(shader));
    settings.toggles = PaintToggles::CANVAS_GRAIN | PaintToggles::CONTRAST;
    let mut feature = OilPaintFeature::new(settings);

    assert!(feature.prepare_frame(&frame));
    assert!(feature.pass_mut().execute(&frame, &mut device).is_completed());

    let bound = device.shader_parameters(shader).unwrap();
    assert_eq!(bound.float(oil_paint::names::ENABLE_GRAIN), Some(1.0));
    assert_eq!(bound.float(oil_paint::names::ENABLE_OIL_PAINT), Some(0.0));
    for name in &[
        oil_paint::names::BUMP_MAP,
        oil_paint::names::BUMP_TILING,
        oil_paint::names::GRAIN_STRENGTH,
        oil_paint::names::BRUSH_SIZE,
    ] {
        assert!(!bound.contains(name), "{} should not be bound", name);
    }

    // Assigning a bump map between frames binds the grain parameters.
    let bump = device
        .register_texture(common::opaque_black(2, 2), FilterMode::Bilinear)
        .unwrap();
    feature.settings_mut().bump_map = Some(bump);
    assert!(feature.prepare_frame(&frame));
    assert!(feature.pass_mut().execute(&frame, &mut device).is_completed());

    let bound = device.shader_parameters(shader).unwrap();
    assert_eq!(bound.texture(oil_paint::names::BUMP_MAP), Some(bump));
    assert_eq!(bound.float(oil_paint::names::GRAIN_STRENGTH), Some(0.08));
}

fn projected(_: u32, input: &FragmentInput<'_>) -> Color {
    match input.texture(camera_projector::PROJECTOR_TEX) {
        Some(texture) => texture.sample(input.uv),
        None => input.source().sample(input.uv),
    }
}

#[test]
fn projector_without_texture_is_never_enqueued() {
    common::init_logger();
    let input = common::random_image(11, 4, 4);
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(projected);
    let frame = common::frame_with(&mut device, &input);

    let mut renderer = FrameRenderer::new();
    let _ = renderer.register(Box::new(CameraProjectorFeature::new(
        ProjectorSettings::new(Some(shader), None),
    )));

    let report = renderer.render_camera(&frame, &mut device);
    assert!(report.passes.is_empty());
    assert!(device.commands().is_empty());
    assert_eq!(device.read_target(frame.color_target).unwrap(), &input);
}

#[test]
fn projector_blits_the_projected_image_back() {
    common::init_logger();
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(projected);
    let red = device
        .register_texture(
            RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255])),
            FilterMode::Bilinear,
        )
        .unwrap();

    let desc = common::descriptor(4, 4);
    let target = device.create_color_target(desc).unwrap();
    let camera = CameraMatrices::new(
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 20.0),
    );
    let frame = FrameContext::new(camera, target, desc);

    let mut renderer = FrameRenderer::new();
    let _ = renderer.register(Box::new(CameraProjectorFeature::new(
        ProjectorSettings::new(Some(shader), Some(red)),
    )));

    let report = renderer.render_camera(&frame, &mut device);
    assert_eq!(report.completed(), 1);

    let commands = device.commands();
    assert!(commands.iter().any(|c| matches!(
        c,
        DeviceCommand::AcquireScratch {
            filter: FilterMode::Bilinear,
            ..
        }
    )));
    assert!(commands
        .iter()
        .any(|c| matches!(c, DeviceCommand::Blit { destination, .. } if *destination == target)));
    assert!(!commands
        .iter()
        .any(|c| matches!(c, DeviceCommand::CopyTexture { .. })));

    let bound = device.shader_parameters(shader).unwrap();
    assert_eq!(
        bound.matrix(camera_projector::PROJECTOR_VP),
        Some(camera.view_projection(ClipConvention::ZeroToOne))
    );
    assert!(device
        .read_target(target)
        .unwrap()
        .pixels()
        .all(|p| p.0 == [255, 0, 0, 255]));
}

struct TwoStage;

impl CpuShader for TwoStage {
    fn pass_count(&self) -> u32 {
        2
    }

    fn fragment(&self, pass: u32, input: &FragmentInput<'_>) -> Color {
        let c = input.source().sample(input.uv);
        match pass {
            0 => Color::new(1.0, c.g, c.b, c.a),
            _ => Color::new(c.r, 1.0, c.b, c.a),
        }
    }
}

#[test]
fn chained_stages_ping_pong_between_two_scratch_buffers() {
    common::init_logger();
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(TwoStage);
    let frame = common::frame_with(&mut device, &common::opaque_black(3, 3));

    let pass = FullScreenPass::new("TwoStage", CopyBack::CopyTexture).with_stages(&[0, 1]);
    let mut effect = FullScreenEffect::new(EffectDescriptor::new(Some(shader)), pass);
    assert!(effect.execute(&frame, &mut device).is_completed());

    let draws: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::Draw {
                pass,
                source,
                destination,
                ..
            } => Some((*pass, *source, *destination)),
            _ => None,
        })
        .collect();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].1, frame.color_target);
    assert_eq!(draws[1].1, draws[0].2);
    assert_ne!(draws[1].2, draws[0].2);

    assert_eq!(device.outstanding_scratch(), 0);
    assert_eq!(device.scratch_stats().released, 2);
    assert!(device
        .read_target(frame.color_target)
        .unwrap()
        .pixels()
        .all(|p| p.0 == [255, 255, 0, 255]));
}

fn offset_red(_: u32, input: &FragmentInput<'_>) -> Color {
    let c = input.source().sample(input.uv);
    Color::new(c.r + input.float("_V"), c.g, c.b, c.a)
}

#[test]
fn passes_sharing_a_shader_draw_with_their_own_parameters() {
    common::init_logger();
    let mut device = SoftwareDevice::new();
    let shader = device.register_shader(offset_red);
    let frame = common::frame_with(&mut device, &common::opaque_black(4, 4));

    let mut renderer = FrameRenderer::new();
    for &(name, v) in &[("Quarter", 0.25f32), ("Half", 0.5)] {
        let mut descriptor = EffectDescriptor::new(Some(shader)).at(InsertionPoint::AfterRendering);
        descriptor.set_float("_V", v);
        let _ = renderer.register(Box::new(FullScreenEffect::copy_back(name, descriptor)));
    }

    let report = renderer.render_camera(&frame, &mut device);
    assert_eq!(report.names(), vec!["Quarter", "Half"]);
    assert_eq!(report.completed(), 2);

    // Both offsets are applied: 0.25 + 0.5 of full red.
    let out = device.read_target(frame.color_target).unwrap();
    for px in out.pixels() {
        assert!((189..=193).contains(&px[0]), "red is {}", px[0]);
        assert_eq!(&px.0[1..], &[0, 0, 255]);
    }
    assert_eq!(device.shader_parameters(shader).unwrap().float("_V"), Some(0.5));
}
