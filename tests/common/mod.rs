#![allow(dead_code)]

use canvasfx::prelude::*;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn descriptor(width: u32, height: u32) -> TargetDescriptor {
    TargetDescriptor::new(width, height, ColorFormat::Rgba8Unorm)
}

/// Creates a color target filled with `image` and the frame rendering to it.
pub fn frame_with(device: &mut SoftwareDevice, image: &RgbaImage) -> FrameContext {
    let desc = descriptor(image.width(), image.height());
    let target = device.create_color_target(desc).unwrap();
    device.write_target(target, image).unwrap();
    FrameContext::new(CameraMatrices::default(), target, desc)
}

pub fn opaque_black(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))
}

pub fn random_image(seed: u64, width: u32, height: u32) -> RgbaImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |_, _| {
        image::Rgba([rng.random(), rng.random(), rng.random(), 255])
    })
}

pub fn invert(_: u32, input: &FragmentInput<'_>) -> Color {
    let c = input.source().sample(input.uv);
    Color::new(1.0 - c.r, 1.0 - c.g, 1.0 - c.b, c.a)
}

/// A Kuwahara filter over four square sectors of side `_Radius + 1`.
pub fn kuwahara(_: u32, input: &FragmentInput<'_>) -> Color {
    let radius = input.int("_Radius").max(1) as i64;
    let source = input.source();
    let (x, y) = (input.pixel.0 as i64, input.pixel.1 as i64);

    let mut best = (f32::MAX, source.load(x, y));
    for &(sx, sy) in &[(-1i64, -1i64), (1, -1), (-1, 1), (1, 1)] {
        let mut sum = [0.0f32; 3];
        let mut sum_sq = 0.0f32;
        let mut n = 0.0f32;

        for dy in 0..=radius {
            for dx in 0..=radius {
                let c = source.load(x + sx * dx, y + sy * dy);
                sum[0] += c.r;
                sum[1] += c.g;
                sum[2] += c.b;
                sum_sq += c.r * c.r + c.g * c.g + c.b * c.b;
                n += 1.0;
            }
        }

        let mean = [sum[0] / n, sum[1] / n, sum[2] / n];
        let variance =
            sum_sq / n - (mean[0] * mean[0] + mean[1] * mean[1] + mean[2] * mean[2]);
        if variance < best.0 {
            best = (variance, Color::new(mean[0], mean[1], mean[2], 1.0));
        }
    }

    best.1
}
