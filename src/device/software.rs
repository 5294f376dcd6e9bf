//! A CPU render device over `image` buffers.
//!
//! Shaders are Rust implementations of [`CpuShader`], evaluated once per destination pixel.
//! The device is deterministic and records every operation it receives, which makes it the
//! reference device for tests and headless tooling.

use std::collections::HashMap;

use glamx::{Mat4, Vec2};
use image::RgbaImage;

use crate::color::Color;
use crate::device::{DeviceCommand, RenderDevice};
use crate::error::FeatureError;
use crate::resource::{
    Acquired, ColorFormat, FilterMode, ScratchHandle, ScratchKey, ScratchPool, ScratchStats,
    ShaderHandle, TargetDescriptor, TargetId, TextureHandle,
};
use crate::shader::ParameterBlock;

/// Default largest width or height the software device accepts for scratch buffers.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// A shader program evaluated on the CPU.
///
/// Any `Fn(u32, &FragmentInput) -> Color` closure is a single-pass `CpuShader`.
pub trait CpuShader {
    /// Number of passes (sub-programs) of this shader.
    fn pass_count(&self) -> u32 {
        1
    }

    /// Computes the color of one destination pixel for pass `pass`.
    fn fragment(&self, pass: u32, input: &FragmentInput<'_>) -> Color;
}

impl<F> CpuShader for F
where
    F: Fn(u32, &FragmentInput<'_>) -> Color,
{
    fn fragment(&self, pass: u32, input: &FragmentInput<'_>) -> Color {
        self(pass, input)
    }
}

/// An image together with the filter it is sampled with.
#[derive(Copy, Clone)]
pub struct SampledImage<'a> {
    image: &'a RgbaImage,
    filter: FilterMode,
}

impl<'a> SampledImage<'a> {
    /// Width of the image.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the image.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Reads the texel at `(x, y)`, clamped to the image bounds.
    ///
    /// Images reachable from a shader always hold at least one texel: empty targets and
    /// empty textures are rejected when created.
    pub fn load(&self, x: i64, y: i64) -> Color {
        let x = x.clamp(0, self.image.width() as i64 - 1) as u32;
        let y = y.clamp(0, self.image.height() as i64 - 1) as u32;
        decode(self.image.get_pixel(x, y))
    }

    /// Samples the image at normalized coordinates with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> Color {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;

        match self.filter {
            FilterMode::Point => self.load((uv.x * w).floor() as i64, (uv.y * h).floor() as i64),
            FilterMode::Bilinear => {
                let x = uv.x * w - 0.5;
                let y = uv.y * h - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let fx = x - x0;
                let fy = y - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let top = lerp(self.load(x0, y0), self.load(x0 + 1, y0), fx);
                let bottom = lerp(self.load(x0, y0 + 1), self.load(x0 + 1, y0 + 1), fx);
                lerp(top, bottom, fy)
            }
        }
    }
}

/// Everything a [`CpuShader`] can read while shading one pixel.
pub struct FragmentInput<'a> {
    /// Normalized coordinates of the pixel center, origin at the top-left corner.
    pub uv: Vec2,
    /// Integer coordinates of the pixel in the destination.
    pub pixel: (u32, u32),
    /// Size of the destination.
    pub resolution: (u32, u32),
    source: SampledImage<'a>,
    parameters: &'a ParameterBlock,
    textures: &'a HashMap<TextureHandle, SoftTexture>,
}

impl<'a> FragmentInput<'a> {
    /// The image the pass reads from.
    pub fn source(&self) -> SampledImage<'a> {
        self.source
    }

    /// The parameter block bound to the shader.
    pub fn parameters(&self) -> &'a ParameterBlock {
        self.parameters
    }

    /// A float parameter, `0.0` when unbound.
    pub fn float(&self, name: &str) -> f32 {
        self.parameters.float(name).unwrap_or(0.0)
    }

    /// An integer parameter, `0` when unbound.
    pub fn int(&self, name: &str) -> i32 {
        self.parameters.int(name).unwrap_or(0)
    }

    /// A matrix parameter, identity when unbound.
    pub fn matrix(&self, name: &str) -> Mat4 {
        self.parameters.matrix(name).unwrap_or(Mat4::IDENTITY)
    }

    /// The texture bound to `name`, if any.
    pub fn texture(&self, name: &str) -> Option<SampledImage<'a>> {
        let handle = self.parameters.texture(name)?;
        self.textures.get(&handle).map(|t| SampledImage {
            image: &t.image,
            filter: t.filter,
        })
    }
}

struct SoftShader {
    program: Box<dyn CpuShader>,
    parameters: ParameterBlock,
    supported: bool,
}

struct SoftTexture {
    image: RgbaImage,
    filter: FilterMode,
}

struct SoftTarget {
    image: RgbaImage,
    descriptor: TargetDescriptor,
    filter: FilterMode,
}

impl SoftTarget {
    fn new(descriptor: TargetDescriptor, filter: FilterMode) -> Self {
        SoftTarget {
            image: RgbaImage::new(descriptor.width, descriptor.height),
            descriptor,
            filter,
        }
    }

    fn sampled(&self) -> SampledImage<'_> {
        SampledImage {
            image: &self.image,
            filter: self.filter,
        }
    }
}

/// A deterministic render device that shades on the CPU.
pub struct SoftwareDevice {
    shaders: HashMap<ShaderHandle, SoftShader>,
    textures: HashMap<TextureHandle, SoftTexture>,
    colors: HashMap<u32, SoftTarget>,
    scratch: HashMap<ScratchHandle, SoftTarget>,
    pool: ScratchPool,
    next_shader: u32,
    next_texture: u32,
    next_color: u32,
    max_dimension: u32,
    commands: Vec<DeviceCommand>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// Creates an empty software device.
    pub fn new() -> SoftwareDevice {
        SoftwareDevice {
            shaders: HashMap::new(),
            textures: HashMap::new(),
            colors: HashMap::new(),
            scratch: HashMap::new(),
            pool: ScratchPool::new(),
            next_shader: 0,
            next_texture: 0,
            next_color: 0,
            max_dimension: DEFAULT_MAX_DIMENSION,
            commands: Vec::new(),
        }
    }

    /// Sets the largest scratch width or height the device accepts.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Registers a shader program.
    pub fn register_shader<S: CpuShader + 'static>(&mut self, shader: S) -> ShaderHandle {
        let handle = ShaderHandle(self.next_shader);
        self.next_shader += 1;
        let _ = self.shaders.insert(
            handle,
            SoftShader {
                program: Box::new(shader),
                parameters: ParameterBlock::new(),
                supported: true,
            },
        );
        handle
    }

    /// Marks a shader as having (or lacking) a program for this device.
    ///
    /// Draws with an unsupported shader fail with [`FeatureError::ShaderBind`].
    pub fn set_backend_support(&mut self, shader: ShaderHandle, supported: bool) {
        if let Some(s) = self.shaders.get_mut(&shader) {
            s.supported = supported;
        }
    }

    /// Registers a texture asset. Empty images are rejected.
    pub fn register_texture(
        &mut self,
        image: RgbaImage,
        filter: FilterMode,
    ) -> Result<TextureHandle, FeatureError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FeatureError::EmptyTexture { width, height });
        }

        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        let _ = self
            .textures
            .insert(handle, SoftTexture { image, filter });
        Ok(handle)
    }

    /// Creates a host-owned color target, cleared to transparent black.
    pub fn create_color_target(
        &mut self,
        descriptor: TargetDescriptor,
    ) -> Result<TargetId, FeatureError> {
        self.check_descriptor(&descriptor)?;
        let id = self.next_color;
        self.next_color += 1;
        let _ = self
            .colors
            .insert(id, SoftTarget::new(descriptor, FilterMode::Bilinear));
        Ok(TargetId::Color(id))
    }

    /// Overwrites the contents of a target.
    pub fn write_target(&mut self, target: TargetId, image: &RgbaImage) -> Result<(), FeatureError> {
        let t = self.target_mut(target)?;
        if image.dimensions() != (t.descriptor.width, t.descriptor.height) {
            return Err(FeatureError::buffer_acquisition(
                &t.descriptor,
                "image size does not match the target",
            ));
        }
        t.image = image.clone();
        Ok(())
    }

    /// The current contents of a target.
    pub fn read_target(&self, target: TargetId) -> Option<&RgbaImage> {
        self.target(target).ok().map(|t| &t.image)
    }

    /// The parameter block last bound to `shader`.
    pub fn shader_parameters(&self, shader: ShaderHandle) -> Option<&ParameterBlock> {
        self.shaders.get(&shader).map(|s| &s.parameters)
    }

    /// The operations recorded so far.
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Returns and clears the recorded operations.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Scratch pool counters.
    pub fn scratch_stats(&self) -> ScratchStats {
        self.pool.stats()
    }

    /// Number of scratch buffers currently acquired.
    pub fn outstanding_scratch(&self) -> usize {
        self.pool.outstanding()
    }

    /// Number of scratch images currently allocated, acquired or free.
    pub fn held_scratch(&self) -> usize {
        self.pool.held()
    }

    fn check_descriptor(&self, descriptor: &TargetDescriptor) -> Result<(), FeatureError> {
        if descriptor.is_empty() {
            return Err(FeatureError::buffer_acquisition(descriptor, "zero-sized target"));
        }
        if descriptor.width > self.max_dimension || descriptor.height > self.max_dimension {
            return Err(FeatureError::buffer_acquisition(
                descriptor,
                format!("exceeds the {} pixel limit", self.max_dimension),
            ));
        }
        if descriptor.format == ColorFormat::Rgba16Float {
            return Err(FeatureError::buffer_acquisition(
                descriptor,
                "format not supported by the software device",
            ));
        }
        Ok(())
    }

    fn target(&self, id: TargetId) -> Result<&SoftTarget, FeatureError> {
        let target = match id {
            TargetId::Color(i) => self.colors.get(&i),
            TargetId::Scratch(h) if self.pool.is_live(h) => self.scratch.get(&h),
            TargetId::Scratch(_) => None,
        };
        target.ok_or(FeatureError::UnknownTarget(id))
    }

    fn target_mut(&mut self, id: TargetId) -> Result<&mut SoftTarget, FeatureError> {
        let target = match id {
            TargetId::Color(i) => self.colors.get_mut(&i),
            TargetId::Scratch(h) if self.pool.is_live(h) => self.scratch.get_mut(&h),
            TargetId::Scratch(_) => None,
        };
        target.ok_or(FeatureError::UnknownTarget(id))
    }
}

impl RenderDevice for SoftwareDevice {
    fn bind_parameters(
        &mut self,
        shader: ShaderHandle,
        parameters: &ParameterBlock,
    ) -> Result<(), FeatureError> {
        let s = self
            .shaders
            .get_mut(&shader)
            .ok_or(FeatureError::UnknownShader(shader))?;
        s.parameters.merge(parameters);
        self.commands.push(DeviceCommand::BindParameters {
            shader,
            names: parameters.names(),
        });
        Ok(())
    }

    fn acquire_scratch(
        &mut self,
        descriptor: &TargetDescriptor,
        filter: FilterMode,
    ) -> Result<ScratchHandle, FeatureError> {
        self.check_descriptor(descriptor)?;

        let key = ScratchKey {
            descriptor: *descriptor,
            filter,
        };
        let handle = match self.pool.acquire(key) {
            Acquired::Fresh(handle) => {
                let _ = self
                    .scratch
                    .insert(handle, SoftTarget::new(*descriptor, filter));
                handle
            }
            Acquired::Reused(handle) => handle,
        };

        self.commands.push(DeviceCommand::AcquireScratch {
            handle,
            descriptor: *descriptor,
            filter,
        });
        Ok(handle)
    }

    fn release_scratch(&mut self, handle: ScratchHandle) -> Result<(), FeatureError> {
        let _ = self.pool.release(handle)?;
        self.commands.push(DeviceCommand::ReleaseScratch { handle });
        Ok(())
    }

    fn draw_fullscreen(
        &mut self,
        shader: ShaderHandle,
        pass: u32,
        source: TargetId,
        destination: TargetId,
    ) -> Result<(), FeatureError> {
        if source == destination {
            return Err(FeatureError::Aliasing(destination));
        }

        let program = self
            .shaders
            .get(&shader)
            .ok_or(FeatureError::UnknownShader(shader))?;
        if !program.supported {
            return Err(FeatureError::ShaderBind {
                shader,
                pass,
                reason: "no program for the software backend".to_string(),
            });
        }
        let pass_count = program.program.pass_count();
        if pass >= pass_count {
            return Err(FeatureError::ShaderBind {
                shader,
                pass,
                reason: format!("shader only has {} pass(es)", pass_count),
            });
        }

        let output = {
            let src = self.target(source)?.sampled();
            let dst = self.target(destination)?.descriptor;
            let (w, h) = (dst.width, dst.height);
            let mut output = RgbaImage::new(w, h);

            for (x, y, px) in output.enumerate_pixels_mut() {
                let input = FragmentInput {
                    uv: Vec2::new((x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32),
                    pixel: (x, y),
                    resolution: (w, h),
                    source: src,
                    parameters: &program.parameters,
                    textures: &self.textures,
                };
                *px = encode(program.program.fragment(pass, &input));
            }

            output
        };

        self.target_mut(destination)?.image = output;
        self.commands.push(DeviceCommand::Draw {
            shader,
            pass,
            source,
            destination,
        });
        Ok(())
    }

    fn blit(&mut self, source: TargetId, destination: TargetId) -> Result<(), FeatureError> {
        if source == destination {
            return Err(FeatureError::Aliasing(destination));
        }

        let output = {
            let src = self.target(source)?;
            let dst = self.target(destination)?.descriptor;

            if src.image.dimensions() == (dst.width, dst.height) {
                src.image.clone()
            } else {
                let sampled = src.sampled();
                let (w, h) = (dst.width as f32, dst.height as f32);
                RgbaImage::from_fn(dst.width, dst.height, |x, y| {
                    encode(sampled.sample(Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h)))
                })
            }
        };

        self.target_mut(destination)?.image = output;
        self.commands.push(DeviceCommand::Blit {
            source,
            destination,
        });
        Ok(())
    }

    fn copy_texture(
        &mut self,
        source: TargetId,
        destination: TargetId,
    ) -> Result<(), FeatureError> {
        if source == destination {
            return Err(FeatureError::Aliasing(destination));
        }

        let output = {
            let src = self.target(source)?;
            let dst = self.target(destination)?;
            if src.descriptor != dst.descriptor {
                return Err(FeatureError::CopyMismatch {
                    from: source,
                    to: destination,
                });
            }
            src.image.clone()
        };

        self.target_mut(destination)?.image = output;
        self.commands.push(DeviceCommand::CopyTexture {
            source,
            destination,
        });
        Ok(())
    }

    fn end_frame(&mut self) {
        for handle in self.pool.end_frame() {
            let _ = self.scratch.remove(&handle);
        }
    }
}

fn lerp(a: Color, b: Color, t: f32) -> Color {
    Color::new(
        a.r + (b.r - a.r) * t,
        a.g + (b.g - a.g) * t,
        a.b + (b.b - a.b) * t,
        a.a + (b.a - a.a) * t,
    )
}

fn decode(px: &image::Rgba<u8>) -> Color {
    let [r, g, b, a] = px.0;
    Color::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    )
}

fn encode(c: Color) -> image::Rgba<u8> {
    fn channel(v: f32) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
    image::Rgba([channel(c.r), channel(c.g), channel(c.b), channel(c.a)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(w: u32, h: u32) -> TargetDescriptor {
        TargetDescriptor::new(w, h, ColorFormat::Rgba8Unorm)
    }

    fn invert(_: u32, input: &FragmentInput<'_>) -> Color {
        let c = input.source().sample(input.uv);
        Color::new(1.0 - c.r, 1.0 - c.g, 1.0 - c.b, c.a)
    }

    #[test]
    fn draw_shades_every_destination_pixel() {
        let mut device = SoftwareDevice::new();
        let shader = device.register_shader(invert);
        let color = device.create_color_target(desc(2, 2)).unwrap();
        device
            .write_target(color, &RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 10, 255])))
            .unwrap();

        let scratch = device.acquire_scratch(&desc(2, 2), FilterMode::Point).unwrap();
        device
            .draw_fullscreen(shader, 0, color, scratch.target())
            .unwrap();

        let out = device.read_target(scratch.target()).unwrap();
        assert_eq!(out.get_pixel(1, 1).0, [0, 255, 245, 255]);
    }

    #[test]
    fn aliased_operations_are_rejected() {
        let mut device = SoftwareDevice::new();
        let shader = device.register_shader(invert);
        let color = device.create_color_target(desc(2, 2)).unwrap();

        assert_eq!(
            device.draw_fullscreen(shader, 0, color, color),
            Err(FeatureError::Aliasing(color))
        );
        assert_eq!(device.copy_texture(color, color), Err(FeatureError::Aliasing(color)));
        assert!(device.commands().is_empty());
    }

    #[test]
    fn copies_require_identical_descriptors() {
        let mut device = SoftwareDevice::new();
        let color = device.create_color_target(desc(4, 4)).unwrap();
        let scratch = device.acquire_scratch(&desc(2, 2), FilterMode::Point).unwrap();

        assert!(matches!(
            device.copy_texture(scratch.target(), color),
            Err(FeatureError::CopyMismatch { .. })
        ));
        assert!(device.blit(scratch.target(), color).is_ok());
    }

    #[test]
    fn unsupported_scratch_requests_fail() {
        let mut device = SoftwareDevice::new().with_max_dimension(64);
        let hdr = TargetDescriptor::new(8, 8, ColorFormat::Rgba16Float);

        assert!(matches!(
            device.acquire_scratch(&hdr, FilterMode::Point),
            Err(FeatureError::BufferAcquisition { .. })
        ));
        assert!(device.acquire_scratch(&desc(128, 8), FilterMode::Point).is_err());
        assert!(device.acquire_scratch(&desc(0, 8), FilterMode::Point).is_err());
        assert_eq!(device.outstanding_scratch(), 0);
    }

    #[test]
    fn released_scratch_targets_are_no_longer_addressable() {
        let mut device = SoftwareDevice::new();
        let color = device.create_color_target(desc(2, 2)).unwrap();
        let scratch = device.acquire_scratch(&desc(2, 2), FilterMode::Point).unwrap();
        device.release_scratch(scratch).unwrap();

        assert_eq!(
            device.copy_texture(scratch.target(), color),
            Err(FeatureError::UnknownTarget(scratch.target()))
        );
        assert_eq!(
            device.release_scratch(scratch),
            Err(FeatureError::UnknownScratch(scratch))
        );
    }

    #[test]
    fn empty_textures_are_rejected() {
        let mut device = SoftwareDevice::new();
        assert_eq!(
            device.register_texture(RgbaImage::new(0, 0), FilterMode::Bilinear),
            Err(FeatureError::EmptyTexture {
                width: 0,
                height: 0
            })
        );
        assert!(device
            .register_texture(RgbaImage::new(3, 0), FilterMode::Point)
            .is_err());

        // Rejected images do not consume a handle.
        let handle = device
            .register_texture(RgbaImage::new(1, 1), FilterMode::Point)
            .unwrap();
        assert_eq!(handle, TextureHandle(0));
    }

    #[test]
    fn resized_scratch_buffers_are_freed_at_the_end_of_the_next_frame() {
        let mut device = SoftwareDevice::new();

        for width in 1..=50 {
            let scratch = device
                .acquire_scratch(&desc(width, 4), FilterMode::Point)
                .unwrap();
            device.release_scratch(scratch).unwrap();
            device.end_frame();
            assert!(device.held_scratch() <= 2);
        }

        assert_eq!(device.held_scratch(), 1);
        assert_eq!(device.scratch.len(), 1);
        assert_eq!(device.scratch_stats().evicted, 49);
    }

    #[test]
    fn bilinear_sampling_blends_neighbours() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, image::Rgba([255, 255, 255, 255]));

        let point = SampledImage {
            image: &image,
            filter: FilterMode::Point,
        };
        let bilinear = SampledImage {
            image: &image,
            filter: FilterMode::Bilinear,
        };
        let middle = Vec2::new(0.5, 0.5);

        assert_eq!(point.sample(middle).r, 1.0);
        assert!((bilinear.sample(middle).r - 0.5).abs() < 1.0e-6);
    }
}
