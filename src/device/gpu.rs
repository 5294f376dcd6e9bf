//! A wgpu render device.
//!
//! Every effect shader is a WGSL module whose inputs are described by a
//! [`ShaderInterface`]. Draws are recorded into one command encoder that is submitted on
//! [`RenderDevice::flush`]. Each draw gets its own uniform buffer holding the parameters bound
//! when it was recorded.

use std::collections::HashMap;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;

use crate::context::Context;
use crate::device::RenderDevice;
use crate::error::FeatureError;
use crate::resource::{
    Acquired, ColorFormat, FilterMode, ScratchHandle, ScratchKey, ScratchPool, ScratchStats,
    ShaderHandle, TargetDescriptor, TargetId, TextureHandle,
};
use crate::shader::{ParameterBlock, ShaderInterface};

/// Vertex data for full-screen quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
}

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

fn quad_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

fn create_fullscreen_pipeline(
    ctxt: &Context,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    ctxt.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("vs_main"),
            buffers: &[quad_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn frame_encoder<'a>(
    slot: &'a mut Option<wgpu::CommandEncoder>,
    ctxt: &Context,
) -> &'a mut wgpu::CommandEncoder {
    slot.get_or_insert_with(|| ctxt.create_command_encoder(Some("canvasfx_frame_encoder")))
}

fn draw_quad(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    destination: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    quad: &wgpu::Buffer,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: destination,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, bind_group, &[]);
    render_pass.set_vertex_buffer(0, quad.slice(..));
    render_pass.draw(0..4, 0..1);
}

struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    descriptor: TargetDescriptor,
    filter: FilterMode,
}

impl GpuTarget {
    fn new(ctxt: &Context, label: &str, descriptor: TargetDescriptor, filter: FilterMode) -> Self {
        let texture = ctxt.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: descriptor.format.into(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        GpuTarget {
            texture,
            view,
            descriptor,
            filter,
        }
    }
}

struct GpuTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    filter: FilterMode,
}

impl GpuTexture {
    fn upload(ctxt: &Context, label: &str, image: &RgbaImage, filter: FilterMode) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = ctxt.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctxt.write_texture(
            texture.as_image_copy(),
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTexture {
            texture,
            view,
            filter,
        }
    }
}

struct GpuShader {
    interface: ShaderInterface,
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(u32, wgpu::TextureFormat), wgpu::RenderPipeline>,
    parameters: ParameterBlock,
}

fn lookup<'a>(
    colors: &'a HashMap<u32, GpuTarget>,
    scratch: &'a HashMap<ScratchHandle, GpuTarget>,
    pool: &ScratchPool,
    id: TargetId,
) -> Result<&'a GpuTarget, FeatureError> {
    let target = match id {
        TargetId::Color(i) => colors.get(&i),
        TargetId::Scratch(h) if pool.is_live(h) => scratch.get(&h),
        TargetId::Scratch(_) => None,
    };
    target.ok_or(FeatureError::UnknownTarget(id))
}

/// A render device backed by the global wgpu [`Context`].
pub struct GpuDevice {
    ctxt: Context,
    quad: wgpu::Buffer,
    vertex_module: wgpu::ShaderModule,
    blit_layout: wgpu::BindGroupLayout,
    blit_pipeline_layout: wgpu::PipelineLayout,
    blit_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    point_sampler: wgpu::Sampler,
    bilinear_sampler: wgpu::Sampler,
    default_texture: GpuTexture,
    shaders: HashMap<ShaderHandle, GpuShader>,
    textures: HashMap<TextureHandle, GpuTexture>,
    colors: HashMap<u32, GpuTarget>,
    scratch: HashMap<ScratchHandle, GpuTarget>,
    pool: ScratchPool,
    encoder: Option<wgpu::CommandEncoder>,
    next_shader: u32,
    next_texture: u32,
    next_color: u32,
}

impl Default for GpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice {
    /// Creates a device on the global wgpu context.
    ///
    /// # Panics
    /// Panics if the context has not been initialized.
    pub fn new() -> GpuDevice {
        let ctxt = Context::get();

        let vertex_module = ctxt.create_shader_module(
            Some("canvasfx_fullscreen_shader"),
            include_str!("../builtin/fullscreen.wgsl"),
        );

        let blit_layout = ctxt.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("canvasfx_blit_bind_group_layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let blit_pipeline_layout = ctxt.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("canvasfx_blit_pipeline_layout"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });

        let vertices = [
            QuadVertex {
                position: [-1.0, -1.0],
            },
            QuadVertex {
                position: [1.0, -1.0],
            },
            QuadVertex {
                position: [-1.0, 1.0],
            },
            QuadVertex {
                position: [1.0, 1.0],
            },
        ];
        let quad = ctxt.create_buffer_init(
            Some("canvasfx_quad_vertex_buffer"),
            bytemuck::cast_slice(&vertices),
            wgpu::BufferUsages::VERTEX,
        );

        // Texture slots without a texture sample opaque white.
        let default_texture = GpuTexture::upload(
            &ctxt,
            "canvasfx_default_texture",
            &RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])),
            FilterMode::Bilinear,
        );

        let point_sampler =
            ctxt.create_sampler(Some("canvasfx_point_sampler"), FilterMode::Point.into());
        let bilinear_sampler =
            ctxt.create_sampler(Some("canvasfx_bilinear_sampler"), FilterMode::Bilinear.into());

        GpuDevice {
            ctxt,
            quad,
            vertex_module,
            blit_layout,
            blit_pipeline_layout,
            blit_pipelines: HashMap::new(),
            point_sampler,
            bilinear_sampler,
            default_texture,
            shaders: HashMap::new(),
            textures: HashMap::new(),
            colors: HashMap::new(),
            scratch: HashMap::new(),
            pool: ScratchPool::new(),
            encoder: None,
            next_shader: 0,
            next_texture: 0,
            next_color: 0,
        }
    }

    /// Compiles a WGSL effect shader.
    ///
    /// Pipelines are created lazily, per pass and destination format, on the first draw.
    pub fn register_shader(
        &mut self,
        source: &str,
        interface: ShaderInterface,
    ) -> Result<ShaderHandle, FeatureError> {
        let label = interface.label.clone();
        let module = self
            .ctxt
            .validated(|ctxt| ctxt.create_shader_module(Some(&label), source))
            .map_err(FeatureError::Gpu)?;

        let mut entries = vec![
            texture_entry(0),
            sampler_entry(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ];
        for i in 0..interface.textures.len() as u32 {
            entries.push(texture_entry(3 + 2 * i));
            entries.push(sampler_entry(4 + 2 * i));
        }

        let bind_group_layout = self
            .ctxt
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{}_bind_group_layout", label)),
                entries: &entries,
            });
        let pipeline_layout = self
            .ctxt
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{}_pipeline_layout", label)),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let handle = ShaderHandle(self.next_shader);
        self.next_shader += 1;
        let _ = self.shaders.insert(
            handle,
            GpuShader {
                interface,
                module,
                bind_group_layout,
                pipeline_layout,
                pipelines: HashMap::new(),
                parameters: ParameterBlock::new(),
            },
        );
        Ok(handle)
    }

    /// Uploads a texture asset. Empty images are rejected.
    pub fn register_texture(
        &mut self,
        image: &RgbaImage,
        filter: FilterMode,
    ) -> Result<TextureHandle, FeatureError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FeatureError::EmptyTexture { width, height });
        }

        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        let texture = GpuTexture::upload(&self.ctxt, "canvasfx_texture", image, filter);
        let _ = self.textures.insert(handle, texture);
        Ok(handle)
    }

    /// Creates a host-owned color target.
    pub fn create_color_target(
        &mut self,
        descriptor: TargetDescriptor,
    ) -> Result<TargetId, FeatureError> {
        self.check_descriptor(&descriptor)?;
        let id = self.next_color;
        self.next_color += 1;
        let target = GpuTarget::new(
            &self.ctxt,
            "canvasfx_color_target",
            descriptor,
            FilterMode::Bilinear,
        );
        let _ = self.colors.insert(id, target);
        Ok(TargetId::Color(id))
    }

    /// Uploads `image` into an 8-bit color target.
    pub fn write_target(&mut self, target: TargetId, image: &RgbaImage) -> Result<(), FeatureError> {
        let t = lookup(&self.colors, &self.scratch, &self.pool, target)?;
        let desc = t.descriptor;
        if image.dimensions() != (desc.width, desc.height) {
            return Err(FeatureError::buffer_acquisition(
                &desc,
                "image size does not match the target",
            ));
        }

        let data = match desc.format {
            ColorFormat::Rgba8Unorm | ColorFormat::Rgba8UnormSrgb => image.as_raw().clone(),
            ColorFormat::Bgra8Unorm | ColorFormat::Bgra8UnormSrgb => image
                .as_raw()
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0], px[3]])
                .collect(),
            ColorFormat::Rgba16Float => {
                return Err(FeatureError::buffer_acquisition(
                    &desc,
                    "8-bit uploads only",
                ))
            }
        };

        self.ctxt.write_texture(
            t.texture.as_image_copy(),
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * desc.format.bytes_per_pixel()),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Reads an 8-bit target back into an RGBA image.
    ///
    /// Recorded commands are submitted first, so this waits for every pending draw.
    pub fn read_target(&mut self, target: TargetId) -> Result<RgbaImage, FeatureError> {
        self.flush()?;

        let t = lookup(&self.colors, &self.scratch, &self.pool, target)?;
        let desc = t.descriptor;
        let swizzle = match desc.format {
            ColorFormat::Rgba8Unorm | ColorFormat::Rgba8UnormSrgb => false,
            ColorFormat::Bgra8Unorm | ColorFormat::Bgra8UnormSrgb => true,
            ColorFormat::Rgba16Float => {
                return Err(FeatureError::buffer_acquisition(
                    &desc,
                    "8-bit readback only",
                ))
            }
        };

        // Rows of a texture-to-buffer copy must be aligned.
        let unpadded_bytes_per_row = desc.width * desc.format.bytes_per_pixel();
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let staging_buffer = self.ctxt.create_buffer_simple(
            Some("canvasfx_readback_buffer"),
            (padded_bytes_per_row * desc.height) as u64,
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        );

        let mut encoder = self
            .ctxt
            .create_command_encoder(Some("canvasfx_readback_encoder"));
        encoder.copy_texture_to_buffer(
            t.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(desc.height),
                },
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctxt.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.ctxt.device.poll(wgpu::PollType::wait_indefinitely());

        rx.recv()
            .map_err(|e| FeatureError::Gpu(e.to_string()))?
            .map_err(|e| FeatureError::Gpu(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * desc.height) as usize);
        {
            let data = buffer_slice.get_mapped_range();
            for row in data.chunks(padded_bytes_per_row as usize) {
                let row = &row[..unpadded_bytes_per_row as usize];
                if swizzle {
                    pixels.extend(row.chunks_exact(4).flat_map(|px| [px[2], px[1], px[0], px[3]]));
                } else {
                    pixels.extend_from_slice(row);
                }
            }
        }
        staging_buffer.unmap();

        RgbaImage::from_raw(desc.width, desc.height, pixels)
            .ok_or_else(|| FeatureError::Gpu("readback size mismatch".to_string()))
    }

    /// The wgpu texture behind a target, e.g. to render the scene into it or present it.
    pub fn color_texture(&self, target: TargetId) -> Option<&wgpu::Texture> {
        lookup(&self.colors, &self.scratch, &self.pool, target)
            .ok()
            .map(|t| &t.texture)
    }

    /// The parameter block last bound to `shader`.
    pub fn shader_parameters(&self, shader: ShaderHandle) -> Option<&ParameterBlock> {
        self.shaders.get(&shader).map(|s| &s.parameters)
    }

    /// Scratch pool counters.
    pub fn scratch_stats(&self) -> ScratchStats {
        self.pool.stats()
    }

    /// Number of scratch textures currently allocated.
    pub fn held_scratch(&self) -> usize {
        self.pool.held()
    }

    fn check_descriptor(&self, descriptor: &TargetDescriptor) -> Result<(), FeatureError> {
        if descriptor.is_empty() {
            return Err(FeatureError::buffer_acquisition(descriptor, "zero-sized target"));
        }

        let max = self.ctxt.device.limits().max_texture_dimension_2d;
        if descriptor.width > max || descriptor.height > max {
            return Err(FeatureError::buffer_acquisition(
                descriptor,
                format!("exceeds the {} pixel device limit", max),
            ));
        }

        let features = self
            .ctxt
            .adapter
            .get_texture_format_features(descriptor.format.into());
        let needed = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        if !features.allowed_usages.contains(needed) {
            return Err(FeatureError::buffer_acquisition(
                descriptor,
                "format cannot be rendered to and sampled on this adapter",
            ));
        }
        Ok(())
    }

    fn ensure_pipeline(
        &mut self,
        shader: ShaderHandle,
        pass: u32,
        format: wgpu::TextureFormat,
    ) -> Result<(), FeatureError> {
        let ctxt = &self.ctxt;
        let vertex_module = &self.vertex_module;
        let program = self
            .shaders
            .get_mut(&shader)
            .ok_or(FeatureError::UnknownShader(shader))?;

        let pass_count = program.interface.pass_count();
        if pass >= pass_count {
            return Err(FeatureError::ShaderBind {
                shader,
                pass,
                reason: format!("shader only has {} pass(es)", pass_count),
            });
        }
        if program.pipelines.contains_key(&(pass, format)) {
            return Ok(());
        }

        let label = format!("{}_pass{}_pipeline", program.interface.label, pass);
        let entry = &program.interface.fragment_entries[pass as usize];
        let layout = &program.pipeline_layout;
        let module = &program.module;
        let pipeline = ctxt
            .validated(|ctxt| {
                create_fullscreen_pipeline(ctxt, &label, layout, vertex_module, module, entry, format)
            })
            .map_err(|reason| FeatureError::ShaderBind {
                shader,
                pass,
                reason,
            })?;

        let _ = program.pipelines.insert((pass, format), pipeline);
        Ok(())
    }

    fn ensure_blit_pipeline(&mut self, format: wgpu::TextureFormat) {
        if self.blit_pipelines.contains_key(&format) {
            return;
        }
        let pipeline = create_fullscreen_pipeline(
            &self.ctxt,
            "canvasfx_blit_pipeline",
            &self.blit_pipeline_layout,
            &self.vertex_module,
            &self.vertex_module,
            "fs_blit",
            format,
        );
        let _ = self.blit_pipelines.insert(format, pipeline);
    }

    fn sampler(&self, filter: FilterMode) -> &wgpu::Sampler {
        match filter {
            FilterMode::Point => &self.point_sampler,
            FilterMode::Bilinear => &self.bilinear_sampler,
        }
    }
}

impl RenderDevice for GpuDevice {
    fn bind_parameters(
        &mut self,
        shader: ShaderHandle,
        parameters: &ParameterBlock,
    ) -> Result<(), FeatureError> {
        let program = self
            .shaders
            .get_mut(&shader)
            .ok_or(FeatureError::UnknownShader(shader))?;
        program.parameters.merge(parameters);
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

        match self.pool.acquire(key) {
            Acquired::Fresh(handle) => {
                let target = GpuTarget::new(&self.ctxt, "canvasfx_scratch", *descriptor, filter);
                let _ = self.scratch.insert(handle, target);
                Ok(handle)
            }
            Acquired::Reused(handle) => Ok(handle),
        }
    }

    fn release_scratch(&mut self, handle: ScratchHandle) -> Result<(), FeatureError> {
        self.pool.release(handle).map(|_| ())
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

        let format = lookup(&self.colors, &self.scratch, &self.pool, destination)?
            .descriptor
            .format
            .into();
        self.ensure_pipeline(shader, pass, format)?;

        let program = self
            .shaders
            .get(&shader)
            .ok_or(FeatureError::UnknownShader(shader))?;
        let pipeline = program
            .pipelines
            .get(&(pass, format))
            .ok_or(FeatureError::UnknownShader(shader))?;
        let src = lookup(&self.colors, &self.scratch, &self.pool, source)?;
        let dst = lookup(&self.colors, &self.scratch, &self.pool, destination)?;

        let label = format!("{}_pass{}", program.interface.label, pass);
        let uniforms = self.ctxt.create_buffer_init(
            Some(&format!("{}_uniforms", label)),
            &program.interface.pack_uniforms(&program.parameters),
            wgpu::BufferUsages::UNIFORM,
        );

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&src.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(self.sampler(src.filter)),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniforms.as_entire_binding(),
            },
        ];
        for (i, name) in program.interface.textures.iter().enumerate() {
            let texture = program
                .parameters
                .texture(name)
                .and_then(|h| self.textures.get(&h))
                .unwrap_or(&self.default_texture);
            let i = i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 3 + 2 * i,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 4 + 2 * i,
                resource: wgpu::BindingResource::Sampler(self.sampler(texture.filter)),
            });
        }

        let bind_group = self.ctxt.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        let encoder = frame_encoder(&mut self.encoder, &self.ctxt);
        draw_quad(encoder, &label, &dst.view, pipeline, &bind_group, &self.quad);
        Ok(())
    }

    fn blit(&mut self, source: TargetId, destination: TargetId) -> Result<(), FeatureError> {
        if source == destination {
            return Err(FeatureError::Aliasing(destination));
        }

        let format = lookup(&self.colors, &self.scratch, &self.pool, destination)?
            .descriptor
            .format
            .into();
        self.ensure_blit_pipeline(format);

        let src = lookup(&self.colors, &self.scratch, &self.pool, source)?;
        let dst = lookup(&self.colors, &self.scratch, &self.pool, destination)?;
        let pipeline = self
            .blit_pipelines
            .get(&format)
            .ok_or_else(|| FeatureError::Gpu("missing blit pipeline".to_string()))?;

        let bind_group = self.ctxt.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("canvasfx_blit_bind_group"),
            layout: &self.blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(self.sampler(src.filter)),
                },
            ],
        });

        let encoder = frame_encoder(&mut self.encoder, &self.ctxt);
        draw_quad(
            encoder,
            "canvasfx_blit",
            &dst.view,
            pipeline,
            &bind_group,
            &self.quad,
        );
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

        let src = lookup(&self.colors, &self.scratch, &self.pool, source)?;
        let dst = lookup(&self.colors, &self.scratch, &self.pool, destination)?;
        if src.descriptor != dst.descriptor {
            return Err(FeatureError::CopyMismatch {
                from: source,
                to: destination,
            });
        }

        let encoder = frame_encoder(&mut self.encoder, &self.ctxt);
        encoder.copy_texture_to_texture(
            src.texture.as_image_copy(),
            dst.texture.as_image_copy(),
            wgpu::Extent3d {
                width: dst.descriptor.width,
                height: dst.descriptor.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FeatureError> {
        if let Some(encoder) = self.encoder.take() {
            self.ctxt.submit(Some(encoder.finish()));
        }
        Ok(())
    }

    fn end_frame(&mut self) {
        for handle in self.pool.end_frame() {
            let _ = self.scratch.remove(&handle);
        }
    }
}
