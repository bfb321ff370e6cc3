use std::{borrow::Cow, ops::Range, sync::Arc};

use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{BlendMode, Color, CopyCommand, Image, PixelError, PixelResult, RenderBackend};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A texture uploaded to the GPU. Dropping it frees the texture. Batches
/// queued for the current frame keep only the bind group alive.
pub struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: Arc<wgpu::BindGroup>,
}

impl GpuTexture {
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }
}

struct Batch {
    bind_group: Arc<wgpu::BindGroup>,
    blend: BlendMode,
    vertices: Range<u32>,
}

/// Window backed render backend. Copies are batched and submitted on
/// [`RenderBackend::present`].
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    replace_pipeline: wgpu::RenderPipeline,
    alpha_pipeline: wgpu::RenderPipeline,
    vertices: Vec<Vertex>,
    batches: Vec<Batch>,
    clear_color: Color,
    window: Arc<Window>,
}

impl GpuRenderer {
    pub(crate) fn new(window: Arc<Window>, vsync: bool) -> PixelResult<Self> {
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::DEBUG | wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter =
            match pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })) {
                Some(adapter) => adapter,
                None => {
                    return Err(PixelError::platform("failed to get graphics adapter"));
                }
            };

        let adapter_info = adapter.get_info();
        info!(
            "using {} ({:?}, {:?})",
            adapter_info.name, adapter_info.backend, adapter_info.device_type
        );

        let (device, queue) = match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            },
            None,
        )) {
            Ok((device, queue)) => (device, queue),
            Err(err) => {
                return Err(PixelError::platform("failed to get graphics queue").with_source(err));
            }
        };

        let caps = surface.get_capabilities(&adapter);
        // texture bytes are drawn as stored, so avoid an srgb backbuffer.
        let format = match caps.formats.iter().find(|f| !f.is_srgb()) {
            Some(format) => *format,
            None => match caps.formats.first() {
                Some(format) => *format,
                None => return Err(PixelError::platform("window surface is not supported")),
            },
        };
        let alpha_mode = match caps.alpha_modes.first() {
            Some(mode) => *mode,
            None => wgpu::CompositeAlphaMode::Auto,
        };

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        info!("surface configured {}x{} {:?}", config.width, config.height, format);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/sprite.wgsl"))),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let create_pipeline = |label: &str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[Vertex::layout()],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // flips reverse the winding.
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            })
        };

        let replace_pipeline = create_pipeline("sprite pipeline (replace)", wgpu::BlendState::REPLACE);
        let alpha_pipeline = create_pipeline("sprite pipeline (alpha)", wgpu::BlendState::ALPHA_BLENDING);

        Ok(Self {
            surface,
            config,
            device,
            queue,
            bind_group_layout,
            sampler,
            replace_pipeline,
            alpha_pipeline,
            vertices: Vec::new(),
            batches: Vec::new(),
            clear_color: Color::WHITE,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        debug!("surface resized to {width}x{height}");
    }

    fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        [
            x / self.config.width as f32 * 2.0 - 1.0,
            1.0 - y / self.config.height as f32 * 2.0,
        ]
    }

    fn pipeline(&self, blend: BlendMode) -> &wgpu::RenderPipeline {
        match blend {
            BlendMode::None => &self.replace_pipeline,
            BlendMode::Alpha => &self.alpha_pipeline,
        }
    }
}

impl RenderBackend for GpuRenderer {
    type Texture = GpuTexture;

    fn create_texture(&mut self, image: &Image) -> PixelResult<Self::Texture> {
        if image.is_empty() {
            return Err(PixelError::upload("cannot create a texture from an empty image"));
        }

        let max = self.max_texture_size();
        if image.width() > max || image.height() > max {
            return Err(PixelError::upload(format!(
                "{}x{} exceeds the maximum texture size of {max}",
                image.width(),
                image.height()
            )));
        }

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(Image::BYTES_PER_PIXEL as u32 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Ok(GpuTexture {
            texture,
            bind_group: Arc::new(bind_group),
        })
    }

    fn copy(&mut self, texture: &Self::Texture, cmd: &CopyCommand) {
        if cmd.dst.is_empty() {
            return;
        }

        let tw = texture.width() as f32;
        let th = texture.height() as f32;
        let [r, g, b] = cmd.tint.to_array();
        let color = [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            cmd.alpha as f32 / 255.0,
        ];

        let corners = cmd.corners();
        let uvs = cmd.source_corners();
        let quad: [Vertex; 4] = std::array::from_fn(|i| Vertex {
            position: self.to_ndc(corners[i].x, corners[i].y),
            uv: [uvs[i].x / tw, uvs[i].y / th],
            color,
        });

        let start = self.vertices.len() as u32;
        self.vertices
            .extend_from_slice(&[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]]);
        let end = self.vertices.len() as u32;

        match self.batches.last_mut() {
            Some(batch)
                if batch.blend == cmd.blend
                    && Arc::ptr_eq(&batch.bind_group, &texture.bind_group) =>
            {
                batch.vertices.end = end;
            }
            _ => self.batches.push(Batch {
                bind_group: texture.bind_group.clone(),
                blend: cmd.blend,
                vertices: start..end,
            }),
        }
    }

    fn clear(&mut self, color: Color) {
        self.clear_color = color;
        self.vertices.clear();
        self.batches.clear();
    }

    fn present(&mut self) -> PixelResult {
        let vertices = std::mem::take(&mut self.vertices);
        let batches = std::mem::take(&mut self.batches);

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("timed out acquiring the next frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let vertex_buffer = if vertices.is_empty() {
            None
        } else {
            Some(
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("sprite vertices"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
            )
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(vertex_buffer) = &vertex_buffer {
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
                for batch in &batches {
                    rpass.set_pipeline(self.pipeline(batch.blend));
                    rpass.set_bind_group(0, &batch.bind_group, &[]);
                    rpass.draw(batch.vertices.clone(), 0..1);
                }
            }
        }

        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        frame.present();

        Ok(())
    }
}

impl From<wgpu::CreateSurfaceError> for PixelError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        PixelError::platform("failed to create a surface for the window").with_source(err)
    }
}

impl From<wgpu::SurfaceError> for PixelError {
    fn from(err: wgpu::SurfaceError) -> Self {
        PixelError::platform("failed to acquire a surface").with_source(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // resolves only while GpuTexture has no Clone impl.
    trait AmbiguousIfClone<A> {
        fn check() {}
    }
    impl<T: ?Sized> AmbiguousIfClone<()> for T {}
    impl<T: ?Sized + Clone> AmbiguousIfClone<u8> for T {}

    #[test]
    fn gpu_texture_handle_cannot_be_shared() {
        <GpuTexture as AmbiguousIfClone<_>>::check();
    }
}
