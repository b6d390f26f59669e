//! WebGPU renderer for the volume field
//!
//! Particles are drawn as instanced camera-facing quads (WebGPU point
//! primitives are always one pixel wide) and links as a line list. Styles
//! are uploaded once; positions and link vertices are rewritten every frame
//! into buffers allocated up front, so a frame never allocates GPU memory.

use driftfield::gpu::{
    LineVertex, PointPosition, PointStyle, SceneUniforms, point_styles, write_line_vertices,
    write_point_positions,
};
use driftfield::{FieldConfig, FrameView, Particle, Renderer, Viewport};
use tracing::{debug, warn};
use web_sys::HtmlCanvasElement;
use wgpu::util::DeviceExt;

/// Link budget when the config sets no cap
pub const DEFAULT_MAX_LINKS: usize = 4096;

/// Corner of the unit sprite quad
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    corner: [f32; 2],
}

const QUAD: [QuadVertex; 6] = [
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, 1.0] },
];

/// GPU objects, dropped on release
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    point_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    position_buffer: wgpu::Buffer,
    style_buffer: wgpu::Buffer,
    point_count: u32,

    line_pipeline: wgpu::RenderPipeline,
    line_buffer: wgpu::Buffer,
    line_vertex_count: u32,

    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuState {
    fn destroy(self) {
        self.quad_buffer.destroy();
        self.position_buffer.destroy();
        self.style_buffer.destroy();
        self.line_buffer.destroy();
        self.uniform_buffer.destroy();
        // Surface and device drop here
    }
}

/// WebGPU renderer
pub struct WebGpuRenderer {
    canvas: HtmlCanvasElement,
    gpu: Option<GpuState>,
    max_links: usize,
    capacity: usize,
    point_scale: f32,
    // Per-frame staging, reused
    positions: Vec<PointPosition>,
    lines: Vec<LineVertex>,
}

impl WebGpuRenderer {
    /// Create a new WebGPU renderer (async)
    pub async fn new(canvas: HtmlCanvasElement, field: &FieldConfig) -> Result<Self, String> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);
        let capacity = field.particle_count;
        let max_links = field.max_connections.unwrap_or(DEFAULT_MAX_LINKS);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| format!("Failed to create surface: {}", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("Failed to find adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("driftfield"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| format!("Failed to create device: {}", e))?;

        // Colors are sRGB-encoded already, like CSS colors
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or("Surface reports no formats")?;
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            wgpu::CompositeAlphaMode::Auto
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let target = [Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let point_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
        });

        let point_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &point_shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    // Quad corners
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                    },
                    // Positions, rewritten every frame
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<PointPosition>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x3],
                    },
                    // Styles, uploaded once
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<PointStyle>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![2 => Float32x4, 3 => Float32],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &point_shader,
                entry_point: Some("fs_main"),
                targets: &target,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(LINE_SHADER.into()),
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_main"),
                targets: &target,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let slots = capacity.max(1) as u64;
        let position_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Position Buffer"),
            size: slots * std::mem::size_of::<PointPosition>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let style_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Style Buffer"),
            size: slots * std::mem::size_of::<PointStyle>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Two vertices per link, sized for the cap
        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Buffer"),
            size: (max_links.max(1) * 2 * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        debug!(?format, ?alpha_mode, capacity, max_links, "webgpu surface ready");

        Ok(Self {
            canvas,
            gpu: Some(GpuState {
                surface,
                device,
                queue,
                config,
                point_pipeline,
                quad_buffer,
                position_buffer,
                style_buffer,
                point_count: 0,
                line_pipeline,
                line_buffer,
                line_vertex_count: 0,
                uniform_buffer,
                bind_group,
            }),
            max_links,
            capacity,
            point_scale: field.point_scale,
            positions: Vec::with_capacity(capacity),
            lines: Vec::with_capacity(max_links * 2),
        })
    }
}

impl Renderer for WebGpuRenderer {
    fn resize(&mut self, viewport: &Viewport) {
        self.canvas.set_width(viewport.backing_width);
        self.canvas.set_height(viewport.backing_height);

        if let Some(gpu) = self.gpu.as_mut() {
            gpu.config.width = viewport.backing_width;
            gpu.config.height = viewport.backing_height;
            gpu.surface.configure(&gpu.device, &gpu.config);
        }
    }

    fn upload_static(&mut self, particles: &[Particle]) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let styles = point_styles(
            &particles[..particles.len().min(self.capacity)],
            self.point_scale,
        );
        if !styles.is_empty() {
            gpu.queue
                .write_buffer(&gpu.style_buffer, 0, bytemuck::cast_slice(&styles));
        }
        gpu.point_count = styles.len() as u32;
    }

    fn draw(&mut self, frame: &FrameView<'_>) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let particles = &frame.particles[..frame.particles.len().min(self.capacity)];
        write_point_positions(particles, &mut self.positions);
        if !self.positions.is_empty() {
            gpu.queue.write_buffer(
                &gpu.position_buffer,
                0,
                bytemuck::cast_slice(&self.positions),
            );
        }

        gpu.line_vertex_count =
            write_line_vertices(frame.particles, frame.edges, self.max_links, &mut self.lines);
        if !self.lines.is_empty() {
            gpu.queue
                .write_buffer(&gpu.line_buffer, 0, bytemuck::cast_slice(&self.lines));
        }

        let uniforms = SceneUniforms::new(frame.camera, frame.viewport, frame.config);
        gpu.queue
            .write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                warn!(error = %err, "surface texture unavailable; reconfiguring");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Links behind particles
            if gpu.line_vertex_count > 0 {
                render_pass.set_pipeline(&gpu.line_pipeline);
                render_pass.set_bind_group(0, &gpu.bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu.line_buffer.slice(..));
                render_pass.draw(0..gpu.line_vertex_count, 0..1);
            }

            if gpu.point_count > 0 {
                render_pass.set_pipeline(&gpu.point_pipeline);
                render_pass.set_bind_group(0, &gpu.bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu.quad_buffer.slice(..));
                render_pass.set_vertex_buffer(1, gpu.position_buffer.slice(..));
                render_pass.set_vertex_buffer(2, gpu.style_buffer.slice(..));
                render_pass.draw(0..QUAD.len() as u32, 0..gpu.point_count);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn release(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.destroy();
        }
        self.positions = Vec::new();
        self.lines = Vec::new();
        self.canvas.set_width(0);
        self.canvas.set_height(0);
    }
}

// WGSL Shaders

const POINT_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    link_color: vec4<f32>,
    viewport: vec2<f32>,
    focal: f32,
    _padding: f32,
}

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) corner: vec2<f32>,
}

struct InstanceInput {
    @location(1) position: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) size: f32,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) corner: vec2<f32>,
}

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    var out: VertexOutput;

    // Offset in clip space; the perspective divide shrinks far sprites
    let center = scene.view_proj * vec4<f32>(instance.position, 1.0);
    let aspect = scene.viewport.x / scene.viewport.y;
    let radius = instance.size * 0.5 * scene.focal;

    out.clip_position = center;
    out.clip_position.x += vertex.corner.x * radius / aspect;
    out.clip_position.y += vertex.corner.y * radius;

    out.color = instance.color;
    out.corner = vertex.corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(in.corner);
    if (dist > 1.0) {
        discard;
    }

    let alpha = in.color.a * smoothstep(1.0, 0.8, dist);
    return vec4<f32>(in.color.rgb * alpha, alpha);
}
"#;

const LINE_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    link_color: vec4<f32>,
    viewport: vec2<f32>,
    focal: f32,
    _padding: f32,
}

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) opacity: f32,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = scene.view_proj * vec4<f32>(vertex.position, 1.0);
    let alpha = scene.link_color.a * vertex.opacity;
    out.color = vec4<f32>(scene.link_color.rgb * alpha, alpha);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
