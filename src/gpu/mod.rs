//! GPU state: device setup, the surface pipeline and the field mirror.

mod camera;
mod field_gpu;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use log::info;
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
pub use field_gpu::STEP_SHADER;
use field_gpu::FieldGpu;

use crate::error::GpuError;
use crate::field::ConcentrationField;
use crate::mask::TextMask;
use crate::params::SimulationParams;
use crate::surface::{SurfaceGrid, SurfaceStyle, SurfaceVertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub displacement_scale: f32,
    pub width: u32,
    pub height: u32,
    pub _pad: f32,
}

/// Convert an sRGB-encoded color to linear for an sRGB render target.
pub fn srgb_to_linear(c: Vec3) -> Vec3 {
    let f = |v: f32| {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(f(c.x), f(c.y), f(c.z))
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    surface_bind_group_layout: wgpu::BindGroupLayout,
    surface_bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    depth_texture: wgpu::TextureView,
    field: FieldGpu,
    linear_output: bool,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        field: &ConcentrationField,
        generation: u64,
        grid: &SurfaceGrid,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!("Using adapter {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Vertex Buffer"),
            contents: bytemuck::cast_slice(grid.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Index Buffer"),
            contents: bytemuck::cast_slice(grid.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Uniform Buffer"),
            size: std::mem::size_of::<SurfaceUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let surface_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Surface Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Settled field cells
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let field_gpu = FieldGpu::new(&device, field, generation);
        let surface_bind_group = create_surface_bind_group(
            &device,
            &surface_bind_group_layout,
            &uniform_buffer,
            &field_gpu,
        );

        let surface_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(SURFACE_SHADER.into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Surface Pipeline Layout"),
            bind_group_layouts: &[&surface_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Surface Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &surface_shader,
                entry_point: Some("vs_main"),
                buffers: &[SurfaceVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &surface_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            linear_output: config.format.is_srgb(),
            config,
            render_pipeline,
            surface_bind_group_layout,
            surface_bind_group,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: grid.indices().len() as u32,
            depth_texture,
            field: field_gpu,
            camera: Camera::new(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        winit::dpi::PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Session generation the GPU field was built from.
    pub fn field_generation(&self) -> u64 {
        self.field.generation
    }

    /// Rebuild the GPU field from a fresh instance after a reset.
    pub fn replace_field(&mut self, field: &ConcentrationField, generation: u64) {
        self.field = FieldGpu::new(&self.device, field, generation);
        self.surface_bind_group = create_surface_bind_group(
            &self.device,
            &self.surface_bind_group_layout,
            &self.uniform_buffer,
            &self.field,
        );
    }

    /// Upload the mask if it changed since the last upload.
    pub fn upload_mask(&mut self, mask: &TextMask) -> bool {
        self.field.upload_mask(&self.queue, mask)
    }

    /// Show a field stepped on the CPU.
    pub fn upload_field(&self, field: &ConcentrationField) {
        self.field.upload_cells(&self.queue, field.current());
    }

    fn update_uniforms(&mut self, style: &SurfaceStyle) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let (color1, color2) = if self.linear_output {
            (srgb_to_linear(style.color1), srgb_to_linear(style.color2))
        } else {
            (style.color1, style.color2)
        };
        let uniforms = SurfaceUniforms {
            view_proj: self.camera.view_proj(aspect).to_cols_array_2d(),
            color1: color1.extend(1.0).to_array(),
            color2: color2.extend(1.0).to_array(),
            displacement_scale: style.displacement_scale,
            width: self.field.width(),
            height: self.field.height(),
            _pad: 0.0,
        };
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draw one frame. With `step` set, the field is advanced on the GPU
    /// first, in the same submission.
    pub fn render(
        &mut self,
        style: &SurfaceStyle,
        background: Vec3,
        step: Option<&SimulationParams>,
    ) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms(style);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if let Some(params) = step {
            self.field.encode_frame(&mut encoder, &self.queue, params);
        }

        let clear = if self.linear_output {
            srgb_to_linear(background)
        } else {
            background
        };

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Surface Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.surface_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_surface_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    field: &FieldGpu,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Surface Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: field.settled_buffer().as_entire_binding(),
            },
        ],
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Displaced, shaded surface. Mirrors `surface::sample_b` and `surface::shade`.
pub const SURFACE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    color1: vec4<f32>,
    color2: vec4<f32>,
    displacement_scale: f32,
    width: u32,
    height: u32,
    _pad: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var<storage, read> cells: array<vec2<f32>>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

fn texel_b(x: i32, y: i32) -> f32 {
    return cells[u32(y) * uniforms.width + u32(x)].y;
}

fn sample_b(uv: vec2<f32>) -> f32 {
    let size = vec2<f32>(f32(uniforms.width), f32(uniforms.height));
    let p = clamp(uv * size - vec2<f32>(0.5), vec2<f32>(0.0), size - vec2<f32>(1.0));
    let p0 = floor(p);
    let f = p - p0;
    let x0 = i32(p0.x);
    let y0 = i32(p0.y);
    let x1 = min(x0 + 1, i32(uniforms.width) - 1);
    let y1 = min(y0 + 1, i32(uniforms.height) - 1);
    let top = mix(texel_b(x0, y0), texel_b(x1, y0), f.x);
    let bottom = mix(texel_b(x0, y1), texel_b(x1, y1), f.x);
    return mix(top, bottom, f.y);
}

fn shade(b: f32) -> vec3<f32> {
    let mask = smoothstep(0.05, 0.2, b);
    var color = mix(vec3<f32>(0.0), uniforms.color1.rgb, mask);
    color = mix(color, uniforms.color2.rgb, smoothstep(0.2, 0.5, b));
    color = color * mask;
    return color + vec3<f32>(0.3 * smoothstep(0.4, 0.6, b));
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    let b = sample_b(uv);
    let displaced = position + vec3<f32>(0.0, b * uniforms.displacement_scale, 0.0);
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(displaced, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(shade(sample_b(in.uv)), 1.0);
}
"#;
