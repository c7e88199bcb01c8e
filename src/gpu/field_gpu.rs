//! GPU resources and compute pipeline for the concentration field.
//!
//! The field lives in two storage buffers. Each half-step is a compute pass
//! reading one and writing the other; the two bind groups are fixed
//! (0 -> 1 and 1 -> 0), so a cycle always ends back in buffer 0, which is
//! the buffer the surface shader samples.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::field::{Cell, ConcentrationField};
use crate::mask::TextMask;
use crate::params::SimulationParams;

/// Workgroup side length of the step shader.
const WORKGROUP_SIZE: u32 = 16;

/// Step parameters, uploaded once per frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct StepParamsGpu {
    pub width: u32,
    pub height: u32,
    pub feed: f32,
    pub kill: f32,
    pub dt: f32,
    pub _pad: [f32; 3],
}

impl StepParamsGpu {
    pub fn new(width: u32, height: u32, params: &SimulationParams) -> Self {
        Self {
            width,
            height,
            feed: params.feed,
            kill: params.kill,
            dt: params.dt,
            _pad: [0.0; 3],
        }
    }
}

/// GPU mirror of a [`ConcentrationField`] and its text mask.
pub struct FieldGpu {
    /// Buffer 0 holds the settled field between frames.
    pub cell_buffers: [wgpu::Buffer; 2],
    pub mask_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    /// `step_bind_groups[i]` reads buffer `i` and writes the other.
    step_bind_groups: [wgpu::BindGroup; 2],
    width: u32,
    height: u32,
    mask_revision: Option<u64>,
    /// Session generation this mirror was built from.
    pub generation: u64,
}

impl FieldGpu {
    /// Upload the field's current buffer into both GPU buffers.
    pub fn new(device: &wgpu::Device, field: &ConcentrationField, generation: u64) -> Self {
        let width = field.width() as u32;
        let height = field.height() as u32;

        let cell_buffers = [0, 1].map(|i| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Field Cell Buffer {}", i)),
                contents: bytemuck::cast_slice(field.current()),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
        });

        let mask_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Text Mask Buffer"),
            size: (field.len() * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = StepParamsGpu::new(width, height, &SimulationParams::default());
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Step Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let (pipeline, layout) = create_step_pipeline(device);

        let bind_group = |src: &wgpu::Buffer, dst: &wgpu::Buffer, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: src.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: dst.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: mask_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let step_bind_groups = [
            bind_group(&cell_buffers[0], &cell_buffers[1], "Field Step 0->1"),
            bind_group(&cell_buffers[1], &cell_buffers[0], "Field Step 1->0"),
        ];

        Self {
            cell_buffers,
            mask_buffer,
            params_buffer,
            pipeline,
            step_bind_groups,
            width,
            height,
            mask_revision: None,
            generation,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The buffer holding the settled field.
    pub fn settled_buffer(&self) -> &wgpu::Buffer {
        &self.cell_buffers[0]
    }

    /// Re-upload the mask if its revision changed since the last upload.
    pub fn upload_mask(&mut self, queue: &wgpu::Queue, mask: &TextMask) -> bool {
        if self.mask_revision == Some(mask.revision()) {
            return false;
        }
        queue.write_buffer(&self.mask_buffer, 0, bytemuck::cast_slice(mask.data()));
        self.mask_revision = Some(mask.revision());
        true
    }

    /// Overwrite the settled buffer with cells stepped on the CPU.
    pub fn upload_cells(&self, queue: &wgpu::Queue, cells: &[Cell]) {
        queue.write_buffer(&self.cell_buffers[0], 0, bytemuck::cast_slice(cells));
    }

    /// Encode one frame of `iterations_per_frame` cycles.
    ///
    /// Parameters are written once; every compute pass in the frame sees the
    /// same values.
    pub fn encode_frame(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        params: &SimulationParams,
    ) {
        let gpu_params = StepParamsGpu::new(self.width, self.height, params);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&gpu_params));

        let groups_x = self.width.div_ceil(WORKGROUP_SIZE);
        let groups_y = self.height.div_ceil(WORKGROUP_SIZE);

        for _ in 0..params.iterations_per_frame.max(1) {
            for bind_group in &self.step_bind_groups {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Field Step Pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }
        }
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_step_pipeline(device: &wgpu::Device) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Field Step Shader"),
        source: wgpu::ShaderSource::Wgsl(STEP_SHADER.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Field Step Bind Group Layout"),
        entries: &[
            // Source cells
            storage_entry(0, true),
            // Destination cells
            storage_entry(1, false),
            // Text mask
            storage_entry(2, true),
            // Params
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Field Step Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Field Step Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    (pipeline, bind_group_layout)
}

/// One Gray-Scott half-step, matching `field::update_cell`.
pub const STEP_SHADER: &str = r#"
struct Params {
    width: u32,
    height: u32,
    feed: f32,
    kill: f32,
    dt: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<storage, read> src: array<vec2<f32>>;

@group(0) @binding(1)
var<storage, read_write> dst: array<vec2<f32>>;

@group(0) @binding(2)
var<storage, read> text_mask: array<f32>;

@group(0) @binding(3)
var<uniform> params: Params;

fn cell_at(x: i32, y: i32) -> vec2<f32> {
    let cx = clamp(x, 0, i32(params.width) - 1);
    let cy = clamp(y, 0, i32(params.height) - 1);
    return src[u32(cy) * params.width + u32(cx)];
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {
    if global_id.x >= params.width || global_id.y >= params.height {
        return;
    }
    let x = i32(global_id.x);
    let y = i32(global_id.y);
    let idx = global_id.y * params.width + global_id.x;

    let c = cell_at(x, y);
    let edges = cell_at(x, y - 1) + cell_at(x, y + 1)
        + cell_at(x + 1, y) + cell_at(x - 1, y);
    let corners = cell_at(x + 1, y - 1) + cell_at(x - 1, y - 1)
        + cell_at(x + 1, y + 1) + cell_at(x - 1, y + 1);
    let lap = 0.2 * edges + 0.05 * corners - c;

    let a = c.x;
    let b = c.y;
    let reaction = a * b * b;
    let next_a = a + params.dt * (lap.x - reaction + params.feed * (1.0 - a));
    var next_b = b + params.dt * (0.5 * lap.y + reaction - (params.kill + params.feed) * b);

    if text_mask[idx] > 0.1 {
        next_b = mix(next_b, 0.9, 0.5);
    }

    dst[idx] = clamp(vec2<f32>(next_a, next_b), vec2<f32>(0.0), vec2<f32>(1.0));
}
"#;
