//! Instanced disc and trail rendering for the plane view

use common::{create_uniform_buffer, Camera2D, CameraUniform, GraphicsContext, Vertex};
use glam::DVec2;
use wgpu::util::DeviceExt;

use nbody_sandbox::color::to_rgba;
use nbody_sandbox::{Prediction, Star2D, SimVector};

const TRAIL_ALPHA: f32 = 0.6;
const PREVIEW_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.35];
const DOOMED_COLOR: [f32; 4] = [1.0, 0.3, 0.3, 0.6];

/// Instance data for GPU rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

impl ParticleInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32,
        4 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    fn from_star(star: &Star2D) -> Self {
        Self {
            position: star.position.to_render(),
            radius: star.size() as f32,
            color: to_rgba(&star.color),
        }
    }
}

/// Quad vertex for instanced rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
];

/// What one upload produced: disc count plus one vertex range per line strip.
#[derive(Debug, Default)]
pub struct FrameGeometry {
    pub instances: u32,
    pub strips: Vec<(u32, u32)>,
}

/// Collects line strips up to a vertex budget.
struct StripBuilder {
    vertices: Vec<Vertex>,
    strips: Vec<(u32, u32)>,
    budget: usize,
}

impl StripBuilder {
    fn new(budget: usize) -> Self {
        Self {
            vertices: Vec::new(),
            strips: Vec::new(),
            budget,
        }
    }

    /// Add one strip; `color_at(i, len)` colors each point.
    fn push<'a>(
        &mut self,
        points: impl ExactSizeIterator<Item = &'a DVec2>,
        color_at: impl Fn(usize, usize) -> [f32; 4],
    ) -> bool {
        let len = points.len();
        if len < 2 {
            return true;
        }
        if self.vertices.len() + len > self.budget {
            return false;
        }
        let start = self.vertices.len() as u32;
        self.vertices.extend(
            points
                .enumerate()
                .map(|(i, p)| Vertex::new(p.to_render(), color_at(i, len))),
        );
        self.strips.push((start, len as u32));
        true
    }
}

pub struct Renderer {
    particle_pipeline: wgpu::RenderPipeline,
    trail_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    trail_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    max_instances: usize,
    max_trail_vertices: usize,
}

impl Renderer {
    pub fn new(ctx: &GraphicsContext, max_instances: usize, max_trail_vertices: usize) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particle.wgsl").into()),
        });

        let camera_buffer = create_uniform_buffer(
            device,
            "Camera Buffer",
            &CameraUniform::from(&Camera2D::new(ctx.aspect_ratio())),
        );

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_instanced",
                buffers: &[QuadVertex::layout(), ParticleInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_instanced",
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let trail_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Trail Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_trail",
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_trail",
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (std::mem::size_of::<ParticleInstance>() * max_instances) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let trail_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trail Buffer"),
            size: (std::mem::size_of::<Vertex>() * max_trail_vertices) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            particle_pipeline,
            trail_pipeline,
            quad_buffer,
            instance_buffer,
            trail_buffer,
            camera_buffer,
            camera_bind_group,
            max_instances,
            max_trail_vertices,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera2D) {
        let uniform = CameraUniform::from(camera);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Upload discs, trails and (optionally) a prediction's paths.
    ///
    /// Bodies past the instance budget are not drawn; strips stop at the
    /// vertex budget, preview paths first so they are never the ones cut.
    pub fn update_bodies(
        &self,
        queue: &wgpu::Queue,
        stars: &[Star2D],
        preview: Option<&Prediction<DVec2>>,
        show_trails: bool,
    ) -> FrameGeometry {
        let instances: Vec<ParticleInstance> = stars
            .iter()
            .take(self.max_instances)
            .map(ParticleInstance::from_star)
            .collect();
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut strips = StripBuilder::new(self.max_trail_vertices);
        if let Some(prediction) = preview {
            for star in &prediction.survivors {
                strips.push(star.trajectory().iter(), |_, _| PREVIEW_COLOR);
            }
            for doomed in &prediction.destroyed {
                strips.push(doomed.star.trajectory().iter(), |_, _| DOOMED_COLOR);
            }
        }
        if show_trails {
            for star in stars {
                let [r, g, b, _] = to_rgba(&star.color);
                let fits = strips.push(star.trajectory().iter(), |i, len| {
                    [r, g, b, (i as f32 / len as f32) * TRAIL_ALPHA]
                });
                if !fits {
                    break;
                }
            }
        }
        if !strips.vertices.is_empty() {
            queue.write_buffer(&self.trail_buffer, 0, bytemuck::cast_slice(&strips.vertices));
        }

        FrameGeometry {
            instances: instances.len() as u32,
            strips: strips.strips,
        }
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        geometry: &FrameGeometry,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.0,
                        g: 0.0,
                        b: 0.0,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        if !geometry.strips.is_empty() {
            render_pass.set_pipeline(&self.trail_pipeline);
            render_pass.set_vertex_buffer(0, self.trail_buffer.slice(..));
            for &(start, count) in &geometry.strips {
                render_pass.draw(start..start + count, 0..1);
            }
        }

        if geometry.instances > 0 {
            render_pass.set_pipeline(&self.particle_pipeline);
            render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..geometry.instances);
        }
    }
}
