use layers::provinces::DrawItem;

/// Page background `#111827`.
pub const CLEAR_SRGB: [f64; 3] = [17.0 / 255.0, 24.0 / 255.0, 39.0 / 255.0];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Linear RGB + opacity.
    pub color: [f32; 4],
    pub emissive: f32,
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Flattens the frame's provinces into one world-space vertex/index pair.
pub fn build_vertices(items: &[DrawItem<'_>]) -> (Vec<Vertex>, Vec<u32>) {
    let vertex_total: usize = items.iter().map(|i| i.mesh.positions.len()).sum();
    let index_total: usize = items.iter().map(|i| i.mesh.indices.len()).sum();
    let mut vertices = Vec::with_capacity(vertex_total);
    let mut indices = Vec::with_capacity(index_total);

    for item in items {
        let [r, g, b, a] = item.style.rgba();
        let color = [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a];
        let base = vertices.len() as u32;
        for (i, p) in item.mesh.positions.iter().enumerate() {
            let normal = item
                .mesh
                .normals
                .get(i)
                .map(|n| item.transform.direction_to_world(*n).to_f32())
                .unwrap_or([0.0, 1.0, 0.0]);
            vertices.push(Vertex {
                position: item.transform.local_to_world(*p).to_f32(),
                normal,
                color,
                emissive: item.style.emissive_intensity,
            });
        }
        indices.extend(item.mesh.indices.iter().map(|i| i + base));
    }

    (vertices, indices)
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use super::{CLEAR_SRGB, Vertex, srgb_to_linear};
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    #[derive(Debug)]
    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        pub pipeline: ::wgpu::RenderPipeline,
        pub uniform_buffer: ::wgpu::Buffer,
        pub uniform_bind_group: ::wgpu::BindGroup,
        pub depth_view: ::wgpu::TextureView,
        pub vertex_buffer: Option<::wgpu::Buffer>,
        pub index_buffer: Option<::wgpu::Buffer>,
        pub index_count: u32,
    }

    const PROVINCE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    key_light: vec4<f32>,
    fill_light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) emissive: f32,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) emissive: f32,
) -> VsOut {
    return VsOut(
        globals.view_proj * vec4<f32>(position, 1.0),
        normal,
        color,
        emissive,
    );
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(fs_in.normal);
    let key = max(dot(n, normalize(globals.key_light.xyz)), 0.0) * globals.key_light.w;
    let fill = max(dot(n, normalize(globals.fill_light.xyz)), 0.0) * globals.fill_light.w;
    let shade = 0.35 + key + fill;
    let rgb = fs_in.color.rgb * shade + fs_in.color.rgb * fs_in.emissive;
    return vec4<f32>(min(rgb, vec3<f32>(1.0)), fs_in.color.a);
}
"#;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Globals {
        view_proj: [[f32; 4]; 4],
        /// Direction towards the light in xyz, intensity in w.
        key_light: [f32; 4],
        fill_light: [f32; 4],
    }

    impl Globals {
        fn new(view_proj: [[f32; 4]; 4]) -> Self {
            Self {
                view_proj,
                key_light: [10.0, 20.0, 30.0, 0.55],
                fill_light: [-10.0, -10.0, -10.0, 0.25],
            }
        }
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("budaya-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Depth24Plus,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    pub async fn init_wgpu_from_canvas_id(canvas_id: &str) -> Result<WgpuContext, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas missing"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width();
        let height = canvas_elem.height();

        // The surface borrows the instance for 'static; leak it for the page lifetime.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("budaya-wgpu-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .cloned()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().cloned())
            .ok_or_else(|| JsValue::from_str("surface has no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .cloned()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("budaya-province-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(PROVINCE_SHADER)),
        });

        let uniform_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("budaya-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("budaya-globals-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("budaya-globals-bg"),
            layout: &uniform_bind_group_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("budaya-province-pipeline-layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("budaya-province-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 12,
                            shader_location: 1,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x4,
                            offset: 24,
                            shader_location: 2,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32,
                            offset: 40,
                            shader_location: 3,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                // Slabs are viewed from below after orbiting.
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: ::wgpu::TextureFormat::Depth24Plus,
                depth_write_enabled: true,
                depth_compare: ::wgpu::CompareFunction::Less,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        queue.write_buffer(
            &uniform_buffer,
            0,
            bytemuck::bytes_of(&Globals::new([[0.0; 4]; 4])),
        );

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
            vertex_buffer: None,
            index_buffer: None,
            index_count: 0,
        })
    }

    pub fn upload_geometry(ctx: &mut WgpuContext, vertices: &[Vertex], indices: &[u32]) {
        if vertices.is_empty() || indices.is_empty() {
            ctx.vertex_buffer = None;
            ctx.index_buffer = None;
            ctx.index_count = 0;
            return;
        }

        ctx.vertex_buffer = Some(ctx.device.create_buffer_init(
            &::wgpu::util::BufferInitDescriptor {
                label: Some("budaya-province-vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: ::wgpu::BufferUsages::VERTEX,
            },
        ));
        ctx.index_buffer = Some(ctx.device.create_buffer_init(
            &::wgpu::util::BufferInitDescriptor {
                label: Some("budaya-province-indices"),
                contents: bytemuck::cast_slice(indices),
                usage: ::wgpu::BufferUsages::INDEX,
            },
        ));
        ctx.index_count = indices.len() as u32;
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.depth_view = create_depth_view(&ctx.device, &ctx.config);
    }

    pub fn render_frame(ctx: &WgpuContext, view_proj: [[f32; 4]; 4]) -> Result<(), JsValue> {
        let frame = ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
        let view = frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        ctx.queue.write_buffer(
            &ctx.uniform_buffer,
            0,
            bytemuck::bytes_of(&Globals::new(view_proj)),
        );

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("budaya-frame-encoder"),
            });

        {
            let [r, g, b] = CLEAR_SRGB.map(|c| srgb_to_linear(c as f32) as f64);
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("budaya-province-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color { r, g, b, a: 1.0 }),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if let (Some(vertices), Some(indices)) = (&ctx.vertex_buffer, &ctx.index_buffer) {
                rpass.set_pipeline(&ctx.pipeline);
                rpass.set_bind_group(0, &ctx.uniform_bind_group, &[]);
                rpass.set_vertex_buffer(0, vertices.slice(..));
                rpass.set_index_buffer(indices.slice(..), ::wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..ctx.index_count, 0, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use super::Vertex;
    use wasm_bindgen::prelude::JsValue;

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas_id(_canvas_id: &str) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub fn upload_geometry(_ctx: &mut WgpuContext, _vertices: &[Vertex], _indices: &[u32]) {}

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn render_frame(_ctx: &WgpuContext, _view_proj: [[f32; 4]; 4]) -> Result<(), JsValue> {
        Err(JsValue::from_str(
            "wgpu rendering is only available on wasm32 targets",
        ))
    }
}

pub use imp::{WgpuContext, init_wgpu_from_canvas_id, render_frame, resize_wgpu, upload_geometry};
