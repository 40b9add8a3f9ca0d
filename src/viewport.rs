use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use image::RgbaImage;
use wgpu::{
    include_wgsl, CommandEncoderDescriptor, PipelineLayoutDescriptor, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipelineDescriptor, SurfaceError, TextureViewDescriptor,
};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent},
};

use crate::{
    application::{AppState, Layer, Screen},
    buffer::{IndexBuffer, Vertex, VertexBuffer, QUAD_INDICES, QUAD_VERTICES},
    error::Result,
    renderer::FrameRenderer,
    settings::SettingsController,
    snapshot,
    texture::Texture,
};

const TITLE_REFRESH: Duration = Duration::from_millis(250);

pub struct ViewportConfig {
    pub title: String,
    pub controller: SettingsController,
    pub snapshot_path: PathBuf,
}

/// Final image uploaded to the GPU together with the bind group sampling it.
struct ViewportTarget {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

impl ViewportTarget {
    fn new(screen: &Screen, layout: &wgpu::BindGroupLayout, image: &RgbaImage) -> Self {
        let texture = Texture::from_image(
            &screen.device,
            &screen.queue,
            image,
            Some("Final image texture"),
        );
        let bind_group = screen.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("final_image_bind_group"),
        });
        Self {
            texture,
            bind_group,
        }
    }
}

/// Shades the sphere on the CPU every frame and shows the result.
pub struct ViewportLayer {
    renderer: FrameRenderer,
    controller: SettingsController,
    title: String,
    snapshot_path: PathBuf,
    snapshot_requested: bool,
    last_render: Duration,
    title_updated: Instant,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    target: Option<ViewportTarget>,
    /// The final image is too large to upload; warned once until it fits again.
    oversized: bool,
}

impl ViewportLayer {
    fn upload(&mut self, screen: &Screen) {
        let Some(image) = self.renderer.final_image() else {
            return;
        };
        if image.width() == 0 || image.height() == 0 {
            self.target = None;
            return;
        }
        let max_dimension = screen.device.limits().max_texture_dimension_2d;
        if !Texture::fits(image.width(), image.height(), max_dimension) {
            if !self.oversized {
                tracing::warn!(
                    width = image.width(),
                    height = image.height(),
                    max_dimension,
                    "final image exceeds the GPU texture limit, not displayed"
                );
            }
            self.oversized = true;
            self.target = None;
            return;
        }
        self.oversized = false;

        if let Some(target) = self.target.as_ref().filter(|t| t.texture.matches(image)) {
            target.texture.update_data(&screen.queue, image);
            return;
        }
        self.target = Some(ViewportTarget::new(
            screen,
            &self.texture_bind_group_layout,
            image,
        ));
    }

    fn save_snapshot(&mut self) {
        self.snapshot_requested = false;
        let Some(image) = self.renderer.final_image() else {
            tracing::warn!("nothing rendered yet, snapshot skipped");
            return;
        };
        if let Err(err) = snapshot::save(image, &self.snapshot_path) {
            tracing::error!(%err, "could not save snapshot");
        }
    }

    fn refresh_title(&mut self, app: &AppState, screen: &Screen) {
        if self.title_updated.elapsed() < TITLE_REFRESH {
            return;
        }
        self.title_updated = Instant::now();
        screen.window().set_title(&format!(
            "{} - last render: {:.3}ms, frame: {:.3}ms",
            self.title,
            self.last_render.as_secs_f64() * 1000.0,
            app.frame_time().as_secs_f64() * 1000.0,
        ));
    }
}

impl Layer for ViewportLayer {
    type Config = ViewportConfig;

    fn start(config: ViewportConfig, screen: &mut Screen, _app: &AppState) -> Result<Self> {
        let shader = screen
            .device
            .create_shader_module(include_wgsl!("asset/shader/viewport.wgsl"));

        let vertex_buffer =
            VertexBuffer::init_immediate(&screen.device, QUAD_VERTICES, Some("Vertex Buffer"));
        let index_buffer =
            IndexBuffer::init_immediate_u16(&screen.device, QUAD_INDICES, Some("Index Buffer"));

        let texture_bind_group_layout =
            screen
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                multisampled: false,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
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
                    label: Some("texture_bind_group_layout"),
                });

        let render_pipeline_layout =
            screen
                .device
                .create_pipeline_layout(&PipelineLayoutDescriptor {
                    label: Some("Render Pipeline Layout"),
                    bind_group_layouts: &[&texture_bind_group_layout],
                    push_constant_ranges: &[],
                });

        let render_pipeline = screen
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("Render Pipeline"),
                layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[Vertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: screen.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
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
            });

        tracing::info!(
            "controls: R/F G/H B/N T/Y color, arrows and PageUp/PageDown light, \
             Backspace reset, F12 snapshot, Esc exit"
        );

        Ok(Self {
            renderer: FrameRenderer::new(),
            controller: config.controller,
            title: config.title,
            snapshot_path: config.snapshot_path,
            snapshot_requested: false,
            last_render: Duration::ZERO,
            title_updated: Instant::now(),
            render_pipeline,
            vertex_buffer,
            index_buffer,
            texture_bind_group_layout,
            target: None,
            oversized: false,
        })
    }

    fn process_event(&mut self, event: &WindowEvent, _screen: &mut Screen) {
        if self.controller.process_events(event) {
            return;
        }
        if let WindowEvent::KeyboardInput {
            input:
                KeyboardInput {
                    state: ElementState::Pressed,
                    virtual_keycode: Some(VirtualKeyCode::F12),
                    ..
                },
            ..
        } = event
        {
            self.snapshot_requested = true;
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>, _app: &AppState, _screen: &mut Screen) {
        tracing::debug!(width = new_size.width, height = new_size.height, "viewport resized");
    }

    fn update(&mut self, app: &AppState, screen: &mut Screen) -> Result<()> {
        let viewport = screen.viewport_size();
        let settings = self.controller.snapshot();

        let timer = Instant::now();
        self.renderer.resize(viewport.width, viewport.height)?;
        self.renderer.render(&settings)?;
        self.last_render = timer.elapsed();
        tracing::trace!(
            last_render_ms = self.last_render.as_secs_f64() * 1000.0,
            "frame rendered"
        );

        self.upload(screen);
        if self.snapshot_requested {
            self.save_snapshot();
        }
        self.refresh_title(app, screen);
        Ok(())
    }

    fn render(&mut self, _app: &AppState, screen: &mut Screen) -> Result<(), SurfaceError> {
        let output = screen.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&TextureViewDescriptor::default());
        let mut encoder = screen
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            if let Some(target) = &self.target {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &target.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.buffer().slice(..));
                render_pass.set_index_buffer(
                    self.index_buffer.buffer().slice(..),
                    self.index_buffer.format(),
                );
                render_pass.draw_indexed(0..self.index_buffer.count(), 0, 0..1);
            }
        }

        screen.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn shutdown(&mut self, _app: &AppState, _screen: &mut Screen) -> Result<()> {
        tracing::info!(
            last_render_ms = self.last_render.as_secs_f64() * 1000.0,
            "exiting"
        );
        Ok(())
    }
}
