use std::time::Instant;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;
use winit::dpi::PhysicalSize;

use crate::error::RendererError;
use crate::types::Tuning;

use super::canvas::Canvas;
use super::context::GpuContext;
use super::frame::{drive_frame, DispatchGrid, StagePasses};
use super::params::KernelParams;
use super::pipeline::StagePipelines;

/// Everything the three stages share: device, canvas, compiled programs,
/// bind groups, and the params uniform. Built once; per-frame work only
/// records commands against it.
pub(crate) struct GpuState {
    context: GpuContext,
    canvas: Canvas,
    pipelines: StagePipelines,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    storage_bind_group: wgpu::BindGroup,
    loaded_bind_group: wgpu::BindGroup,
    grid: DispatchGrid,
    frames_since_report: u32,
    last_report: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        tuning: &Tuning,
    ) -> Result<Self, RendererError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size).map_err(|err| {
            RendererError::SetupFailure {
                reason: format!("{err:#}"),
            }
        })?;

        let canvas = Canvas::allocate(&context.device, context.size.width, context.size.height)?;
        let pipelines =
            StagePipelines::build(&context.device, context.surface_format, tuning)?;

        let params_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kernel params"),
            size: std::mem::size_of::<KernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kernel params"),
            layout: &pipelines.params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });
        let storage_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("canvas storage"),
            layout: &pipelines.storage_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&canvas.storage_view),
            }],
        });
        let loaded_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("canvas sampled"),
            layout: &pipelines.loaded_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&canvas.loaded_view),
            }],
        });

        let grid = DispatchGrid::for_canvas(canvas.width, canvas.height);

        Ok(Self {
            context,
            canvas,
            pipelines,
            params_buffer,
            params_bind_group,
            storage_bind_group,
            loaded_bind_group,
            grid,
            frames_since_report: 0,
            last_report: Instant::now(),
        })
    }

    pub(crate) fn reconfigure_surface(&mut self) {
        self.context.reconfigure();
    }

    /// Records and submits one full frame at the given animation time.
    pub(crate) fn render(&mut self, time: f32) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let params = KernelParams::new(self.canvas.width, self.canvas.height, time);
        self.context
            .queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let mut passes = FramePasses {
            encoder,
            pipelines: &self.pipelines,
            params_bind_group: &self.params_bind_group,
            storage_bind_group: &self.storage_bind_group,
            loaded_bind_group: &self.loaded_bind_group,
            surface_view: &surface_view,
            grid: self.grid,
            active: None,
        };
        drive_frame(&mut passes);

        self.context.queue.submit(Some(passes.encoder.finish()));
        frame.present();

        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed();
        if elapsed.as_secs() >= 1 {
            debug!(
                fps = self.frames_since_report as f32 / elapsed.as_secs_f32(),
                "frame rate"
            );
            self.frames_since_report = 0;
            self.last_report = Instant::now();
        }

        Ok(())
    }
}

/// Command recording for one frame. A compute pass stays open between a
/// kernel dispatch and the following canvas commit; dropping it ends the
/// pass, which is the synchronization point for the canvas writes.
struct FramePasses<'a> {
    encoder: wgpu::CommandEncoder,
    pipelines: &'a StagePipelines,
    params_bind_group: &'a wgpu::BindGroup,
    storage_bind_group: &'a wgpu::BindGroup,
    loaded_bind_group: &'a wgpu::BindGroup,
    surface_view: &'a wgpu::TextureView,
    grid: DispatchGrid,
    active: Option<wgpu::ComputePass<'static>>,
}

impl FramePasses<'_> {
    fn begin_kernel(&mut self, label: &'static str, pipeline: &wgpu::ComputePipeline) {
        debug_assert!(self.active.is_none(), "kernel dispatched without a commit");
        let mut pass = self
            .encoder
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, self.params_bind_group, &[]);
        pass.set_bind_group(1, self.storage_bind_group, &[]);
        pass.dispatch_workgroups(self.grid.x, self.grid.y, 1);
        self.active = Some(pass.forget_lifetime());
    }
}

impl StagePasses for FramePasses<'_> {
    fn generate(&mut self) {
        self.begin_kernel("generator", &self.pipelines.generator);
    }

    fn commit_canvas(&mut self) {
        // Ending the pass orders the kernel's canvas writes before the next
        // stage's reads.
        let pass = self.active.take();
        debug_assert!(pass.is_some(), "canvas commit without an open kernel pass");
        drop(pass);
    }

    fn filter(&mut self) {
        self.begin_kernel("filter", &self.pipelines.filter);
    }

    fn present(&mut self) {
        debug_assert!(self.active.is_none(), "presenter started with an open kernel pass");
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("presenter"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.surface_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.0,
                        g: 0.0,
                        b: 0.3,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipelines.presenter);
        pass.set_bind_group(0, self.params_bind_group, &[]);
        pass.set_bind_group(1, self.loaded_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
