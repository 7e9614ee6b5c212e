//! Everything that lives on the GPU, and the per-frame sequencing between it.

use std::time::Duration;

use rand::Rng;
use winit::dpi::PhysicalSize;

use crate::fs::Config;
use crate::shaders;

mod compute;
mod frame_clock;
mod params;
mod particles;
mod render;
mod text;

pub use frame_clock::FrameClock;
pub use params::ParamsChannel;
pub use particles::ParticleLayout;

/// How much work a single frame records. Fixed for the lifetime of the pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Workgroups along x in the one compute dispatch
    pub dispatch_width: u32,
    /// Vertices in the one draw call
    pub vertex_count: u32,
}

impl From<&ParticleLayout> for FrameGeometry {
    fn from(layout: &ParticleLayout) -> Self {
        Self {
            dispatch_width: layout.dispatch_width(),
            vertex_count: layout.count(),
        }
    }
}

/// A zero-sized surface can't be configured or drawn to.
pub fn is_drawable(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

pub struct Pipeline {
    clear_color: wgpu::Color,
    params: ParamsChannel,
    clock: FrameClock,

    particles: particles::ParticleBuffer,
    params_uniform: params::ParamsUniform,
    compute: compute::Pipeline,
    render: render::Pipeline,
    text: Option<text::Pipeline<'static>>,
}

impl Pipeline {
    /// Allocates and uploads the initial particle state, then builds both pipelines. Buffer and
    /// pipeline creation errors surface through the device's error scopes, not here.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: PhysicalSize<u32>,
        surface_format: wgpu::TextureFormat,
        config: &Config,
        layout: ParticleLayout,
        rng: &mut impl Rng,
    ) -> Self {
        let particles = particles::ParticleBuffer::new(device, queue, layout, rng);
        let params_uniform = params::ParamsUniform::new(device);

        let module = shaders::particles::create_shader_module(device);
        let compute = compute::Pipeline::new(device, &module, &particles, &params_uniform);
        let render = render::Pipeline::new(device, &module, &particles, surface_format);

        let text = if config.show_overlay {
            text::Pipeline::new(device, size, surface_format, layout.count())
        } else {
            None
        };

        let mut out = Self {
            clear_color: config.clear_color(),
            params: ParamsChannel::new(size.width, size.height),
            clock: FrameClock::default(),
            particles,
            params_uniform,
            compute,
            render,
            text,
        };
        out.resize(queue, size);
        out
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.particles.layout().into()
    }

    /// Input handlers write here between frames.
    pub fn params_mut(&mut self) -> &mut ParamsChannel {
        &mut self.params
    }

    /// The viewport always follows the window, including a minimized window's zero size, so
    /// the parameters stay current. The overlay projection is only rebuilt for a visible size.
    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>) {
        self.params.set_viewport(new_size.width, new_size.height);
        if let Some(text) = &mut self.text
            && is_drawable(new_size)
        {
            text.resize(queue, new_size);
        }
    }

    /// Feeds the refresh tick's elapsed time into the frame clock and returns the current rate.
    pub fn tick(&mut self, elapsed: Duration) -> Option<f64> {
        let framerate = self.clock.tick(elapsed);
        if let Some(text) = &mut self.text {
            text.set_framerate(framerate);
        }
        framerate
    }

    /// Records and submits one frame: simulate, then draw what was just simulated.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_texture: &wgpu::Texture,
        surface_format: wgpu::TextureFormat,
    ) {
        // Unconditionally, whether or not any input arrived since the last frame
        self.params_uniform.upload(queue, &self.params);

        if let Some(text) = &mut self.text {
            text.prepare(device, queue);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("particles_compute_pass"),
                timestamp_writes: None,
            });

            self.compute.compute_pass(&mut compute_pass);
        }

        // No barrier here: wgpu tracks the particle buffer going from storage write to vertex
        // read between the two passes and synchronizes them itself.

        let surface_texture_view = surface_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("surface_texture_view"),
            format: Some(surface_format.add_srgb_suffix()),
            dimension: Some(wgpu::TextureViewDimension::D2),
            usage: Some(wgpu::TextureUsages::RENDER_ATTACHMENT),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: None,
            base_array_layer: 0,
            array_layer_count: None,
        });

        {
            // Create the renderpass which will clear the screen before drawing anything
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("particles_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.render.render_pass(&mut render_pass);
            if let Some(text) = &self.text {
                text.render_pass(&mut render_pass);
            }
        }

        // One submission, so the compute pass always lands before the render pass
        queue.submit([encoder.finish()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_million_scenario() {
        let layout = ParticleLayout::new(5_000_000, 256).unwrap();
        assert_eq!(
            FrameGeometry::from(&layout),
            FrameGeometry {
                dispatch_width: 19_532,
                vertex_count: 5_000_192,
            }
        );
    }

    #[test]
    fn minimized_window_is_not_drawable() {
        assert!(is_drawable(PhysicalSize::new(800, 600)));
        assert!(is_drawable(PhysicalSize::new(1, 1)));
        assert!(!is_drawable(PhysicalSize::new(0, 0)));
        assert!(!is_drawable(PhysicalSize::new(0, 600)));
        assert!(!is_drawable(PhysicalSize::new(800, 0)));
    }

    #[test]
    fn dispatch_covers_every_vertex() {
        for (target, workgroup_size) in [(1, 1), (1, 256), (300, 64), (4096, 256), (77_777, 32)] {
            let layout = ParticleLayout::new(target, workgroup_size).unwrap();
            let geometry = FrameGeometry::from(&layout);
            assert_eq!(
                geometry.dispatch_width * workgroup_size,
                geometry.vertex_count
            );
        }
    }
}
