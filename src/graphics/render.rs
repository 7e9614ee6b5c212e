use crate::graphics::particles::{PARTICLE_STRIDE, Particle, ParticleBuffer};
use crate::shaders::{self, particles as shader};

/// Only the position is pulled out of each particle; the stride skips over the drift.
const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x2,
    offset: std::mem::offset_of!(Particle, position) as u64,
    shader_location: 0,
}];

pub fn particle_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: PARTICLE_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &PARTICLE_ATTRIBUTES,
    }
}

/// Draws every particle as one point, straight out of the particle buffer.
pub struct Pipeline {
    vertex_count: u32,
    vertex_buffer: wgpu::Buffer,
    pipeline: wgpu::RenderPipeline,
}

impl Pipeline {
    pub fn new(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        particles: &ParticleBuffer,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        // The vertex stage reads the particles as vertices, so no bind groups
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("render_pipeline_layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let fragment_entry = shader::main_fs_entry(
            [Some(wgpu::ColorTargetState {
                // The pass renders into the sRGB view of the surface
                format: surface_format.add_srgb_suffix(),
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            &shaders::override_constants(particles.layout().workgroup_size()),
        );

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("render_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(shader::ENTRY_MAIN_VS),
                compilation_options: Default::default(),
                buffers: &[particle_vertex_layout()],
            },
            fragment: Some(shader::fragment_state(module, &fragment_entry)),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            vertex_count: particles.layout().count(),
            vertex_buffer: particles.buffer().clone(),
            pipeline,
        }
    }

    pub fn render_pass(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_reads_only_the_position() {
        let layout = particle_vertex_layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
    }
}
