use crate::graphics::params::ParamsUniform;
use crate::graphics::particles::{ParticleBuffer, ParticleLayout};
use crate::shaders::{self, particles as shader};

/// Advances every particle once per dispatch.
pub struct Pipeline {
    layout: ParticleLayout,
    bind_group: shader::bind_groups::BindGroup0,
    pipeline: wgpu::ComputePipeline,
}

impl Pipeline {
    pub fn new(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        particles: &ParticleBuffer,
        params: &ParamsUniform,
    ) -> Self {
        let bind_group = shader::bind_groups::BindGroup0::from_bindings(
            device,
            shader::bind_groups::BindGroupLayout0 {
                particles: particles.buffer().as_entire_buffer_binding(),
                params: params.buffer().as_entire_buffer_binding(),
            },
        );

        let pipeline_layout = shader::create_pipeline_layout(device);

        let layout = *particles.layout();
        // The override is the only place the shader learns its workgroup size, so the dispatch
        // math below and the shader can't drift apart.
        let constants = shaders::override_constants(layout.workgroup_size()).constants();
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("compute_pipeline"),
            layout: Some(&pipeline_layout),
            module,
            entry_point: Some(shader::ENTRY_MAIN_COMPUTE),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                zero_initialize_workgroup_memory: false,
            },
            cache: None,
        });

        Self {
            layout,
            bind_group,
            pipeline,
        }
    }

    pub fn compute_pass(&self, compute_pass: &mut wgpu::ComputePass) {
        compute_pass.set_pipeline(&self.pipeline);
        self.bind_group.set(compute_pass);
        compute_pass.dispatch_workgroups(self.layout.dispatch_width(), 1, 1);
    }
}
