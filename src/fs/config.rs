use crate::constants;
use crate::error::StartupError;
use crate::graphics::ParticleLayout;

/// Everything that can be tuned before startup. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, facet::Facet)]
pub struct Config {
    /// How many particles we'd like; the realized count is rounded up to whole workgroups.
    pub target_particle_count: u32,
    /// Compute shader workgroup size, injected into the shader as an override.
    pub workgroup_size: u32,
    /// RGB the render target is cleared to every frame.
    pub background_color: [f64; 3],
    /// Whether to draw the frame-rate overlay.
    pub show_overlay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_particle_count: constants::DEFAULT_TARGET_PARTICLE_COUNT,
            workgroup_size: constants::DEFAULT_WORKGROUP_SIZE,
            background_color: constants::DEFAULT_BACKGROUND_COLOR,
            show_overlay: true,
        }
    }
}

impl Config {
    /// Validates the host-side invariants; device limits are checked once we have a device.
    pub fn particle_layout(&self) -> Result<ParticleLayout, StartupError> {
        ParticleLayout::new(self.target_particle_count, self.workgroup_size)
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.background_color;
        wgpu::Color { r, g, b, a: 1.0 }
    }
}
