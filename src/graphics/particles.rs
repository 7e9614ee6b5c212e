use rand::Rng;

use crate::constants::{DRIFT_RANGE, POSITION_RANGE};
use crate::error::StartupError;

/// A single particle, exactly as the shaders see it: the `Particle` struct generated from
/// particles.wgsl, a position followed by a drift.
pub use crate::shaders::particles::Particle;

pub const PARTICLE_STRIDE: u64 = size_of::<Particle>() as u64;

impl Particle {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            position: glam::vec2(
                rng.random_range(POSITION_RANGE),
                rng.random_range(POSITION_RANGE),
            ),
            drift: glam::vec2(rng.random_range(DRIFT_RANGE), rng.random_range(DRIFT_RANGE)),
        }
    }
}

/// The fixed geometry of the particle buffer. The realized count is always a whole number of
/// workgroups, so a dispatch covers every particle exactly once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParticleLayout {
    count: u32,
    workgroup_size: u32,
}

impl ParticleLayout {
    /// Rounds `target_count` up to the next multiple of `workgroup_size`.
    pub fn new(target_count: u32, workgroup_size: u32) -> Result<Self, StartupError> {
        if target_count == 0 {
            return Err(StartupError::InvalidConfig(
                "particle count must be positive".into(),
            ));
        }
        if workgroup_size == 0 {
            return Err(StartupError::InvalidConfig(
                "workgroup size must be positive".into(),
            ));
        }
        let count = target_count
            .div_ceil(workgroup_size)
            .checked_mul(workgroup_size)
            .ok_or_else(|| {
                StartupError::InvalidConfig(format!(
                    "{target_count} particles in workgroups of {workgroup_size} overflows u32"
                ))
            })?;
        Ok(Self {
            count,
            workgroup_size,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn workgroup_size(&self) -> u32 {
        self.workgroup_size
    }

    /// Number of workgroups along x for one compute dispatch. Exact, never rounded.
    pub fn dispatch_width(&self) -> u32 {
        self.count / self.workgroup_size
    }

    pub fn buffer_size(&self) -> u64 {
        self.count as u64 * PARTICLE_STRIDE
    }

    /// Checks the layout against what the device can actually do.
    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<(), StartupError> {
        let fail = |msg: String| Err(StartupError::DeviceLimits(msg));
        if self.workgroup_size > limits.max_compute_workgroup_size_x {
            return fail(format!(
                "workgroup size {} > max_compute_workgroup_size_x {}",
                self.workgroup_size, limits.max_compute_workgroup_size_x
            ));
        }
        if self.workgroup_size > limits.max_compute_invocations_per_workgroup {
            return fail(format!(
                "workgroup size {} > max_compute_invocations_per_workgroup {}",
                self.workgroup_size, limits.max_compute_invocations_per_workgroup
            ));
        }
        if self.dispatch_width() > limits.max_compute_workgroups_per_dimension {
            return fail(format!(
                "dispatch width {} > max_compute_workgroups_per_dimension {}",
                self.dispatch_width(),
                limits.max_compute_workgroups_per_dimension
            ));
        }
        if self.buffer_size() > limits.max_buffer_size {
            return fail(format!(
                "particle buffer of {} bytes > max_buffer_size {}",
                self.buffer_size(),
                limits.max_buffer_size
            ));
        }
        if self.buffer_size() > limits.max_storage_buffer_binding_size as u64 {
            return fail(format!(
                "particle buffer of {} bytes > max_storage_buffer_binding_size {}",
                self.buffer_size(),
                limits.max_storage_buffer_binding_size
            ));
        }
        Ok(())
    }
}

/// Builds the host-side staging copy of the initial particle state.
pub fn generate(layout: &ParticleLayout, rng: &mut impl Rng) -> Vec<Particle> {
    (0..layout.count()).map(|_| Particle::random(rng)).collect()
}

/// The particle buffer. Written once from the host at creation; after that only the compute
/// shader touches it.
pub struct ParticleBuffer {
    layout: ParticleLayout,
    buffer: wgpu::Buffer,
}

impl ParticleBuffer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: ParticleLayout,
        rng: &mut impl Rng,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particles_buffer"),
            size: layout.buffer_size(),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let particles = generate(&layout, rng);
        queue.write_buffer(&buffer, 0, bytemuck::cast_slice(particles.as_slice()));

        Self { layout, buffer }
    }

    pub fn layout(&self) -> &ParticleLayout {
        &self.layout
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn realized_count_is_whole_workgroups() {
        for workgroup_size in [1, 2, 32, 64, 100, 256, 1024] {
            for target in [1, 2, 63, 64, 65, 255, 256, 257, 1000, 999_999, 5_000_000] {
                let layout = ParticleLayout::new(target, workgroup_size).unwrap();
                let n = layout.count();
                assert_eq!(n % workgroup_size, 0, "T={target} W={workgroup_size}");
                assert!(n >= target);
                assert!(n - target < workgroup_size);
                assert_eq!(layout.dispatch_width() * workgroup_size, n);
            }
        }
    }

    #[test]
    fn five_million_particles() {
        let layout = ParticleLayout::new(5_000_000, 256).unwrap();
        assert_eq!(layout.count(), 5_000_192);
        assert_eq!(layout.dispatch_width(), 19_532);
        assert_eq!(layout.buffer_size(), 5_000_192 * 16);
    }

    #[test]
    fn rejects_degenerate_layouts() {
        assert!(matches!(
            ParticleLayout::new(0, 256),
            Err(StartupError::InvalidConfig(_))
        ));
        assert!(matches!(
            ParticleLayout::new(100, 0),
            Err(StartupError::InvalidConfig(_))
        ));
        assert!(matches!(
            ParticleLayout::new(u32::MAX, 256),
            Err(StartupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn limits_are_enforced() {
        let limits = wgpu::Limits::default();
        assert!(ParticleLayout::new(1000, 256).unwrap().check_limits(&limits).is_ok());

        let too_wide = ParticleLayout::new(1000, 4096).unwrap();
        assert!(matches!(
            too_wide.check_limits(&limits),
            Err(StartupError::DeviceLimits(_))
        ));

        // 65536 workgroups of 1 is one more than the default per-dimension limit.
        let too_many = ParticleLayout::new(65_536, 1).unwrap();
        assert!(matches!(
            too_many.check_limits(&limits),
            Err(StartupError::DeviceLimits(_))
        ));
    }

    #[test]
    fn particle_record_layout() {
        assert_eq!(size_of::<Particle>(), 16);
        assert_eq!(std::mem::offset_of!(Particle, position), 0);
        assert_eq!(std::mem::offset_of!(Particle, drift), 8);

        let p = Particle {
            position: glam::vec2(1.0, 2.0),
            drift: glam::vec2(3.0, 4.0),
        };
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&p));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn initial_state_is_in_range() {
        let layout = ParticleLayout::new(10_000, 64).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let particles = generate(&layout, &mut rng);
        assert_eq!(particles.len(), layout.count() as usize);
        for p in &particles {
            assert!((-1.0..=1.0).contains(&p.position.x));
            assert!((-1.0..=1.0).contains(&p.position.y));
            assert!((-0.1..=0.1).contains(&p.drift.x));
            assert!((-0.1..=0.1).contains(&p.drift.y));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let layout = ParticleLayout::new(128, 64).unwrap();
        let a = generate(&layout, &mut StdRng::seed_from_u64(42));
        let b = generate(&layout, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
