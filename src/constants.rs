use std::ops::Range;

/// How many particles we'd like to simulate. The realized count is rounded up to a whole number
/// of workgroups, see `ParticleLayout`.
pub const DEFAULT_TARGET_PARTICLE_COUNT: u32 = 5_000_000;
/// Passed to the compute shader as the `workgroupSize` override, so it only lives here.
pub const DEFAULT_WORKGROUP_SIZE: u32 = 256;

/// Initial particle positions, on both axes, in clip space.
pub const POSITION_RANGE: Range<f32> = -1.0..1.0;
/// Initial particle drift, on both axes.
pub const DRIFT_RANGE: Range<f32> = -0.1..0.1;

/// Opaque black
pub const DEFAULT_BACKGROUND_COLOR: [f64; 3] = [0.0, 0.0, 0.0];

pub const WINDOW_TITLE: &str = "gpu-particles-rs";

/// Height of the frame-rate overlay, in physical pixels. Two lines of text.
pub const OVERLAY_HEIGHT: u32 = 48;
