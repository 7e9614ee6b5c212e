//! The simulation parameters: pointer and viewport state handed to the compute shader.
//!
//! The host keeps a single copy that input handlers write into as events arrive. Whatever is in
//! it when a frame starts is uploaded, every frame, changed or not. All of this happens on the
//! event loop thread, so there is no locking; the last write before an upload wins.

use bytemuck::Zeroable;
use glam::UVec2;

/// Generated from particles.wgsl, laid out as
///
/// | offset | field                     |
/// |--------|---------------------------|
/// | 0      | cursor.x                  |
/// | 4      | cursor.y (from bottom)    |
/// | 8      | viewport.x (width)        |
/// | 12     | viewport.y (height)       |
/// | 16     | pressed (0 or 1)          |
/// | 20     | padding                   |
pub use crate::shaders::particles::SimulationParams;

pub const SIMULATION_PARAMS_SIZE: u64 = size_of::<SimulationParams>() as u64;

/// Host-side half of the parameter channel. Input handlers mutate this between frames.
#[derive(Debug)]
pub struct ParamsChannel {
    record: SimulationParams,
}

impl Default for ParamsChannel {
    fn default() -> Self {
        Self {
            record: SimulationParams::zeroed(),
        }
    }
}

impl ParamsChannel {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let mut out = Self::default();
        out.set_viewport(viewport_width, viewport_height);
        out
    }

    /// `y` is measured from the bottom of the viewport.
    pub fn set_cursor(&mut self, x: u32, y: u32) {
        self.record.cursor = UVec2::new(x, y);
    }

    /// Takes a pointer position in window coordinates (origin top-left, possibly fractional or
    /// outside the window) and stores it bottom-up.
    pub fn set_cursor_from_top(&mut self, x: f64, y: f64) {
        let x = x.max(0.0) as u32;
        let y = self.record.viewport.y.saturating_sub(y.max(0.0) as u32);
        self.set_cursor(x, y);
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.record.pressed = pressed as u32;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.record.viewport = UVec2::new(width, height);
    }

    pub fn record(&self) -> &SimulationParams {
        &self.record
    }

    /// The exact bytes the next upload will send.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self.record())
    }
}

/// Device-side half of the parameter channel.
pub struct ParamsUniform {
    buffer: wgpu::Buffer,
}

impl ParamsUniform {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("simulation_params_buffer"),
            size: SIMULATION_PARAMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Unconditional: there's no dirty tracking, so nothing can be missed.
    pub fn upload(&self, queue: &wgpu::Queue, channel: &ParamsChannel) {
        queue.write_buffer(&self.buffer, 0, channel.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn byte_layout() {
        let mut channel = ParamsChannel::default();
        channel.set_cursor(100, 200);
        channel.set_viewport(800, 600);
        channel.set_pressed(true);

        let bytes = channel.as_bytes();
        assert_eq!(bytes.len(), 24);
        assert_eq!(word(bytes, 0), 100);
        assert_eq!(word(bytes, 4), 200);
        assert_eq!(word(bytes, 8), 800);
        assert_eq!(word(bytes, 12), 600);
        assert_eq!(word(bytes, 16), 1);
        assert_eq!(word(bytes, 20), 0);

        let mut expected = Vec::new();
        for v in [100u32, 200, 800, 600, 1, 0] {
            expected.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(bytes, expected.as_slice());
    }

    #[test]
    fn record_is_the_full_uniform() {
        assert_eq!(SIMULATION_PARAMS_SIZE, 24);
        assert_eq!(std::mem::offset_of!(SimulationParams, pressed), 16);
        assert_eq!(std::mem::offset_of!(SimulationParams, padding), 20);
    }

    #[test]
    fn resize_is_visible_to_next_upload() {
        let mut channel = ParamsChannel::new(800, 600);
        channel.set_cursor(10, 20);
        channel.set_viewport(1920, 1080);

        let bytes = channel.as_bytes();
        assert_eq!(word(bytes, 8), 1920);
        assert_eq!(word(bytes, 12), 1080);
        // the cursor is untouched by a resize
        assert_eq!(channel.record().cursor, UVec2::new(10, 20));
    }

    #[test]
    fn minimized_viewport_is_uploaded() {
        let mut channel = ParamsChannel::new(800, 600);
        channel.set_viewport(0, 0);
        assert_eq!(word(channel.as_bytes(), 8), 0);
        assert_eq!(word(channel.as_bytes(), 12), 0);

        // the flip uses the new height, not the stale one
        channel.set_cursor_from_top(10.0, 10.0);
        assert_eq!(channel.record().cursor, UVec2::new(10, 0));

        channel.set_viewport(1024, 768);
        channel.set_cursor_from_top(10.0, 10.0);
        assert_eq!(channel.record().cursor, UVec2::new(10, 758));
    }

    #[test]
    fn press_then_release_before_upload() {
        let mut channel = ParamsChannel::default();
        channel.set_pressed(true);
        channel.set_pressed(false);
        assert_eq!(channel.record().pressed, 0);
        assert_eq!(word(channel.as_bytes(), 16), 0);

        channel.set_pressed(false);
        channel.set_pressed(true);
        assert_eq!(word(channel.as_bytes(), 16), 1);
    }

    #[test]
    fn coalesced_moves_keep_the_last() {
        let mut channel = ParamsChannel::new(800, 600);
        channel.set_cursor(1, 1);
        channel.set_cursor(2, 2);
        channel.set_cursor(3, 3);
        assert_eq!(channel.record().cursor, UVec2::new(3, 3));
    }

    #[test]
    fn cursor_is_flipped_to_bottom_origin() {
        let mut channel = ParamsChannel::new(800, 600);
        channel.set_cursor_from_top(100.7, 0.0);
        assert_eq!(channel.record().cursor, UVec2::new(100, 600));

        channel.set_cursor_from_top(0.0, 600.0);
        assert_eq!(channel.record().cursor, UVec2::new(0, 0));

        // outside the window
        channel.set_cursor_from_top(-20.0, 900.0);
        assert_eq!(channel.record().cursor, UVec2::new(0, 0));
        channel.set_cursor_from_top(10.0, -5.0);
        assert_eq!(channel.record().cursor, UVec2::new(10, 600));
    }

    #[test]
    fn starts_released_at_origin() {
        let channel = ParamsChannel::new(640, 480);
        assert_eq!(
            channel.record(),
            &SimulationParams {
                cursor: UVec2::ZERO,
                viewport: UVec2::new(640, 480),
                pressed: 0,
                padding: 0,
            }
        );
    }
}
