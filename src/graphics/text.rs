use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use wgpu_text::BrushBuilder;
use wgpu_text::TextBrush;
use wgpu_text::glyph_brush::Layout;
use wgpu_text::glyph_brush::OwnedSection;
use wgpu_text::glyph_brush::OwnedText;
use wgpu_text::glyph_brush::Section;
use wgpu_text::glyph_brush::ab_glyph::FontRef;
use winit::dpi::PhysicalSize;

use crate::constants::OVERLAY_HEIGHT;

/// Two rows of text: frame rate and particle count.
const FONT_SIZE: f32 = OVERLAY_HEIGHT as f32 / 2.0;
const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Frame-rate and particle-count readout in the top-left corner.
pub struct Pipeline<'a> {
    brush: TextBrush<FontRef<'a>>,
    section: OwnedSection,
    particle_count: String,
}

fn load_monospace_font() -> Option<&'static [u8]> {
    let font_handle = match SystemSource::new()
        .select_best_match(&[FamilyName::Monospace], &Properties::new())
    {
        Ok(handle) => handle,
        Err(err) => {
            log::warn!("Did not find a system monospace font: {err}");
            return None;
        }
    };
    let font_vec = match font_handle {
        Handle::Memory { bytes, .. } => Vec::clone(&bytes),
        Handle::Path { path, .. } => match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Failed to read font file {}: {err}", path.display());
                return None;
            }
        },
    };
    // The brush borrows the font for the rest of the program
    let font_bytes: &'static [u8] = font_vec.leak();
    Some(font_bytes)
}

impl Pipeline<'_> {
    /// Returns `None` if no usable font is installed; the overlay is then simply skipped.
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        surface_format: wgpu::TextureFormat,
        particle_count: u32,
    ) -> Option<Self> {
        let font_bytes = load_monospace_font()?;
        let brush_builder = match BrushBuilder::using_font_bytes(font_bytes) {
            Ok(builder) => builder,
            Err(err) => {
                log::warn!("Failed to load font: {err}");
                return None;
            }
        };
        let brush = brush_builder.build(
            device,
            size.width,
            size.height,
            surface_format.add_srgb_suffix(),
        );

        let section = Section::default().with_layout(Layout::default()).to_owned();

        let mut out = Self {
            brush,
            section,
            particle_count: format_count(particle_count),
        };
        out.set_framerate(None);
        Some(out)
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>) {
        self.section.bounds = (new_size.width as f32, OVERLAY_HEIGHT as f32);
        self.section.screen_position = (0.0, 0.0);
        self.brush
            .resize_view(new_size.width as f32, new_size.height as f32, queue);
    }

    pub fn set_framerate(&mut self, framerate: Option<f64>) {
        self.section.text.clear();
        self.section.text.push(
            OwnedText::default()
                .with_text(format_overlay(framerate, &self.particle_count))
                .with_scale(FONT_SIZE)
                .with_color(TEXT_COLOR),
        );
    }

    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if let Err(err) = self.brush.queue(device, queue, [&self.section]) {
            log::warn!("Failed to queue overlay text: {err:?}");
        }
    }

    pub fn render_pass<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>) {
        self.brush.draw(render_pass);
    }
}

fn format_overlay(framerate: Option<f64>, particle_count: &str) -> String {
    match framerate {
        Some(framerate) => {
            format!("Framerate: {}\nParticles: {particle_count}", framerate.round())
        }
        None => format!("Framerate: -\nParticles: {particle_count}"),
    }
}

/// `5000192` -> `5,000,192`
fn format_count(count: u32) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
