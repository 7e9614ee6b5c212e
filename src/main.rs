use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use rand::{SeedableRng, rngs::StdRng};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::error::StartupError;
use crate::fs::Config;

mod constants;
mod error;
mod fs;
mod graphics;
mod shaders;

/// How often the current frame rate is written to the log.
const FRAMERATE_LOG_INTERVAL: Duration = Duration::from_secs(1);

struct State {
    window: Arc<Window>,

    device: wgpu::Device,
    queue: wgpu::Queue,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface<'static>,
    surface_format: wgpu::TextureFormat,
    alpha_mode: wgpu::CompositeAlphaMode,
    pipeline: crate::graphics::Pipeline,

    start: Instant,
    last_framerate_log: Duration,
}

impl State {
    async fn new(
        config: &Config,
        seed: Option<u64>,
        window: Arc<Window>,
    ) -> Result<State, StartupError> {
        let layout = config.particle_layout()?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptionsBase {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        // Ask for everything the adapter has; big particle buffers need more than the defaults.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await?;
        layout.check_limits(&device.limits())?;

        let size = window.inner_size();

        let cap = surface.get_capabilities(&adapter);
        let surface_format = *cap.formats.first().ok_or(StartupError::Surface)?;
        let alpha_mode = choose_alpha_mode(&cap.alpha_modes);

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        // Anything that goes wrong while allocating is fatal, so capture it instead of letting
        // wgpu's default handler panic.
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = graphics::Pipeline::new(
            &device,
            &queue,
            size,
            surface_format,
            config,
            layout,
            &mut rng,
        );
        let validation_error = device.pop_error_scope().await;
        let out_of_memory_error = device.pop_error_scope().await;
        if let Some(err) = out_of_memory_error.or(validation_error) {
            return Err(StartupError::Allocation(err));
        }

        let geometry = pipeline.geometry();
        log::info!(
            "Simulating {} particles ({} requested): {} workgroups of {}, {} vertices, {} bytes",
            layout.count(),
            config.target_particle_count,
            geometry.dispatch_width,
            layout.workgroup_size(),
            geometry.vertex_count,
            layout.buffer_size(),
        );

        let mut state = State {
            window,
            device,
            queue,
            size,
            surface,
            surface_format,
            alpha_mode,
            pipeline,
            start: Instant::now(),
            last_framerate_log: Duration::ZERO,
        };

        // Configure surface for the first time
        state.configure_surface();

        Ok(state)
    }

    fn get_window(&self) -> &Window {
        &self.window
    }

    fn is_drawable(&self) -> bool {
        graphics::is_drawable(self.size)
    }

    fn configure_surface(&mut self) {
        self.pipeline.resize(&self.queue, self.size);

        // A minimized window reports a zero size, which can't be configured
        if !self.is_drawable() {
            return;
        }
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            // Request compatibility with the sRGB-format texture view we‘re going to create later.
            view_formats: vec![self.surface_format.add_srgb_suffix()],
            alpha_mode: self.alpha_mode,
            width: self.size.width,
            height: self.size.height,
            desired_maximum_frame_latency: 1,
            present_mode: wgpu::PresentMode::AutoVsync,
        };
        self.surface.configure(&self.device, &surface_config);
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.size = new_size;

        // reconfigure the surface
        self.configure_surface();
    }

    fn update_framerate(&mut self) {
        let elapsed = self.start.elapsed();
        let framerate = self.pipeline.tick(elapsed);
        if let Some(framerate) = framerate
            && elapsed.saturating_sub(self.last_framerate_log) >= FRAMERATE_LOG_INTERVAL
        {
            log::debug!("Framerate: {}", framerate.round());
            self.last_framerate_log = elapsed;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        self.pipeline.render(
            &self.device,
            &self.queue,
            &surface_texture.texture,
            self.surface_format,
        );

        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}

struct App {
    config: Config,
    seed: Option<u64>,
    close_requested: bool,
    failed: bool,
    state: Option<State>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        // Create window object
        let window_attributes = Window::default_attributes().with_title(constants::WINDOW_TITLE);
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Could not create a window: {err}");
                self.failed = true;
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(State::new(&self.config, self.seed, window.clone())) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("{err}");
                self.failed = true;
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                log::info!("The close button was pressed; stopping");
                self.close_requested = true;
            }
            WindowEvent::RedrawRequested => {
                // Nothing to draw into while minimized; the next non-zero resize restarts the
                // redraw loop.
                if !state.is_drawable() {
                    return;
                }
                state.update_framerate();
                match state.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.configure_surface();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory acquiring the surface texture; stopping");
                        self.failed = true;
                        self.close_requested = true;
                        return;
                    }
                    Err(err) => {
                        // On Linux, this usually means that the window was drawn over by
                        // something else.
                        log::warn!("Skipping frame: {err}");
                    }
                }

                // Request another redraw after this one so we keep a consistent framerate
                state.get_window().request_redraw();
            }
            WindowEvent::Resized(size) => {
                // Reconfigures the size of the surface. We do not re-render here, but the
                // redraw loop stops while minimized, so restart it once there's a surface again.
                state.resize(size);
                if state.is_drawable() {
                    state.get_window().request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                state
                    .pipeline
                    .params_mut()
                    .set_cursor_from_top(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => {
                state
                    .pipeline
                    .params_mut()
                    .set_pressed(button_state == ElementState::Pressed);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::F11),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                // Toggle fullscreen
                let window = state.get_window();
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(window.current_monitor())));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.close_requested = true;
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested {
            event_loop.exit();
        }
    }
}

/// The clear colour is fully opaque, so prefer a surface that ignores alpha.
fn choose_alpha_mode(supported: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    if supported.contains(&wgpu::CompositeAlphaMode::Opaque) {
        wgpu::CompositeAlphaMode::Opaque
    } else {
        wgpu::CompositeAlphaMode::Auto
    }
}

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        cmd main {
            /// JSON configuration file.
            optional --config file: PathBuf
            /// Number of particles to simulate, rounded up to whole workgroups.
            optional --particles count: u32
            /// Compute shader workgroup size.
            optional --workgroup-size size: u32
            /// Seed for the initial particle state.
            optional --seed seed: u64
            /// Don't draw the frame-rate overlay.
            optional --no-overlay
            /// Print the effective configuration as JSON and exit.
            optional --print-config
        }
    }
}

/// File first, then command line overrides on top.
fn resolve_config(flags: &flags::Main) -> Config {
    let mut config = match &flags.config {
        Some(path) => Config::read_or_default(path),
        None => Config::default(),
    };
    if let Some(count) = flags.particles {
        config.target_particle_count = count;
    }
    if let Some(size) = flags.workgroup_size {
        config.workgroup_size = size;
    }
    if flags.no_overlay {
        config.show_overlay = false;
    }
    config
}

fn main() {
    // wgpu uses `log` for all of our logging, so we initialize a logger with the `env_logger` crate.
    //
    // To change the log level, set the `RUST_LOG` environment variable. See the `env_logger`
    // documentation for more information.
    env_logger::init();

    let flags = flags::Main::from_env_or_exit();
    let config = resolve_config(&flags);

    if flags.print_config {
        if let Err(err) = config.write(std::io::stdout()) {
            log::error!("Could not print config: {err}");
            std::process::exit(1);
        }
        println!();
        return;
    }

    // Catch bad counts before we go to the trouble of opening a window
    if let Err(err) = config.particle_layout() {
        log::error!("{err}");
        std::process::exit(1);
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Could not create the event loop: {err}");
            std::process::exit(1);
        }
    };

    // When the current loop iteration finishes, immediately begin a new
    // iteration regardless of whether or not new events are available to
    // process. Preferred for applications that want to render as fast as
    // possible, like games.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        config,
        seed: flags.seed,
        state: None,
        close_requested: false,
        failed: false,
    };
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop failed: {err}");
        std::process::exit(1);
    }
    if app.failed {
        std::process::exit(1);
    }
}
