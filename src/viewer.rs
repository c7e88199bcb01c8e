//! Interactive window: type text, watch it grow.
//!
//! The viewer owns a [`Session`], a [`TextInput`] and the current
//! [`AppConfig`]. Every redraw it syncs the session with the text, style
//! and reset key, advances the field on the chosen backend, and draws the
//! surface.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::ModifiersState,
    window::{Window, WindowId},
};

use crate::config::{AppConfig, FONT_SIZE_STEP};
use crate::error::{GpuError, ViewerError};
use crate::gpu::GpuState;
use crate::input::{command_for, Command, TextInput};
use crate::simulation::{Session, DEFAULT_GRID};
use crate::stepper::FrameStats;
use crate::surface::SurfaceGrid;
use crate::time::FrameClock;

/// Where the field is stepped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Compute shaders; the field never leaves the GPU.
    #[default]
    Gpu,
    /// Rayon on the CPU; the settled field is uploaded each frame.
    Cpu,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Gpu => f.write_str("gpu"),
            Backend::Cpu => f.write_str("cpu"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gpu" => Ok(Backend::Gpu),
            "cpu" => Ok(Backend::Cpu),
            other => Err(format!("unknown backend '{}', expected gpu or cpu", other)),
        }
    }
}

/// Viewer builder.
pub struct Viewer {
    config: AppConfig,
    text: String,
    backend: Backend,
    grid: usize,
}

impl Viewer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            text: String::new(),
            backend: Backend::Gpu,
            grid: DEFAULT_GRID,
        }
    }

    /// Initial text. Ignored with a warning if it exceeds the length limit.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Cells per side of the simulation grid.
    pub fn with_grid(mut self, grid: usize) -> Self {
        self.grid = grid;
        self
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let mut input = TextInput::new();
        if !input.set(&self.text) {
            warn!(
                "Initial text is longer than {} characters, starting empty",
                input.max_chars()
            );
        }

        let mut session = Session::new(self.grid, self.grid, self.config.text_style())?;
        session.set_text(input.text());

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        info!("Starting viewer ({} backend, {}x{} grid)", self.backend, self.grid, self.grid);
        let mut app = App::new(self.config, input, session, self.backend);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn window_title(config: &AppConfig, clock: &FrameClock) -> String {
    format!(
        "rdtype | {} | {} {}px | {:.0} fps | {:.1} Mcell/s",
        config.preset_name().unwrap_or("Custom"),
        config.font_family,
        config.font_size,
        clock.fps(),
        clock.cells_per_second() / 1e6
    )
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    config: AppConfig,
    input: TextInput,
    session: Session,
    backend: Backend,
    grid: SurfaceGrid,
    clock: FrameClock,
    reset_key: u64,
    modifiers: ModifiersState,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<ViewerError>,
}

impl App {
    fn new(config: AppConfig, input: TextInput, session: Session, backend: Backend) -> Self {
        Self {
            window: None,
            gpu_state: None,
            config,
            input,
            reset_key: session.reset_key(),
            session,
            backend,
            grid: SurfaceGrid::default(),
            clock: FrameClock::new(),
            modifiers: ModifiersState::empty(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        error!("{}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::Reset => self.reset_key = self.reset_key.wrapping_add(1),
            Command::NextPreset => {
                let preset = self.config.next_preset();
                info!("Preset {}", preset.name);
                self.config = self.config.clone().with_preset(preset);
            }
            Command::ToggleCaps => {
                let caps = !self.config.use_caps;
                self.config = self.config.clone().with_caps(caps);
            }
            Command::NextFont => {
                let family = self.config.font_family.next();
                self.config = self.config.clone().with_font_family(family);
            }
            Command::FontSizeUp => {
                let size = self.config.font_size + FONT_SIZE_STEP;
                self.config = self.config.clone().with_font_size(size);
            }
            Command::FontSizeDown => {
                let size = self.config.font_size - FONT_SIZE_STEP;
                self.config = self.config.clone().with_font_size(size);
            }
            edit => {
                self.input.apply(&edit);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.session.sync_reset_key(self.reset_key) {
            self.fail(event_loop, e.into());
            return;
        }
        self.session.set_style(&self.config.text_style());
        self.session.set_text(self.input.text());

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        let instance = self.session.instance();
        if gpu_state.field_generation() != self.session.generation() {
            gpu_state.replace_field(instance.field(), self.session.generation());
        }
        gpu_state.upload_mask(instance.mask());

        let params = self.config.simulation_params();
        let (step, cell_updates) = match self.backend {
            Backend::Gpu => {
                let cycles = params.iterations_per_frame.max(1);
                let stats = FrameStats::for_cycles(cycles, instance.field().len());
                (Some(&params), stats.cell_updates)
            }
            Backend::Cpu => {
                let stats = self.session.advance_frame(&params);
                gpu_state.upload_field(self.session.instance().field());
                (None, stats.cell_updates)
            }
        };

        if self.clock.tick(cell_updates) {
            if let Some(window) = &self.window {
                window.set_title(&window_title(&self.config, &self.clock));
            }
        }

        let style = self.config.surface_style();
        let background = self.config.background_color.to_vec3();
        match gpu_state.render(&style, background, step) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu_state.resize(gpu_state.size());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(window_title(&self.config, &self.clock))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };
        self.window = Some(window.clone());

        let gpu_state: Result<GpuState, GpuError> = pollster::block_on(GpuState::new(
            window,
            self.session.instance().field(),
            self.session.generation(),
            &self.grid,
        ));
        match gpu_state {
            Ok(state) => self.gpu_state = Some(state),
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    let text = event.text.as_deref();
                    if let Some(command) = command_for(&event.logical_key, text, self.modifiers) {
                        self.apply_command(command);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state
                                .camera
                                .orbit((position.x - last_x) as f32, (position.y - last_y) as f32);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
