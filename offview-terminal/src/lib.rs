/// Terminal front end: renders a mesh as ASCII and maps mouse/keyboard input
/// onto the orientation controller
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use std::fs::File;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

use offview_core::config::LoggingConfig;
use offview_core::{Config, DragTracker, GestureDelta, Mesh, RenderContext, Viewport};

pub mod renderer;
pub mod guard;

pub use renderer::AsciiRenderer;
pub use guard::TerminalGuard;

/// Nominal size of one terminal cell in pixels. Gesture deltas and the
/// projection aspect ratio are computed in these units.
pub const CELL_WIDTH_PX: f32 = 8.0;
pub const CELL_HEIGHT_PX: f32 = 16.0;

/// Scale change per scroll notch or `+`/`-` press
pub const ZOOM_STEP: f32 = 1.1;

/// Synthetic drag length for arrow keys, in pixels
const KEY_DRAG_PX: f32 = 16.0;

/// Install `env_logger` according to the `[logging]` section
///
/// `RUST_LOG` still overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> io::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(config.level.into())
        .parse_default_env();
    if let Some(path) = &config.file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder
        .try_init()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))
}

/// Scale that brings the mesh's bounding box to a radius of two units
pub fn fit_scale(mesh: &Mesh) -> f32 {
    let Some((min, max)) = mesh.bounds() else {
        return 1.0;
    };
    let radius = ((max - min) / 2.0).norm();
    if radius > f32::EPSILON {
        2.0 / radius
    } else {
        1.0
    }
}

fn viewport_for(columns: u16, rows: u16) -> Viewport {
    Viewport::new(
        (columns as f32 * CELL_WIDTH_PX) as u32,
        (rows as f32 * CELL_HEIGHT_PX) as u32,
    )
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    context: RenderContext,
    tracker: DragTracker,
    renderer: AsciiRenderer,
    pointer_x: f32,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// The mesh is fitted to the view by scaling the configured initial scale
    pub fn new(mesh: Mesh, config: &Config) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;

        let mut config = config.clone();
        config.interaction.initial_scale *= fit_scale(&mesh);

        let viewport = viewport_for(columns, rows);
        Ok(Self {
            context: RenderContext::new(mesh, &config, viewport),
            tracker: DragTracker::new(),
            renderer: AsciiRenderer::new(columns as usize, rows as usize),
            pointer_x: viewport.width as f32 / 2.0,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn run(&mut self) -> io::Result<()> {
        let _guard = TerminalGuard::enter()?;
        self.main_loop()
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Drain every pending event before drawing
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn viewport_width(&self) -> f32 {
        self.context.pipeline().viewport().width as f32
    }

    /// Apply one input event to the controller
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => {
                let viewport = viewport_for(columns, rows);
                log::debug!("resize to {columns}x{rows} cells");
                self.renderer.resize(columns as usize, rows as usize);
                self.context.resize(viewport.width, viewport.height);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }
        let width = self.viewport_width();
        let drag = |dx: f32, dy: f32| GestureDelta::new(dx, dy, self.pointer_x, width);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Up => self.context.on_drag(drag(0.0, -KEY_DRAG_PX)),
            KeyCode::Down => self.context.on_drag(drag(0.0, KEY_DRAG_PX)),
            KeyCode::Left => self.context.on_drag(drag(-KEY_DRAG_PX, 0.0)),
            KeyCode::Right => self.context.on_drag(drag(KEY_DRAG_PX, 0.0)),
            KeyCode::Char('+') | KeyCode::Char('=') => self.context.on_scale(ZOOM_STEP),
            KeyCode::Char('-') => self.context.on_scale(1.0 / ZOOM_STEP),
            KeyCode::Char('r') => self.context.controller_mut().reset(),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        let x = column as f32 * CELL_WIDTH_PX;
        let y = row as f32 * CELL_HEIGHT_PX;
        self.pointer_x = x;
        match kind {
            MouseEventKind::Down(MouseButton::Left) => self.tracker.press(x, y),
            MouseEventKind::Drag(MouseButton::Left) => {
                let width = self.viewport_width();
                if let Some(delta) = self.tracker.motion(x, y, width) {
                    self.context.on_drag(delta);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.tracker.release(),
            MouseEventKind::ScrollUp => self.context.on_scale(ZOOM_STEP),
            MouseEventKind::ScrollDown => self.context.on_scale(1.0 / ZOOM_STEP),
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let matrices = self.context.frame();

        self.renderer.clear();
        self.renderer.render_mesh(self.context.mesh(), &matrices);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let state = self.context.state();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "offview | FPS: {:.1} | x {:.0} y {:.0} scale {:.2} | Drag/Arrows=Rotate Scroll/+-=Zoom R=Reset Q=Quit",
                self.fps, state.x_angle_deg, state.y_angle_deg, state.scale
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
