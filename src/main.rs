//! cubebeat - audio-reactive 3D track visualizer
//!
//! Every track plays around a small cube: a ring of bars or a smoothed
//! line ribbon, pulsing with its own frequency analysis.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

use cubebeat::audio::{AudioSystem, FileLoader, GraphRegistry, UploadStore};
use cubebeat::cli::Args;
use cubebeat::controls::{action_for_key, help_text, Action, PanelCommand};
use cubebeat::playback::{FileCandidate, PlayerState, Track};
use cubebeat::rendering::{DrawList, RenderSystem};
use cubebeat::scene::{mesh_library, Scene};
use cubebeat::settings::Settings;

/// Cursor travel (px) up to which a press and release still count as a click
const CLICK_SLOP_PX: f32 = 4.0;
/// Touchpad pixels per wheel line
const PIXELS_PER_LINE: f32 = 40.0;
/// Longest frame step fed to the simulation (s)
const MAX_FRAME_DT: f32 = 0.1;

/// Main application state
struct App {
    settings: Settings,
    debug: bool,

    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    draw_list: DrawList,

    // Audio graphs and their consumers
    registry: GraphRegistry,
    uploads: UploadStore,
    ended_rx: Receiver<String>,

    state: PlayerState,
    scene: Scene,

    // Pointer and keyboard tracking (physical pixels)
    cursor: Option<Vec2>,
    press: Option<Vec2>,
    dragging: bool,
    modifiers: ModifiersState,

    last_frame: Instant,
    title: String,

    // Declared last so it drops after every graph it mixes
    audio: AudioSystem,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let mut settings =
            Settings::load(args.config.as_deref()).context("Failed to load settings")?;
        args.apply(&mut settings);
        for path in settings.default_track_paths().iter().filter(|p| !p.exists()) {
            log::warn!("Bundled track not found: {}", path.display());
        }

        let audio = AudioSystem::open_or_headless();
        let uploads = UploadStore::new();
        let loader = FileLoader::new(&settings.assets.root, uploads.clone());
        let registry =
            GraphRegistry::new(Arc::new(loader), audio.mixer(), settings.analyser.clone());

        let tracks = settings
            .assets
            .default_tracks
            .iter()
            .map(|t| Track::bundled(t))
            .collect();
        let mut state = PlayerState::new(tracks, &settings.playback);
        args.apply_pickers(&mut state);

        let added = state.add_files(
            args.files.iter().map(|p| FileCandidate::from_path(p)),
            &uploads,
        );
        if added < args.files.len() {
            log::info!("Skipped {} non-audio files", args.files.len() - added);
        }

        let (ended_tx, ended_rx) = mpsc::channel();
        let scene = Scene::new(
            &settings.camera,
            &settings.layout,
            &settings.post,
            settings.analyser.bin_count(),
            ended_tx,
        );

        Ok(Self {
            debug: args.debug,
            settings,
            window: None,
            render_system: None,
            draw_list: DrawList::default(),
            registry,
            uploads,
            ended_rx,
            audio,
            state,
            scene,
            cursor: None,
            press: None,
            dragging: false,
            modifiers: ModifiersState::empty(),
            last_frame: Instant::now(),
            title: String::new(),
        })
    }

    /// Cursor position in NDC plus the viewport aspect ratio
    fn ndc(&self, position: Vec2) -> Option<(Vec2, f32)> {
        let render_system = self.render_system.as_ref()?;
        let (width, height) = render_system.size();
        let ndc = Vec2::new(
            2.0 * position.x / width as f32 - 1.0,
            1.0 - 2.0 * position.y / height as f32,
        );
        Some((ndc, render_system.aspect_ratio()))
    }

    fn apply_command(&mut self, command: PanelCommand) {
        if !self.state.panel_visible() {
            log::info!("Click the model to open the panel");
            return;
        }
        let Some(removed) = self.state.apply(command, &self.uploads) else {
            return;
        };
        // The same file may still be listed under another entry
        let still_listed = self
            .state
            .tracks()
            .iter()
            .any(|t| t.locator == removed.locator);
        if !still_listed {
            self.registry.release(&removed.locator);
        }
    }

    fn cursor_moved(&mut self, position: Vec2) {
        let previous = self.cursor.replace(position);

        if let Some(press) = self.press {
            if !self.dragging && position.distance(press) > CLICK_SLOP_PX {
                self.dragging = true;
            }
            if self.dragging {
                let delta = previous.map_or(Vec2::ZERO, |p| position - p);
                let height = self
                    .render_system
                    .as_ref()
                    .map_or(1.0, |r| r.size().1 as f32);
                self.scene.drag(delta, height);
                return;
            }
        }

        if let Some((ndc, aspect)) = self.ndc(position) {
            self.scene.pointer_moved(ndc, aspect);
        }
    }

    fn mouse_released(&mut self) {
        let was_drag = std::mem::take(&mut self.dragging);
        self.press = None;
        if was_drag {
            return;
        }
        let Some((ndc, aspect)) = self.cursor.and_then(|c| self.ndc(c)) else {
            return;
        };
        self.scene.click(ndc, aspect, &mut self.state);
    }

    /// Advance state and render a single frame. Returns false on a fatal
    /// surface error.
    fn render_frame(&mut self) -> bool {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME_DT);
        self.last_frame = now;

        self.registry.pump();
        let ended: Vec<String> = self.ended_rx.try_iter().collect();
        self.state.on_tracks_ended(&ended);

        self.scene.reconcile(&self.state);
        self.scene.frame(dt, &mut self.registry, &self.state);
        self.scene.draw(&self.state, &mut self.draw_list);

        let title = match self.scene.tracks().loading_label() {
            Some(loading) => format!("cubebeat - {} | {}", self.state.status_line(), loading),
            None => format!("cubebeat - {}", self.state.status_line()),
        };
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }

        let Some(render_system) = self.render_system.as_mut() else {
            return true;
        };
        let (width, height) = render_system.size();
        let scene_uniforms = self.scene.scene_uniforms(render_system.aspect_ratio());
        let post_uniforms = self.scene.post_uniforms(width, height);

        match render_system.render(&self.draw_list, &scene_uniforms, &post_uniforms) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Render error: out of GPU memory");
                false
            }
            Err(e) => {
                log::warn!("Render error: {:?}", e);
                true
            }
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("cubebeat")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.render.window_width,
                self.settings.render.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let meshes = mesh_library(&self.settings.layout);
        let texture = self.settings.baked_texture_path();
        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.settings.render,
            &meshes,
            &texture,
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                log::error!("Failed to initialize rendering: {}", e);
                event_loop.exit();
                return;
            }
        };

        log::info!(
            "cubebeat is running ({} tracks, audio {})",
            self.state.tracks().len(),
            if self.audio.is_headless() { "headless" } else { "on device" }
        );
        log::info!("Click the cube to start");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.scene.pointer_left();
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.press = self.cursor;
                    self.dragging = false;
                }
                ElementState::Released => self.mouse_released(),
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.scene.wheel(lines);
            }
            WindowEvent::DroppedFile(path) => {
                let added = self
                    .state
                    .add_files([FileCandidate::from_path(&path)], &self.uploads);
                if added == 0 {
                    log::debug!("Ignored dropped file {}", path.display());
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match action_for_key(code, self.modifiers, self.debug) {
                Some(Action::Quit) => event_loop.exit(),
                Some(Action::Panel(command)) => self.apply_command(command),
                Some(Action::Debug(command)) => command.apply(self.scene.post_mut()),
                None => {}
            },
            WindowEvent::RedrawRequested => {
                if !self.render_frame() {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let revoked = self.uploads.revoke_all();
        if revoked > 0 {
            log::debug!("Revoked {} upload locators", revoked);
        }
        log::info!("Goodbye");
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("cubebeat - audio-reactive track visualizer");

    let mut app = App::new(&args)?;
    log::info!("{}", help_text(args.debug));

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop
        .run_app(&mut app)
        .context("Event loop terminated with an error")?;
    Ok(())
}
