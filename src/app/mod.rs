mod input;
mod timing;

use crate::assets::{FileImporter, ResourceCache};
use crate::config::EditorConfig;
use crate::editor::menu::{self, MenuCommand, MenuKind};
use crate::editor::{EditMode, Editor, MenuOutcome};
use crate::render::{HeadlessDevice, RenderContext};
use input::{InputAction, InputState};
use timing::{FrameTiming, TitleInfo};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Modifiers, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "scenedit";

pub struct App {
    window: Option<Arc<Window>>,
    config: EditorConfig,
    data_dir: PathBuf,
    editor: Editor,
    input: InputState,
    modifiers: Modifiers,
    timing: FrameTiming,
    start_time: Instant,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    render: Option<RenderContext>,
}

impl App {
    fn new(config: EditorConfig, data_dir: PathBuf) -> Self {
        let mut editor = Editor::new(&config, StdRng::seed_from_u64(rand::random()));
        // Start with one random mesh so there is something to look at.
        let first_mesh = rand::rng().random_range(1..config.mesh_count);
        editor.add_object(first_mesh);
        editor.set_mode(EditMode::CameraOrbit);

        Self {
            window: None,
            config,
            data_dir,
            editor,
            input: InputState::default(),
            modifiers: Modifiers::default(),
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            start_time: Instant::now(),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
            render: None,
        }
    }

    fn init_render(&mut self, window: &Window) {
        let cache = ResourceCache::new(self.config.mesh_count, self.config.texture_count);
        let render = RenderContext::new(
            cache,
            Box::new(FileImporter::new(&self.data_dir)),
            Box::new(HeadlessDevice::default()),
            window.inner_size(),
        );
        self.render = Some(render);
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.editor.resize(new_size.width, new_size.height);
        if let Some(render) = &mut self.render {
            render.resize(new_size);
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    /// Mode name plus the object the drags edit, for the title bar.
    fn status_line(&self) -> String {
        let mode = menu::mode_label(self.editor.mode(), self.editor.menu_ranges());
        match self.editor.store().tool() {
            Some(tool) => format!("{mode} on object {}", tool.index()),
            None => mode,
        }
    }

    fn render(&mut self) {
        let status = self.status_line();
        let Some(render) = &mut self.render else {
            return;
        };
        let prepare_start = Instant::now();
        let elapsed = self.start_time.elapsed().as_secs_f32();
        match render.prepare_frame(self.editor.store(), self.editor.camera(), elapsed) {
            Ok(frame) => {
                log::trace!("Prepared {} draws", frame.draws.len());
            }
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        }
        self.timing
            .set_prepare_ms(prepare_start.elapsed().as_secs_f32() * 1000.0);
        let info = TitleInfo {
            status,
            viewport: render.viewport_size(),
            stats: render.cache_stats(),
        };
        self.timing
            .update(self.window.as_deref(), Instant::now(), &info);
    }

    /// Fixed menu entries; an unknown id here is a bug, so it is fatal.
    fn handle_menu_action(&mut self, event_loop: &ActiveEventLoop, kind: MenuKind, id: u32) {
        match self.editor.handle_menu(kind, id) {
            Ok(outcome) => self.finish_menu(event_loop, outcome),
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        }
    }

    /// Typed numbers can be anything, so a bad one is only a warning.
    fn handle_numbered_action(&mut self, event_loop: &ActiveEventLoop, kind: MenuKind, id: u32) {
        let command = match MenuCommand::decode(kind, id, self.editor.menu_ranges()) {
            Ok(command) => command,
            Err(err) => {
                log::warn!("{err}");
                return;
            }
        };
        match command {
            MenuCommand::AddObject(id) => {
                log::info!("Adding {}", menu::mesh_label(id).unwrap_or("mesh"));
            }
            MenuCommand::SetTexture(id) | MenuCommand::SetGroundTexture(id) => {
                log::info!("Texture {}", menu::texture_label(id).unwrap_or("?"));
            }
            _ => {}
        }
        let outcome = self.editor.apply(command);
        self.finish_menu(event_loop, outcome);
    }

    fn finish_menu(&mut self, event_loop: &ActiveEventLoop, outcome: MenuOutcome) {
        if outcome == MenuOutcome::Exit {
            event_loop.exit();
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// A press starts a drag, taking over from any drag already running;
    /// releasing either drag button ends it.
    fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let shift = self.modifiers.state().shift_key();
        let Some(drag) = input::drag_button(button, shift) else {
            return;
        };
        match state {
            ElementState::Pressed => self.editor.button_pressed(drag),
            ElementState::Released => self.editor.button_released(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        self.init_render(&window);
        self.handle_resize(window.inner_size());
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(false) => {
                if self.editor.is_dragging() {
                    self.editor.button_released();
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                match self.input.handle_key(event.physical_key, pressed) {
                    InputAction::Menu(kind, id) => self.handle_menu_action(event_loop, kind, id),
                    InputAction::Numbered(kind, id) => {
                        self.handle_numbered_action(event_loop, kind, id)
                    }
                    InputAction::MissingNumber(kind) => {
                        log::warn!("Type a number before the {kind:?} key");
                    }
                    InputAction::None => {}
                }
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.editor
                    .pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.editor.scroll(lines);
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

fn log_shortcuts(editor: &Editor) {
    for line in input::SHORTCUT_HELP {
        log::info!("   {line}");
    }
    let meshes = menu::entries(MenuKind::Object, editor.menu_ranges());
    log::debug!(
        "Meshes: {}",
        meshes
            .iter()
            .map(|(_, label)| label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = match EditorConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };
    let cli_dir = std::env::args_os().nth(1).map(PathBuf::from);
    let data_dir = match config.resolve_data_dir(cli_dir.as_deref()) {
        Ok(dir) => dir,
        Err(err) => {
            log::error!("{err}");
            log::error!(
                "Put the models-textures folder here, in /tmp, or pass its path as the first argument."
            );
            std::process::exit(1);
        }
    };

    log::info!("scenedit: models and textures from {}", data_dir.display());
    let mut app = App::new(config, data_dir);
    log_shortcuts(&app.editor);

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye!");
}
