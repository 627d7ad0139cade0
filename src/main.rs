//! Evergreen - animated Christmas tree

use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use evergreen::app::{self, AppShell, UserAction};
use evergreen::config::AppSettings;
use evergreen::controls::{self, HELP};
use evergreen::core::{
    camera::Camera,
    camera_controller::OrbitController,
    input::InputState,
    logging,
    time::FrameClock,
};
use evergreen::gallery::{self, ImageRef};
use evergreen::generation::scene_rng;
use evergreen::render::{GpuContext, Renderer};

/// Title refresh interval in frames
const TITLE_INTERVAL: u64 = 30;

struct App {
    settings: AppSettings,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<Renderer>,
    shell: AppShell,
    camera: Camera,
    controller: OrbitController,
    input: InputState,
    clock: FrameClock,
    /// Files dropped since the last redraw
    dropped: Vec<PathBuf>,
    /// Image currently uploaded to the viewer overlay
    shown: Option<ImageRef>,
}

impl App {
    fn new(settings: AppSettings) -> Self {
        let shell = AppShell::new(&settings, scene_rng(settings.seed));
        let rig = *shell.composer().rig();
        let aspect = settings.window.width as f32 / settings.window.height.max(1) as f32;
        let camera = rig.camera(aspect);
        let controller = rig.orbit(&camera);

        Self {
            settings,
            window: None,
            gpu: None,
            renderer: None,
            shell,
            camera,
            controller,
            input: InputState::new(),
            clock: FrameClock::new(),
            dropped: Vec::new(),
            shown: None,
        }
    }

    fn apply(&mut self, action: UserAction) {
        self.shell.apply(action);
    }

    /// Turn this frame's input into actions.
    fn handle_input(&mut self) {
        if !self.dropped.is_empty() {
            let paths = std::mem::take(&mut self.dropped);
            self.apply(UserAction::Upload(paths));
        }

        let keys: Vec<_> = self.input.just_pressed_keys().collect();
        for key in keys {
            if let Some(action) = controls::action_for_key(key) {
                self.apply(action);
            }
        }

        let (width, height) = self.gpu.as_ref().map_or((1, 1), GpuContext::size);
        for (x, y) in self.input.take_clicks() {
            let ray = self.camera.screen_ray(x, y, width as f32, height as f32);
            let target = self.shell.resolve_click(&ray);
            log::debug!("Click at ({:.0}, {:.0}) -> {:?}", x, y, target);
            self.apply(UserAction::Click(target));
        }

        // The scene does not orbit behind the viewer
        if !self.shell.viewer().is_open() {
            self.controller.update(&mut self.camera, &self.input);
        }
    }

    /// Keep the overlay texture in step with the viewer selection.
    fn sync_viewer_image(&mut self) {
        let selected = self.shell.viewer().selected().cloned();
        if selected == self.shown {
            return;
        }
        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };

        let image = selected.as_ref().and_then(|image| match gallery::load_rgba(image) {
            Ok(rgba) => Some(rgba),
            Err(e) => {
                log::warn!("Cannot display {}: {}", image, e);
                None
            }
        });
        renderer.set_viewer_image(gpu, image.as_ref());
        self.shown = selected;
    }

    fn redraw(&mut self) {
        self.clock.tick();
        self.handle_input();
        self.sync_viewer_image();

        self.shell.tick(self.clock.elapsed(), self.clock.delta_secs());
        let frame = self.shell.frame();
        let viewer_open = self.shell.viewer().is_open();

        if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
            if let Err(e) = renderer.render(gpu, &self.camera, &frame, self.clock.elapsed(), viewer_open) {
                log::error!("Failed to render frame: {}", e);
                gpu.reconfigure();
            }
        }

        if self.clock.frame_count() % TITLE_INTERVAL == 0 {
            if let Some(window) = &self.window {
                let config = self.shell.config();
                window.set_title(&app::window_title(&self.settings.window, self.clock.fps(), &config));
                let stats = self.clock.fps_window();
                log::debug!("FPS avg {:.1} min {:.1} max {:.1}", stats.avg, stats.min, stats.max);
            }
        }

        self.input.end_frame();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.settings.window.caption())
            .with_inner_size(PhysicalSize::new(self.settings.window.width, self.settings.window.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let gpu = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("Failed to create GPU context: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.camera.set_aspect(size.width as f32, size.height.max(1) as f32);
        log::info!("Window created: {}x{}", size.width, size.height);

        self.renderer = Some(Renderer::new(&gpu));
        self.gpu = Some(gpu);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(size.width, size.height);
                        self.camera.set_aspect(size.width as f32, size.height as f32);
                        if let Some(renderer) = &mut self.renderer {
                            renderer.resize(gpu);
                        }
                    }
                }
            }
            WindowEvent::DroppedFile(path) => {
                self.dropped.push(path);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    logging::init();
    log::info!("Evergreen starting...");

    let args: Vec<String> = std::env::args().collect();
    let settings = match AppSettings::load_or_default(parse_config_arg(&args).as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load settings: {}", e);
            return;
        }
    };

    let mut app = App::new(settings);
    let images = parse_image_args(&args);
    if !images.is_empty() {
        app.apply(UserAction::Upload(images));
    }
    println!("{}", HELP);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}

/// Parse --config argument from command line
fn parse_config_arg(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

/// Collect every --image argument, in command-line order
fn parse_image_args(args: &[String]) -> Vec<PathBuf> {
    args.windows(2)
        .filter(|pair| pair[0] == "--image" || pair[0] == "-i")
        .map(|pair| PathBuf::from(&pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_config_arg() {
        assert_eq!(
            parse_config_arg(&args(&["evergreen", "--config", "tree.json"])),
            Some(PathBuf::from("tree.json"))
        );
        assert_eq!(parse_config_arg(&args(&["evergreen", "--config"])), None);
        assert_eq!(parse_config_arg(&args(&["evergreen"])), None);
    }

    #[test]
    fn test_parse_image_args() {
        let parsed = parse_image_args(&args(&["evergreen", "--image", "a.png", "-c", "x.json", "-i", "b.jpg"]));
        assert_eq!(parsed, vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")]);
    }
}
