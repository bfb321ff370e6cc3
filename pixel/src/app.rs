use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use log::{debug, info};
use winit::{
    event::{Event, WindowEvent},
    event_loop::ControlFlow,
};

use crate::{os, Color, Game, GpuRenderer, InputState, PixelResult, RenderBackend};

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub title: String,
    /// Window size in physical pixels, matching draw coordinates.
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub resizable: bool,
    pub clear_color: Color,
    /// Relative asset names resolve against this directory.
    pub asset_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "pixel".to_string(),
            width: 640,
            height: 480,
            vsync: true,
            resizable: false,
            clear_color: Color::WHITE,
            asset_dir: PathBuf::from("assets"),
        }
    }
}

impl AppConfig {
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    pub fn with_vsync(self, vsync: bool) -> Self {
        Self { vsync, ..self }
    }

    pub fn with_resizable(self, resizable: bool) -> Self {
        Self { resizable, ..self }
    }

    pub fn with_clear_color(self, clear_color: Color) -> Self {
        Self {
            clear_color,
            ..self
        }
    }

    pub fn with_asset_dir(self, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            ..self
        }
    }

    pub fn asset_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(name)
    }
}

/// Everything a game can reach while the application runs.
pub struct Context {
    config: AppConfig,
    renderer: GpuRenderer,
    clear_color: Color,
    exit: bool,
}

impl Context {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn renderer(&mut self) -> &mut GpuRenderer {
        &mut self.renderer
    }

    pub fn asset_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.config.asset_path(name)
    }

    /// Backbuffer size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.renderer.size()
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn set_title(&self, title: &str) {
        self.renderer.window().set_title(title);
    }

    pub fn exit(&mut self) {
        self.exit = true;
    }

    fn should_exit(&self) -> bool {
        self.exit
    }
}

pub(crate) fn run<G: Game>(config: AppConfig) -> PixelResult {
    let el = os::create_event_loop()?;
    let window = Arc::new(os::create_window(&config, &el)?);
    let renderer = GpuRenderer::new(window.clone(), config.vsync)?;
    info!("created window {:?} ({}x{})", config.title, config.width, config.height);

    let mut ctx = Context {
        clear_color: config.clear_color,
        config,
        renderer,
        exit: false,
    };

    let mut game = G::on_start(&mut ctx)?;
    let mut input = InputState::new();
    let mut last_frame = Instant::now();

    os::run(el, |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::Resumed => window.set_visible(true),

            Event::WindowEvent { event, window_id } if window_id == window.id() => {
                if input.handle_window_event(&event) {
                    return Ok(());
                }

                match event {
                    WindowEvent::CloseRequested => game.on_exit_requested(&mut ctx),

                    WindowEvent::Resized(size) => ctx.renderer.resize(size.width, size.height),

                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let dt = now - last_frame;
                        last_frame = now;

                        let snapshot = input.snapshot();
                        game.on_update(&mut ctx, &snapshot, dt);

                        let clear_color = ctx.clear_color;
                        ctx.renderer.clear(clear_color);
                        game.on_render(&mut ctx);
                        ctx.renderer.present()?;
                    }

                    _ => {}
                }
            }

            Event::AboutToWait => window.request_redraw(),

            _ => {}
        }

        if ctx.should_exit() {
            debug!("exit requested");
            elwt.exit();
        }

        Ok(())
    })?;

    info!("shut down");

    Ok(())
}
