use std::{process::ExitCode, time::Duration};

pub use app::{AppConfig, Context};
pub use atlas::{AtlasLayout, FrameId, SpriteAtlas};
pub use backend::RenderBackend;
pub use canvas::{CanvasTexture, SoftwareCanvas};
pub use color::*;
pub use draw::{BlendMode, CopyCommand, DrawParams, Flip};
pub use error::{ErrorKind, PixelError, PixelResult};
pub use font::{Font, RasterizeText};
pub use gpu::{GpuRenderer, GpuTexture};
pub use self::image::Image;
pub use input::{InputSnapshot, InputState, Key, MouseButton};
pub use rect::Rect;
pub use select::{
    cycle_frame, select_direction, select_frame, select_frame_with, ChannelKeys, Direction,
    Modulation, RampBindings, DEFAULT_STEP,
};
pub use texture::{LoadOptions, TextureResource};

mod app;
mod atlas;
mod backend;
mod canvas;
mod color;
mod draw;
mod error;
mod font;
mod gen_vec;
mod gpu;
mod image;
mod input;
mod os;
mod rect;
mod select;
mod texture;

/// A texture drawn through the window renderer.
pub type Texture = TextureResource<GpuRenderer>;

pub fn run<G: Game>(config: AppConfig) -> ExitCode {
    match app::run::<G>(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

pub trait Game: Sized {
    fn on_start(ctx: &mut Context) -> PixelResult<Self>;

    fn on_update(&mut self, _ctx: &mut Context, _input: &InputSnapshot, _dt: Duration) {}

    fn on_render(&self, ctx: &mut Context);

    fn on_exit_requested(&mut self, ctx: &mut Context) {
        ctx.exit();
    }
}
