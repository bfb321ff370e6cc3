use winit::{
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event::Event,
    event_loop::{EventLoop, EventLoopBuilder, EventLoopWindowTarget},
    window::{Window, WindowBuilder},
};

use crate::{app::AppConfig, PixelError, PixelResult};

pub(crate) fn create_event_loop() -> PixelResult<EventLoop<()>> {
    let el = EventLoopBuilder::new().build()?;

    Ok(el)
}

/// Draw positions are backbuffer pixels, so the window is sized in physical
/// pixels regardless of the display scale factor.
pub(crate) fn inner_size(config: &AppConfig) -> PhysicalSize<u32> {
    PhysicalSize::new(config.width, config.height)
}

/// The window starts hidden and is shown once the first frame is ready.
pub(crate) fn create_window(config: &AppConfig, el: &EventLoop<()>) -> PixelResult<Window> {
    let window = WindowBuilder::new()
        .with_inner_size(inner_size(config))
        .with_title(&config.title)
        .with_resizable(config.resizable)
        .with_visible(false)
        .build(el)?;

    Ok(window)
}

pub(crate) fn run<F>(el: EventLoop<()>, mut handler: F) -> PixelResult
where
    F: FnMut(Event<()>, &EventLoopWindowTarget<()>) -> PixelResult,
{
    let mut result = Ok(());
    el.run(|event, elwt| {
        if result.is_err() {
            return;
        }

        result = handler(event, elwt);
        if result.is_err() {
            elwt.exit();
        }
    })?;

    result
}

impl From<EventLoopError> for PixelError {
    fn from(err: EventLoopError) -> Self {
        PixelError::platform("failed to run event loop").with_source(err)
    }
}

impl From<OsError> for PixelError {
    fn from(err: OsError) -> Self {
        PixelError::platform("failed to perform os action").with_source(err)
    }
}
