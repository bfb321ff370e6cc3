use std::{io::Cursor, process::ExitCode, time::Duration};

use image::{ImageFormat, Rgba, RgbaImage};
use log::{info, warn};
use pixel::{
    cycle_frame, select_direction, select_frame, AppConfig, AtlasLayout, BlendMode, Color,
    Context, Direction, DrawParams, Flip, Font, Game, InputSnapshot, Key, LoadOptions,
    Modulation, PixelResult, Rgb, SpriteAtlas, Texture, DEFAULT_STEP,
};
use pixel_math::iv2;

const FONT_SIZE: f32 = 24.0;

struct Sprites {
    sheet: Texture,
    atlas: SpriteAtlas,
    frame: usize,
    modulation: Modulation,
    flip: Flip,
    rotation: f32,
    blend: BlendMode,
    font: Option<Font>,
    label: Texture,
}

impl Sprites {
    fn update_label(&mut self, ctx: &mut Context) {
        let Some(font) = &self.font else {
            return;
        };

        let Modulation { r, g, b, a } = self.modulation;
        let text = format!("frame {} rgba {r} {g} {b} {a}", self.frame);
        if let Err(err) = self
            .label
            .load_from_text(ctx.renderer(), font, &text, FONT_SIZE, Color::BLACK)
        {
            warn!("label not updated: {err}");
        }
    }
}

fn encode_png(image: &RgbaImage) -> PixelResult<Vec<u8>> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(png)
}

/// Four colored dots in a 2x2 grid on a cyan key.
fn generate_dots() -> RgbaImage {
    const COLORS: [Rgba<u8>; 4] = [
        Rgba([220, 40, 40, 255]),
        Rgba([40, 200, 40, 255]),
        Rgba([230, 210, 30, 255]),
        Rgba([40, 80, 220, 255]),
    ];

    RgbaImage::from_fn(200, 200, |x, y| {
        let cell = (y / 100 * 2 + x / 100) as usize;
        let (dx, dy) = (x as i32 % 100 - 50, y as i32 % 100 - 50);
        if dx * dx + dy * dy <= 45 * 45 {
            COLORS[cell]
        } else {
            Rgba([0x00, 0xFF, 0xFF, 0xFF])
        }
    })
}

impl Game for Sprites {
    fn on_start(ctx: &mut Context) -> PixelResult<Self> {
        let keyed = LoadOptions::color_keyed(Rgb::CYAN);
        let mut sheet = Texture::new();
        let path = ctx.asset_path("dots.png");
        if path.exists() {
            sheet.load_from_file(ctx.renderer(), path, &keyed)?;
        } else {
            info!("{} not found, generating a sprite sheet", path.display());
            let png = encode_png(&generate_dots())?;
            sheet.load_from_bytes(ctx.renderer(), &png, &keyed)?;
        }

        let layout = AtlasLayout::Grid {
            columns: 2,
            rows: 2,
            cell_width: sheet.width() / 2,
            cell_height: sheet.height() / 2,
        };
        let atlas = SpriteAtlas::for_texture(&sheet, &layout)?;
        info!("sprite sheet has {} frames", atlas.len());

        // text is optional, the demo still runs without a font.
        let font = match Font::from_file(ctx.asset_path("font.ttf")) {
            Ok(font) => Some(font),
            Err(err) => {
                warn!("{err}, labels are disabled");
                None
            }
        };

        let mut sprites = Self {
            sheet,
            atlas,
            frame: 0,
            modulation: Modulation::default(),
            flip: Flip::None,
            rotation: 0.0,
            blend: BlendMode::Alpha,
            font,
            label: Texture::new(),
        };
        sprites.update_label(ctx);

        Ok(sprites)
    }

    fn on_update(&mut self, ctx: &mut Context, input: &InputSnapshot, dt: Duration) {
        if input.key_pressed(Key::Escape) {
            ctx.exit();
            return;
        }

        let modulation = select_frame(self.modulation, input, DEFAULT_STEP);
        let frame = cycle_frame(self.frame, self.atlas.len(), input);

        match select_direction(input) {
            Some(Direction::Up) => self.flip = Flip::Vertical,
            Some(Direction::Down) => self.flip = Flip::None,
            Some(Direction::Left) | Some(Direction::Right) | None => {}
        }

        if input.key_pressed(Key::H) {
            self.flip = Flip::Horizontal;
        }
        if input.key_pressed(Key::B) {
            self.blend = match self.blend {
                BlendMode::Alpha => BlendMode::None,
                BlendMode::None => BlendMode::Alpha,
            };
        }
        if input.key_held(Key::Space) {
            self.rotation = (self.rotation + 90.0 * dt.as_secs_f32()) % 360.0;
        }

        if modulation != self.modulation || frame != self.frame {
            self.modulation = modulation;
            self.frame = frame;
            self.update_label(ctx);
        }
    }

    fn on_render(&self, ctx: &mut Context) {
        let (width, height) = ctx.size();

        let clip = match self.atlas.clip_for(self.frame) {
            Ok(clip) => clip,
            Err(err) => {
                warn!("{err}");
                return;
            }
        };

        let x = (width as i32 - clip.width as i32) / 2;
        let y = (height as i32 - clip.height as i32) / 2;
        let params = DrawParams::at(x, y)
            .with_clip(clip)
            .with_tint(self.modulation.tint())
            .with_alpha(self.modulation.alpha())
            .with_blend(self.blend)
            .with_rotation(self.rotation)
            .with_flip(self.flip);
        self.sheet.draw(ctx.renderer(), &params);

        // every frame along the bottom, unmodulated.
        for (i, frame) in self.atlas.frames().iter().enumerate() {
            let position = iv2(i as i32 * frame.width as i32, height as i32 - frame.height as i32);
            let params = DrawParams {
                position,
                ..DrawParams::default().with_clip(*frame)
            };
            self.sheet.draw(ctx.renderer(), &params);
        }

        self.label.draw(ctx.renderer(), &DrawParams::at(8, 8));
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default()
        .with_title("Sprites")
        .with_resizable(true)
        .with_asset_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
    pixel::run::<Sprites>(config)
}

#[cfg(test)]
mod test {
    use pixel::{RenderBackend, SoftwareCanvas, TextureResource};

    use super::*;

    #[test]
    fn generated_sheet_splits_into_four_dots() {
        let mut canvas = SoftwareCanvas::new(100, 100);
        canvas.clear(Color::BLACK);

        let png = encode_png(&generate_dots()).unwrap();
        let mut sheet = TextureResource::new();
        sheet
            .load_from_bytes(&mut canvas, &png, &LoadOptions::color_keyed(Rgb::CYAN))
            .unwrap();

        let layout = AtlasLayout::Grid {
            columns: 2,
            rows: 2,
            cell_width: sheet.width() / 2,
            cell_height: sheet.height() / 2,
        };
        let atlas = SpriteAtlas::for_texture(&sheet, &layout).unwrap();
        assert_eq!(4, atlas.len());

        let clip = atlas.clip_for(3).unwrap();
        sheet.draw(&mut canvas, &DrawParams::default().with_clip(clip));

        assert_eq!([40, 80, 220, 255], canvas.pixel(50, 50));
        assert_eq!([0, 0, 0, 255], canvas.pixel(0, 0));
    }
}
