use std::{io::Cursor, process::ExitCode};

use image::{ImageFormat, Rgba, RgbaImage};
use log::info;
use pixel::{
    AppConfig, Context, DrawParams, Game, LoadOptions, PixelResult, Rgb, Texture,
};

const CYAN: Rgba<u8> = Rgba([0x00, 0xFF, 0xFF, 0xFF]);

struct Textures {
    background: Texture,
    foo: Texture,
}

/// Loads `name` from the asset directory, or a generated stand-in when the
/// file is not there.
fn load(ctx: &mut Context, name: &str, generate: fn() -> RgbaImage) -> PixelResult<Texture> {
    let keyed = LoadOptions::color_keyed(Rgb::CYAN);
    let mut texture = Texture::new();

    let path = ctx.asset_path(name);
    if path.exists() {
        texture.load_from_file(ctx.renderer(), path, &keyed)?;
    } else {
        info!("{} not found, generating {name}", path.display());
        let png = encode_png(&generate())?;
        texture.load_from_bytes(ctx.renderer(), &png, &keyed)?;
    }

    Ok(texture)
}

fn encode_png(image: &RgbaImage) -> PixelResult<Vec<u8>> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(png)
}

fn generate_background() -> RgbaImage {
    RgbaImage::from_fn(640, 480, |_, y| {
        if y < 360 {
            let shade = (120 + y * 100 / 360) as u8;
            Rgba([shade / 2, shade, 255, 255])
        } else {
            Rgba([40, 140, 40, 255])
        }
    })
}

/// A stick figure on a cyan key.
fn generate_foo() -> RgbaImage {
    RgbaImage::from_fn(64, 205, |x, y| {
        let (cx, cy) = (x as i32 - 32, y as i32 - 24);
        let head = cx * cx + cy * cy <= 20 * 20;
        let body = (30..34).contains(&x) && (44..140).contains(&y);
        let arms = (70..74).contains(&y) && (8..56).contains(&x);
        let legs = y >= 140 && ((x as i32 - 32).abs() - (y as i32 - 140) / 3).abs() <= 2;

        if head || body || arms || legs {
            Rgba([0, 0, 0, 255])
        } else {
            CYAN
        }
    })
}

impl Game for Textures {
    fn on_start(ctx: &mut Context) -> PixelResult<Self> {
        let foo = load(ctx, "foo.png", generate_foo)?;
        let background = load(ctx, "background.png", generate_background)?;

        info!(
            "loaded foo ({}x{}) and background ({}x{})",
            foo.width(),
            foo.height(),
            background.width(),
            background.height()
        );

        Ok(Self { background, foo })
    }

    fn on_render(&self, ctx: &mut Context) {
        self.background.draw(ctx.renderer(), &DrawParams::at(0, 0));
        self.foo.draw(ctx.renderer(), &DrawParams::at(240, 190));
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default()
        .with_title("Textures")
        .with_asset_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
    pixel::run::<Textures>(config)
}
