use std::{cell::RefCell, rc::Rc};

use log::warn;
use pixel_math::{bounds, rotate_about, v2};

use crate::{
    draw::mul_u8,
    gen_vec::{GenIdx, GenVec},
    BlendMode, Color, CopyCommand, Image, PixelError, PixelResult, Rect, RenderBackend,
};

type TextureStore = Rc<RefCell<GenVec<Image>>>;

/// CPU render backend drawing into an RGBA framebuffer.
pub struct SoftwareCanvas {
    frame: Image,
    textures: TextureStore,
    presented: u64,
}

impl SoftwareCanvas {
    pub const MAX_TEXTURE_SIZE: u32 = 8192;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Image::new(width, height),
            textures: TextureStore::default(),
            presented: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn frame(&self) -> &Image {
        &self.frame
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.frame.pixel(x, y)
    }

    /// Number of uploaded textures that have not been dropped.
    pub fn live_textures(&self) -> usize {
        self.textures.borrow().len()
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }
}

pub struct CanvasTexture {
    idx: GenIdx,
    store: TextureStore,
}

impl Drop for CanvasTexture {
    fn drop(&mut self) {
        self.store.borrow_mut().remove(self.idx);
    }
}

impl RenderBackend for SoftwareCanvas {
    type Texture = CanvasTexture;

    fn create_texture(&mut self, image: &Image) -> PixelResult<Self::Texture> {
        if image.is_empty() {
            return Err(PixelError::upload("cannot create a texture from an empty image"));
        }
        if image.width() > Self::MAX_TEXTURE_SIZE || image.height() > Self::MAX_TEXTURE_SIZE {
            return Err(PixelError::upload(format!(
                "{}x{} exceeds the maximum texture size of {}",
                image.width(),
                image.height(),
                Self::MAX_TEXTURE_SIZE
            )));
        }

        let idx = self.textures.borrow_mut().add(image.clone());

        Ok(CanvasTexture {
            idx,
            store: self.textures.clone(),
        })
    }

    fn copy(&mut self, texture: &Self::Texture, cmd: &CopyCommand) {
        if !Rc::ptr_eq(&texture.store, &self.textures) {
            warn!("copy from a texture that is not owned by this canvas");
            return;
        }

        let store = self.textures.borrow();
        let Some(src) = store.get(texture.idx) else {
            warn!("copy from a released texture");
            return;
        };

        if cmd.dst.is_empty() {
            return;
        }

        // pixels touched by the rotated destination, clipped to the frame.
        let (min, max) = bounds(&cmd.corners());
        let left = min.x.floor() as i32;
        let top = min.y.floor() as i32;
        let covered = Rect::new(
            left,
            top,
            (max.x.ceil() as i64 - left as i64).clamp(0, u32::MAX as i64) as u32,
            (max.y.ceil() as i64 - top as i64).clamp(0, u32::MAX as i64) as u32,
        );
        let frame = Rect::new(0, 0, self.frame.width(), self.frame.height());
        let Some(area) = covered.intersect(&frame) else {
            return;
        };

        let origin = cmd.dst.position().as_vec2();
        let w = cmd.dst.width;
        let h = cmd.dst.height;

        for py in area.y as u32..area.bottom() as u32 {
            for px in area.x as u32..area.right() as u32 {
                // map the pixel center back into the unrotated destination.
                let center = v2(px as f32 + 0.5, py as f32 + 0.5);
                let local = rotate_about(center, cmd.pivot, -cmd.rotation) - origin;
                if local.x < 0.0 || local.y < 0.0 || local.x >= w as f32 || local.y >= h as f32 {
                    continue;
                }

                let mut u = (local.x as u32).min(w - 1);
                let mut v = (local.y as u32).min(h - 1);
                if cmd.flip.horizontal() {
                    u = w - 1 - u;
                }
                if cmd.flip.vertical() {
                    v = h - 1 - v;
                }

                let sx = cmd.src.x as i64 + u as i64;
                let sy = cmd.src.y as i64 + v as i64;
                let inside =
                    sx >= 0 && sy >= 0 && sx < src.width() as i64 && sy < src.height() as i64;
                let texel = if inside {
                    cmd.modulate(src.pixel(sx as u32, sy as u32))
                } else {
                    [0; 4]
                };
                let out = match cmd.blend {
                    BlendMode::None => texel,
                    BlendMode::Alpha => blend_over(texel, self.frame.pixel(px, py)),
                };
                self.frame.set_pixel(px, py, out);
            }
        }
    }

    fn clear(&mut self, color: Color) {
        self.frame.fill(color.to_array_u8());
    }

    fn present(&mut self) -> PixelResult {
        self.presented += 1;
        Ok(())
    }
}

fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let a = src[3];
    let inv = 255 - a;
    let channel = |s: u8, d: u8| ((s as u16 * a as u16 + d as u16 * inv as u16 + 127) / 255) as u8;

    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        a.saturating_add(mul_u8(dst[3], inv)),
    ]
}
