use pixel_math::{rotate_about, v2, IVec2, Vec2};

use crate::{Rect, Rgb};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source pixels overwrite the destination, alpha included.
    None,
    /// Source over destination using the source alpha.
    #[default]
    Alpha,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    pub fn horizontal(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    pub fn vertical(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }
}

/// How a texture is drawn for a single call. Nothing here is remembered by the
/// texture between draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub position: IVec2,
    pub clip: Option<Rect>,
    pub tint: Rgb,
    pub alpha: u8,
    pub blend: BlendMode,
    /// Degrees, clockwise on screen.
    pub rotation: f32,
    /// Relative to the destination rectangle. Defaults to its center.
    pub pivot: Option<IVec2>,
    pub flip: Flip,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            position: IVec2::ZERO,
            clip: None,
            tint: Rgb::WHITE,
            alpha: u8::MAX,
            blend: BlendMode::default(),
            rotation: 0.0,
            pivot: None,
            flip: Flip::None,
        }
    }
}

impl DrawParams {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            position: IVec2::new(x, y),
            ..Default::default()
        }
    }

    pub fn with_clip(self, clip: Rect) -> Self {
        Self {
            clip: Some(clip),
            ..self
        }
    }

    pub fn with_tint(self, tint: Rgb) -> Self {
        Self { tint, ..self }
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }

    pub fn with_blend(self, blend: BlendMode) -> Self {
        Self { blend, ..self }
    }

    pub fn with_rotation(self, degrees: f32) -> Self {
        Self {
            rotation: degrees,
            ..self
        }
    }

    pub fn with_pivot(self, pivot: IVec2) -> Self {
        Self {
            pivot: Some(pivot),
            ..self
        }
    }

    pub fn with_flip(self, flip: Flip) -> Self {
        Self { flip, ..self }
    }

    /// Source region for a texture of the given size.
    pub fn source(&self, texture_width: u32, texture_height: u32) -> Rect {
        match self.clip {
            Some(clip) => clip,
            None => Rect::new(0, 0, texture_width, texture_height),
        }
    }

    /// Destination rectangle. Its size is always the source size, drawing
    /// never scales.
    pub fn destination(&self, texture_width: u32, texture_height: u32) -> Rect {
        let src = self.source(texture_width, texture_height);
        Rect::from_position(self.position, src.width, src.height)
    }

    pub fn to_copy(&self, texture_width: u32, texture_height: u32) -> CopyCommand {
        let src = self.source(texture_width, texture_height);
        let dst = self.destination(texture_width, texture_height);
        let pivot = match self.pivot {
            Some(pivot) => (dst.position() + pivot).as_vec2(),
            None => dst.center(),
        };

        CopyCommand {
            src,
            dst,
            rotation: self.rotation,
            pivot,
            flip: self.flip,
            tint: self.tint,
            alpha: self.alpha,
            blend: self.blend,
        }
    }
}

/// A single copy of a texture region onto the backend surface, with every
/// modulation resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CopyCommand {
    pub src: Rect,
    pub dst: Rect,
    pub rotation: f32,
    /// Absolute surface coordinates.
    pub pivot: Vec2,
    pub flip: Flip,
    pub tint: Rgb,
    pub alpha: u8,
    pub blend: BlendMode,
}

impl CopyCommand {
    /// Destination corners after rotation, clockwise from the top left.
    pub fn corners(&self) -> [Vec2; 4] {
        let left = self.dst.x as f32;
        let top = self.dst.y as f32;
        let right = left + self.dst.width as f32;
        let bottom = top + self.dst.height as f32;

        [
            v2(left, top),
            v2(right, top),
            v2(right, bottom),
            v2(left, bottom),
        ]
        .map(|p| rotate_about(p, self.pivot, self.rotation))
    }

    /// Source texel coordinates sampled at each of [`CopyCommand::corners`].
    pub fn source_corners(&self) -> [Vec2; 4] {
        let mut left = self.src.x as f32;
        let mut top = self.src.y as f32;
        let mut right = left + self.src.width as f32;
        let mut bottom = top + self.src.height as f32;

        if self.flip.horizontal() {
            std::mem::swap(&mut left, &mut right);
        }
        if self.flip.vertical() {
            std::mem::swap(&mut top, &mut bottom);
        }

        [
            v2(left, top),
            v2(right, top),
            v2(right, bottom),
            v2(left, bottom),
        ]
    }

    /// Applies tint and alpha to a source texel.
    pub fn modulate(&self, rgba: [u8; 4]) -> [u8; 4] {
        let [r, g, b, a] = rgba;
        [
            mul_u8(r, self.tint.r),
            mul_u8(g, self.tint.g),
            mul_u8(b, self.tint.b),
            mul_u8(a, self.alpha),
        ]
    }
}

pub(crate) fn mul_u8(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16 + 127) / 255) as u8
}

#[cfg(test)]
mod test {
    use pixel_math::iv2;

    use super::*;

    #[test]
    fn destination_without_clip_is_full_texture() {
        let params = DrawParams::at(10, 20);
        assert_eq!(Rect::new(10, 20, 100, 100), params.destination(100, 100));
    }

    #[test]
    fn destination_with_clip_is_clip_size() {
        let params = DrawParams::at(10, 20).with_clip(Rect::new(0, 0, 50, 50));
        assert_eq!(Rect::new(10, 20, 50, 50), params.destination(100, 100));
    }

    #[test]
    fn destination_size_ignores_texture_size_when_clipped() {
        let clip = Rect::new(30, 40, 17, 9);
        let params = DrawParams::at(-5, 3).with_clip(clip);

        for (w, h) in [(1, 1), (64, 64), (4096, 16)] {
            let dst = params.destination(w, h);
            assert_eq!((clip.width, clip.height), dst.size());
        }
    }

    #[test]
    fn defaults_do_not_modulate() {
        let params = DrawParams::default();
        assert_eq!(Rgb::WHITE, params.tint);
        assert_eq!(255, params.alpha);
        assert_eq!(BlendMode::Alpha, params.blend);
        assert_eq!(Flip::None, params.flip);

        let cmd = params.to_copy(4, 4);
        assert_eq!([12, 34, 56, 78], cmd.modulate([12, 34, 56, 78]));
    }

    #[test]
    fn pivot_defaults_to_destination_center() {
        let cmd = DrawParams::at(10, 20).to_copy(100, 50);
        assert_eq!(v2(60.0, 45.0), cmd.pivot);
    }

    #[test]
    fn pivot_is_relative_to_destination() {
        let cmd = DrawParams::at(10, 20)
            .with_pivot(iv2(0, 0))
            .to_copy(100, 50);
        assert_eq!(v2(10.0, 20.0), cmd.pivot);
    }

    #[test]
    fn corners_without_rotation_are_destination() {
        let cmd = DrawParams::at(1, 2).to_copy(3, 4);
        assert_eq!(
            [v2(1.0, 2.0), v2(4.0, 2.0), v2(4.0, 6.0), v2(1.0, 6.0)],
            cmd.corners()
        );
    }

    #[test]
    fn half_turn_about_center_swaps_opposite_corners() {
        let cmd = DrawParams::at(0, 0).with_rotation(180.0).to_copy(4, 2);
        let [tl, _, br, _] = cmd.corners();

        assert!(tl.abs_diff_eq(v2(4.0, 2.0), 1e-4));
        assert!(br.abs_diff_eq(v2(0.0, 0.0), 1e-4));
    }

    #[test]
    fn flip_swaps_source_corners() {
        let clip = Rect::new(10, 20, 5, 5);
        let plain = DrawParams::default().with_clip(clip).to_copy(64, 64);
        let both = DrawParams::default()
            .with_clip(clip)
            .with_flip(Flip::Both)
            .to_copy(64, 64);

        let [tl, tr, br, bl] = plain.source_corners();
        assert_eq!([br, bl, tl, tr], both.source_corners());
    }

    #[test]
    fn tint_and_alpha_multiply() {
        let cmd = DrawParams::default()
            .with_tint(Rgb::new(128, 0, 255))
            .with_alpha(128)
            .to_copy(1, 1);

        assert_eq!([100, 0, 200, 128], cmd.modulate([200, 200, 200, 255]));
    }
}
