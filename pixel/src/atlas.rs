use std::collections::HashMap;

use crate::{PixelError, PixelResult, Rect, RenderBackend, TextureResource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasLayout {
    /// Equal cells, numbered row by row from the top left.
    Grid {
        columns: u32,
        rows: u32,
        cell_width: u32,
        cell_height: u32,
    },
    /// Named rectangles, numbered in the order given.
    Frames(Vec<(String, Rect)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameId<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for FrameId<'_> {
    fn from(index: usize) -> Self {
        FrameId::Index(index)
    }
}

impl<'a> From<&'a str> for FrameId<'a> {
    fn from(name: &'a str) -> Self {
        FrameId::Name(name)
    }
}

/// Frame rectangles of a sprite sheet. Holds no reference to the texture it
/// was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteAtlas {
    frames: Vec<Rect>,
    names: HashMap<String, usize>,
}

impl SpriteAtlas {
    pub fn new(texture_width: u32, texture_height: u32, layout: &AtlasLayout) -> PixelResult<Self> {
        let mut frames = Vec::new();
        let mut names = HashMap::new();

        match layout {
            AtlasLayout::Grid {
                columns,
                rows,
                cell_width,
                cell_height,
            } => {
                let count = *columns as u64 * *rows as u64;
                if count > 0 && (*cell_width == 0 || *cell_height == 0) {
                    return Err(PixelError::out_of_bounds(format!(
                        "grid cells of {cell_width}x{cell_height} are empty"
                    )));
                }
                if count > 0
                    && (*columns as u64 * *cell_width as u64 > texture_width as u64
                        || *rows as u64 * *cell_height as u64 > texture_height as u64)
                {
                    return Err(PixelError::out_of_bounds(format!(
                        "{columns}x{rows} grid of {cell_width}x{cell_height} cells does not fit in a {texture_width}x{texture_height} texture"
                    )));
                }

                let count = count as usize;
                frames.reserve(count);
                for i in 0..count {
                    let row = (i / *columns as usize) as u32;
                    let col = (i % *columns as usize) as u32;

                    let x = i32::try_from(col as u64 * *cell_width as u64);
                    let y = i32::try_from(row as u64 * *cell_height as u64);
                    let (Ok(x), Ok(y)) = (x, y) else {
                        return Err(PixelError::out_of_bounds(format!(
                            "grid cell {i} does not fit in a {texture_width}x{texture_height} texture"
                        )));
                    };

                    frames.push(Rect::new(x, y, *cell_width, *cell_height));
                }
            }

            AtlasLayout::Frames(named) => {
                for (name, rect) in named {
                    names.insert(name.clone(), frames.len());
                    frames.push(*rect);
                }
            }
        }

        for (i, frame) in frames.iter().enumerate() {
            if frame.is_empty() || !frame.fits_within(texture_width, texture_height) {
                return Err(PixelError::out_of_bounds(format!(
                    "frame {i} {frame} does not fit in a {texture_width}x{texture_height} texture"
                )));
            }
        }

        Ok(Self { frames, names })
    }

    /// Builds an atlas against a loaded texture's size.
    pub fn for_texture<B: RenderBackend>(
        texture: &TextureResource<B>,
        layout: &AtlasLayout,
    ) -> PixelResult<Self> {
        Self::new(texture.width(), texture.height(), layout)
    }

    pub fn clip_for<'a>(&self, frame: impl Into<FrameId<'a>>) -> PixelResult<Rect> {
        let frame = frame.into();
        let index = match frame {
            FrameId::Index(index) => index,
            FrameId::Name(name) => match self.index_of(name) {
                Some(index) => index,
                None => {
                    return Err(PixelError::unknown_frame(format!(
                        "frame {name:?} is not in the atlas"
                    )))
                }
            },
        };

        match self.frames.get(index) {
            Some(rect) => Ok(*rect),
            None => Err(PixelError::unknown_frame(format!(
                "frame {index} is not in the atlas of {} frames",
                self.frames.len()
            ))),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn frames(&self) -> &[Rect] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    fn grid(columns: u32, rows: u32, cell_width: u32, cell_height: u32) -> AtlasLayout {
        AtlasLayout::Grid {
            columns,
            rows,
            cell_width,
            cell_height,
        }
    }

    #[test]
    fn grid_frames_are_row_major() {
        let atlas = SpriteAtlas::new(200, 200, &grid(2, 2, 100, 100)).unwrap();

        assert_eq!(
            &[
                Rect::new(0, 0, 100, 100),
                Rect::new(100, 0, 100, 100),
                Rect::new(0, 100, 100, 100),
                Rect::new(100, 100, 100, 100),
            ],
            atlas.frames()
        );
        for i in 0..4 {
            assert_eq!(atlas.frames()[i], atlas.clip_for(i).unwrap());
        }
    }

    #[test]
    fn grid_larger_than_texture_is_out_of_bounds() {
        let err = SpriteAtlas::new(200, 150, &grid(2, 2, 100, 100)).unwrap_err();
        assert_eq!(ErrorKind::OutOfBounds, err.kind());
    }

    #[test]
    fn grid_may_leave_unused_space() {
        let atlas = SpriteAtlas::new(256, 64, &grid(3, 1, 64, 64)).unwrap();
        assert_eq!(3, atlas.len());
        assert_eq!(Rect::new(128, 0, 64, 64), atlas.clip_for(2).unwrap());
    }

    #[test]
    fn oversized_grid_fails_before_building_frames() {
        let err = SpriteAtlas::new(1, 1, &grid(100_000, 100_000, 1, 1)).unwrap_err();
        assert_eq!(ErrorKind::OutOfBounds, err.kind());

        let err = SpriteAtlas::new(64, 64, &grid(1, u32::MAX, 64, 64)).unwrap_err();
        assert_eq!(ErrorKind::OutOfBounds, err.kind());
    }

    #[test]
    fn grid_with_empty_cells_is_out_of_bounds() {
        let err = SpriteAtlas::new(64, 64, &grid(u32::MAX, u32::MAX, 0, 0)).unwrap_err();
        assert_eq!(ErrorKind::OutOfBounds, err.kind());

        let err = SpriteAtlas::new(64, 64, &grid(2, 2, 0, 8)).unwrap_err();
        assert_eq!(ErrorKind::OutOfBounds, err.kind());
    }

    #[test]
    fn empty_grid_has_no_frames() {
        let atlas = SpriteAtlas::new(10, 10, &grid(0, 4, 5, 5)).unwrap();
        assert!(atlas.is_empty());
        assert_eq!(ErrorKind::UnknownFrame, atlas.clip_for(0).unwrap_err().kind());
    }

    #[test]
    fn named_frames_resolve_by_name_and_index() {
        let layout = AtlasLayout::Frames(vec![
            ("idle".to_string(), Rect::new(0, 0, 16, 32)),
            ("jump".to_string(), Rect::new(16, 0, 16, 32)),
        ]);
        let atlas = SpriteAtlas::new(32, 32, &layout).unwrap();

        assert_eq!(Rect::new(16, 0, 16, 32), atlas.clip_for("jump").unwrap());
        assert_eq!(Rect::new(0, 0, 16, 32), atlas.clip_for(0).unwrap());
        assert_eq!(Some(1), atlas.index_of("jump"));
    }

    #[test]
    fn unknown_frames_are_reported() {
        let atlas = SpriteAtlas::new(200, 200, &grid(2, 2, 100, 100)).unwrap();

        assert_eq!(ErrorKind::UnknownFrame, atlas.clip_for(4).unwrap_err().kind());
        assert_eq!(
            ErrorKind::UnknownFrame,
            atlas.clip_for("walk").unwrap_err().kind()
        );
    }

    #[test]
    fn explicit_frame_outside_texture_is_out_of_bounds() {
        for rect in [
            Rect::new(-1, 0, 4, 4),
            Rect::new(0, 0, 33, 4),
            Rect::new(30, 30, 4, 4),
            Rect::new(0, 0, 0, 4),
        ] {
            let layout = AtlasLayout::Frames(vec![("bad".to_string(), rect)]);
            let err = SpriteAtlas::new(32, 32, &layout).unwrap_err();
            assert_eq!(ErrorKind::OutOfBounds, err.kind(), "{rect}");
        }
    }

    #[test]
    fn atlas_over_empty_texture_is_out_of_bounds() {
        let texture = TextureResource::<crate::SoftwareCanvas>::new();
        let err = SpriteAtlas::for_texture(&texture, &grid(1, 1, 8, 8)).unwrap_err();
        assert_eq!(ErrorKind::OutOfBounds, err.kind());
    }
}
