use std::path::Path;

use fontdue::FontSettings;

use crate::{Color, Image, PixelError, PixelResult};

/// Turns a string into a bitmap ready for upload.
pub trait RasterizeText {
    fn rasterize_text(&self, text: &str, size: f32, color: Color) -> PixelResult<Image>;
}

pub struct Font {
    font: fontdue::Font,
}

impl Font {
    pub fn from_bytes(data: &[u8]) -> PixelResult<Self> {
        let settings = FontSettings::default();
        let font = fontdue::Font::from_bytes(data, settings)
            .map_err(|err| PixelError::decode(format!("failed to parse font: {err}")))?;

        Ok(Font { font })
    }

    pub fn from_file(path: impl AsRef<Path>) -> PixelResult<Self> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                return Err(
                    PixelError::decode(format!("unable to load font {}", path.display()))
                        .with_source(err),
                )
            }
        };

        Self::from_bytes(&data)
    }

    fn layout(&self, text: &str, size: f32) -> PixelResult<TextLayout> {
        let line_metrics = match self.font.horizontal_line_metrics(size) {
            Some(line_metrics) => line_metrics,
            None => return Err(PixelError::decode("failed to load line metrics")),
        };

        let ascent = f32::ceil(line_metrics.ascent);
        let descent = f32::ceil(line_metrics.descent);

        let mut glyphs = Vec::new();
        let mut pen = 0.0;
        let mut right = 0.0_f32;
        let mut last = None;

        // single line, control characters are skipped.
        for c in text.chars().filter(|c| !c.is_control()) {
            if let Some(last) = last {
                pen += self.font.horizontal_kern(last, c, size).unwrap_or(0.0);
            }

            let (metrics, bitmap) = self.font.rasterize(c, size);
            let x = f32::floor(pen + metrics.xmin as f32);
            let y = f32::floor(ascent - metrics.height as f32 - metrics.ymin as f32);

            right = right.max(x + metrics.width as f32);
            glyphs.push(PlacedGlyph {
                x: x as i32,
                y: y as i32,
                width: metrics.width,
                height: metrics.height,
                coverage: bitmap,
            });

            pen += f32::ceil(metrics.advance_width);
            last = Some(c);
        }

        Ok(TextLayout {
            width: f32::ceil(pen.max(right)).max(0.0) as u32,
            height: (ascent - descent).max(0.0) as u32,
            glyphs,
        })
    }
}

impl RasterizeText for Font {
    fn rasterize_text(&self, text: &str, size: f32, color: Color) -> PixelResult<Image> {
        if text.is_empty() {
            return Err(PixelError::decode("text is empty"));
        }
        if size.is_nan() || size <= 0.0 {
            return Err(PixelError::decode(format!("invalid font size {size}")));
        }

        let layout = self.layout(text, size)?;
        if layout.width == 0 || layout.height == 0 {
            return Err(PixelError::decode(format!(
                "text {text:?} has nothing to render"
            )));
        }

        let [r, g, b, a] = color.to_array_u8();
        let mut image = Image::new(layout.width, layout.height);
        image.fill([r, g, b, 0]);

        for glyph in &layout.glyphs {
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    let coverage = glyph.coverage[gy * glyph.width + gx];
                    if coverage == 0 {
                        continue;
                    }

                    let px = glyph.x + gx as i32;
                    let py = glyph.y + gy as i32;
                    if px < 0 || py < 0 || px >= layout.width as i32 || py >= layout.height as i32
                    {
                        continue;
                    }

                    let (px, py) = (px as u32, py as u32);
                    let alpha = crate::draw::mul_u8(coverage, a);
                    let existing = image.pixel(px, py)[3];
                    image.set_pixel(px, py, [r, g, b, alpha.max(existing)]);
                }
            }
        }

        Ok(image)
    }
}

struct PlacedGlyph {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

struct TextLayout {
    width: u32,
    height: u32,
    glyphs: Vec<PlacedGlyph>,
}
