use std::path::Path;

use image::ImageError;

use crate::{PixelError, PixelResult, Rgb};

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Transparent image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * Self::BYTES_PER_PIXEL],
        }
    }

    pub fn from_bytes(data: &[u8]) -> PixelResult<Self> {
        let image = image::load_from_memory(data)?.into_rgba8();
        let (width, height) = image.dimensions();

        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> PixelResult<Self> {
        let path = path.as_ref();
        let image = match image::open(path) {
            Ok(image) => image.into_rgba8(),
            Err(err) => {
                return Err(PixelError::decode(format!(
                    "unable to load image {}",
                    path.display()
                ))
                .with_source(err))
            }
        };
        let (width, height) = image.dimensions();

        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    /// Panics when `pixels` is not `width * height * 4` bytes long.
    pub fn from_pixels(width: u32, height: u32, pixels: &[u8]) -> Self {
        assert_eq!(
            width as usize * height as usize * Self::BYTES_PER_PIXEL,
            pixels.len(),
            "pixel buffer does not match image dimensions"
        );

        Self {
            width,
            height,
            pixels: pixels.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + Self::BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(Self::BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Makes every pixel matching `key` fully transparent.
    pub fn apply_color_key(&mut self, key: Rgb) {
        let key = key.to_array();
        for px in self.pixels.chunks_exact_mut(Self::BYTES_PER_PIXEL) {
            if px[..3] == key {
                px[3] = 0;
            }
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL
    }
}

impl From<ImageError> for PixelError {
    fn from(err: ImageError) -> Self {
        PixelError::decode("an image processing error occurred").with_source(err)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::ErrorKind;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decode_png_from_bytes() {
        let image = Image::from_bytes(&png_bytes(3, 2, [1, 2, 3, 255])).unwrap();

        assert_eq!(3, image.width());
        assert_eq!(2, image.height());
        assert_eq!(3 * 2 * 4, image.pixels().len());
        assert_eq!([1, 2, 3, 255], image.pixel(2, 1));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let err = Image::from_bytes(b"definitely not a png").unwrap_err();
        assert_eq!(ErrorKind::Decode, err.kind());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Image::from_file("does/not/exist.png").unwrap_err();
        assert_eq!(ErrorKind::Decode, err.kind());
        assert!(err.message().contains("does/not/exist.png"));
    }

    #[test]
    fn color_key_clears_alpha_of_matching_pixels_only() {
        let mut image = Image::new(2, 1);
        image.set_pixel(0, 0, [0, 255, 255, 255]);
        image.set_pixel(1, 0, [0, 255, 254, 255]);

        image.apply_color_key(Rgb::CYAN);

        assert_eq!([0, 255, 255, 0], image.pixel(0, 0));
        assert_eq!([0, 255, 254, 255], image.pixel(1, 0));
    }

    #[test]
    #[should_panic(expected = "pixel buffer does not match image dimensions")]
    fn from_pixels_rejects_short_buffer() {
        Image::from_pixels(2, 2, &[0; 4]);
    }
}
