use std::path::Path;

use log::{debug, warn};

use crate::{Color, DrawParams, Image, PixelError, PixelResult, RasterizeText, RenderBackend, Rgb};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Pixels of this color become fully transparent while decoding.
    pub color_key: Option<Rgb>,
}

impl LoadOptions {
    pub fn color_keyed(key: Rgb) -> Self {
        Self {
            color_key: Some(key),
        }
    }
}

/// Owns zero or one backend texture along with its pixel size.
///
/// `width` and `height` are non-zero exactly when a texture is held.
pub struct TextureResource<B: RenderBackend> {
    texture: Option<B::Texture>,
    width: u32,
    height: u32,
}

impl<B: RenderBackend> TextureResource<B> {
    pub fn new() -> Self {
        Self {
            texture: None,
            width: 0,
            height: 0,
        }
    }

    /// Decodes and uploads the image at `path`.
    ///
    /// A decode failure leaves the resource untouched. Once decoding succeeds
    /// the current texture is released before the upload, so an upload
    /// failure leaves the resource empty.
    pub fn load_from_file(
        &mut self,
        backend: &mut B,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> PixelResult {
        let path = path.as_ref();
        let mut image = match Image::from_file(path) {
            Ok(image) => image,
            Err(err) => {
                warn!("{err}");
                return Err(err);
            }
        };

        if let Some(key) = options.color_key {
            image.apply_color_key(key);
        }

        self.load_from_image(backend, &image).map_err(|err| {
            PixelError::upload(format!("unable to create texture from {}", path.display()))
                .with_source(err)
        })
    }

    pub fn load_from_bytes(
        &mut self,
        backend: &mut B,
        data: &[u8],
        options: &LoadOptions,
    ) -> PixelResult {
        let mut image = match Image::from_bytes(data) {
            Ok(image) => image,
            Err(err) => {
                warn!("{err}");
                return Err(err);
            }
        };

        if let Some(key) = options.color_key {
            image.apply_color_key(key);
        }

        self.load_from_image(backend, &image)
    }

    /// Renders `text` with `font` and uploads the result. Any failure leaves
    /// the resource empty.
    pub fn load_from_text(
        &mut self,
        backend: &mut B,
        font: &impl RasterizeText,
        text: &str,
        size: f32,
        color: Color,
    ) -> PixelResult {
        let image = match font.rasterize_text(text, size, color) {
            Ok(image) => image,
            Err(err) => {
                self.release();
                warn!("unable to render text {text:?}: {err}");
                return Err(err);
            }
        };

        self.load_from_image(backend, &image)
    }

    /// Releases the current texture, then uploads `image`.
    pub fn load_from_image(&mut self, backend: &mut B, image: &Image) -> PixelResult {
        self.release();

        if image.is_empty() {
            let err = PixelError::upload(format!(
                "cannot create a {}x{} texture",
                image.width(),
                image.height()
            ));
            warn!("{err}");
            return Err(err);
        }

        let texture = match backend.create_texture(image) {
            Ok(texture) => texture,
            Err(err) => {
                warn!("{err}");
                return Err(err);
            }
        };

        self.texture = Some(texture);
        self.width = image.width();
        self.height = image.height();
        debug!("uploaded {}x{} texture", self.width, self.height);

        Ok(())
    }

    /// Frees the backend texture. Calling it on an empty resource does nothing.
    pub fn release(&mut self) {
        if let Some(texture) = self.texture.take() {
            drop(texture);
            debug!("released {}x{} texture", self.width, self.height);
        }

        self.width = 0;
        self.height = 0;
    }

    /// Issues one backend copy. Returns `false` without touching the backend
    /// when nothing is loaded.
    pub fn draw(&self, backend: &mut B, params: &DrawParams) -> bool {
        let Some(texture) = self.texture.as_ref() else {
            return false;
        };

        let cmd = params.to_copy(self.width, self.height);
        backend.copy(texture, &cmd);

        true
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_loaded(&self) -> bool {
        self.texture.is_some()
    }
}

impl<B: RenderBackend> Default for TextureResource<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> Drop for TextureResource<B> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, io::Cursor, path::PathBuf, rc::Rc};

    use proptest::prelude::*;

    use super::*;
    use crate::{CopyCommand, ErrorKind, Rect, SoftwareCanvas};

    /// Records every call and counts live textures through their drop.
    #[derive(Default)]
    struct RecordingBackend {
        live: Rc<RefCell<usize>>,
        created: usize,
        copies: Vec<CopyCommand>,
        reject_uploads: bool,
    }

    struct RecordedTexture {
        live: Rc<RefCell<usize>>,
    }

    impl Drop for RecordedTexture {
        fn drop(&mut self) {
            *self.live.borrow_mut() -= 1;
        }
    }

    impl RecordingBackend {
        fn live(&self) -> usize {
            *self.live.borrow()
        }
    }

    impl RenderBackend for RecordingBackend {
        type Texture = RecordedTexture;

        fn create_texture(&mut self, _image: &Image) -> PixelResult<Self::Texture> {
            if self.reject_uploads {
                return Err(PixelError::upload("uploads are disabled"));
            }

            self.created += 1;
            *self.live.borrow_mut() += 1;
            Ok(RecordedTexture {
                live: self.live.clone(),
            })
        }

        fn copy(&mut self, _texture: &Self::Texture, cmd: &CopyCommand) {
            self.copies.push(*cmd);
        }

        fn clear(&mut self, _color: Color) {}

        fn present(&mut self) -> PixelResult {
            Ok(())
        }
    }

    fn write_png(dir: &tempfile::TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbaImage::from_pixel(width, height, image::Rgba([0, 255, 255, 255]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn new_resource_is_empty() {
        let texture = TextureResource::<RecordingBackend>::new();
        assert!(!texture.is_loaded());
        assert_eq!((0, 0), texture.size());
    }

    #[test]
    fn load_from_file_sets_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "foo.png", 64, 205);
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();

        texture
            .load_from_file(&mut backend, &path, &LoadOptions::default())
            .unwrap();

        assert!(texture.is_loaded());
        assert_eq!(64, texture.width());
        assert_eq!(205, texture.height());
        assert_eq!(1, backend.live());
    }

    #[test]
    fn failed_decode_leaves_loaded_resource_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "background.png", 640, 480);
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();
        texture
            .load_from_file(&mut backend, &path, &LoadOptions::default())
            .unwrap();

        let missing = dir.path().join("missing.png");
        let err = texture
            .load_from_file(&mut backend, &missing, &LoadOptions::default())
            .unwrap_err();

        assert_eq!(ErrorKind::Decode, err.kind());
        assert!(texture.is_loaded());
        assert_eq!((640, 480), texture.size());
        assert_eq!(1, backend.live());
    }

    #[test]
    fn failed_decode_leaves_empty_resource_empty() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();

        let err = texture
            .load_from_bytes(&mut backend, b"not an image", &LoadOptions::default())
            .unwrap_err();

        assert_eq!(ErrorKind::Decode, err.kind());
        assert!(!texture.is_loaded());
        assert_eq!(0, backend.created);
    }

    #[test]
    fn failed_upload_leaves_resource_empty() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();
        texture
            .load_from_bytes(&mut backend, &png_bytes(8, 8), &LoadOptions::default())
            .unwrap();

        backend.reject_uploads = true;
        let err = texture
            .load_from_bytes(&mut backend, &png_bytes(4, 4), &LoadOptions::default())
            .unwrap_err();

        assert_eq!(ErrorKind::Upload, err.kind());
        assert!(!texture.is_loaded());
        assert_eq!((0, 0), texture.size());
        assert_eq!(0, backend.live());
    }

    #[test]
    fn failed_file_upload_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir, "dots.png", 2, 2);
        let mut backend = RecordingBackend {
            reject_uploads: true,
            ..Default::default()
        };
        let mut texture = TextureResource::new();

        let err = texture
            .load_from_file(&mut backend, &path, &LoadOptions::default())
            .unwrap_err();

        assert_eq!(ErrorKind::Upload, err.kind());
        assert!(err.message().contains("dots.png"));
    }

    #[test]
    fn reload_keeps_one_live_texture() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();

        texture
            .load_from_bytes(&mut backend, &png_bytes(8, 8), &LoadOptions::default())
            .unwrap();
        texture
            .load_from_bytes(&mut backend, &png_bytes(16, 4), &LoadOptions::default())
            .unwrap();

        assert_eq!(2, backend.created);
        assert_eq!(1, backend.live());
        assert_eq!((16, 4), texture.size());
    }

    #[test]
    fn release_twice_equals_release_once() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();
        texture
            .load_from_bytes(&mut backend, &png_bytes(8, 8), &LoadOptions::default())
            .unwrap();

        texture.release();
        assert_eq!(0, backend.live());
        assert_eq!((0, 0), texture.size());

        texture.release();
        assert_eq!(0, backend.live());
        assert_eq!((0, 0), texture.size());
        assert!(!texture.is_loaded());
    }

    #[test]
    fn drop_releases_texture() {
        let mut backend = RecordingBackend::default();
        {
            let mut texture = TextureResource::new();
            texture
                .load_from_bytes(&mut backend, &png_bytes(8, 8), &LoadOptions::default())
                .unwrap();
            assert_eq!(1, backend.live());
        }
        assert_eq!(0, backend.live());
    }

    #[test]
    fn draw_empty_resource_issues_no_copy() {
        let mut backend = RecordingBackend::default();
        let texture = TextureResource::new();

        assert!(!texture.draw(&mut backend, &DrawParams::at(10, 20)));
        assert!(backend.copies.is_empty());
    }

    #[test]
    fn draw_issues_exactly_one_copy() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();
        texture
            .load_from_bytes(&mut backend, &png_bytes(100, 100), &LoadOptions::default())
            .unwrap();

        assert!(texture.draw(&mut backend, &DrawParams::at(10, 20)));
        assert!(texture.draw(
            &mut backend,
            &DrawParams::at(10, 20).with_clip(Rect::new(0, 0, 50, 50))
        ));

        assert_eq!(2, backend.copies.len());
        assert_eq!(Rect::new(10, 20, 100, 100), backend.copies[0].dst);
        assert_eq!(Rect::new(10, 20, 50, 50), backend.copies[1].dst);
        assert_eq!(Rect::new(0, 0, 50, 50), backend.copies[1].src);
    }

    #[test]
    fn color_key_is_applied_when_requested() {
        let mut canvas = SoftwareCanvas::new(4, 4);
        let mut texture = TextureResource::new();
        texture
            .load_from_bytes(
                &mut canvas,
                &png_bytes(2, 2),
                &LoadOptions::color_keyed(Rgb::CYAN),
            )
            .unwrap();

        canvas.clear(Color::BLACK);
        texture.draw(&mut canvas, &DrawParams::at(0, 0));

        assert_eq!([0, 0, 0, 255], canvas.pixel(0, 0));
    }

    struct BlockFont;

    impl RasterizeText for BlockFont {
        fn rasterize_text(&self, text: &str, size: f32, color: Color) -> PixelResult<Image> {
            if text.is_empty() {
                return Err(PixelError::decode("text is empty"));
            }

            let mut image = Image::new(text.chars().count() as u32 * size as u32, size as u32);
            image.fill(color.to_array_u8());
            Ok(image)
        }
    }

    #[test]
    fn load_from_text_uses_rendered_size() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();

        texture
            .load_from_text(&mut backend, &BlockFont, "Hello", 8.0, Color::BLACK)
            .unwrap();

        assert_eq!((40, 8), texture.size());
        assert_eq!(1, backend.live());
    }

    #[test]
    fn unrenderable_text_leaves_resource_empty() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();
        texture
            .load_from_bytes(&mut backend, &png_bytes(8, 8), &LoadOptions::default())
            .unwrap();

        let err = texture
            .load_from_text(&mut backend, &BlockFont, "", 16.0, Color::BLACK)
            .unwrap_err();

        assert_eq!(ErrorKind::Decode, err.kind());
        assert!(!texture.is_loaded());
        assert_eq!(0, backend.live());
    }

    #[test]
    fn zero_size_text_is_an_upload_failure() {
        let mut backend = RecordingBackend::default();
        let mut texture = TextureResource::new();

        let err = texture
            .load_from_text(&mut backend, &BlockFont, "Hi", 0.0, Color::BLACK)
            .unwrap_err();

        assert_eq!(ErrorKind::Upload, err.kind());
        assert_eq!(0, backend.created);
    }

    proptest! {
        #[test]
        fn loaded_iff_positive_dimensions(width in 1u32..64, height in 1u32..64, release in any::<bool>()) {
            let mut backend = RecordingBackend::default();
            let mut texture = TextureResource::new();
            texture
                .load_from_image(&mut backend, &Image::new(width, height))
                .unwrap();

            if release {
                texture.release();
            }

            prop_assert_eq!(texture.is_loaded(), texture.width() > 0 && texture.height() > 0);
            prop_assert_eq!(backend.live(), usize::from(texture.is_loaded()));
        }
    }
}
