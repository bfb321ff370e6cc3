use crate::{Color, CopyCommand, Image, PixelResult};

/// A drawable surface that textures can be uploaded to and copied onto.
///
/// Texture handles own their backend resource. Dropping a handle destroys the
/// resource, so a backend never has to be told explicitly.
pub trait RenderBackend {
    type Texture;

    /// Uploads decoded pixels. Fails with [`crate::ErrorKind::Upload`].
    fn create_texture(&mut self, image: &Image) -> PixelResult<Self::Texture>;

    /// Copies `cmd.src` of `texture` to `cmd.dst`, applying rotation, flip,
    /// tint, alpha and blend in one operation.
    fn copy(&mut self, texture: &Self::Texture, cmd: &CopyCommand);

    fn clear(&mut self, color: Color);

    fn present(&mut self) -> PixelResult;
}
