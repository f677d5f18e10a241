use crate::foundation::error::NotifyResult;

pub(crate) mod image_loader;

/// Pixel size of a loaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureSize {
    /// Height over width, used to derive the overlay height from its width.
    pub fn aspect(self) -> f32 {
        if self.width == 0 {
            return 1.0;
        }
        self.height as f32 / self.width as f32
    }
}

/// Loads notification images into the texture bound to one overlay.
///
/// At most one texture is resident at a time; `load` replaces whatever was loaded before.
pub trait TextureLoader: Send {
    /// Decode and bind `image`, returning its pixel size.
    fn load(&mut self, image: &[u8]) -> NotifyResult<TextureSize>;

    /// Release the resident texture. Calling this with nothing loaded is a no-op.
    fn unload(&mut self);
}
