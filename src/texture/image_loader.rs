use std::sync::Arc;

use crate::foundation::error::{NotifyError, NotifyResult};
use crate::texture::{TextureLoader, TextureSize};

/// Decoded texture pixels, premultiplied RGBA8, tightly packed, row-major.
#[derive(Clone, Debug)]
pub struct PreparedTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedTexture {
    /// Pixel size.
    pub fn size(&self) -> TextureSize {
        TextureSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// [`TextureLoader`] that decodes PNG/JPEG bytes with the `image` crate and keeps the pixels
/// resident until unloaded.
#[derive(Debug, Default)]
pub struct ImageTextureLoader {
    resident: Option<PreparedTexture>,
}

impl ImageTextureLoader {
    /// Create a loader with nothing resident.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently resident texture.
    pub fn texture(&self) -> Option<&PreparedTexture> {
        self.resident.as_ref()
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load(&mut self, image: &[u8]) -> NotifyResult<TextureSize> {
        let prepared = decode_texture(image)?;
        let size = prepared.size();
        tracing::debug!(width = size.width, height = size.height, "texture loaded");
        self.resident = Some(prepared);
        Ok(size)
    }

    fn unload(&mut self) {
        if self.resident.take().is_some() {
            tracing::debug!("texture unloaded");
        }
    }
}

/// Decode encoded image bytes into premultiplied RGBA8.
pub fn decode_texture(bytes: &[u8]) -> NotifyResult<PreparedTexture> {
    if bytes.is_empty() {
        return Err(NotifyError::texture("image data is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| NotifyError::texture(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(NotifyError::texture("image has zero area"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedTexture {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/texture/image_loader.rs"]
mod tests;
