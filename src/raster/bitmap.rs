use std::sync::Arc;

use crate::foundation::error::{BoothError, BoothResult};

/// Decoded raster image in premultiplied RGBA8.
///
/// Pixel storage is shared, so cloning a bitmap (for example when the same sticker image is added
/// twice) never copies pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> BoothResult<Self> {
        let expected = byte_len(width, height)?;
        if rgba8_premul.len() != expected {
            return Err(BoothError::decode(format!(
                "bitmap byte length mismatch: got {}, expected {expected}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Single-color bitmap from a straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = premul_px(rgba);
        let n = width as usize * height as usize;
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_in_place(&mut data);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }

    /// Straight-alpha copy, suitable for encoders.
    pub fn to_rgba_image(&self) -> BoothResult<image::RgbaImage> {
        let mut data = self.rgba8_premul.as_ref().clone();
        unpremultiply_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| BoothError::encode("bitmap buffer does not match its dimensions"))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let d = &self.rgba8_premul;
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }
}

pub(crate) fn byte_len(width: u32, height: u32) -> BoothResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BoothError::validation("bitmap size overflow"))
}

pub(crate) fn premul_px([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let p = |c: u8| (((u16::from(c) * u16::from(a)) + 127) / 255) as u8;
    [p(r), p(g), p(b), a]
}

pub(crate) fn unpremul_px([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let u = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
    [u(r), u(g), u(b), a]
}

pub(crate) fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = premul_px([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

pub(crate) fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = unpremul_px([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}
