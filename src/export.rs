use std::{io::Cursor, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::error::{BoothError, BoothResult},
    raster::{Bitmap, Surface},
};

/// Encoded output format for downloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg {
        quality: u8,
    },
}

impl ExportFormat {
    /// Pick a format from a file name, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => Self::Jpeg { quality: 92 },
            _ => Self::Png,
        }
    }
}

pub fn encode_bitmap(bitmap: &Bitmap, format: ExportFormat) -> BoothResult<Vec<u8>> {
    let rgba = bitmap.to_rgba_image()?;
    let mut buf = Vec::new();
    match format {
        ExportFormat::Png => image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| BoothError::encode(format!("png encode failed: {e}")))?,
        ExportFormat::Jpeg { quality } => {
            if quality == 0 || quality > 100 {
                return Err(BoothError::validation("jpeg quality must be in 1..=100"));
            }
            let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            image::DynamicImage::ImageRgb8(rgb)
                .write_with_encoder(encoder)
                .map_err(|e| BoothError::encode(format!("jpeg encode failed: {e}")))?;
        }
    }
    Ok(buf)
}

/// Encode the surface as it is now. Reading never touches editor or capture state.
#[tracing::instrument(skip(surface), fields(width = surface.size().width, height = surface.size().height))]
pub fn encode_surface(surface: &Surface, format: ExportFormat) -> BoothResult<Vec<u8>> {
    encode_bitmap(&surface.to_bitmap(), format)
}

/// Write encoded bytes, creating parent directories as needed.
pub fn save(path: &Path, bytes: &[u8]) -> BoothResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_export_decodes_back() {
        let b = Bitmap::solid(4, 4, [1, 2, 3, 255]);
        let png = encode_bitmap(&b, ExportFormat::Png).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (4, 4));
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn jpeg_export_has_jpeg_magic() {
        let b = Bitmap::solid(8, 8, [200, 100, 50, 255]);
        let jpg = encode_bitmap(&b, ExportFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(&jpg[..2], &[0xFF, 0xD8]);
        assert!(encode_bitmap(&b, ExportFormat::Jpeg { quality: 0 }).is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("a/b.JPG")),
            ExportFormat::Jpeg { quality: 92 }
        );
        assert_eq!(ExportFormat::from_path(Path::new("strip")), ExportFormat::Png);
    }
}
