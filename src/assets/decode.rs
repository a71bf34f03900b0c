use crate::{
    foundation::error::{BoothError, BoothResult},
    raster::Bitmap,
};

/// Decode any raster format `image` understands, or an SVG document.
pub fn decode_image(bytes: &[u8]) -> BoothResult<Bitmap> {
    if looks_like_svg(bytes) {
        return decode_svg(bytes);
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| BoothError::decode(format!("unreadable image data: {e}")))?;
    let bitmap = Bitmap::from_rgba_image(dyn_img.to_rgba8());
    if bitmap.is_empty() {
        return Err(BoothError::decode("image has zero width or height"));
    }
    Ok(bitmap)
}

/// Rasterize an SVG at its intrinsic size.
pub fn decode_svg(bytes: &[u8]) -> BoothResult<Bitmap> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| BoothError::decode(format!("unreadable svg: {e}")))?;

    let size = tree.size();
    let to_px = |v: f32| -> BoothResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(BoothError::decode("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    };
    let (w, h) = (to_px(size.width())?, to_px(size.height())?);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| BoothError::decode("failed to allocate svg pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    // tiny-skia pixmaps are already premultiplied RGBA8.
    Bitmap::from_premul(w, h, pixmap.data().to_vec())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decode_png_dimensions_and_premul() {
        let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50, 200, 128]).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let b = decode_image(&buf).unwrap();
        assert_eq!((b.width, b.height), (1, 1));
        assert_eq!(
            b.pixel(0, 0).unwrap(),
            [
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128
            ]
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, BoothError::Decode(_)));
    }

    #[test]
    fn svg_is_rasterized_at_intrinsic_size() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2" fill="#ff0000"/></svg>"##;
        let b = decode_image(svg).unwrap();
        assert_eq!((b.width, b.height), (4, 2));
        assert_eq!(b.pixel(1, 1), Some([255, 0, 0, 255]));

        assert!(decode_svg(b"<svg").is_err());
    }
}
