use crate::foundation::error::{BoothError, BoothResult};

/// Largest kernel radius accepted by [`gaussian_blur_in_place`].
pub const MAX_BLUR_RADIUS: u32 = 256;

/// Separable gaussian blur over premultiplied RGBA8 with clamped edges.
///
/// `sigma` is the standard deviation in pixels, matching CSS `blur(<length>)`.
pub fn gaussian_blur_in_place(
    data: &mut [u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> BoothResult<()> {
    let expected = super::bitmap::byte_len(width, height)?;
    if data.len() != expected {
        return Err(BoothError::validation(
            "blur expects a buffer matching width*height*4",
        ));
    }
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(BoothError::validation("blur sigma must be finite and >= 0"));
    }
    if sigma == 0.0 || width == 0 || height == 0 {
        return Ok(());
    }

    let radius = ((sigma * 3.0).ceil() as u32).clamp(1, MAX_BLUR_RADIUS);
    let kernel = kernel(radius, sigma);
    let mut tmp = vec![0u8; expected];
    pass(data, &mut tmp, width, height, &kernel, true);
    pass(&tmp, data, width, height, &kernel, false);
    Ok(())
}

fn kernel(radius: u32, sigma: f32) -> Vec<f32> {
    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f32> = (-r..=r)
        .map(|i| {
            let x = i as f32;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f32 = k.iter().sum();
    for w in &mut k {
        *w /= sum;
    }
    k
}

fn pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[f32], horizontal: bool) {
    let radius = (k.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = if horizontal {
                    ((x + d).clamp(0, w - 1), y)
                } else {
                    (x, (y + d).clamp(0, h - 1))
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += kw * f32::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_is_unchanged() {
        let mut data = [40u8, 80, 120, 255].repeat(16);
        let before = data.clone();
        gaussian_blur_in_place(&mut data, 4, 4, 2.0).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn single_bright_pixel_spreads() {
        let mut data = vec![0u8; 5 * 5 * 4];
        let center = (2 * 5 + 2) * 4;
        data[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
        gaussian_blur_in_place(&mut data, 5, 5, 1.0).unwrap();
        assert!(data[center + 3] < 255);
        assert!(data[(2 * 5 + 3) * 4 + 3] > 0);
    }

    #[test]
    fn zero_sigma_is_noop_and_bad_len_errors() {
        let mut data = vec![7u8; 16];
        gaussian_blur_in_place(&mut data, 2, 2, 0.0).unwrap();
        assert_eq!(data, vec![7u8; 16]);
        assert!(gaussian_blur_in_place(&mut data, 3, 3, 1.0).is_err());
    }
}
