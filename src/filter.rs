//! CSS-style filter strings (`"grayscale(100%) blur(2px)"`) applied to a single draw call.

use crate::{
    foundation::error::{BoothError, BoothResult},
    raster::{
        bitmap::{premul_px, unpremul_px},
        blur::{MAX_BLUR_RADIUS, gaussian_blur_in_place},
    },
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOp {
    Grayscale(f32),
    Sepia(f32),
    Invert(f32),
    Opacity(f32),
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    /// Gaussian standard deviation in pixels.
    Blur(f32),
}

/// Ordered list of filter functions. An empty chain is the `none` filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterChain {
    ops: Vec<FilterOp>,
}

impl FilterChain {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_ops(ops: Vec<FilterOp>) -> Self {
        Self { ops }
    }

    pub fn parse(input: &str) -> BoothResult<Self> {
        let s = input.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }

        let mut ops = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| BoothError::validation(format!("malformed filter '{input}'")))?;
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| BoothError::validation(format!("unclosed filter in '{input}'")))?;
            let name = rest[..open].trim().to_ascii_lowercase();
            let arg = rest[open + 1..close].trim();
            ops.push(parse_op(&name, arg)?);
            rest = rest[close + 1..].trim_start();
        }
        Ok(Self { ops })
    }

    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| match *op {
            FilterOp::Grayscale(a) | FilterOp::Sepia(a) | FilterOp::Invert(a) => a == 0.0,
            FilterOp::Opacity(v)
            | FilterOp::Brightness(v)
            | FilterOp::Contrast(v)
            | FilterOp::Saturate(v) => v == 1.0,
            FilterOp::Blur(sigma) => sigma == 0.0,
        })
    }

    /// Apply every function in order to a premultiplied RGBA8 buffer.
    pub fn apply(&self, data: &mut [u8], width: u32, height: u32) -> BoothResult<()> {
        for op in &self.ops {
            match *op {
                FilterOp::Blur(sigma) => gaussian_blur_in_place(data, width, height, sigma)?,
                color => {
                    for px in data.chunks_exact_mut(4) {
                        if px[3] == 0 {
                            continue;
                        }
                        let out = apply_color(color, [px[0], px[1], px[2], px[3]]);
                        px.copy_from_slice(&out);
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for FilterChain {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_op(name: &str, arg: &str) -> BoothResult<FilterOp> {
    let op = match name {
        "grayscale" => FilterOp::Grayscale(amount(name, arg)?.min(1.0)),
        "sepia" => FilterOp::Sepia(amount(name, arg)?.min(1.0)),
        "invert" => FilterOp::Invert(amount(name, arg)?.min(1.0)),
        "opacity" => FilterOp::Opacity(amount(name, arg)?.min(1.0)),
        "brightness" => FilterOp::Brightness(amount(name, arg)?),
        "contrast" => FilterOp::Contrast(amount(name, arg)?),
        "saturate" => FilterOp::Saturate(amount(name, arg)?),
        "blur" => FilterOp::Blur(blur_length(arg)?),
        _ => {
            return Err(BoothError::validation(format!(
                "unknown filter function '{name}'"
            )));
        }
    };
    Ok(op)
}

/// `<number> | <percentage>`, defaulting to 1 when omitted.
fn amount(name: &str, arg: &str) -> BoothResult<f32> {
    if arg.is_empty() {
        return Ok(1.0);
    }
    let (num, scale) = match arg.strip_suffix('%') {
        Some(n) => (n.trim(), 0.01),
        None => (arg, 1.0),
    };
    let v: f32 = num
        .parse()
        .map_err(|_| BoothError::validation(format!("{name}() expects a number, got '{arg}'")))?;
    let v = v * scale;
    if !v.is_finite() || v < 0.0 {
        return Err(BoothError::validation(format!(
            "{name}() amount must be finite and >= 0"
        )));
    }
    Ok(v)
}

fn blur_length(arg: &str) -> BoothResult<f32> {
    if arg.is_empty() {
        return Ok(0.0);
    }
    let num = arg.strip_suffix("px").map(str::trim).unwrap_or(arg);
    let v: f32 = num
        .parse()
        .map_err(|_| BoothError::validation(format!("blur() expects a length, got '{arg}'")))?;
    if num == arg && v != 0.0 {
        return Err(BoothError::validation("blur() length needs a 'px' unit"));
    }
    if !v.is_finite() || v < 0.0 || v * 3.0 > MAX_BLUR_RADIUS as f32 {
        return Err(BoothError::validation(format!(
            "blur() radius must be between 0 and {}px",
            MAX_BLUR_RADIUS / 3
        )));
    }
    Ok(v)
}

fn apply_color(op: FilterOp, px: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = unpremul_px(px);
    let mut c = [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    ];
    let mut alpha = f32::from(a) / 255.0;

    match op {
        FilterOp::Grayscale(amt) => {
            let s = 1.0 - amt;
            c = matrix(
                c,
                [
                    [0.2126 + 0.7874 * s, 0.7152 - 0.7152 * s, 0.0722 - 0.0722 * s],
                    [0.2126 - 0.2126 * s, 0.7152 + 0.2848 * s, 0.0722 - 0.0722 * s],
                    [0.2126 - 0.2126 * s, 0.7152 - 0.7152 * s, 0.0722 + 0.9278 * s],
                ],
            );
        }
        FilterOp::Sepia(amt) => {
            let s = 1.0 - amt;
            c = matrix(
                c,
                [
                    [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
                    [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
                    [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
                ],
            );
        }
        FilterOp::Saturate(s) => {
            c = matrix(
                c,
                [
                    [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                    [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
                ],
            );
        }
        FilterOp::Invert(amt) => {
            for v in &mut c {
                *v = amt * (1.0 - *v) + (1.0 - amt) * *v;
            }
        }
        FilterOp::Brightness(k) => {
            for v in &mut c {
                *v *= k;
            }
        }
        FilterOp::Contrast(k) => {
            for v in &mut c {
                *v = (*v - 0.5) * k + 0.5;
            }
        }
        FilterOp::Opacity(k) => alpha *= k,
        FilterOp::Blur(_) => {}
    }

    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    premul_px([to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), to_u8(alpha)])
}

fn matrix(c: [f32; 3], m: [[f32; 3]; 3]) -> [f32; 3] {
    [
        m[0][0] * c[0] + m[0][1] * c[1] + m[0][2] * c[2],
        m[1][0] * c[0] + m[1][1] * c[1] + m[1][2] * c[2],
        m[2][0] * c[0] + m[2][1] * c[1] + m[2][2] * c[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_empty_are_identity() {
        assert!(FilterChain::parse("none").unwrap().is_identity());
        assert!(FilterChain::parse("  ").unwrap().is_identity());
        assert!(FilterChain::parse("grayscale(0%)").unwrap().is_identity());
    }

    #[test]
    fn parses_chain_in_order() {
        let f = FilterChain::parse("grayscale(100%) brightness(1.2) blur(2px)").unwrap();
        assert_eq!(
            f.ops(),
            &[
                FilterOp::Grayscale(1.0),
                FilterOp::Brightness(1.2),
                FilterOp::Blur(2.0)
            ]
        );
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!(FilterChain::parse("wobble(3)").is_err());
        assert!(FilterChain::parse("sepia(").is_err());
        assert!(FilterChain::parse("blur(3)").is_err());
        assert!(FilterChain::parse("contrast(-1)").is_err());
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let f = FilterChain::parse("grayscale(1)").unwrap();
        let mut px = vec![255u8, 0, 0, 255];
        f.apply(&mut px, 1, 1).unwrap();
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn invert_full_flips_channels() {
        let f = FilterChain::parse("invert(100%)").unwrap();
        let mut px = vec![0u8, 255, 10, 255];
        f.apply(&mut px, 1, 1).unwrap();
        assert_eq!(px, vec![255, 0, 245, 255]);
    }

    #[test]
    fn transparent_pixels_are_untouched() {
        let f = FilterChain::parse("brightness(3)").unwrap();
        let mut px = vec![0u8; 4];
        f.apply(&mut px, 1, 1).unwrap();
        assert_eq!(px, vec![0; 4]);
    }
}
