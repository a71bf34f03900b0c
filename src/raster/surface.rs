use kurbo::Rect;

use crate::{
    filter::FilterChain,
    foundation::{
        core::CanvasSize,
        error::{BoothError, BoothResult},
    },
    raster::{
        bitmap::{Bitmap, byte_len},
        composite::{self, over},
    },
};

/// Per-draw state, the equivalent of what a 2D context keeps between `save()` and `restore()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DrawOpts<'a> {
    /// Reflect the draw across the vertical center line of the surface.
    pub mirror_x: bool,
    /// Filter applied to this draw only.
    pub filter: Option<&'a FilterChain>,
}

impl<'a> DrawOpts<'a> {
    pub fn mirrored(mirror_x: bool) -> Self {
        Self {
            mirror_x,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: &'a FilterChain) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Fixed-resolution premultiplied RGBA8 drawing target.
#[derive(Clone, Debug)]
pub struct Surface {
    size: CanvasSize,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(size: CanvasSize) -> BoothResult<Self> {
        let len = byte_len(size.width, size.height)?;
        Ok(Self {
            size,
            data: vec![0; len],
        })
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Reset the pixels covered by `rect` to transparent.
    pub fn clear_rect(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = self.pixel_span(rect) else {
            return;
        };
        for y in y0..y1 {
            let start = self.index(x0, y);
            let end = self.index(x1 - 1, y) + 4;
            self.data[start..end].fill(0);
        }
    }

    /// Draw the `src` region of `image` scaled into `dst`, like a 9-argument `drawImage`.
    ///
    /// Sampling is bilinear and never reads outside `src`, so a crop never bleeds in pixels from
    /// the discarded margins.
    pub fn draw_image(
        &mut self,
        image: &Bitmap,
        src: Rect,
        dst: Rect,
        opts: DrawOpts<'_>,
    ) -> BoothResult<()> {
        if image.is_empty() {
            return Err(BoothError::decode("cannot draw an empty image"));
        }
        if !is_drawable(src) || !is_drawable(dst) {
            return Ok(());
        }

        if let Some(filter) = opts.filter.filter(|f| !f.is_identity()) {
            let mut layer = Surface::new(self.size)?;
            layer.draw_image(image, src, dst, DrawOpts::mirrored(opts.mirror_x))?;
            filter.apply(&mut layer.data, self.size.width, self.size.height)?;
            return composite::over_in_place(&mut self.data, &layer.data, 1.0);
        }

        let canvas_w = f64::from(self.size.width);
        let dst = if opts.mirror_x {
            Rect::new(canvas_w - dst.x1, dst.y0, canvas_w - dst.x0, dst.y1)
        } else {
            dst
        };
        let Some((x0, y0, x1, y1)) = self.pixel_span(dst) else {
            return Ok(());
        };

        let sampler = Sampler::new(image, src);
        for y in y0..y1 {
            let v = ((f64::from(y) + 0.5) - dst.y0) / dst.height();
            let sy = src.y0 + v * src.height();
            for x in x0..x1 {
                let mut u = ((f64::from(x) + 0.5) - dst.x0) / dst.width();
                if opts.mirror_x {
                    u = 1.0 - u;
                }
                let sx = src.x0 + u * src.width();
                let px = sampler.sample(sx, sy);
                let i = self.index(x, y);
                let out = over(
                    [
                        self.data[i],
                        self.data[i + 1],
                        self.data[i + 2],
                        self.data[i + 3],
                    ],
                    px,
                    1.0,
                );
                self.data[i..i + 4].copy_from_slice(&out);
            }
        }
        Ok(())
    }

    /// Draw the whole image stretched into `dst`.
    pub fn draw_image_fill(
        &mut self,
        image: &Bitmap,
        dst: Rect,
        opts: DrawOpts<'_>,
    ) -> BoothResult<()> {
        let src = Rect::new(0.0, 0.0, f64::from(image.width), f64::from(image.height));
        self.draw_image(image, src, dst, opts)
    }

    /// Copy the pixels under `rect` (rounded to whole pixels) into a new bitmap.
    pub fn copy_region(&self, rect: Rect) -> BoothResult<Bitmap> {
        let (x0, y0, x1, y1) = self
            .pixel_span(rect)
            .ok_or_else(|| BoothError::validation("copy region lies outside the surface"))?;
        let (w, h) = (x1 - x0, y1 - y0);
        let mut out = Vec::with_capacity(byte_len(w, h)?);
        for y in y0..y1 {
            let start = self.index(x0, y);
            out.extend_from_slice(&self.data[start..start + w as usize * 4]);
        }
        Bitmap::from_premul(w, h, out)
    }

    pub fn to_bitmap(&self) -> Bitmap {
        Bitmap {
            width: self.size.width,
            height: self.size.height,
            rgba8_premul: std::sync::Arc::new(self.data.clone()),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * 4
    }

    /// Pixels whose centers fall inside `rect`, clamped to the surface.
    fn pixel_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let clamp_x = |v: f64| (v - 0.5).ceil().clamp(0.0, f64::from(self.size.width)) as u32;
        let clamp_y = |v: f64| (v - 0.5).ceil().clamp(0.0, f64::from(self.size.height)) as u32;
        let (x0, x1) = (clamp_x(rect.x0), clamp_x(rect.x1));
        let (y0, y1) = (clamp_y(rect.y0), clamp_y(rect.y1));
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

fn is_drawable(r: Rect) -> bool {
    r.is_finite() && r.width() > 0.0 && r.height() > 0.0
}

struct Sampler<'a> {
    image: &'a Bitmap,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl<'a> Sampler<'a> {
    fn new(image: &'a Bitmap, src: Rect) -> Self {
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let min_x = src.x0.floor().clamp(0.0, iw - 1.0);
        let min_y = src.y0.floor().clamp(0.0, ih - 1.0);
        Self {
            image,
            min_x,
            max_x: (src.x1.ceil() - 1.0).clamp(min_x, iw - 1.0),
            min_y,
            max_y: (src.y1.ceil() - 1.0).clamp(min_y, ih - 1.0),
        }
    }

    fn sample(&self, sx: f64, sy: f64) -> [u8; 4] {
        let fx = (sx - 0.5).clamp(self.min_x, self.max_x);
        let fy = (sy - 0.5).clamp(self.min_y, self.max_y);
        let (x0, y0) = (fx.floor(), fy.floor());
        let (tx, ty) = (fx - x0, fy - y0);
        let x1 = (x0 + 1.0).min(self.max_x);
        let y1 = (y0 + 1.0).min(self.max_y);

        let p00 = self.texel(x0, y0);
        let p10 = self.texel(x1, y0);
        let p01 = self.texel(x0, y1);
        let p11 = self.texel(x1, y1);
        let mut out = [0u8; 4];
        for c in 0..4 {
            let top = f64::from(p00[c]) * (1.0 - tx) + f64::from(p10[c]) * tx;
            let bottom = f64::from(p01[c]) * (1.0 - tx) + f64::from(p11[c]) * tx;
            out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    fn texel(&self, x: f64, y: f64) -> [u8; 4] {
        let i = (y as usize * self.image.width as usize + x as usize) * 4;
        let d = &self.image.rgba8_premul;
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }
}
