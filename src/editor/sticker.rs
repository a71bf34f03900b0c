use kurbo::{Point, Rect};

use crate::{config::StickerLayout, foundation::core::CanvasSize, raster::Bitmap};

/// A decorative overlay on the strip. Paint order is its position in the [`StickerStack`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sticker {
    pub image: Bitmap,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Sticker {
    /// Default placement for a freshly added sticker.
    ///
    /// Size is the native size divided by `scale_down`; the origin is the canvas center minus the
    /// native size divided by `center_divisor`. The two divisors differ, so the sticker does not
    /// sit exactly on center.
    pub fn placed(image: Bitmap, canvas: CanvasSize, layout: StickerLayout) -> Self {
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let c = canvas.center();
        Self {
            x: c.x - iw / layout.center_divisor,
            y: c.y - ih / layout.center_divisor,
            width: iw / layout.scale_down,
            height: ih / layout.scale_down,
            image,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Edge-inclusive bounding-box containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Stickers in paint order: the last entry is drawn last and hit-tested first.
#[derive(Clone, Debug, Default)]
pub struct StickerStack {
    items: Vec<Sticker>,
}

impl StickerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sticker> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Sticker> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sticker> {
        self.items.get_mut(index)
    }

    pub fn top(&self) -> Option<&Sticker> {
        self.items.last()
    }

    /// Append on top and return the new index.
    pub fn push(&mut self, sticker: Sticker) -> usize {
        self.items.push(sticker);
        self.items.len() - 1
    }

    /// Index of the topmost sticker containing `p`.
    pub fn hit_test(&self, p: Point) -> Option<usize> {
        self.items.iter().rposition(|s| s.contains(p))
    }

    /// Move the sticker at `index` to the top and return its new index.
    pub fn bring_to_front(&mut self, index: usize) -> Option<usize> {
        if index >= self.items.len() {
            return None;
        }
        let s = self.items.remove(index);
        Some(self.push(s))
    }

    pub fn remove(&mut self, index: usize) -> Option<Sticker> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a StickerStack {
    type Item = &'a Sticker;
    type IntoIter = std::slice::Iter<'a, Sticker>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sticker_at(x: f64, y: f64, side: f64) -> Sticker {
        Sticker {
            image: Bitmap::solid(1, 1, [0, 0, 0, 255]),
            x,
            y,
            width: side,
            height: side,
        }
    }

    #[test]
    fn placement_of_100px_sticker() {
        let canvas = CanvasSize::default();
        let s = Sticker::placed(
            Bitmap::solid(100, 100, [0, 0, 0, 255]),
            canvas,
            StickerLayout::default(),
        );
        assert_eq!(s.x, 1176.0 / 2.0 - 100.0 / 6.0);
        assert_eq!(s.y, 1470.0 / 2.0 - 100.0 / 6.0);
        assert_eq!(s.width, 40.0);
        assert_eq!(s.height, 40.0);
    }

    #[test]
    fn containment_includes_edges() {
        let s = sticker_at(10.0, 10.0, 5.0);
        assert!(s.contains(Point::new(10.0, 10.0)));
        assert!(s.contains(Point::new(15.0, 15.0)));
        assert!(!s.contains(Point::new(15.01, 12.0)));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut stack = StickerStack::new();
        stack.push(sticker_at(0.0, 0.0, 10.0));
        stack.push(sticker_at(5.0, 5.0, 10.0));
        assert_eq!(stack.hit_test(Point::new(7.0, 7.0)), Some(1));
        assert_eq!(stack.hit_test(Point::new(1.0, 1.0)), Some(0));
        assert_eq!(stack.hit_test(Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn bring_to_front_moves_to_end() {
        let mut stack = StickerStack::new();
        stack.push(sticker_at(0.0, 0.0, 1.0));
        stack.push(sticker_at(1.0, 0.0, 1.0));
        stack.push(sticker_at(2.0, 0.0, 1.0));
        assert_eq!(stack.bring_to_front(0), Some(2));
        let xs: Vec<f64> = stack.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 0.0]);
        assert_eq!(stack.bring_to_front(3), None);
    }

    #[test]
    fn remove_and_clear() {
        let mut stack = StickerStack::new();
        stack.push(sticker_at(0.0, 0.0, 1.0));
        stack.push(sticker_at(1.0, 0.0, 1.0));
        assert_eq!(stack.remove(0).unwrap().x, 0.0);
        assert!(stack.remove(5).is_none());
        stack.clear();
        assert!(stack.is_empty());
    }
}
