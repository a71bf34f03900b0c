use kurbo::{Point, Size, Vec2};

use crate::foundation::{
    core::CanvasSize,
    error::{BoothError, BoothResult},
};

/// Where and how large the canvas is displayed, for mapping pointer positions back to logical
/// canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    logical: CanvasSize,
    /// Top-left of the displayed canvas in client coordinates.
    origin: Point,
    /// Displayed (layout) size.
    display: Size,
}

impl Viewport {
    /// Canvas displayed at its logical size at the client origin.
    pub fn identity(logical: CanvasSize) -> Self {
        Self {
            logical,
            origin: Point::ZERO,
            display: Size::new(f64::from(logical.width), f64::from(logical.height)),
        }
    }

    pub fn new(logical: CanvasSize, origin: Point, display: Size) -> BoothResult<Self> {
        if !display.is_finite() || display.width <= 0.0 || display.height <= 0.0 {
            return Err(BoothError::validation(
                "displayed canvas size must be finite and > 0",
            ));
        }
        if !origin.is_finite() {
            return Err(BoothError::validation("canvas origin must be finite"));
        }
        Ok(Self {
            logical,
            origin,
            display,
        })
    }

    pub fn scale(&self) -> Vec2 {
        Vec2::new(
            f64::from(self.logical.width) / self.display.width,
            f64::from(self.logical.height) / self.display.height,
        )
    }

    /// Client-space pointer position to logical canvas coordinates.
    pub fn to_logical(&self, client: Point) -> Point {
        let s = self.scale();
        Point::new(
            (client.x - self.origin.x) * s.x,
            (client.y - self.origin.y) * s.y,
        )
    }
}

/// The sticker being dragged, if any.
///
/// The offset between pointer and sticker origin is fixed at pointer-down and reused for every
/// move until the pointer is released.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragState {
    selected: Option<usize>,
    offset: Vec2,
}

impl DragState {
    pub fn begin(&mut self, index: usize, pointer: Point, sticker_origin: Point) {
        self.selected = Some(index);
        self.offset = pointer - sticker_origin;
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        self.selected.is_some()
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Origin the dragged sticker should move to for a pointer at `pointer`.
    pub fn target_origin(&self, pointer: Point) -> Point {
        pointer - self.offset
    }

    pub fn end(&mut self) {
        self.selected = None;
        self.offset = Vec2::ZERO;
    }
}
