use crate::foundation::error::{BoothError, BoothResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Fixed logical drawing resolution of the booth canvas.
///
/// Every drawing operation targets this size regardless of how large the canvas is displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1176,
            height: 1470,
        }
    }
}

impl CanvasSize {
    /// Create a validated canvas size. The height must split into two equal cells.
    pub fn new(width: u32, height: u32) -> BoothResult<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(&self) -> BoothResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BoothError::validation("canvas width/height must be > 0"));
        }
        if !self.height.is_multiple_of(2) {
            return Err(BoothError::validation(
                "canvas height must be even so the strip splits into two equal cells",
            ));
        }
        Ok(())
    }

    /// Height of one strip cell (`HALF`).
    pub fn half(self) -> u32 {
        self.height / 2
    }

    pub fn full_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Destination rectangle of a strip cell in logical coordinates.
    pub fn cell_rect(self, cell: Cell) -> Rect {
        let y0 = f64::from(cell.y_offset(self));
        Rect::new(0.0, y0, f64::from(self.width), y0 + f64::from(self.half()))
    }

    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// One half of the photo strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Top,
    Bottom,
}

impl Cell {
    pub const ALL: [Cell; 2] = [Cell::Top, Cell::Bottom];

    pub fn index(self) -> usize {
        match self {
            Cell::Top => 0,
            Cell::Bottom => 1,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Cell::Top),
            1 => Some(Cell::Bottom),
            _ => None,
        }
    }

    pub fn y_offset(self, canvas: CanvasSize) -> u32 {
        match self {
            Cell::Top => 0,
            Cell::Bottom => canvas.half(),
        }
    }
}
