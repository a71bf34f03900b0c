use crate::{
    foundation::{
        core::Cell,
        error::{BoothError, BoothResult},
    },
    raster::Bitmap,
};

/// Which cell is being filled. Only moves forward, except on [`CaptureSession::reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Top,
    Bottom,
    Done,
}

impl Stage {
    pub fn active_cell(self) -> Option<Cell> {
        match self {
            Stage::Top => Some(Cell::Top),
            Stage::Bottom => Some(Cell::Bottom),
            Stage::Done => None,
        }
    }

    fn next(self) -> Self {
        match self {
            Stage::Top => Stage::Bottom,
            Stage::Bottom | Stage::Done => Stage::Done,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CaptureSession {
    stage: Stage,
    captured: Vec<Bitmap>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            stage: Stage::Top,
            captured: Vec::with_capacity(2),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn active_cell(&self) -> Option<Cell> {
        self.stage.active_cell()
    }

    /// Captured cells in capture order (top first).
    pub fn captured(&self) -> &[Bitmap] {
        &self.captured
    }

    /// Store the bitmap for the active cell and advance.
    ///
    /// Once both cells are filled further captures fail with [`BoothError::OverCapture`] and the
    /// session is left untouched.
    pub fn record(&mut self, cell: Bitmap) -> BoothResult<Stage> {
        if self.is_done() {
            return Err(BoothError::OverCapture);
        }
        self.captured.push(cell);
        let from = self.stage;
        self.stage = self.stage.next();
        tracing::debug!(?from, to = ?self.stage, "capture stage advanced");
        Ok(self.stage)
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Top;
        self.captured.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px() -> Bitmap {
        Bitmap::solid(1, 1, [0, 0, 0, 255])
    }

    #[test]
    fn stage_advances_top_bottom_done() {
        let mut s = CaptureSession::new();
        assert_eq!(s.active_cell(), Some(Cell::Top));
        assert_eq!(s.record(px()).unwrap(), Stage::Bottom);
        assert_eq!(s.active_cell(), Some(Cell::Bottom));
        assert_eq!(s.record(px()).unwrap(), Stage::Done);
        assert_eq!(s.active_cell(), None);
        assert_eq!(s.captured().len(), 2);
    }

    #[test]
    fn third_capture_is_rejected_without_change() {
        let mut s = CaptureSession::new();
        s.record(px()).unwrap();
        s.record(px()).unwrap();
        assert!(matches!(s.record(px()), Err(BoothError::OverCapture)));
        assert_eq!(s.captured().len(), 2);
        assert_eq!(s.stage(), Stage::Done);
    }

    #[test]
    fn reset_is_the_only_way_back() {
        let mut s = CaptureSession::new();
        s.record(px()).unwrap();
        s.reset();
        assert_eq!(s.stage(), Stage::Top);
        assert!(s.captured().is_empty());
    }
}
