use crate::{foundation::error::BoothResult, raster::Bitmap};

/// Requested capture format. Sources treat these as ideals, not guarantees.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Constraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// Prefer the user-facing camera. Picks the device when the default device is requested.
    pub facing_user: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            ideal_width: 2560,
            ideal_height: 1440,
            facing_user: true,
        }
    }
}

/// A live video stream. Frame dimensions may change between frames and are read per call.
pub trait LiveSource {
    /// Latest frame, or `None` once the stream has ended.
    fn current_frame(&mut self) -> BoothResult<Option<Bitmap>>;

    /// Human-readable name for logs.
    fn describe(&self) -> String {
        "live source".to_string()
    }
}

/// Replays a fixed frame, optionally ending after a number of frames.
#[derive(Clone, Debug)]
pub struct StillSource {
    frame: Bitmap,
    remaining: Option<u64>,
}

impl StillSource {
    pub fn new(frame: Bitmap) -> Self {
        Self {
            frame,
            remaining: None,
        }
    }

    pub fn with_limit(frame: Bitmap, frames: u64) -> Self {
        Self {
            frame,
            remaining: Some(frames),
        }
    }
}

impl LiveSource for StillSource {
    fn current_frame(&mut self) -> BoothResult<Option<Bitmap>> {
        match &mut self.remaining {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.frame.clone()))
            }
            None => Ok(Some(self.frame.clone())),
        }
    }

    fn describe(&self) -> String {
        format!("still {}x{}", self.frame.width, self.frame.height)
    }
}
