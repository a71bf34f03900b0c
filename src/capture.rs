//! Capture/Compositor: fills the two strip cells from a live stream or uploads, then stamps the
//! frame overlay and hands the strip off to the editor.

pub mod compositor;
pub mod countdown;
pub mod crop;
pub mod session;

pub use compositor::{Compositor, PreviewTick};
pub use countdown::{Countdown, CountdownStep};
pub use crop::{CropRect, crop_to_fit};
pub use session::{CaptureSession, Stage};
