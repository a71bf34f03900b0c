//! Frame sources for the capture stage.

pub mod ffmpeg;
pub mod raw;
pub mod source;

pub use ffmpeg::{DEFAULT_DEVICE, acquire_live_stream};
pub use raw::RawVideoSource;
pub use source::{Constraints, LiveSource, StillSource};
