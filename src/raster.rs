//! In-memory drawing surface standing in for a browser 2D canvas.

pub mod bitmap;
pub mod blur;
pub mod composite;
pub mod surface;

pub use bitmap::Bitmap;
pub use surface::{DrawOpts, Surface};
