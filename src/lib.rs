//! Photobooth strip compositing and sticker editing.
//!
//! Two stages share one bitmap handoff:
//!
//! - [`Compositor`] fills the two cells of a fixed-size strip from a live stream or uploaded
//!   stills (aspect-preserving center crop, optional mirroring), stamps a frame overlay and puts
//!   the strip into a [`HandoffStore`].
//! - [`StickerEditor`] takes the strip back out, draws it as a background layer and manages a
//!   paint-ordered stack of draggable stickers on top.
#![forbid(unsafe_code)]

pub mod assets;
pub mod capture;
pub mod config;
pub mod editor;
pub mod export;
pub mod filter;
mod foundation;
pub mod handoff;
pub mod media;
pub mod nav;
pub mod raster;
pub mod script;

pub use crate::foundation::core::{CanvasSize, Cell, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{BoothError, BoothResult};

pub use crate::assets::{AssetStore, decode_image};
pub use crate::capture::{
    CaptureSession, Compositor, Countdown, CountdownStep, CropRect, PreviewTick, Stage,
    crop_to_fit,
};
pub use crate::config::{BoothConfig, MirrorPolicy, StickerFamily, StickerLayout};
pub use crate::editor::{DragState, Sticker, StickerEditor, StickerStack, Viewport};
pub use crate::export::{ExportFormat, encode_bitmap, encode_surface};
pub use crate::filter::{FilterChain, FilterOp};
pub use crate::handoff::{
    FileHandoff, HandoffStore, MemoryHandoff, decode_data_url, encode_data_url,
};
pub use crate::media::{
    Constraints, LiveSource, RawVideoSource, StillSource, acquire_live_stream,
};
pub use crate::nav::{LogNavigator, Navigator, Page, RecordingNavigator};
pub use crate::raster::{Bitmap, DrawOpts, Surface};
pub use crate::script::{EditorAction, EditorScript};
