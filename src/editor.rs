//! Sticker Canvas Editor: the finished strip as a background layer with draggable stickers on
//! top.

pub mod canvas;
pub mod pointer;
pub mod sticker;

pub use canvas::StickerEditor;
pub use pointer::{DragState, Viewport};
pub use sticker::{Sticker, StickerStack};
