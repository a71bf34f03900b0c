//! Scripted editor sessions: a JSON list of user actions replayed against a [`StickerEditor`].
//!
//! ```json
//! { "viewport": { "width": 588, "height": 735 },
//!   "actions": [
//!     { "action": "add_sticker", "family": "sticker1" },
//!     { "action": "pointer_down", "x": 294, "y": 367 },
//!     { "action": "pointer_move", "x": 100, "y": 80 },
//!     { "action": "pointer_up" }
//!   ] }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use kurbo::{Point, Size};

use crate::{
    editor::{StickerEditor, Viewport},
    foundation::error::BoothResult,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    AddSticker { family: String },
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    Reset,
    Remove { index: usize },
    Filter { value: String },
}

/// Displayed canvas geometry the pointer coordinates refer to.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DisplayRect {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditorScript {
    #[serde(default)]
    pub viewport: Option<DisplayRect>,
    pub actions: Vec<EditorAction>,
}

impl EditorScript {
    pub fn load(path: &Path) -> BoothResult<Self> {
        let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
        let script = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse script '{}'", path.display()))?;
        Ok(script)
    }

    /// Replay every action in order, stopping at the first failure.
    pub fn apply(&self, editor: &mut StickerEditor) -> BoothResult<()> {
        if let Some(d) = self.viewport {
            editor.set_viewport(Viewport::new(
                editor.canvas(),
                Point::new(d.left, d.top),
                Size::new(d.width, d.height),
            )?);
        }
        for (i, action) in self.actions.iter().enumerate() {
            tracing::debug!(step = i, ?action, "replay");
            match action {
                EditorAction::AddSticker { family } => {
                    editor.add_sticker(family)?;
                }
                EditorAction::PointerDown { x, y } => {
                    editor.on_pointer_down(Point::new(*x, *y))?;
                }
                EditorAction::PointerMove { x, y } => {
                    editor.on_pointer_move(Point::new(*x, *y))?;
                }
                EditorAction::PointerUp => editor.on_pointer_up(),
                EditorAction::Reset => editor.reset()?,
                EditorAction::Remove { index } => {
                    editor.remove_sticker(*index)?;
                }
                EditorAction::Filter { value } => editor.set_background_filter(value)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_actions() {
        let s: EditorScript = serde_json::from_value(serde_json::json!({
            "viewport": { "width": 588, "height": 735 },
            "actions": [
                { "action": "add_sticker", "family": "sticker1" },
                { "action": "pointer_down", "x": 1, "y": 2 },
                { "action": "pointer_up" },
                { "action": "filter", "value": "sepia(1)" }
            ]
        }))
        .unwrap();
        assert_eq!(s.actions.len(), 4);
        assert_eq!(s.viewport.unwrap().left, 0.0);
        assert_eq!(
            s.actions[1],
            EditorAction::PointerDown { x: 1.0, y: 2.0 }
        );
    }
}
