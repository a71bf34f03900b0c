//! Booth theme and layout configuration.
//!
//! A single parameterized theme replaces per-skin copies of the capture and editor pages: asset
//! paths, sticker families and their cycling variants all live here.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::{
    assets::store::normalize_rel_path,
    export::ExportFormat,
    foundation::{
        core::CanvasSize,
        error::{BoothError, BoothResult},
    },
    handoff::DEFAULT_KEY,
};

/// Whether each capture path draws its frames horizontally flipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MirrorPolicy {
    /// Live camera frames, mirrored so the preview behaves like a mirror.
    pub live: bool,
    /// Uploaded stills.
    pub upload: bool,
}

impl Default for MirrorPolicy {
    fn default() -> Self {
        Self {
            live: true,
            upload: true,
        }
    }
}

/// Placement constants for newly added stickers.
///
/// A sticker is drawn at `native / scale_down` and its origin is offset from the canvas center by
/// `native / center_divisor`, which leaves it up and to the left of true center.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StickerLayout {
    pub scale_down: f64,
    pub center_divisor: f64,
}

impl Default for StickerLayout {
    fn default() -> Self {
        Self {
            scale_down: 2.5,
            center_divisor: 6.0,
        }
    }
}

/// A sticker button: every press adds the next variant, round-robin.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StickerFamily {
    pub name: String,
    pub variants: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub capture_filename: String,
    pub editor_filename: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            capture_filename: "photo-strip.png".to_string(),
            editor_filename: "photobooth.png".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    pub canvas: CanvasSize,
    /// Overlay stamped over the finished strip, relative to the asset root.
    pub frame_asset: String,
    pub mirror: MirrorPolicy,
    pub sticker_layout: StickerLayout,
    pub sticker_families: Vec<StickerFamily>,
    /// Countdown length in one-second ticks.
    pub countdown_ticks: u32,
    /// Filter applied to the live preview, CSS syntax.
    pub preview_filter: Option<String>,
    pub handoff_key: String,
    pub export: ExportSettings,
}

impl Default for BoothConfig {
    fn default() -> Self {
        let family = |n: u32| StickerFamily {
            name: format!("sticker{n}"),
            variants: vec![
                format!("stickers/sticker{n}.png"),
                format!("stickers/sticker{n}.png"),
            ],
        };
        Self {
            canvas: CanvasSize::default(),
            frame_asset: "stickers/frame.png".to_string(),
            mirror: MirrorPolicy::default(),
            sticker_layout: StickerLayout::default(),
            sticker_families: vec![family(1), family(2)],
            countdown_ticks: 3,
            preview_filter: None,
            handoff_key: DEFAULT_KEY.to_string(),
            export: ExportSettings::default(),
        }
    }
}

impl BoothConfig {
    pub fn load(path: &Path) -> BoothResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> BoothResult<()> {
        self.canvas.validate()?;
        normalize_rel_path(&self.frame_asset)?;

        let l = self.sticker_layout;
        if !l.scale_down.is_finite() || l.scale_down <= 0.0 {
            return Err(BoothError::validation("sticker scale_down must be finite and > 0"));
        }
        if !l.center_divisor.is_finite() || l.center_divisor <= 0.0 {
            return Err(BoothError::validation(
                "sticker center_divisor must be finite and > 0",
            ));
        }
        if self.countdown_ticks == 0 {
            return Err(BoothError::validation("countdown_ticks must be > 0"));
        }
        if self.handoff_key.trim().is_empty() {
            return Err(BoothError::validation("handoff_key must be non-empty"));
        }
        if let Some(f) = &self.preview_filter {
            crate::filter::FilterChain::parse(f)?;
        }

        let mut seen = std::collections::BTreeSet::new();
        for fam in &self.sticker_families {
            if fam.name.trim().is_empty() {
                return Err(BoothError::validation("sticker family name must be non-empty"));
            }
            if !seen.insert(fam.name.as_str()) {
                return Err(BoothError::validation(format!(
                    "duplicate sticker family '{}'",
                    fam.name
                )));
            }
            if fam.variants.is_empty() {
                return Err(BoothError::validation(format!(
                    "sticker family '{}' has no variants",
                    fam.name
                )));
            }
            for v in &fam.variants {
                normalize_rel_path(v)?;
            }
        }
        Ok(())
    }

    pub fn family(&self, name: &str) -> Option<&StickerFamily> {
        self.sticker_families.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_match_booth_constants() {
        let c = BoothConfig::default();
        c.validate().unwrap();
        assert_eq!((c.canvas.width, c.canvas.height), (1176, 1470));
        assert_eq!(c.countdown_ticks, 3);
        assert_eq!(c.sticker_layout.scale_down, 2.5);
        assert_eq!(c.sticker_layout.center_divisor, 6.0);
        assert_eq!(c.handoff_key, "photoStrip");
        assert!(c.family("sticker2").is_some());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: BoothConfig = serde_json::from_value(serde_json::json!({
            "frame_asset": "theme/frame.svg",
            "mirror": { "upload": false },
            "sticker_families": [{ "name": "hearts", "variants": ["h1.png", "h2.png"] }]
        }))
        .unwrap();
        c.validate().unwrap();
        assert!(c.mirror.live);
        assert!(!c.mirror.upload);
        assert_eq!(c.canvas, CanvasSize::default());
        assert_eq!(c.family("hearts").unwrap().variants.len(), 2);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut c = BoothConfig::default();
        c.sticker_families[1].name = "sticker1".to_string();
        assert!(c.validate().is_err());

        let mut c = BoothConfig::default();
        c.sticker_families[0].variants.clear();
        assert!(c.validate().is_err());

        let mut c = BoothConfig::default();
        c.frame_asset = "../frame.png".to_string();
        assert!(c.validate().is_err());

        let mut c = BoothConfig::default();
        c.preview_filter = Some("nope(1)".to_string());
        assert!(c.validate().is_err());
    }
}
