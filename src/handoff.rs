//! Single-slot transient store that carries the finished strip from capture to the editor.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use base64::Engine as _;

use crate::{
    assets::decode::decode_image,
    export::{ExportFormat, encode_bitmap},
    foundation::error::{BoothError, BoothResult},
    raster::Bitmap,
};

/// Slot name used by the booth pages.
pub const DEFAULT_KEY: &str = "photoStrip";

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// At most one pending payload: `take` hands it out once and empties the slot.
pub trait HandoffStore {
    fn put(&mut self, value: String) -> BoothResult<()>;
    fn take(&mut self) -> BoothResult<Option<String>>;
    fn clear(&mut self) -> BoothResult<()>;
}

impl<T: HandoffStore + ?Sized> HandoffStore for &mut T {
    fn put(&mut self, value: String) -> BoothResult<()> {
        (**self).put(value)
    }

    fn take(&mut self) -> BoothResult<Option<String>> {
        (**self).take()
    }

    fn clear(&mut self) -> BoothResult<()> {
        (**self).clear()
    }
}

#[derive(Debug, Default)]
pub struct MemoryHandoff {
    slot: Option<String>,
}

impl MemoryHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

impl HandoffStore for MemoryHandoff {
    fn put(&mut self, value: String) -> BoothResult<()> {
        self.slot = Some(value);
        Ok(())
    }

    fn take(&mut self) -> BoothResult<Option<String>> {
        Ok(self.slot.take())
    }

    fn clear(&mut self) -> BoothResult<()> {
        self.slot = None;
        Ok(())
    }
}

/// File-backed slot so that separate processes (capture, then decorate) can hand off.
#[derive(Clone, Debug)]
pub struct FileHandoff {
    path: PathBuf,
}

impl FileHandoff {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> BoothResult<Self> {
        if key.is_empty() || key.contains(&['/', '\\'][..]) || key == "." || key == ".." {
            return Err(BoothError::validation(format!("invalid handoff key '{key}'")));
        }
        Ok(Self {
            path: dir.as_ref().join(key),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HandoffStore for FileHandoff {
    fn put(&mut self, value: String) -> BoothResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create handoff dir '{}'", parent.display()))?;
        }
        std::fs::write(&self.path, value)
            .with_context(|| format!("write handoff '{}'", self.path.display()))?;
        Ok(())
    }

    fn take(&mut self) -> BoothResult<Option<String>> {
        let value = match std::fs::read_to_string(&self.path) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read handoff '{}'", self.path.display()))
                    .into());
            }
        };
        self.clear()?;
        Ok(Some(value))
    }

    fn clear(&mut self) -> BoothResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove handoff '{}'", self.path.display()))
                .into()),
        }
    }
}

/// Serialize a bitmap as a self-contained PNG data URL.
pub fn encode_data_url(bitmap: &Bitmap) -> BoothResult<String> {
    let png = encode_bitmap(bitmap, ExportFormat::Png)?;
    let mut out = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
    out.push_str(PNG_DATA_URL_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(&png, &mut out);
    Ok(out)
}

/// Decode any `data:<mime>;base64,<payload>` image URL.
pub fn decode_data_url(url: &str) -> BoothResult<Bitmap> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| BoothError::decode("handoff payload is not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| BoothError::decode("data URL has no payload"))?;
    if !meta.ends_with(";base64") {
        return Err(BoothError::decode("data URL payload must be base64"));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| BoothError::decode(format!("invalid base64 payload: {e}")))?;
    decode_image(&bytes)
}
