use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    assets::decode::decode_image,
    foundation::error::{BoothError, BoothResult},
    raster::Bitmap,
};

/// Decoded-image cache keyed by normalized asset path.
///
/// A cached asset resolves immediately; anything else is read from disk under `root` and decoded
/// before the caller sees it, so no caller ever holds an undecoded image.
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    cache: HashMap<String, Bitmap>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_cached(&self, source: &str) -> bool {
        normalize_rel_path(source)
            .map(|key| self.cache.contains_key(&key))
            .unwrap_or(false)
    }

    /// Register an already-decoded image under `source`.
    pub fn insert(&mut self, source: &str, bitmap: Bitmap) -> BoothResult<()> {
        let key = normalize_rel_path(source)?;
        self.cache.insert(key, bitmap);
        Ok(())
    }

    pub fn load(&mut self, source: &str) -> BoothResult<Bitmap> {
        let key = normalize_rel_path(source)?;
        if let Some(b) = self.cache.get(&key) {
            return Ok(b.clone());
        }

        let path = self.root.join(&key);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read asset '{}'", path.display()))
            .map_err(|e| BoothError::decode(format!("{e:#}")))?;
        let bitmap = decode_image(&bytes)?;
        tracing::debug!(asset = %key, width = bitmap.width, height = bitmap.height, "decoded asset");
        self.cache.insert(key, bitmap.clone());
        Ok(bitmap)
    }
}

/// Normalize and validate asset-root-relative paths.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or parent
/// traversals (`..`).
pub fn normalize_rel_path(source: &str) -> BoothResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(BoothError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(BoothError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(BoothError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(BoothError::validation("asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_cross_platform() {
        assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_rel_path("./a\\b.png").unwrap(), "a/b.png");
        assert!(normalize_rel_path("../x.png").is_err());
        assert!(normalize_rel_path("/abs.png").is_err());
        assert!(normalize_rel_path("./").is_err());
    }

    #[test]
    fn inserted_assets_resolve_without_io() {
        let mut store = AssetStore::new("/nonexistent-root");
        store
            .insert("stickers/star.png", Bitmap::solid(2, 2, [1, 2, 3, 255]))
            .unwrap();
        assert!(store.is_cached("./stickers/star.png"));
        assert_eq!(store.load("stickers/star.png").unwrap().width, 2);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let mut store = AssetStore::new("/nonexistent-root");
        let err = store.load("frame.png").unwrap_err();
        assert!(matches!(err, BoothError::Decode(_)));
        assert!(!store.is_cached("frame.png"));
    }
}
