//! Resolving `(layer, trait value)` pairs to loadable image sources.
//!
//! File mode resolves against a traits directory laid out as
//! `{traits_dir}/{layer}/{value}`. Buffer mode resolves through a
//! caller-supplied [`SourceTable`], where each entry is either a path or
//! bytes already held in memory.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A loadable image: a file on disk or an encoded image held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl LayerSource {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Short human-readable label for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for LayerSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Maps a layer's selected trait value to something the backend can decode.
///
/// Returns `None` when the value is unknown to the resolver. Resolvers are
/// shared by every worker, hence `Sync`.
pub trait SourceResolver: Sync {
    fn resolve(&self, layer: &str, value: &str) -> Option<LayerSource>;
}

/// True when `name` is a single ordinary path component: not empty, not `.`
/// or `..`, no separators, no root or drive prefix.
pub fn is_plain_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

/// File-mode resolver: `{root}/{layer}/{value}`.
///
/// Resolution never touches the filesystem; a missing file surfaces later as
/// a load error from the backend. Layers and values that are not plain names
/// do not resolve, so nothing outside `root` is ever addressed.
#[derive(Debug, Clone)]
pub struct TraitsDir {
    root: PathBuf,
}

impl TraitsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, layer: &str, value: &str) -> Option<PathBuf> {
        if !is_plain_name(layer) || !is_plain_name(value) {
            return None;
        }
        Some(self.root.join(layer).join(value))
    }
}

impl SourceResolver for TraitsDir {
    fn resolve(&self, layer: &str, value: &str) -> Option<LayerSource> {
        self.path_for(layer, value).map(LayerSource::Path)
    }
}

/// Buffer-mode resolver: layer → trait value → source.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    layers: BTreeMap<String, BTreeMap<String, LayerSource>>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        layer: impl Into<String>,
        value: impl Into<String>,
        source: LayerSource,
    ) -> Option<LayerSource> {
        self.layers
            .entry(layer.into())
            .or_default()
            .insert(value.into(), source)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(
        mut self,
        layer: impl Into<String>,
        value: impl Into<String>,
        source: LayerSource,
    ) -> Self {
        self.insert(layer, value, source);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SourceResolver for SourceTable {
    fn resolve(&self, layer: &str, value: &str) -> Option<LayerSource> {
        self.layers.get(layer)?.get(value).cloned()
    }
}
