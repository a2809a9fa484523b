//! Traits directory scanning and job-list loading.
//!
//! ## Directory Structure
//!
//! One directory per layer, one file per trait value:
//!
//! ```text
//! traits/
//! ├── background/
//! │   ├── red.png
//! │   └── blue.png
//! ├── body/
//! │   └── circle.png
//! └── eyes/
//!     ├── open.png
//!     └── closed.png
//! ```
//!
//! Only layers named in the config's `order` are scanned. Hidden files
//! (leading `.`) and subdirectories are ignored.
//!
//! ## Pre-flight
//!
//! [`TraitCatalog::missing_traits`] cross-checks a job list against the
//! catalog so broken references can be reported before any image is
//! composited. [`TraitCatalog::to_source_table`] preloads every trait into
//! memory for buffer-mode runs.

use crate::imaging::source::{LayerSource, SourceTable};
use crate::types::ImageDescriptor;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Layer directory not found: {0}")]
    MissingLayer(PathBuf),
}

/// Trait values available on disk, per layer.
#[derive(Debug, Clone)]
pub struct TraitCatalog {
    root: PathBuf,
    order: Vec<String>,
    layers: BTreeMap<String, BTreeSet<String>>,
}

/// A job-list reference with nothing on disk behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTrait {
    pub id: u32,
    pub layer: String,
    /// `None` when the descriptor selects no value for the layer at all.
    pub value: Option<String>,
}

impl TraitCatalog {
    /// List the trait files of every layer in `order`.
    pub fn scan(traits_dir: &Path, order: &[String]) -> Result<Self, ScanError> {
        let mut layers = BTreeMap::new();
        for layer in order {
            let dir = traits_dir.join(layer);
            if !dir.is_dir() {
                return Err(ScanError::MissingLayer(dir));
            }
            layers.insert(layer.clone(), list_values(&dir)?);
        }
        tracing::debug!(
            root = %traits_dir.display(),
            layers = layers.len(),
            "scanned traits directory"
        );
        Ok(Self {
            root: traits_dir.to_path_buf(),
            order: order.to_vec(),
            layers,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Layers in draw order with their available values.
    pub fn layers(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.order
            .iter()
            .filter_map(|layer| self.layers.get(layer).map(|values| (layer.as_str(), values)))
    }

    pub fn values(&self, layer: &str) -> Option<&BTreeSet<String>> {
        self.layers.get(layer)
    }

    pub fn contains(&self, layer: &str, value: &str) -> bool {
        self.layers
            .get(layer)
            .is_some_and(|values| values.contains(value))
    }

    pub fn trait_count(&self) -> usize {
        self.layers.values().map(BTreeSet::len).sum()
    }

    /// Every reference in `descriptors` that would fail to load.
    pub fn missing_traits(&self, descriptors: &[ImageDescriptor]) -> Vec<MissingTrait> {
        let mut missing = Vec::new();
        for descriptor in descriptors {
            for layer in &self.order {
                match descriptor.trait_value(layer) {
                    Some(value) if self.contains(layer, value) => {}
                    value => missing.push(MissingTrait {
                        id: descriptor.id,
                        layer: layer.clone(),
                        value: value.map(str::to_string),
                    }),
                }
            }
        }
        missing
    }

    /// Read every trait into memory.
    pub fn to_source_table(&self) -> Result<SourceTable, ScanError> {
        let mut table = SourceTable::new();
        for (layer, values) in &self.layers {
            for value in values {
                let bytes = fs::read(self.root.join(layer).join(value))?;
                table.insert(layer.clone(), value.clone(), LayerSource::from_bytes(bytes));
            }
        }
        Ok(table)
    }
}

fn list_values(dir: &Path) -> Result<BTreeSet<String>, ScanError> {
    let mut values = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        values.insert(name.into_owned());
    }
    Ok(values)
}

/// Load a job list: a JSON array of flat descriptor records.
pub fn load_descriptors(path: &Path) -> Result<Vec<ImageDescriptor>, ScanError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
