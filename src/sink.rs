//! Destinations for finished images.
//!
//! | Sink | Mode | Behaviour |
//! |---|---|---|
//! | [`FileSink`] | file | writes `{assets_dir}/{name}` via a temp file + rename |
//! | [`MapSink`] | buffer | collects `name → bytes` in a mutex-guarded map |
//!
//! Output names are unique per job, so sinks never see the same name twice
//! within a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Receives finished images. Shared by all workers, hence `Sync`.
pub trait OutputSink: Sync {
    fn deliver(&self, name: &str, bytes: Vec<u8>) -> Result<(), SinkError>;
}

/// Writes each image into a directory that must already exist.
///
/// Bytes go to a hidden `.{name}.tmp` sibling first and are renamed into
/// place, so a reader never observes a half-written PNG.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl OutputSink for FileSink {
    fn deliver(&self, name: &str, bytes: Vec<u8>) -> Result<(), SinkError> {
        let target = self.path_for(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));

        std::fs::write(&tmp, &bytes).map_err(|source| SinkError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &target).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            SinkError::Io {
                path: target.clone(),
                source,
            }
        })
    }
}

/// Collects images in memory, keyed by output name.
#[derive(Debug, Default)]
pub struct MapSink {
    images: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MapSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<u8>> {
        self.images
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputSink for MapSink {
    fn deliver(&self, name: &str, bytes: Vec<u8>) -> Result<(), SinkError> {
        let mut images = self
            .images
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        images.insert(name.to_string(), bytes);
        Ok(())
    }
}
