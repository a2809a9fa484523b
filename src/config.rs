//! Generation configuration.
//!
//! A config file describes the artwork being assembled: the layer stacking
//! order and the output size. Two optional sections tune the compression pass
//! and the worker pool.
//!
//! ## Config File Formats
//!
//! Both JSON (the format upstream generators already write) and TOML are
//! accepted; the format is chosen by file extension (`.toml` → TOML,
//! anything else → JSON).
//!
//! ```toml
//! order = ["background", "body", "eyes"]  # bottom → top
//! width = 1000
//! height = 1000
//!
//! [compression]
//! quality = [0.6, 0.95]    # pngquant-style min/max window (0.0-1.0)
//! speed = 4                # 1 = slowest/best, 10 = fastest
//!
//! [processing]
//! max_workers = 4          # omit for auto = available parallelism
//! ```
//!
//! Unknown top-level keys are ignored: generator configs typically carry
//! unrelated metadata (names, creators, rarity tables) alongside `order`,
//! `width` and `height`. Unknown keys inside `[compression]` and
//! `[processing]` are rejected to catch typos early.

use crate::imaging::canvas::MAX_DIMENSION;
use crate::imaging::params::{CompressionParams, QualityRange, Speed};
use crate::imaging::source::is_plain_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Artwork configuration.
///
/// Read once at the start of a run; every worker shares the same layer order
/// and canvas size.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtConfig {
    /// Layer names, bottom to top.
    pub order: Vec<String>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Lossy PNG compression settings.
    pub compression: CompressionConfig,
    /// Worker pool settings.
    pub processing: ProcessingConfig,
}

impl ArtConfig {
    pub fn new(order: impl IntoIterator<Item = impl Into<String>>, width: u32, height: u32) -> Self {
        Self {
            order: order.into_iter().map(Into::into).collect(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Validate config values before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(format!(
                "width and height must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ConfigError::Validation(format!(
                "width and height must be at most {MAX_DIMENSION}, got {}x{}",
                self.width, self.height
            )));
        }
        if self.order.is_empty() {
            return Err(ConfigError::Validation("order must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for layer in &self.order {
            if !is_plain_name(layer) {
                return Err(ConfigError::Validation(format!(
                    "invalid layer name '{layer}' in order"
                )));
            }
            if !seen.insert(layer.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "layer '{layer}' appears more than once in order"
                )));
            }
        }
        if self.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn compression_params(&self) -> CompressionParams {
        CompressionParams {
            quality: self.compression.quality,
            speed: self.compression.speed,
        }
    }
}

/// Lossy PNG compression settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Acceptable quality window `[min, max]`.
    pub quality: QualityRange,
    /// Quantizer speed, 1-10.
    pub speed: Speed,
}

/// Worker pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of concurrent workers.
    /// When absent, defaults to the available parallelism of the host.
    pub max_workers: Option<usize>,
}

pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Parse config text; `toml` selects the TOML parser, otherwise JSON.
pub fn parse_config(content: &str, toml: bool) -> Result<ArtConfig, ConfigError> {
    let config: ArtConfig = if toml {
        toml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<ArtConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, is_toml(path))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# layergen configuration
# ======================
#
# Save as config.toml (or write the same keys as JSON in config.json).

# Layer names, bottom to top. Each name is a directory under the traits
# directory holding that layer's trait images.
order = ["background", "body", "eyes"]

# Output size in pixels, at most 16384 each way. Every layer is scaled to
# exactly this size.
width = 1000
height = 1000

# ---------------------------------------------------------------------------
# Lossy PNG compression
# ---------------------------------------------------------------------------
[compression]
# Quality window [min, max], as fractions. The palette quantizer aims for
# max; if it cannot reach min, the image is stored losslessly instead.
quality = [0.6, 0.95]

# Quantizer speed: 1 = slowest/best, 10 = fastest/roughest.
speed = 4

# ---------------------------------------------------------------------------
# Worker pool
# ---------------------------------------------------------------------------
[processing]
# Maximum number of concurrent workers. Omit to use all available cores.
# max_workers = 4
"##
}
