//! Shared types passed between the job list, the workers and the sinks.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One artwork to generate: a 1-based `id` plus the trait value selected for
/// each layer.
///
/// On the wire this is a flat record, the shape upstream randomizers emit:
///
/// ```json
/// { "id": 1, "background": "red.png", "body": "circle.png" }
/// ```
///
/// `id` may also arrive as a numeric string (`"id": "7"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u32,
    #[serde(flatten)]
    pub layers: BTreeMap<String, String>,
}

impl ImageDescriptor {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            layers: BTreeMap::new(),
        }
    }

    /// Builder-style layer selection.
    pub fn with(mut self, layer: impl Into<String>, value: impl Into<String>) -> Self {
        self.layers.insert(layer.into(), value.into());
        self
    }

    pub fn trait_value(&self, layer: &str) -> Option<&str> {
        self.layers.get(layer).map(String::as_str)
    }

    /// Zero-based output index (`id - 1`). `None` for `id == 0`.
    pub fn output_index(&self) -> Option<u32> {
        self.id.checked_sub(1)
    }

    /// Output file name, `{id - 1}.png`.
    pub fn output_name(&self) -> Option<String> {
        self.output_index().map(output_name)
    }
}

/// File name for an output index.
pub fn output_name(index: u32) -> String {
    format!("{index}.png")
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u32),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid image id '{s}'"))),
    }
}
