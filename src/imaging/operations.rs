//! High-level compositing.
//!
//! [`composite`] turns one descriptor into compressed PNG bytes:
//!
//! 1. **Plan**: resolve every layer in draw order to a [`LayerSource`].
//! 2. **Load**: decode every planned layer. Nothing is drawn until all
//!    layers have decoded, so a failure leaves the canvas untouched and load
//!    order can never leak into draw order.
//! 3. **Draw**: paint layers bottom to top on the worker's canvas.
//! 4. **Compress**: snapshot, clear the canvas, quantize to PNG.

use super::backend::{BackendError, ImageBackend};
use super::canvas::{Canvas, CanvasError};
use super::params::CompressionParams;
use super::source::{LayerSource, SourceResolver};
use crate::types::ImageDescriptor;
use image::DynamicImage;
use thiserror::Error;

/// Failure while producing a single image. Scoped to that image only.
#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("cannot load layer '{layer}' ({value}): {reason}")]
    Load {
        layer: String,
        value: String,
        reason: String,
    },
    #[error("render failed: {0}")]
    Render(#[from] CanvasError),
    #[error("compression failed: {0}")]
    Compression(#[source] BackendError),
}

/// One resolved layer, ready to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLayer {
    pub layer: String,
    pub value: String,
    pub source: LayerSource,
}

/// Resolve every layer of `descriptor` in `order` without loading anything.
pub fn plan_layers(
    descriptor: &ImageDescriptor,
    order: &[String],
    resolver: &dyn SourceResolver,
) -> Result<Vec<PlannedLayer>, CompositeError> {
    order
        .iter()
        .map(|layer| {
            let value = descriptor
                .trait_value(layer)
                .ok_or_else(|| CompositeError::Load {
                    layer: layer.clone(),
                    value: String::new(),
                    reason: "no trait selected for this layer".into(),
                })?;
            let source = resolver
                .resolve(layer, value)
                .ok_or_else(|| CompositeError::Load {
                    layer: layer.clone(),
                    value: value.to_string(),
                    reason: "unknown trait value".into(),
                })?;
            Ok(PlannedLayer {
                layer: layer.clone(),
                value: value.to_string(),
                source,
            })
        })
        .collect()
}

fn load_layers(
    backend: &impl ImageBackend,
    plan: &[PlannedLayer],
) -> Result<Vec<DynamicImage>, CompositeError> {
    plan.iter()
        .map(|planned| {
            backend
                .load(&planned.source)
                .map_err(|e| CompositeError::Load {
                    layer: planned.layer.clone(),
                    value: planned.value.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Composite one descriptor on `canvas` and return the compressed PNG.
///
/// The canvas is clear again when this returns, on success and on failure.
#[tracing::instrument(level = "debug", skip_all, fields(id = descriptor.id))]
pub fn composite(
    backend: &impl ImageBackend,
    descriptor: &ImageDescriptor,
    order: &[String],
    resolver: &dyn SourceResolver,
    canvas: &mut Canvas,
    params: &CompressionParams,
) -> Result<Vec<u8>, CompositeError> {
    let plan = plan_layers(descriptor, order, resolver)?;
    let layers = load_layers(backend, &plan)?;

    let rendered = {
        let mut surface = canvas.begin();
        for layer in &layers {
            surface.draw(layer);
        }
        surface.snapshot()
    };

    backend
        .compress(&rendered, params)
        .map_err(CompositeError::Compression)
}
