//! Image backend trait and shared error type.
//!
//! The [`ImageBackend`] trait covers the two pixel operations the compositor
//! delegates: decoding a layer source and compressing a rendered canvas into
//! PNG bytes. Drawing itself lives on [`Canvas`](super::canvas::Canvas).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::CompressionParams;
use super::source::LayerSource;
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image backends.
///
/// A single backend instance is shared by every worker in the pool, so
/// implementations must be `Sync`.
pub trait ImageBackend: Sync {
    /// Decode a layer image.
    fn load(&self, source: &LayerSource) -> Result<DynamicImage, BackendError>;

    /// Compress a rendered canvas into PNG bytes.
    fn compress(
        &self,
        pixels: &RgbaImage,
        params: &CompressionParams,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::Rgba;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that serves solid-color layers from an in-memory table.
    ///
    /// `compress` returns the raw RGBA bytes unchanged, so tests can inspect
    /// the composited pixels without a PNG round trip. Uses Mutex (not
    /// RefCell) so it is Sync and can be shared by pool workers.
    #[derive(Default)]
    pub struct MockBackend {
        pub layers: HashMap<String, [u8; 4]>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_compress: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Load(String),
        Compress { width: u32, height: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a solid layer; lookups match on [`LayerSource::describe`].
        pub fn with_layer(mut self, source: impl Into<String>, color: [u8; 4]) -> Self {
            self.layers.insert(source.into(), color);
            self
        }

        pub fn failing_compress(mut self) -> Self {
            self.fail_compress = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn compress_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Compress { .. }))
                .count()
        }
    }

    impl ImageBackend for MockBackend {
        fn load(&self, source: &LayerSource) -> Result<DynamicImage, BackendError> {
            let key = source.describe();
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Load(key.clone()));

            self.layers
                .get(&key)
                .map(|color| DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba(*color))))
                .ok_or_else(|| BackendError::Decode(format!("no mock layer for {key}")))
        }

        fn compress(
            &self,
            pixels: &RgbaImage,
            _params: &CompressionParams,
        ) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Compress {
                width: pixels.width(),
                height: pixels.height(),
            });
            if self.fail_compress {
                return Err(BackendError::Encode("mock encoder refused".into()));
            }
            Ok(pixels.as_raw().clone())
        }
    }

    #[test]
    fn mock_records_load() {
        let backend = MockBackend::new().with_layer("/traits/bg/red.png", [255, 0, 0, 255]);
        let img = backend
            .load(&LayerSource::Path("/traits/bg/red.png".into()))
            .unwrap();
        assert_eq!(img.to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Load("/traits/bg/red.png".into())]);
    }

    #[test]
    fn mock_unknown_layer_is_decode_error() {
        let backend = MockBackend::new();
        let result = backend.load(&LayerSource::Path("/missing.png".into()));
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn mock_compress_passes_raw_pixels_through() {
        let backend = MockBackend::new();
        let pixels = RgbaImage::from_pixel(3, 1, Rgba([1, 2, 3, 4]));
        let bytes = backend
            .compress(&pixels, &CompressionParams::default())
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(backend.compress_count(), 1);
    }
}
