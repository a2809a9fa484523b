//! Image processing: decode, layer, compress.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` / `image::load_from_memory` |
//! | **Scale** | `image::imageops::resize` with Lanczos3 |
//! | **Layer** | straight-alpha "over" on the worker's [`Canvas`] |
//! | **Compress** | `imagequant` palette quantization → `png` indexed encoder |
//!
//! The module is split into:
//! - **Parameters**: quality window and quantizer speed
//! - **Sources**: resolving `(layer, value)` to a path or in-memory bytes
//! - **Canvas**: the per-worker drawing surface
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`composite`], which strings the pieces together per job

pub mod backend;
pub mod canvas;
pub mod operations;
pub mod params;
pub mod rust_backend;
pub mod source;

pub use backend::{BackendError, ImageBackend};
pub use canvas::{Canvas, CanvasError};
pub use operations::{CompositeError, composite};
pub use params::{CompressionParams, QualityError, QualityRange, Speed};
pub use rust_backend::RustBackend;
pub use source::{LayerSource, SourceResolver, SourceTable, TraitsDir};
