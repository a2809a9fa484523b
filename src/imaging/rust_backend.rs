//! Pure Rust backend built on the `image` ecosystem and libimagequant.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) from disk | `image::ImageReader` with content sniffing |
//! | Decode from memory | `image::load_from_memory` |
//! | Palette quantization | `imagequant` (pngquant's engine), quality window + dithering |
//! | Indexed PNG encode | `png` crate (`PLTE` + `tRNS`) |
//! | Lossless fallback | `image::codecs::png::PngEncoder` |
//!
//! When the quantizer cannot reach the minimum quality it reports
//! `QualityTooLow`; the render is then kept as a lossless RGBA PNG rather than
//! failing the image.

use super::backend::{BackendError, ImageBackend};
use super::params::CompressionParams;
use super::source::LayerSource;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn load_path(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

fn load_bytes(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes)
        .map_err(|e| BackendError::Decode(format!("in-memory image: {}", e)))
}

fn encode_err(e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode(e.to_string())
}

/// Quantize to a palette within the quality window.
///
/// Returns `Ok(None)` when the minimum quality cannot be met.
fn quantize_png(
    pixels: &RgbaImage,
    params: &CompressionParams,
) -> Result<Option<Vec<u8>>, BackendError> {
    let (width, height) = pixels.dimensions();
    let (min, max) = params.quality.as_percent();

    let mut attrs = imagequant::new();
    attrs
        .set_speed(i32::from(params.speed.value()))
        .map_err(encode_err)?;
    attrs.set_quality(min, max).map_err(encode_err)?;

    let bitmap: Vec<imagequant::RGBA> = pixels
        .pixels()
        .map(|px| imagequant::RGBA::new(px[0], px[1], px[2], px[3]))
        .collect();
    let mut image = attrs
        .new_image(bitmap, width as usize, height as usize, 0.0)
        .map_err(encode_err)?;

    let mut quantized = match attrs.quantize(&mut image) {
        Ok(quantized) => quantized,
        Err(imagequant::Error::QualityTooLow) => return Ok(None),
        Err(e) => return Err(encode_err(e)),
    };
    quantized.set_dithering_level(1.0).map_err(encode_err)?;
    let (palette, indices) = match quantized.remapped(&mut image) {
        Ok(remapped) => remapped,
        Err(imagequant::Error::QualityTooLow) => return Ok(None),
        Err(e) => return Err(encode_err(e)),
    };

    write_indexed_png(width, height, &palette, &indices).map(Some)
}

fn write_indexed_png(
    width: u32,
    height: u32,
    palette: &[imagequant::RGBA],
    indices: &[u8],
) -> Result<Vec<u8>, BackendError> {
    let rgb: Vec<u8> = palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
    let alpha: Vec<u8> = palette.iter().map(|c| c.a).collect();

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Best);
    encoder.set_palette(rgb);
    if alpha.iter().any(|&a| a != u8::MAX) {
        encoder.set_trns(alpha);
    }

    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer.write_image_data(indices).map_err(encode_err)?;
    writer.finish().map_err(encode_err)?;
    Ok(out)
}

fn encode_lossless_png(pixels: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(encode_err)?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn load(&self, source: &LayerSource) -> Result<DynamicImage, BackendError> {
        match source {
            LayerSource::Path(path) => load_path(path),
            LayerSource::Bytes(bytes) => load_bytes(bytes),
        }
    }

    fn compress(
        &self,
        pixels: &RgbaImage,
        params: &CompressionParams,
    ) -> Result<Vec<u8>, BackendError> {
        match quantize_png(pixels, params)? {
            Some(bytes) => Ok(bytes),
            None => {
                tracing::debug!(
                    quality = ?params.quality,
                    "quality floor not reachable, keeping lossless render"
                );
                encode_lossless_png(pixels)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::QualityRange;
    use crate::test_helpers::{circle_png, solid_png};
    use image::Rgba;

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn load_png_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("red.png");
        std::fs::write(&path, solid_png(16, 8, [255, 0, 0, 255])).unwrap();

        let img = RustBackend::new().load(&LayerSource::Path(path)).unwrap();
        assert_eq!((img.width(), img.height()), (16, 8));
    }

    #[test]
    fn load_sniffs_format_without_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("red");
        std::fs::write(&path, solid_png(4, 4, [255, 0, 0, 255])).unwrap();

        assert!(RustBackend::new().load(&LayerSource::Path(path)).is_ok());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = RustBackend::new().load(&LayerSource::Path("/nonexistent/layer.png".into()));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn load_garbage_bytes_is_decode_error() {
        let result = RustBackend::new().load(&LayerSource::from_bytes(vec![0u8, 1, 2, 3]));
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn load_from_memory() {
        let src = LayerSource::from_bytes(circle_png(10, 10, [0, 0, 255, 255]));
        let img = RustBackend::new().load(&src).unwrap();
        assert_eq!((img.width(), img.height()), (10, 10));
    }

    #[test]
    fn compress_produces_indexed_png_with_same_pixels() {
        let pixels = RgbaImage::from_fn(32, 32, |x, _| {
            if x < 16 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let bytes = RustBackend::new()
            .compress(&pixels, &CompressionParams::default())
            .unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(&bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().color_type, png::ColorType::Indexed);

        let out = decode(&bytes);
        assert_eq!(out.dimensions(), (32, 32));
        assert_eq!(out.get_pixel(2, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(30, 30), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn compress_keeps_transparency() {
        let pixels = RgbaImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([0, 255, 0, 255])
            }
        });
        let bytes = RustBackend::new()
            .compress(&pixels, &CompressionParams::default())
            .unwrap();
        let out = decode(&bytes);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(7, 7), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn unreachable_quality_falls_back_to_lossless() {
        // A smooth gradient over far more than 256 colors cannot reach a
        // perfect-quality floor with a palette.
        let pixels = RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255])
        });
        let params = CompressionParams {
            quality: QualityRange::new(1.0, 1.0).unwrap(),
            ..Default::default()
        };
        let bytes = RustBackend::new().compress(&pixels, &params).unwrap();

        let decoder = png::Decoder::new(std::io::Cursor::new(&bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().color_type, png::ColorType::Rgba);
        assert_eq!(decode(&bytes), pixels);
    }
}
