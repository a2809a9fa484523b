//! Shared test utilities for the layergen test suite.
//!
//! Synthetic trait images and on-disk traits directories, so tests never
//! depend on checked-in binary fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_traits(tmp.path(), &[
//!     ("bg", "red.png", solid_png(32, 32, [255, 0, 0, 255])),
//!     ("fg", "circle.png", circle_png(32, 32, [255, 255, 255, 255])),
//! ]);
//! ```

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A `width × height` PNG filled with one color.
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// A centered filled circle on a fully transparent background.
///
/// The radius is 3/8 of the shorter side, which leaves a transparent margin
/// wide enough that resampling never bleeds the circle into the corners.
pub fn circle_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = width.min(height) as f32 * 3.0 / 8.0;
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy <= radius * radius {
            Rgba(color)
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode_png(&image)
}

// =========================================================================
// Traits directories
// =========================================================================

/// Write `(layer, value, bytes)` entries as `{root}/{layer}/{value}`.
pub fn write_traits(root: &Path, entries: &[(&str, &str, Vec<u8>)]) {
    for (layer, value, bytes) in entries {
        let dir = root.join(layer);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(value), bytes).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_has_transparent_corners_and_opaque_center() {
        let image = image::load_from_memory(&circle_png(16, 16, [9, 9, 9, 255]))
            .unwrap()
            .to_rgba8();
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(15, 15).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(8, 8).0, [9, 9, 9, 255]);
    }

    #[test]
    fn write_traits_lays_out_layer_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_traits(tmp.path(), &[("bg", "a.png", vec![1]), ("bg", "b.png", vec![2])]);
        assert_eq!(std::fs::read(tmp.path().join("bg/b.png")).unwrap(), vec![2]);
    }
}
