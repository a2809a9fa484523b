//! Reusable RGBA drawing surface.
//!
//! A [`Canvas`] is owned by exactly one worker for the worker's lifetime.
//! Every draw scales the layer to the full canvas size and alpha-composites it
//! over what is already there, so draw order is z-order.
//!
//! [`CanvasGuard`] wraps a borrowed canvas for the duration of one job and
//! clears it on drop, whichever way the job ends.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Resampling used for every layer draw ("best" preset).
pub const DRAW_FILTER: FilterType = FilterType::Lanczos3;

/// Largest accepted width or height, in pixels.
///
/// A full-size canvas is 1 GiB of RGBA, and every worker owns one.
pub const MAX_DIMENSION: u32 = 16_384;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasError {
    #[error("invalid canvas dimensions {width}x{height}")]
    ZeroSized { width: u32, height: u32 },
    #[error("canvas {width}x{height} exceeds the {MAX_DIMENSION}px limit")]
    TooLarge { width: u32, height: u32 },
}

#[derive(Debug)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Allocate a transparent canvas. Both dimensions must be in
    /// `1..=MAX_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::ZeroSized { width, height });
        }
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if width > MAX_DIMENSION || height > MAX_DIMENSION || bytes.is_none() {
            return Err(CanvasError::TooLarge { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Draw `layer` stretched to exactly the canvas size, alpha-blended over
    /// the current contents.
    pub fn draw(&mut self, layer: &DynamicImage) {
        let (width, height) = (self.width(), self.height());
        let scaled = if layer.width() == width && layer.height() == height {
            layer.to_rgba8()
        } else {
            imageops::resize(layer, width, height, DRAW_FILTER)
        };
        for (dst, src) in self.pixels.pixels_mut().zip(scaled.pixels()) {
            dst.blend(src);
        }
    }

    /// Copy of the rendered pixels.
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = TRANSPARENT;
        }
    }

    pub fn is_clear(&self) -> bool {
        self.pixels.pixels().all(|px| *px == TRANSPARENT)
    }

    /// Borrow the canvas for one job; it is cleared when the guard drops.
    pub fn begin(&mut self) -> CanvasGuard<'_> {
        CanvasGuard { canvas: self }
    }
}

pub struct CanvasGuard<'a> {
    canvas: &'a mut Canvas,
}

impl Deref for CanvasGuard<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl DerefMut for CanvasGuard<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        self.canvas
    }
}

impl Drop for CanvasGuard<'_> {
    fn drop(&mut self) {
        self.canvas.clear();
    }
}
