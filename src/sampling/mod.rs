//! Region sampling in sheet space
//!
//! Field positions are given in sheet-space units (inches). A
//! [`RegionSampler`] owns the binarized sheet and the scan's scale factors,
//! converts a [`SheetRect`] to pixels and decides whether it is marked.
//! Sampling never draws: each read yields an [`AuditMark`] that the
//! [`annotate`] renderer applies to the output image afterwards.

pub mod annotate;

use image::{GrayImage, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use serde::{Deserialize, Serialize};

/// Pixels per sheet-space unit along each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Derive scale factors from a cropped sheet of `width` x `height` pixels
    pub fn from_crop(width: u32, height: u32, sheet_width: f64, sheet_height: f64) -> Self {
        Self {
            x: width as f64 / sheet_width,
            y: height as f64 / sheet_height,
        }
    }
}

/// Axis-aligned rectangle in sheet-space units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SheetRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square box with its top-left corner at `(x, y)`
    pub fn square(x: f64, y: f64, size: f64) -> Self {
        Self::new(x, y, size, size)
    }

    /// Convert to pixels, truncating origin and size independently.
    ///
    /// The part left of or above the image origin is cut off, so a rectangle
    /// lying wholly before it comes back empty.
    pub fn to_pixels(&self, scale: ScaleFactors) -> PixelRect {
        let (x, width) = clip_span(self.x * scale.x, self.width * scale.x);
        let (y, height) = clip_span(self.y * scale.y, self.height * scale.y);
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// Intersect the pixel span `[start, start + len)` with `[0, u32::MAX]`
fn clip_span(start: f64, len: f64) -> (u32, u32) {
    let first = start.floor() as i64;
    let last = first.saturating_add(len.max(0.0) as i64);
    let clamp = |v: i64| v.clamp(0, i64::from(u32::MAX)) as u32;
    let first = clamp(first);
    (first, clamp(last) - first)
}

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Intersect with an image of the given dimensions
    pub fn clip(&self, image_width: u32, image_height: u32) -> PixelRect {
        let x = self.x.min(image_width);
        let y = self.y.min(image_height);
        let right = self.x.saturating_add(self.width).min(image_width);
        let bottom = self.y.saturating_add(self.height).min(image_height);
        PixelRect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How a sampled region should be outlined on the annotated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkKind {
    Marked,
    Unmarked,
    /// An image region found to contain writing
    Content,
}

/// A sampled region recorded for the annotated output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMark {
    pub rect: PixelRect,
    pub kind: MarkKind,
}

/// Binarize a colour sheet for sampling: ink becomes 0, paper 255
pub fn binarize(sheet: &RgbImage, level: u8) -> GrayImage {
    let gray = image::imageops::grayscale(sheet);
    threshold(&gray, level, ThresholdType::Binary)
}

/// Reads sheet-space rectangles from a binarized sheet
#[derive(Debug, Clone, Copy)]
pub struct RegionSampler<'a> {
    image: &'a GrayImage,
    scale: ScaleFactors,
    threshold: f64,
}

impl<'a> RegionSampler<'a> {
    pub fn new(image: &'a GrayImage, scale: ScaleFactors, threshold: f64) -> Self {
        Self {
            image,
            scale,
            threshold,
        }
    }

    pub fn scale(&self) -> ScaleFactors {
        self.scale
    }

    /// Mean intensity over a pixel rectangle, `None` if nothing is left after clipping
    pub fn mean_intensity(&self, rect: PixelRect) -> Option<f64> {
        let clipped = rect.clip(self.image.width(), self.image.height());
        if clipped.is_empty() {
            return None;
        }
        let mut sum: u64 = 0;
        for y in clipped.y..clipped.y + clipped.height {
            for x in clipped.x..clipped.x + clipped.width {
                sum += self.image.get_pixel(x, y).0[0] as u64;
            }
        }
        Some(sum as f64 / (clipped.width as u64 * clipped.height as u64) as f64)
    }

    /// Sample a region and classify it. Regions outside the sheet read as unmarked.
    pub fn sample(&self, rect: SheetRect) -> (bool, AuditMark) {
        let pixels = rect.to_pixels(self.scale);
        let marked = self
            .mean_intensity(pixels)
            .is_some_and(|mean| mean < self.threshold);
        let kind = if marked {
            MarkKind::Marked
        } else {
            MarkKind::Unmarked
        };
        (marked, AuditMark { rect: pixels, kind })
    }

    /// Sample a region and record its audit mark
    pub fn read_box(&self, rect: SheetRect, audit: &mut Vec<AuditMark>) -> bool {
        let (marked, mark) = self.sample(rect);
        audit.push(mark);
        marked
    }
}
