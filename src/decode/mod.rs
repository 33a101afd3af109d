//! Field decoders
//!
//! One decoder per field type, each built on [`RegionSampler`] reads. A
//! decoder never fails: unreadable input resolves to a sentinel value
//! (`_`, `____`, `0`, `null`) so the record stays complete and a reviewer
//! can correct it.
//!
//! Decoders share a [`DecodeContext`] holding the binarized sheet sampler,
//! the colour sheet (for Image crops), the sheet geometry and the audit
//! marks collected so far.

pub mod barcode;
pub mod boxes;
pub mod digits;
pub mod image_field;

use image::RgbImage;

use crate::config::SheetConfig;
use crate::sampling::{AuditMark, RegionSampler, SheetRect};

pub use barcode::{barcode_bits, bits_to_decimal, read_barcode};
pub use boxes::{
    read_boolean, read_box_number, read_bulk_options, read_horizontal_options, read_numbers,
    row_start, total_numbers,
};
pub use digits::{decode_segments, read_digits, segment_rects};
pub use image_field::{count_contours, read_image, ImageCapture, ImageRead};

/// Shared state for decoding one sheet
#[derive(Debug)]
pub struct DecodeContext<'a> {
    pub sampler: RegionSampler<'a>,
    /// Cropped colour sheet; Image fields are cut from it
    pub sheet: &'a RgbImage,
    pub config: &'a SheetConfig,
    pub audit: Vec<AuditMark>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(sampler: RegionSampler<'a>, sheet: &'a RgbImage, config: &'a SheetConfig) -> Self {
        Self {
            sampler,
            sheet,
            config,
            audit: Vec::new(),
        }
    }

    /// Read one rectangle and record its audit mark
    pub fn read(&mut self, rect: SheetRect) -> bool {
        self.sampler.read_box(rect, &mut self.audit)
    }

    /// Read a square mark box of the configured size
    pub fn read_square(&mut self, x: f64, y: f64) -> bool {
        self.read(SheetRect::square(x, y, self.config.box_size))
    }

    /// Horizontal pitch between neighbouring boxes
    pub fn box_pitch(&self) -> f64 {
        self.config.box_size + self.config.box_spacing
    }
}
