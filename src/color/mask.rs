//! HSV threshold ranges for marker colours
//!
//! Hue is expressed in degrees `[0, 360]`, saturation and value on a
//! `[0, 255]` scale so the fixed floor/ceiling match 8-bit thresholds.

use image::{GrayImage, Luma, RgbImage};
use palette::{FromColor, Hsv, Srgb};

use crate::constants::locator::{HUE_MAX, SATURATION_VALUE_CEILING, SATURATION_VALUE_FLOOR};

/// A colour in HSV coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvColour {
    /// Hue in degrees
    pub hue: f32,
    /// Saturation, 0-255
    pub saturation: f32,
    /// Value, 0-255
    pub value: f32,
}

impl HsvColour {
    pub fn new(hue: f32, saturation: f32, value: f32) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Convert an 8-bit RGB triple to HSV
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let srgb = Srgb::new(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        );
        let hsv: Hsv = Hsv::from_color(srgb);
        Self {
            hue: hsv.hue.into_positive_degrees(),
            saturation: hsv.saturation * 255.0,
            value: hsv.value * 255.0,
        }
    }

    /// Rotate the hue by `degrees`, wrapping into `[0, 360)`
    pub fn rotate_hue(self, degrees: f32) -> Self {
        Self {
            hue: (self.hue + degrees).rem_euclid(HUE_MAX),
            ..self
        }
    }
}

/// Inclusive lower/upper HSV bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvRange {
    pub lower: HsvColour,
    pub upper: HsvColour,
}

impl HsvRange {
    /// True when every channel lies within the bounds
    pub fn contains(&self, colour: HsvColour) -> bool {
        (self.lower.hue..=self.upper.hue).contains(&colour.hue)
            && (self.lower.saturation..=self.upper.saturation).contains(&colour.saturation)
            && (self.lower.value..=self.upper.value).contains(&colour.value)
    }
}

/// Build the HSV range around a target colour.
///
/// The hue window is `sensitivity` degrees either side of the target hue,
/// clamped to `[0, 360]`. Saturation and value use a fixed floor of 150 and
/// ceiling of 255, so only strongly coloured pixels pass.
pub fn colour_mask_range(rgb: [u8; 3], sensitivity: f32) -> HsvRange {
    range_around(HsvColour::from_rgb(rgb), sensitivity)
}

fn range_around(target: HsvColour, sensitivity: f32) -> HsvRange {
    let sensitivity = sensitivity.max(0.0);
    HsvRange {
        lower: HsvColour::new(
            (target.hue - sensitivity).max(0.0),
            SATURATION_VALUE_FLOOR,
            SATURATION_VALUE_FLOOR,
        ),
        upper: HsvColour::new(
            (target.hue + sensitivity).min(HUE_MAX),
            SATURATION_VALUE_CEILING,
            SATURATION_VALUE_CEILING,
        ),
    }
}

/// Pixel classifier for one marker colour.
///
/// Targets whose hue window would be cut by the 0/360 seam (reds) are
/// matched in a hue frame rotated by 180 degrees, where the window is whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourMask {
    range: HsvRange,
    hue_shift: f32,
}

impl ColourMask {
    pub fn for_target(rgb: [u8; 3], sensitivity: f32) -> Self {
        let target = HsvColour::from_rgb(rgb);
        let near_seam = target.hue < sensitivity || target.hue > HUE_MAX - sensitivity;
        let hue_shift = if near_seam { HUE_MAX / 2.0 } else { 0.0 };
        Self {
            range: range_around(target.rotate_hue(hue_shift), sensitivity),
            hue_shift,
        }
    }

    pub fn range(&self) -> HsvRange {
        self.range
    }

    /// Hue rotation applied before testing a pixel (0 or 180 degrees)
    pub fn hue_shift(&self) -> f32 {
        self.hue_shift
    }

    pub fn matches(&self, rgb: [u8; 3]) -> bool {
        self.range
            .contains(HsvColour::from_rgb(rgb).rotate_hue(self.hue_shift))
    }

    /// Binary mask: 255 where the pixel matches the marker colour
    pub fn apply(&self, image: &RgbImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut mask = GrayImage::new(width, height);
        for (x, y, pixel) in image.enumerate_pixels() {
            if self.matches(pixel.0) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }
}
