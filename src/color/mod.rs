//! Colour space handling for marker detection
//!
//! This module converts marker colours to HSV and builds the threshold
//! ranges used to isolate the printed corner markers.

pub mod mask;

pub use mask::{colour_mask_range, ColourMask, HsvColour, HsvRange};
