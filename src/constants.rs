//! Fixed thresholds and reference values for sheet scanning
//!
//! Everything here is static: the engine never tunes these at runtime.
//! Geometry that varies between sheet designs lives in [`crate::config::SheetConfig`].

/// Physical sheet dimensions (US Letter, inches)
pub mod sheet {
    /// Sheet width in sheet-space units
    pub const WIDTH: f64 = 8.5;

    /// Sheet height in sheet-space units
    pub const HEIGHT: f64 = 11.0;
}

/// Marker localization parameters
pub mod locator {
    /// Default hue tolerance (degrees) around the marker colour
    pub const MARKER_SENSITIVITY: f32 = 50.0;

    /// Saturation/value floor for marker pixels (0-255 scale)
    pub const SATURATION_VALUE_FLOOR: f32 = 150.0;

    /// Saturation/value ceiling for marker pixels (0-255 scale)
    pub const SATURATION_VALUE_CEILING: f32 = 255.0;

    /// Upper end of the hue circle in degrees
    pub const HUE_MAX: f32 = 360.0;

    /// Canny hysteresis thresholds
    pub const CANNY_LOW_THRESHOLD: f32 = 100.0;
    pub const CANNY_HIGH_THRESHOLD: f32 = 200.0;

    /// Box blur radius applied to edges (5x5 kernel)
    pub const EDGE_BLUR_RADIUS: u32 = 2;

    /// Number of largest contours considered as marker candidates
    pub const MARKER_CONTOURS: usize = 4;

    /// Polygon approximation epsilon (as fraction of perimeter)
    pub const POLY_APPROX_EPSILON: f64 = 0.02;
}

/// Region sampling thresholds
pub mod sampling {
    /// Grey level used to binarize the sheet before sampling
    pub const BINARIZE_THRESHOLD: u8 = 100;

    /// Mean intensity below which a region counts as marked
    pub const MARK_THRESHOLD: f64 = 150.0;

    /// Outline thickness of audit rectangles, in pixels
    pub const OUTLINE_THICKNESS: u32 = 3;

    /// Outline colour for marked regions
    pub const MARKED_COLOUR: [u8; 3] = [0, 255, 0];

    /// Outline colour for unmarked regions
    pub const UNMARKED_COLOUR: [u8; 3] = [200, 200, 200];
}

/// Field decoding constants
pub mod decoding {
    /// Number of digits in a seven-segment field
    pub const SEVEN_SEGMENT_DIGITS: usize = 4;

    /// Placeholder for a digit that matched no segment pattern, or a blank box row
    pub const UNKNOWN_DIGIT: char = '_';

    /// Placeholder for a barcode that could not be parsed
    pub const ILLEGIBLE_BARCODE: &str = "____";

    /// Contour count above which an image region is considered written on
    pub const IMAGE_CONTENT_CONTOURS: usize = 4;

    /// Canny thresholds for image-region content detection
    pub const IMAGE_CANNY_LOW: f32 = 100.0;
    pub const IMAGE_CANNY_HIGH: f32 = 200.0;
}

/// Record assembly
pub mod record {
    /// Default id of the field carrying match number and driver station
    pub const MATCH_FIELD: &str = "encoded_match_data";

    /// Default id of the field carrying the team number
    pub const TEAM_FIELD: &str = "team_number";

    /// Key of the derived match number
    pub const MATCH_KEY: &str = "match";

    /// Key of the derived driver-station position
    pub const POS_KEY: &str = "pos";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_is_portrait() {
        assert!(sheet::WIDTH < sheet::HEIGHT);
    }

    #[test]
    fn test_threshold_ranges() {
        assert!(locator::CANNY_LOW_THRESHOLD < locator::CANNY_HIGH_THRESHOLD);
        assert!(locator::SATURATION_VALUE_FLOOR < locator::SATURATION_VALUE_CEILING);
        assert!((sampling::BINARIZE_THRESHOLD as f64) < 255.0);
        assert!(sampling::MARK_THRESHOLD > 0.0 && sampling::MARK_THRESHOLD < 255.0);
    }
}
