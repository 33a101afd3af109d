//! Configuration structures for the sheet scanner.
//!
//! Two objects configure a scanning session:
//!
//! - [`SheetConfig`]: the printed sheet's geometry and marker colour, all in
//!   sheet-space units (inches). Loaded once and never mutated.
//! - [`ScanOptions`]: which schema fields carry the identifiers used for the
//!   derived `match`/`pos` keys and for naming saved crops.
//!
//! ```no_run
//! use scan_sheets::config::SheetConfig;
//! use std::path::Path;
//!
//! let config = SheetConfig::from_json_file(Path::new("sheet_config.json"))?;
//! println!("box size: {}", config.box_size);
//! # Ok::<(), scan_sheets::ScanError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, ScanError};

/// Printed sheet geometry.
///
/// The nine keys written by the sheet generator are required. The remaining
/// keys tune localization and sampling and fall back to the values in
/// [`crate::constants`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Colour of the printed corner markers (RGB)
    pub marker_colour: [u8; 3],

    /// Side length of a mark box
    pub box_size: f64,

    /// Horizontal gap between neighbouring boxes
    pub box_spacing: f64,

    /// Vertical line pitch
    pub y_spacing: f64,

    /// Width reserved for a field's printed label
    pub label_offset: f64,

    /// Side length of a marker square
    pub marker_size: f64,

    /// Long side of a seven-segment bar
    pub seven_segment_width: f64,

    /// Short side of a seven-segment bar
    pub seven_segment_thickness: f64,

    /// Pitch between consecutive seven-segment digits
    pub seven_segment_offset: f64,

    #[serde(default = "default_sheet_width")]
    pub sheet_width: f64,

    #[serde(default = "default_sheet_height")]
    pub sheet_height: f64,

    /// Grey level separating ink from paper when binarizing
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,

    /// Mean binarized intensity below which a box is marked
    #[serde(default = "default_mark_threshold")]
    pub mark_threshold: f64,

    /// Hue tolerance in degrees used to find the markers
    #[serde(default = "default_marker_sensitivity")]
    pub marker_sensitivity: f32,

    /// How many of the largest contours are tested as marker squares
    #[serde(default = "default_marker_contours")]
    pub marker_contours: usize,

    /// Snap colours to pure black/white per channel before masking
    #[serde(default = "default_round_colours")]
    pub round_colours: bool,
}

fn default_sheet_width() -> f64 {
    constants::sheet::WIDTH
}

fn default_sheet_height() -> f64 {
    constants::sheet::HEIGHT
}

fn default_binarize_threshold() -> u8 {
    constants::sampling::BINARIZE_THRESHOLD
}

fn default_mark_threshold() -> f64 {
    constants::sampling::MARK_THRESHOLD
}

fn default_marker_sensitivity() -> f32 {
    constants::locator::MARKER_SENSITIVITY
}

fn default_marker_contours() -> usize {
    constants::locator::MARKER_CONTOURS
}

fn default_round_colours() -> bool {
    true
}

impl SheetConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ScanError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ScanError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject geometry that would make every sampled region empty or inverted.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("box_size", self.box_size),
            ("seven_segment_width", self.seven_segment_width),
            ("seven_segment_thickness", self.seven_segment_thickness),
            ("sheet_width", self.sheet_width),
            ("sheet_height", self.sheet_height),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScanError::configuration(
                    key,
                    format!("must be a positive number, got {}", value),
                ));
            }
        }

        let non_negative = [
            ("box_spacing", self.box_spacing),
            ("y_spacing", self.y_spacing),
            ("label_offset", self.label_offset),
            ("marker_size", self.marker_size),
            ("seven_segment_offset", self.seven_segment_offset),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ScanError::configuration(
                    key,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }

        if !(0.0..=128.0).contains(&self.marker_sensitivity) {
            return Err(ScanError::configuration(
                "marker_sensitivity",
                format!("must lie in [0, 128], got {}", self.marker_sensitivity),
            ));
        }
        if self.marker_contours == 0 {
            return Err(ScanError::configuration(
                "marker_contours",
                "at least one contour must be considered",
            ));
        }
        Ok(())
    }
}

/// Identifiers of the schema fields the orchestrator treats specially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Field whose value is `<match number><position digit>`
    pub match_field: String,

    /// Field holding the team number, used to name saved crops
    pub team_field: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            match_field: constants::record::MATCH_FIELD.to_string(),
            team_field: constants::record::TEAM_FIELD.to_string(),
        }
    }
}
