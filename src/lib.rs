//! # Scan Sheets
//!
//! A Rust crate for reading paper scouting sheets from photographs.
//!
//! This library turns a photo of a printed data-collection sheet into an
//! ordered record by:
//! - Locating the sheet through its coloured corner markers
//! - Mapping the sheet's physical layout onto the cropped photo
//! - Sampling hand-marked boxes, seven-segment digits and binary codes
//! - Detecting free-drawing areas with content and saving their crops
//!
//! Every sampled region is outlined on an annotated copy of the sheet so a
//! reviewer can check the result at a glance.
//!
//! ## Example
//!
//! ```rust,no_run
//! use scan_sheets::{scan_sheet, NullSink};
//! use std::path::Path;
//!
//! let outcome = scan_sheet(
//!     Path::new("sheet.jpg"),
//!     Path::new("sheet_config.json"),
//!     Path::new("fields.json"),
//!     &mut NullSink,
//! )?;
//! println!("{}", outcome.record.to_json_pretty()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

pub mod color;
pub mod config;
pub mod constants;
pub mod decode;
pub mod detection;
pub mod error;
pub mod image_loader;
pub mod record;
pub mod sampling;
pub mod scanner;
pub mod schema;
pub mod sink;

pub use config::{ScanOptions, SheetConfig};
pub use error::{Result, ScanError};
pub use record::{FieldValue, Position, ScanRecord};
pub use scanner::{ScanOutcome, SheetScanner};
pub use schema::{FieldKind, FieldSpec, Schema};
pub use sink::{CropSink, DirectorySink, NullSink};

/// Scan one photograph with the sheet config and field schema at the given paths
///
/// Uses the default [`ScanOptions`]. For repeated scans build a
/// [`SheetScanner`] once and reuse it.
///
/// # Errors
///
/// Returns `ScanError` if:
/// - The config or schema cannot be read, parsed or validated
/// - The photo cannot be loaded
/// - No sheet markers are found in the photo
/// - A crop cannot be written by the sink
pub fn scan_sheet(
    image_path: &Path,
    config_path: &Path,
    fields_path: &Path,
    sink: &mut dyn CropSink,
) -> Result<ScanOutcome> {
    let config = SheetConfig::from_json_file(config_path)?;
    let schema = Schema::from_json_file(fields_path)?;
    let scanner = SheetScanner::new(config, schema, ScanOptions::default())?;
    scanner.scan_path(image_path, sink)
}
