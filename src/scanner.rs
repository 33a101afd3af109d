//! Sheet scanning pipeline
//!
//! [`SheetScanner`] ties the pieces together for one photograph:
//!
//! 1. Locate the sheet and crop it to sheet space
//! 2. Binarize the crop and decode every schema field in order
//! 3. Split the combined match field into `match` and `pos`
//! 4. Render the audit marks onto the annotated copy of the sheet
//!
//! The scanner holds only immutable configuration, so one instance can serve
//! concurrent scans from several threads.

use std::path::Path;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::config::{ScanOptions, SheetConfig};
use crate::constants::record::{MATCH_KEY, POS_KEY};
use crate::decode::{self, DecodeContext, ImageCapture};
use crate::detection::{MarkerQuad, SheetLocator};
use crate::error::Result;
use crate::image_loader::load_image;
use crate::record::{FieldValue, Position, ScanRecord};
use crate::sampling::annotate::render_annotations;
use crate::sampling::{binarize, RegionSampler};
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::sink::CropSink;

/// Everything produced by one scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub record: ScanRecord,
    /// Cropped sheet with every sampled region outlined
    pub annotated: RgbImage,
    /// Number of Image crops handed to the sink
    pub captures_saved: usize,
    /// Marker quadrilaterals used to locate the sheet
    pub quads: Vec<MarkerQuad>,
}

/// Decodes photographs of one sheet layout
#[derive(Debug, Clone)]
pub struct SheetScanner {
    config: SheetConfig,
    schema: Schema,
    options: ScanOptions,
    locator: SheetLocator,
}

impl SheetScanner {
    /// Build a scanner, rejecting configurations that cannot produce a record
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Configuration` when the sheet geometry is invalid
    /// or the schema breaks a cross-field requirement.
    pub fn new(config: SheetConfig, schema: Schema, options: ScanOptions) -> Result<Self> {
        config.validate()?;
        schema.validate(&options)?;
        let locator = SheetLocator::new(&config);
        Ok(Self {
            config,
            schema,
            options,
            locator,
        })
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Load a photo from disk and scan it
    pub fn scan_path(&self, path: &Path, sink: &mut dyn CropSink) -> Result<ScanOutcome> {
        let photo = load_image(path)?;
        self.scan(&photo, sink)
    }

    /// Scan one photograph
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Localization` when the sheet cannot be found, or
    /// the sink's error if saving a crop fails. Unreadable fields are not
    /// errors; they decode to sentinel values.
    pub fn scan(&self, photo: &RgbImage, sink: &mut dyn CropSink) -> Result<ScanOutcome> {
        debug!(width = photo.width(), height = photo.height(), "localizing sheet");
        let located = self.locator.locate(photo).inspect_err(|e| {
            warn!(error = %e, "scan aborted");
        })?;

        debug!(fields = self.schema.fields().len(), "decoding fields");

        let binary = binarize(&located.image, self.config.binarize_threshold);
        let sampler = RegionSampler::new(&binary, located.scale, self.config.mark_threshold);
        let mut ctx = DecodeContext::new(sampler, &located.image, &self.config);
        let mut record = ScanRecord::new();
        let mut captures_saved = 0;

        for field in self.schema.fields() {
            let value = match self.decode_field(&mut ctx, field, &record) {
                Decoded::Skip => continue,
                Decoded::Value(value) => value,
                Decoded::Capture(capture) => {
                    sink.save(&capture)?;
                    captures_saved += 1;
                    FieldValue::Boolean(true)
                }
            };
            debug!(field = %field.id, kind = field.kind.name(), ?value);
            record.insert(field.id.clone(), value);
        }

        self.derive_match_fields(&mut record);
        let annotated = render_annotations(&located.image, &ctx.audit);

        info!(
            fields = record.len(),
            marks = ctx.audit.len(),
            captures_saved,
            "sheet decoded"
        );

        Ok(ScanOutcome {
            record,
            annotated,
            captures_saved,
            quads: located.quads,
        })
    }

    fn decode_field(
        &self,
        ctx: &mut DecodeContext<'_>,
        field: &FieldSpec,
        record: &ScanRecord,
    ) -> Decoded {
        let (x, y) = (field.x_pos, field.y_pos);
        let value = match &field.kind {
            FieldKind::Markers => return Decoded::Skip,
            FieldKind::Digits => decode::read_digits(ctx, x, y).into(),
            FieldKind::Barcode { digits } => decode::read_barcode(ctx, x, y, *digits).into(),
            FieldKind::BoxNumber { digits } => decode::read_box_number(ctx, x, y, *digits).into(),
            FieldKind::Boolean { row, labels } => {
                decode::read_boolean(ctx, x, y, *row, labels.len()).into()
            }
            FieldKind::Numbers { row, options } => {
                decode::read_numbers(ctx, x, y, *row, options).into()
            }
            FieldKind::HorizontalOptions { row, labels } => {
                decode::read_horizontal_options(ctx, x, y, *row, labels).into()
            }
            FieldKind::BulkOptions { headers, options } => {
                FieldValue::Map(decode::read_bulk_options(ctx, x, y, headers, options))
            }
            FieldKind::Image(region) => {
                let read = decode::read_image(ctx, x, y, region);
                match read.crop {
                    Some(image) => {
                        return Decoded::Capture(ImageCapture {
                            field_id: field.id.clone(),
                            file_name: self.capture_name(record, &field.id),
                            image,
                        })
                    }
                    None => FieldValue::Boolean(read.has_content),
                }
            }
        };
        Decoded::Value(value)
    }

    /// `{team}-{match}_{id}.png`, from the values decoded so far
    ///
    /// Each part is reduced to a single file-name component.
    fn capture_name(&self, record: &ScanRecord, field_id: &str) -> String {
        let label = |id: &str| {
            record
                .get(id)
                .map(FieldValue::to_label)
                .unwrap_or_default()
        };
        format!(
            "{}-{}_{}.png",
            file_component(&label(&self.options.team_field)),
            file_component(&label(&self.options.match_field)),
            file_component(field_id)
        )
    }

    /// Replace the combined match field with leading `match` and `pos` keys
    fn derive_match_fields(&self, record: &mut ScanRecord) {
        let combined = record
            .remove(&self.options.match_field)
            .map(|value| value.to_label())
            .unwrap_or_default();
        let (match_number, position) = split_match_code(&combined);
        if position.is_none() {
            warn!(code = %combined, "unreadable driver station, defaulting to Red 1");
        }
        let pos = position.map_or(0, |p| p as i64);
        debug!(
            match_number,
            station = %position.unwrap_or(Position::Red1),
            "derived match fields"
        );

        record.insert(MATCH_KEY, match_number);
        record.insert(POS_KEY, pos);
        record.move_to_front(&[MATCH_KEY, POS_KEY]);
    }
}

/// Replace anything but ASCII letters, digits, `-` and `_` with `_`
fn file_component(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

enum Decoded {
    Skip,
    Value(FieldValue),
    Capture(ImageCapture),
}

/// Split `<match><station>` into the match number and the driver station.
///
/// All characters but the last are the match number (0 if empty or not a
/// number). The last character is the station index; anything but a digit
/// below 6 gives `None`.
pub fn split_match_code(code: &str) -> (i64, Option<Position>) {
    let mut chars = code.chars();
    let last = chars.next_back();
    let match_number = chars.as_str().parse().unwrap_or(0);
    let position = last
        .and_then(|c| c.to_digit(10))
        .and_then(|d| Position::from_index(d as usize));
    (match_number, position)
}
