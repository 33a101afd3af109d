//! Field schema: what to read, where, and how
//!
//! The schema file is a JSON array of entries
//! `{"id", "type", "x_pos", "y_pos", "options"}`. Each entry is parsed into a
//! [`FieldSpec`] whose [`FieldKind`] carries strongly typed options, so a
//! malformed label or missing option is reported once, at load time, as a
//! `ScanError::Configuration` naming the field.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::config::ScanOptions;
use crate::error::{Result, ScanError};

/// Largest digit count whose maximum value still fits in a `u64`
pub const MAX_BARCODE_DIGITS: u32 = 19;

/// One entry of the schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub id: String,
    pub x_pos: f64,
    pub y_pos: f64,
    pub kind: FieldKind,
}

/// Field type with its typed options
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Corner markers; only used by localization
    Markers,
    /// Four seven-segment digits
    Digits,
    /// Binary-coded number with `digits` decimal digits
    Barcode { digits: u32 },
    /// One row of ten boxes per digit
    BoxNumber { digits: u32 },
    /// Single check box (extra labels are sampled but ignored)
    Boolean { row: RowLayout, labels: Vec<String> },
    /// Row of set/add boxes summed into a total
    Numbers {
        row: RowLayout,
        options: Vec<NumberOption>,
    },
    /// Row of exclusive choices
    HorizontalOptions { row: RowLayout, labels: Vec<String> },
    /// Header columns by option rows
    BulkOptions {
        headers: Vec<String>,
        options: Vec<String>,
    },
    /// Free drawing area saved when it contains writing
    Image(ImageRegion),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Markers => "Markers",
            FieldKind::Digits => "Digits",
            FieldKind::Barcode { .. } => "Barcode",
            FieldKind::BoxNumber { .. } => "BoxNumber",
            FieldKind::Boolean { .. } => "Boolean",
            FieldKind::Numbers { .. } => "Numbers",
            FieldKind::HorizontalOptions { .. } => "HorizontalOptions",
            FieldKind::BulkOptions { .. } => "BulkOptions",
            FieldKind::Image(_) => "Image",
        }
    }

    /// True for kinds whose value is a digit string
    pub fn yields_digits(&self) -> bool {
        matches!(
            self,
            FieldKind::Digits | FieldKind::Barcode { .. } | FieldKind::BoxNumber { .. }
        )
    }
}

/// Space reserved before the boxes of a row field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowLayout {
    pub note_space: bool,
    /// Width of the note area, in boxes
    pub note_width: f64,
}

/// A Numbers label: `N` sets the running total, `+N` adds to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOption {
    Set(i64),
    Add(i64),
}

impl NumberOption {
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.strip_prefix('+') {
            Some(rest) => rest.trim().parse().ok().map(NumberOption::Add),
            None => label.parse().ok().map(NumberOption::Set),
        }
    }
}

/// Geometry of an Image field
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ImageRegion {
    pub width: f64,
    pub height: f64,
    /// The area shares a line with the previous field
    #[serde(default)]
    pub prev_line: bool,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub y_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum FieldType {
    Markers,
    Digits,
    Barcode,
    BoxNumber,
    HorizontalOptions,
    Numbers,
    Boolean,
    BulkOptions,
    Image,
}

#[derive(Debug, Deserialize)]
struct RawField {
    id: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    x_pos: f64,
    y_pos: f64,
    #[serde(default)]
    options: Value,
}

#[derive(Debug, Deserialize)]
struct DigitCount {
    digits: u32,
}

/// Option labels are strings, bare numbers, or `[value, alias...]` lists
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionLabel {
    Text(String),
    Integer(i64),
    Aliased(Vec<String>),
}

impl OptionLabel {
    fn value(self) -> Option<String> {
        match self {
            OptionLabel::Text(text) => Some(text),
            OptionLabel::Integer(n) => Some(n.to_string()),
            OptionLabel::Aliased(values) => values.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RowOptions {
    options: Vec<OptionLabel>,
    #[serde(default)]
    note_space: bool,
    #[serde(default)]
    note_width: f64,
}

#[derive(Debug, Deserialize)]
struct BulkOptionsRaw {
    headers: Vec<OptionLabel>,
    options: Vec<OptionLabel>,
}

fn options<T: serde::de::DeserializeOwned>(id: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ScanError::configuration(id, format!("invalid options: {}", e)))
}

fn labels(id: &str, raw: Vec<OptionLabel>) -> Result<Vec<String>> {
    raw.into_iter()
        .map(|label| {
            label
                .value()
                .ok_or_else(|| ScanError::configuration(id, "empty option alias list"))
        })
        .collect()
}

fn row(id: &str, value: Value) -> Result<(RowLayout, Vec<String>)> {
    let raw: RowOptions = options(id, value)?;
    let labels = labels(id, raw.options)?;
    if labels.is_empty() {
        return Err(ScanError::configuration(id, "at least one option is required"));
    }
    Ok((
        RowLayout {
            note_space: raw.note_space,
            note_width: raw.note_width,
        },
        labels,
    ))
}

impl TryFrom<RawField> for FieldSpec {
    type Error = ScanError;

    fn try_from(raw: RawField) -> Result<Self> {
        let id = raw.id.as_str();
        let kind = match raw.field_type {
            FieldType::Markers => FieldKind::Markers,
            FieldType::Digits => FieldKind::Digits,
            FieldType::Barcode => {
                let DigitCount { digits } = options(id, raw.options)?;
                if !(1..=MAX_BARCODE_DIGITS).contains(&digits) {
                    return Err(ScanError::configuration(
                        id,
                        format!("barcode digits must be 1..={}, got {}", MAX_BARCODE_DIGITS, digits),
                    ));
                }
                FieldKind::Barcode { digits }
            }
            FieldType::BoxNumber => {
                let DigitCount { digits } = options(id, raw.options)?;
                FieldKind::BoxNumber { digits }
            }
            FieldType::Boolean => {
                let (row, labels) = row(id, raw.options)?;
                FieldKind::Boolean { row, labels }
            }
            FieldType::Numbers => {
                let (row, labels) = row(id, raw.options)?;
                let options = labels
                    .iter()
                    .map(|label| {
                        NumberOption::parse(label).ok_or_else(|| {
                            ScanError::configuration(
                                id,
                                format!("`{}` is not a number or +number", label),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                FieldKind::Numbers { row, options }
            }
            FieldType::HorizontalOptions => {
                let (row, labels) = row(id, raw.options)?;
                FieldKind::HorizontalOptions { row, labels }
            }
            FieldType::BulkOptions => {
                let raw_options: BulkOptionsRaw = options(id, raw.options)?;
                FieldKind::BulkOptions {
                    headers: labels(id, raw_options.headers)?,
                    options: labels(id, raw_options.options)?,
                }
            }
            FieldType::Image => {
                let region: ImageRegion = options(id, raw.options)?;
                if !(region.width > 0.0 && region.height > 0.0) {
                    return Err(ScanError::configuration(
                        id,
                        "image width and height must be positive",
                    ));
                }
                FieldKind::Image(region)
            }
        };

        Ok(FieldSpec {
            id: raw.id,
            x_pos: raw.x_pos,
            y_pos: raw.y_pos,
            kind,
        })
    }
}

/// Ordered list of fields on a sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<RawField> = serde_json::from_str(json)
            .map_err(|e| ScanError::configuration("<schema>", e.to_string()))?;
        let fields = raw
            .into_iter()
            .map(FieldSpec::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: Vec<RawField> =
            serde_json::from_str(&content).map_err(|source| ScanError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        let fields = raw
            .into_iter()
            .map(FieldSpec::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Check the cross-field requirements of a scan.
    ///
    /// - ids are unique
    /// - the combined match field exists and decodes to digits
    /// - Image fields come after the team and match fields their crops are named by
    pub fn validate(&self, scan: &ScanOptions) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.id.as_str()) {
                return Err(ScanError::configuration(&field.id, "duplicate field id"));
            }
        }

        match self.get(&scan.match_field) {
            None => {
                return Err(ScanError::configuration(
                    &scan.match_field,
                    "match/position field is missing from the schema",
                ))
            }
            Some(field) if !field.kind.yields_digits() => {
                return Err(ScanError::configuration(
                    &scan.match_field,
                    format!(
                        "match/position field must be Digits, Barcode or BoxNumber, not {}",
                        field.kind.name()
                    ),
                ))
            }
            Some(_) => {}
        }

        let mut decoded: HashSet<&str> = HashSet::new();
        for field in &self.fields {
            if let FieldKind::Image(_) = field.kind {
                for naming in [&scan.team_field, &scan.match_field] {
                    if !decoded.contains(naming.as_str()) {
                        return Err(ScanError::configuration(
                            &field.id,
                            format!("image field must come after `{}`", naming),
                        ));
                    }
                }
            }
            decoded.insert(field.id.as_str());
        }
        Ok(())
    }
}
