//! Integration tests for the complete scanning pipeline
//!
//! These tests render a synthetic sheet photograph (red corner markers,
//! marked boxes, drawn digits, a binary match code and a scribbled drawing
//! area) and check the record, the annotated output and the saved crops.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use proptest::prelude::*;

use scan_sheets::color::colour_mask_range;
use scan_sheets::constants::sampling::MARKED_COLOUR;
use scan_sheets::decode::{barcode_bits, segment_rects, ImageCapture};
use scan_sheets::{
    scan_sheet, CropSink, DirectorySink, FieldValue, NullSink, Result, ScanError, ScanOptions,
    Schema, SheetConfig, SheetScanner,
};

// ============================================================================
// Synthetic sheet
// ============================================================================

/// Pixels per inch of the rendered sheet
const PPI: f64 = 100.0;
/// Photo border around the sheet, in pixels
const MARGIN: f64 = 50.0;

const INK: Rgb<u8> = Rgb([15, 15, 15]);
const MARKER: Rgb<u8> = Rgb([230, 20, 20]);

const CONFIG: &str = r#"{
    "marker_colour": [255, 0, 0],
    "box_size": 0.25,
    "box_spacing": 0.1,
    "y_spacing": 0.3,
    "label_offset": 1.0,
    "marker_size": 0.3,
    "seven_segment_width": 0.3,
    "seven_segment_thickness": 0.1,
    "seven_segment_offset": 0.7
}"#;

const FIELDS: &str = r#"[
    {"id": "markers", "type": "Markers", "x_pos": 0, "y_pos": 0, "options": {}},
    {"id": "team_number", "type": "BoxNumber", "x_pos": 0.5, "y_pos": 0.5,
     "options": {"digits": 4}},
    {"id": "encoded_match_data", "type": "Barcode", "x_pos": 7.5, "y_pos": 0.5,
     "options": {"digits": 4}},
    {"id": "scout", "type": "Digits", "x_pos": 0.5, "y_pos": 3.0},
    {"id": "auto_move", "type": "Boolean", "x_pos": 0.5, "y_pos": 4.2,
     "options": {"options": ["Yes"], "note_space": false}},
    {"id": "auto_gears", "type": "Numbers", "x_pos": 0.5, "y_pos": 4.7,
     "options": {"options": ["1", "+2", "+3"], "note_space": false}},
    {"id": "climb", "type": "HorizontalOptions", "x_pos": 0.5, "y_pos": 5.2,
     "options": {"options": ["None", "Partial", "Full"], "note_space": false}},
    {"id": "fouls", "type": "BulkOptions", "x_pos": 0.5, "y_pos": 5.8,
     "options": {"headers": ["Auto", "Teleop"], "options": ["Pin", "Block"]}},
    {"id": "notes", "type": "Image", "x_pos": 0.5, "y_pos": 7.0,
     "options": {"width": 4, "height": 1.5, "prev_line": false}},
    {"id": "sketch", "type": "Image", "x_pos": 0.5, "y_pos": 8.7,
     "options": {"width": 4, "height": 1.5, "prev_line": false}}
]"#;

fn config() -> SheetConfig {
    serde_json::from_str(CONFIG).unwrap()
}

struct SheetPainter {
    photo: RgbImage,
    config: SheetConfig,
}

impl SheetPainter {
    fn new() -> Self {
        let config = config();
        let width = (config.sheet_width * PPI + 2.0 * MARGIN) as u32;
        let height = (config.sheet_height * PPI + 2.0 * MARGIN) as u32;
        Self {
            photo: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
            config,
        }
    }

    /// Fill a rectangle given in inches from the sheet's top-left corner
    fn fill(&mut self, x: f64, y: f64, width: f64, height: f64, colour: Rgb<u8>) {
        let rect = Rect::at((MARGIN + x * PPI) as i32, (MARGIN + y * PPI) as i32)
            .of_size((width * PPI) as u32, (height * PPI) as u32);
        draw_filled_rect_mut(&mut self.photo, rect, colour);
    }

    fn mark_box(&mut self, x: f64, y: f64) {
        let size = self.config.box_size;
        self.fill(x, y, size, size, INK);
    }

    fn pitch(&self) -> f64 {
        self.config.box_size + self.config.box_spacing
    }

    fn markers(&mut self) {
        let m = self.config.marker_size;
        let (w, h) = (self.config.sheet_width, self.config.sheet_height);
        for (x, y) in [(0.0, 0.0), (w - m, 0.0), (0.0, h - m), (w - m, h - m)] {
            self.fill(x, y, m, m, MARKER);
        }
    }

    fn box_number(&mut self, x: f64, y: f64, digits: &[usize]) {
        let x = x + self.config.label_offset;
        let y = y + 2.0 * self.config.y_spacing;
        for (row, &digit) in digits.iter().enumerate() {
            let box_x = x + digit as f64 * self.pitch();
            self.mark_box(box_x, y + 1.5 * self.config.y_spacing * row as f64);
        }
    }

    fn barcode(&mut self, x: f64, y: f64, value: u64, digits: u32) {
        let start = x - self.config.box_size;
        let pitch = self.config.box_size + self.config.box_spacing / 4.0;
        for k in 0..barcode_bits(digits) {
            if (value >> k) & 1 == 1 {
                self.mark_box(start - k as f64 * pitch, y);
            }
        }
    }

    fn seven_segment(&mut self, x: f64, y: f64, digits: &[usize]) {
        const SEGMENTS: [[bool; 7]; 5] = [
            [true, true, true, false, true, true, true],
            [false, false, true, false, false, true, false],
            [true, false, true, true, true, false, true],
            [true, false, true, true, false, true, true],
            [false, true, true, true, false, true, false],
        ];
        for (index, &digit) in digits.iter().enumerate() {
            let rects = segment_rects(x, y, index, &self.config);
            for (rect, on) in rects.iter().zip(SEGMENTS[digit]) {
                if on {
                    self.fill(rect.x, rect.y, rect.width, rect.height, INK);
                }
            }
        }
    }

    /// Left edge of box `i` in a row field without note space
    fn row_box(&self, x: f64, i: usize) -> f64 {
        x + self.config.label_offset + self.config.marker_size + i as f64 * self.pitch()
    }

    /// Several separate strokes inside an Image field's area
    fn scribble(&mut self, x: f64, y: f64) {
        let area_x = x + 1.0 + self.config.marker_size;
        for i in 0..6 {
            self.fill(area_x + 0.2 + 0.4 * i as f64, y + 0.4, 0.2, 0.2, INK);
        }
    }

    /// The filled-in sheet every test scans
    fn filled() -> RgbImage {
        let mut painter = Self::new();
        painter.markers();
        painter.box_number(0.5, 0.5, &[0, 2, 5, 4]);
        painter.barcode(7.5, 0.5, 1205, 4);
        painter.seven_segment(0.5, 3.0, &[1, 2, 3, 4]);

        let x = painter.row_box(0.5, 0);
        painter.mark_box(x, 4.2);
        for i in [0, 1] {
            let x = painter.row_box(0.5, i);
            painter.mark_box(x, 4.7);
        }
        let x = painter.row_box(0.5, 2);
        painter.mark_box(x, 5.2);

        let pitch = painter.pitch();
        painter.mark_box(0.5 + pitch, 5.8 + pitch);

        painter.scribble(0.5, 7.0);
        painter.photo
    }
}

#[derive(Default)]
struct MemorySink {
    captures: Vec<ImageCapture>,
}

impl CropSink for MemorySink {
    fn save(&mut self, capture: &ImageCapture) -> Result<()> {
        self.captures.push(capture.clone());
        Ok(())
    }
}

fn scanner() -> SheetScanner {
    SheetScanner::new(
        config(),
        Schema::from_json_str(FIELDS).unwrap(),
        ScanOptions::default(),
    )
    .unwrap()
}

// ============================================================================
// End-to-end decoding
// ============================================================================

#[test]
fn test_scan_synthetic_sheet() {
    let photo = SheetPainter::filled();
    let mut sink = MemorySink::default();
    let outcome = scanner().scan(&photo, &mut sink).unwrap();
    let record = &outcome.record;

    assert_eq!(outcome.quads.len(), 4);
    assert_eq!(record.get("match"), Some(&FieldValue::Integer(120)));
    assert_eq!(record.get("pos"), Some(&FieldValue::Integer(5)));
    assert_eq!(record.get("team_number"), Some(&FieldValue::from("0254")));
    assert_eq!(record.get("scout"), Some(&FieldValue::from("1234")));
    assert_eq!(record.get("auto_move"), Some(&FieldValue::Integer(1)));
    assert_eq!(record.get("auto_gears"), Some(&FieldValue::Integer(3)));
    assert_eq!(record.get("climb"), Some(&FieldValue::from("Full")));
    assert_eq!(record.get("notes"), Some(&FieldValue::Boolean(true)));
    assert_eq!(record.get("sketch"), Some(&FieldValue::Boolean(false)));
    assert!(record.get("encoded_match_data").is_none());
    assert!(record.get("markers").is_none());

    match record.get("fouls") {
        Some(FieldValue::Map(fouls)) => {
            assert_eq!(fouls.get("Auto"), Some(&[][..]));
            assert_eq!(fouls.get("Teleop"), Some(&["Block".to_string()][..]));
        }
        other => panic!("expected a header map, got {:?}", other),
    }

    assert_eq!(outcome.captures_saved, 1);
    assert_eq!(sink.captures.len(), 1);
    assert_eq!(sink.captures[0].field_id, "notes");
    assert_eq!(sink.captures[0].file_name, "0254-1205_notes.png");
}

#[test]
fn test_record_json_leads_with_match_and_pos() {
    let outcome = scanner()
        .scan(&SheetPainter::filled(), &mut NullSink)
        .unwrap();
    let keys: Vec<&str> = outcome.record.keys().collect();
    assert_eq!(
        keys,
        vec![
            "match",
            "pos",
            "team_number",
            "scout",
            "auto_move",
            "auto_gears",
            "climb",
            "fouls",
            "notes",
            "sketch"
        ]
    );

    let json = outcome.record.to_json_pretty().unwrap();
    let match_at = json.find("\"match\"").unwrap();
    let pos_at = json.find("\"pos\"").unwrap();
    let team_at = json.find("\"team_number\"").unwrap();
    assert!(match_at < pos_at && pos_at < team_at);
}

#[test]
fn test_annotated_sheet_outlines_marks() {
    let outcome = scanner()
        .scan(&SheetPainter::filled(), &mut NullSink)
        .unwrap();
    let annotated = &outcome.annotated;

    // roughly the sheet, cropped at the markers
    assert!((annotated.width() as i64 - 850).abs() <= 10);
    assert!((annotated.height() as i64 - 1100).abs() <= 10);
    assert!(annotated.pixels().any(|p| *p == Rgb(MARKED_COLOUR)));
}

#[test]
fn test_blank_sheet_uses_sentinels() {
    let mut painter = SheetPainter::new();
    painter.markers();
    let outcome = scanner().scan(&painter.photo, &mut NullSink).unwrap();
    let record = &outcome.record;

    assert_eq!(record.get("match"), Some(&FieldValue::Integer(0)));
    assert_eq!(record.get("pos"), Some(&FieldValue::Integer(0)));
    assert_eq!(record.get("team_number"), Some(&FieldValue::from("____")));
    // empty seven-segment boxes read as zeros
    assert_eq!(record.get("scout"), Some(&FieldValue::from("0000")));
    assert_eq!(record.get("auto_move"), Some(&FieldValue::Integer(0)));
    assert_eq!(record.get("auto_gears"), Some(&FieldValue::Integer(0)));
    assert_eq!(record.get("climb"), Some(&FieldValue::Null));
    assert_eq!(outcome.captures_saved, 0);
}

// ============================================================================
// Error handling
// ============================================================================

#[test]
fn test_photo_without_markers_is_localization_error() {
    let photo = RgbImage::from_pixel(400, 500, Rgb([255, 255, 255]));
    let err = scanner().scan(&photo, &mut NullSink).unwrap_err();
    assert!(matches!(err, ScanError::Localization { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_malformed_numbers_label_is_configuration_error() {
    let fields = FIELDS.replace(r#""+3""#, r#""three""#);
    match Schema::from_json_str(&fields) {
        Err(ScanError::Configuration { field, .. }) => assert_eq!(field, "auto_gears"),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_missing_match_field_is_configuration_error() {
    let schema = Schema::from_json_str(FIELDS).unwrap();
    let options = ScanOptions {
        match_field: "match_code".to_string(),
        ..ScanOptions::default()
    };
    assert!(matches!(
        SheetScanner::new(config(), schema, options),
        Err(ScanError::Configuration { .. })
    ));
}

// ============================================================================
// Files on disk
// ============================================================================

#[test]
fn test_scan_sheet_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let photo_path = dir.path().join("sheet.png");
    let config_path = dir.path().join("sheet_config.json");
    let fields_path = dir.path().join("fields.json");
    SheetPainter::filled().save(&photo_path).unwrap();
    std::fs::write(&config_path, CONFIG).unwrap();
    std::fs::write(&fields_path, FIELDS).unwrap();

    let mut sink = DirectorySink::new(dir.path().join("crops")).unwrap();
    let outcome = scan_sheet(&photo_path, &config_path, &fields_path, &mut sink).unwrap();

    assert_eq!(outcome.record.get("match"), Some(&FieldValue::Integer(120)));
    assert!(dir.path().join("crops").join("0254-1205_notes.png").exists());
}

#[test]
fn test_scan_sheet_missing_photo() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sheet_config.json");
    let fields_path = dir.path().join("fields.json");
    std::fs::write(&config_path, CONFIG).unwrap();
    std::fs::write(&fields_path, FIELDS).unwrap();

    let result = scan_sheet(
        &dir.path().join("missing.jpg"),
        &config_path,
        &fields_path,
        &mut NullSink,
    );
    assert!(matches!(result, Err(ScanError::ImageLoad { .. })));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_mask_range_is_ordered(r: u8, g: u8, b: u8, sensitivity in 0.0f32..=128.0) {
        let range = colour_mask_range([r, g, b], sensitivity);
        prop_assert!(range.lower.hue <= range.upper.hue);
        prop_assert!(range.lower.saturation <= range.upper.saturation);
        prop_assert!(range.lower.value <= range.upper.value);
    }
}
