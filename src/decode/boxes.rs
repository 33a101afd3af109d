//! Check-box fields: number grids, option rows and option matrices

use super::DecodeContext;
use crate::constants::decoding::UNKNOWN_DIGIT;
use crate::record::OrderedLists;
use crate::schema::{NumberOption, RowLayout};

/// x of the first box of a row field whose label starts at `x`
pub fn row_start(ctx: &DecodeContext<'_>, x: f64, row: RowLayout) -> f64 {
    let note = if row.note_space {
        (1.0 + row.note_width) * ctx.box_pitch()
    } else {
        0.0
    };
    x + ctx.config.label_offset + note + ctx.config.marker_size
}

/// Sample `count` boxes of a row, left to right
fn read_row(ctx: &mut DecodeContext<'_>, x: f64, y: f64, row: RowLayout, count: usize) -> Vec<bool> {
    let start = row_start(ctx, x, row);
    let pitch = ctx.box_pitch();
    (0..count)
        .map(|i| ctx.read_square(start + i as f64 * pitch, y))
        .collect()
}

/// Read a grid of `digits` rows of ten boxes (0-9).
///
/// The highest marked box in a row is its digit; a row with nothing marked
/// reads as `_`.
pub fn read_box_number(ctx: &mut DecodeContext<'_>, x: f64, y: f64, digits: u32) -> String {
    let x = x + ctx.config.label_offset;
    let y = y + 2.0 * ctx.config.y_spacing;
    let pitch = ctx.box_pitch();
    let row_pitch = 1.5 * ctx.config.y_spacing;

    (0..digits)
        .map(|i| {
            let row_y = y + row_pitch * i as f64;
            let marked: Vec<bool> = (0..10)
                .map(|j| ctx.read_square(x + j as f64 * pitch, row_y))
                .collect();
            marked
                .iter()
                .rposition(|&m| m)
                .and_then(|digit| char::from_digit(digit as u32, 10))
                .unwrap_or(UNKNOWN_DIGIT)
        })
        .collect()
}

/// First box of the row, as 1/0
pub fn read_boolean(ctx: &mut DecodeContext<'_>, x: f64, y: f64, row: RowLayout, boxes: usize) -> i64 {
    let marked = read_row(ctx, x, y, row, boxes.max(1));
    i64::from(marked[0])
}

/// Apply marked Numbers options left to right: `N` sets the total, `+N` adds
pub fn total_numbers(options: &[NumberOption], marked: &[bool]) -> i64 {
    options
        .iter()
        .zip(marked)
        .filter(|(_, &m)| m)
        .fold(0, |total, (option, _)| match option {
            NumberOption::Set(n) => *n,
            NumberOption::Add(n) => total.saturating_add(*n),
        })
}

pub fn read_numbers(
    ctx: &mut DecodeContext<'_>,
    x: f64,
    y: f64,
    row: RowLayout,
    options: &[NumberOption],
) -> i64 {
    let marked = read_row(ctx, x, y, row, options.len());
    total_numbers(options, &marked)
}

/// Right-most marked label, `None` when nothing is marked
pub fn read_horizontal_options(
    ctx: &mut DecodeContext<'_>,
    x: f64,
    y: f64,
    row: RowLayout,
    labels: &[String],
) -> Option<String> {
    let marked = read_row(ctx, x, y, row, labels.len());
    marked
        .iter()
        .rposition(|&m| m)
        .map(|index| labels[index].clone())
}

/// Column `i` per header, row `j` per option; each header lists its marked options
pub fn read_bulk_options(
    ctx: &mut DecodeContext<'_>,
    x: f64,
    y: f64,
    headers: &[String],
    options: &[String],
) -> OrderedLists {
    let pitch = ctx.box_pitch();
    let mut result = OrderedLists::new();
    for (i, header) in headers.iter().enumerate() {
        let column_x = x + i as f64 * pitch;
        let marked: Vec<String> = options
            .iter()
            .enumerate()
            .filter_map(|(j, option)| {
                ctx.read_square(column_x, y + j as f64 * pitch)
                    .then(|| option.clone())
            })
            .collect();
        result.push(header.clone(), marked);
    }
    result
}
