//! Annotated review image
//!
//! The only place that draws. Decoders collect [`AuditMark`]s while reading
//! the binarized sheet; this renderer outlines them all on a copy of the
//! colour sheet once decoding is finished.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::{AuditMark, MarkKind, PixelRect};
use crate::constants::sampling::{MARKED_COLOUR, OUTLINE_THICKNESS, UNMARKED_COLOUR};

fn outline_colour(kind: MarkKind) -> Rgb<u8> {
    match kind {
        MarkKind::Marked | MarkKind::Content => Rgb(MARKED_COLOUR),
        MarkKind::Unmarked => Rgb(UNMARKED_COLOUR),
    }
}

/// Draw a centred outline `OUTLINE_THICKNESS` pixels wide
fn draw_outline(canvas: &mut RgbImage, rect: PixelRect, colour: Rgb<u8>) {
    let half = (OUTLINE_THICKNESS / 2) as i32;
    for inset in -half..=half {
        let width = rect.width as i32 - 2 * inset;
        let height = rect.height as i32 - 2 * inset;
        if width <= 0 || height <= 0 {
            continue;
        }
        let outline = Rect::at(rect.x as i32 + inset, rect.y as i32 + inset)
            .of_size(width as u32, height as u32);
        draw_hollow_rect_mut(canvas, outline, colour);
    }
}

/// Render every audit mark onto a copy of `sheet`
pub fn render_annotations(sheet: &RgbImage, marks: &[AuditMark]) -> RgbImage {
    let mut canvas = sheet.clone();
    for mark in marks {
        if mark.rect.is_empty() {
            continue;
        }
        draw_outline(&mut canvas, mark.rect, outline_colour(mark.kind));
    }
    canvas
}
