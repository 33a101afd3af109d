//! Seven-segment digit fields
//!
//! Each digit is written by filling in some of seven bars. Segment order is
//! top, upper-left, upper-right, middle, lower-left, lower-right, bottom.

use super::DecodeContext;
use crate::config::SheetConfig;
use crate::constants::decoding::{SEVEN_SEGMENT_DIGITS, UNKNOWN_DIGIT};
use crate::sampling::SheetRect;

const T: bool = true;
const F: bool = false;

/// Canonical segment patterns for 0-9
static DIGIT_SEGMENTS: [[bool; 7]; 10] = [
    [T, T, T, F, T, T, T],
    [F, F, T, F, F, T, F],
    [T, F, T, T, T, F, T],
    [T, F, T, T, F, T, T],
    [F, T, T, T, F, T, F],
    [T, T, F, T, F, T, T],
    [T, T, F, T, T, T, T],
    [T, F, T, F, F, T, F],
    [T, T, T, T, T, T, T],
    [T, T, T, T, F, T, T],
];

/// Common alternative ways of writing some digits.
///
/// An empty box reads as 0, a left-hand 1 is accepted, and 6/9 may be
/// written without their top/bottom bar.
static ALT_DIGIT_SEGMENTS: [Option<[bool; 7]>; 10] = [
    Some([F, F, F, F, F, F, F]),
    Some([F, T, F, F, T, F, F]),
    None,
    None,
    None,
    None,
    Some([F, T, F, T, T, T, T]),
    None,
    None,
    Some([T, T, T, T, F, T, F]),
];

/// Decode a segment vector, `_` if it matches no known pattern
pub fn decode_segments(segments: &[bool; 7]) -> char {
    (0u8..10)
        .find(|&digit| {
            let i = digit as usize;
            DIGIT_SEGMENTS[i] == *segments || ALT_DIGIT_SEGMENTS[i].as_ref() == Some(segments)
        })
        .map(|digit| char::from(b'0' + digit))
        .unwrap_or(UNKNOWN_DIGIT)
}

/// The seven bar rectangles of digit `index` for a field at `(x, y)`
pub fn segment_rects(x: f64, y: f64, index: usize, config: &SheetConfig) -> [SheetRect; 7] {
    let w = config.seven_segment_width;
    let t = config.seven_segment_thickness;
    let left = x + config.seven_segment_offset * index as f64;
    [
        SheetRect::new(left + t, y, w, t),
        SheetRect::new(left, y + t, t, w),
        SheetRect::new(left + t + w, y + t, t, w),
        SheetRect::new(left + t, y + w + t, w, t),
        SheetRect::new(left, y + w + 2.0 * t, t, w),
        SheetRect::new(left + t + w, y + w + 2.0 * t, t, w),
        SheetRect::new(left + t, y + 2.0 * (w + t), w, t),
    ]
}

/// Read a four-digit seven-segment field
pub fn read_digits(ctx: &mut DecodeContext<'_>, x: f64, y: f64) -> String {
    (0..SEVEN_SEGMENT_DIGITS)
        .map(|index| {
            let rects = segment_rects(x, y, index, ctx.config);
            let segments = rects.map(|rect| ctx.read(rect));
            decode_segments(&segments)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{blank, blank_colour, ink, scale};
    use super::*;
    use crate::config::tests::sample_config;
    use crate::sampling::RegionSampler;

    #[test]
    fn test_every_primary_pattern_decodes() {
        for (digit, segments) in DIGIT_SEGMENTS.iter().enumerate() {
            assert_eq!(
                decode_segments(segments),
                char::from_digit(digit as u32, 10).unwrap()
            );
        }
    }

    #[test]
    fn test_alternate_patterns() {
        assert_eq!(decode_segments(&[F; 7]), '0');
        assert_eq!(decode_segments(&[F, T, F, F, T, F, F]), '1');
        assert_eq!(decode_segments(&[F, T, F, T, T, T, T]), '6');
        assert_eq!(decode_segments(&[T, T, T, T, F, T, F]), '9');
    }

    #[test]
    fn test_unknown_pattern() {
        assert_eq!(decode_segments(&[T, F, F, F, F, F, F]), '_');
        assert_eq!(decode_segments(&[F, F, F, F, F, F, T]), '_');
    }

    #[test]
    fn test_segment_layout() {
        let config = sample_config();
        let rects = segment_rects(1.0, 2.0, 1, &config);
        // w = 0.3, t = 0.1, s = 0.7
        assert!((rects[0].x - 1.8).abs() < 1e-9);
        assert!((rects[0].y - 2.0).abs() < 1e-9);
        assert!((rects[2].x - 2.1).abs() < 1e-9);
        assert!((rects[4].y - 2.5).abs() < 1e-9);
        assert!((rects[6].y - 2.8).abs() < 1e-9);
        assert!((rects[1].width - 0.1).abs() < 1e-9);
        assert!((rects[1].height - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_read_drawn_digits() {
        let config = sample_config();
        let mut image = blank(&config);
        let colour = blank_colour(&config);
        let (x, y) = (1.0, 2.0);
        for (index, digit) in [4usize, 0, 7, 2].into_iter().enumerate() {
            let rects = segment_rects(x, y, index, &config);
            for (rect, on) in rects.iter().zip(DIGIT_SEGMENTS[digit]) {
                if on {
                    ink(&mut image, *rect);
                }
            }
        }

        let sampler = RegionSampler::new(&image, scale(), config.mark_threshold);
        let mut ctx = DecodeContext::new(sampler, &colour, &config);
        assert_eq!(read_digits(&mut ctx, x, y), "4072");
        assert_eq!(ctx.audit.len(), 28);
    }
}
