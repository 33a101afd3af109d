//! Free-drawing areas
//!
//! An Image field is a blank area the scout may draw in. The area counts as
//! filled when edge detection finds more than a handful of contours in it;
//! filled areas are cropped from the colour sheet and handed back to the
//! caller for saving.

use image::imageops::{crop_imm, grayscale};
use image::RgbImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::filter::box_filter;

use super::DecodeContext;
use crate::constants::decoding::{IMAGE_CANNY_HIGH, IMAGE_CANNY_LOW, IMAGE_CONTENT_CONTOURS};
use crate::constants::locator::EDGE_BLUR_RADIUS;
use crate::sampling::{AuditMark, MarkKind, PixelRect};
use crate::schema::ImageRegion;

/// A crop waiting to be persisted
#[derive(Debug, Clone)]
pub struct ImageCapture {
    pub field_id: String,
    pub file_name: String,
    pub image: RgbImage,
}

/// Result of reading one Image field
#[derive(Debug, Clone)]
pub struct ImageRead {
    pub has_content: bool,
    /// The crop, present only when the area has content
    pub crop: Option<RgbImage>,
}

/// Top-left of the drawing area for a field declared at `(x, y)`
pub fn region_origin(ctx: &DecodeContext<'_>, x: f64, y: f64, region: &ImageRegion) -> (f64, f64) {
    let marker = ctx.config.marker_size;
    let mut x = x + 1.0 + marker;
    let mut y = y;
    if region.prev_line {
        x += region.offset + 1.0 + marker;
        y -= region.y_offset - marker;
    }
    (x, y)
}

/// Number of contours (outer and hole) in the blurred edge map of `crop`
pub fn count_contours(crop: &RgbImage) -> usize {
    if crop.width() == 0 || crop.height() == 0 {
        return 0;
    }
    let edges = canny(&grayscale(crop), IMAGE_CANNY_LOW, IMAGE_CANNY_HIGH);
    let edges = box_filter(&edges, EDGE_BLUR_RADIUS, EDGE_BLUR_RADIUS);
    find_contours::<i32>(&edges).len()
}

pub fn read_image(ctx: &mut DecodeContext<'_>, x: f64, y: f64, region: &ImageRegion) -> ImageRead {
    let (x, y) = region_origin(ctx, x, y, region);
    let scale = ctx.sampler.scale();

    // corners are truncated separately so neighbouring areas tile exactly
    let left = (x * scale.x).max(0.0) as u32;
    let top = (y * scale.y).max(0.0) as u32;
    let right = ((x + region.width) * scale.x).max(0.0) as u32;
    let bottom = ((y + region.height) * scale.y).max(0.0) as u32;
    let rect = PixelRect {
        x: left,
        y: top,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
    }
    .clip(ctx.sheet.width(), ctx.sheet.height());

    if rect.is_empty() {
        return ImageRead {
            has_content: false,
            crop: None,
        };
    }

    let crop = crop_imm(ctx.sheet, rect.x, rect.y, rect.width, rect.height).to_image();
    let contours = count_contours(&crop);
    let has_content = contours > IMAGE_CONTENT_CONTOURS;
    tracing::trace!(contours, has_content, "image area");

    if has_content {
        ctx.audit.push(AuditMark {
            rect,
            kind: MarkKind::Content,
        });
    }
    ImageRead {
        has_content,
        crop: has_content.then_some(crop),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{blank, blank_colour, scale, PPI};
    use super::*;
    use crate::config::tests::sample_config;
    use crate::sampling::RegionSampler;
    use image::Rgb;

    fn region() -> ImageRegion {
        ImageRegion {
            width: 4.0,
            height: 1.5,
            prev_line: false,
            offset: 0.0,
            y_offset: 0.0,
        }
    }

    /// Scribble `count` separate dark blobs into the area at sheet-space `(x, y)`
    fn scribble(sheet: &mut RgbImage, x: f64, y: f64, count: u32) {
        let left = (x * PPI) as u32 + 20;
        let top = (y * PPI) as u32 + 40;
        for i in 0..count {
            for dy in 0..20 {
                for dx in 0..20 {
                    sheet.put_pixel(left + i * 40 + dx, top + dy, Rgb([20, 20, 20]));
                }
            }
        }
    }

    #[test]
    fn test_region_origin() {
        let config = sample_config();
        let gray = blank(&config);
        let colour = blank_colour(&config);
        let ctx = DecodeContext::new(RegionSampler::new(&gray, scale(), 150.0), &colour, &config);

        let (x, y) = region_origin(&ctx, 0.5, 8.0, &region());
        assert!((x - 1.8).abs() < 1e-9);
        assert!((y - 8.0).abs() < 1e-9);

        let shared = ImageRegion {
            prev_line: true,
            offset: 2.0,
            y_offset: 0.5,
            ..region()
        };
        let (x, y) = region_origin(&ctx, 0.5, 8.0, &shared);
        assert!((x - 5.1).abs() < 1e-9);
        assert!((y - 7.8).abs() < 1e-9);
    }

    #[test]
    fn test_blank_area_has_no_content() {
        let config = sample_config();
        let gray = blank(&config);
        let colour = blank_colour(&config);
        let mut ctx =
            DecodeContext::new(RegionSampler::new(&gray, scale(), 150.0), &colour, &config);

        let read = read_image(&mut ctx, 0.5, 8.0, &region());
        assert!(!read.has_content);
        assert!(read.crop.is_none());
        assert!(ctx.audit.is_empty());
    }

    #[test]
    fn test_drawing_is_detected_and_cropped() {
        let config = sample_config();
        let gray = blank(&config);
        let mut colour = blank_colour(&config);
        scribble(&mut colour, 1.8, 8.0, 6);
        let mut ctx =
            DecodeContext::new(RegionSampler::new(&gray, scale(), 150.0), &colour, &config);

        let read = read_image(&mut ctx, 0.5, 8.0, &region());
        assert!(read.has_content);
        let crop = read.crop.unwrap();
        assert!((399..=401).contains(&crop.width()));
        assert!((149..=151).contains(&crop.height()));
        assert_eq!(ctx.audit.len(), 1);
        assert_eq!(ctx.audit[0].kind, MarkKind::Content);
    }

    #[test]
    fn test_area_left_of_sheet_reads_empty() {
        let config = sample_config();
        let gray = blank(&config);
        let mut colour = blank_colour(&config);
        scribble(&mut colour, 0.0, 8.0, 6);
        let mut ctx =
            DecodeContext::new(RegionSampler::new(&gray, scale(), 150.0), &colour, &config);

        // origin lands at x = 0, over the drawing
        assert!(read_image(&mut ctx, -1.3, 8.0, &region()).has_content);

        // origin at x = -4.7, the whole area lies off the sheet
        let read = read_image(&mut ctx, -6.0, 8.0, &region());
        assert!(!read.has_content);
        assert!(read.crop.is_none());
        assert_eq!(ctx.audit.len(), 1);
    }

    #[test]
    fn test_count_contours_of_empty_crop() {
        assert_eq!(count_contours(&RgbImage::new(0, 0)), 0);
        assert_eq!(
            count_contours(&RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]))),
            0
        );
    }
}
