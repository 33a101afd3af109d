//! Sheet localization from coloured corner markers
//!
//! Implements marker-based localization that:
//! - Snaps colours to pure black/white to suppress compression noise
//! - Masks pixels matching the marker colour in HSV space
//! - Finds marker outlines with edge detection and contour analysis
//! - Keeps quadrilateral markers and crops the photo to their bounding box
//!
//! The crop defines sheet space: its width and height divided by the
//! physical sheet size give the scale factors every decoder uses.

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use imageproc::filter::box_filter;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use tracing::{debug, warn};

use crate::color::ColourMask;
use crate::config::SheetConfig;
use crate::constants::locator::{
    CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD, EDGE_BLUR_RADIUS, POLY_APPROX_EPSILON,
};
use crate::error::{Result, ScanError};
use crate::sampling::{PixelRect, ScaleFactors};

/// Corners of one detected marker, ordered by ascending `x + y`
pub type MarkerQuad = [Point<i32>; 4];

/// A photograph cropped to sheet space
#[derive(Debug, Clone)]
pub struct LocatedSheet {
    /// Cropped colour sheet
    pub image: RgbImage,
    /// Crop rectangle in the source photograph
    pub bounds: PixelRect,
    /// Pixels per sheet-space unit
    pub scale: ScaleFactors,
    /// Marker quadrilaterals found in the source photograph
    pub quads: Vec<MarkerQuad>,
}

impl LocatedSheet {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Sheet locator driven by the marker colour in [`SheetConfig`]
#[derive(Debug, Clone)]
pub struct SheetLocator {
    mask: ColourMask,
    round_colours: bool,
    marker_contours: usize,
    poly_epsilon: f64,
    sheet_width: f64,
    sheet_height: f64,
}

impl SheetLocator {
    pub fn new(config: &SheetConfig) -> Self {
        Self {
            mask: ColourMask::for_target(config.marker_colour, config.marker_sensitivity),
            round_colours: config.round_colours,
            marker_contours: config.marker_contours,
            poly_epsilon: POLY_APPROX_EPSILON,
            sheet_width: config.sheet_width,
            sheet_height: config.sheet_height,
        }
    }

    /// Locate the sheet and crop it
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Localization` if no quadrilateral marker is found
    /// or the markers span a zero-width or zero-height box.
    pub fn locate(&self, image: &RgbImage) -> Result<LocatedSheet> {
        // Step 1-2: marker colour mask
        let mask = self.marker_mask(image);

        // Step 3: edges, blurred so broken outlines join up
        let edges = self.marker_edges(&mask);

        // Step 4: largest outer contours
        let contours = self.largest_contours(&edges);

        // Step 5: quadrilateral markers only
        let quads = self.marker_quads(&contours);
        if quads.is_empty() {
            return Err(ScanError::localization(format!(
                "no quadrilateral markers among {} candidate contours",
                contours.len()
            )));
        }

        // Step 6: bounding box of every marker vertex
        let bounds = bounding_box(&quads);
        if bounds.is_empty() {
            return Err(ScanError::localization(format!(
                "markers span a degenerate box {}x{}",
                bounds.width, bounds.height
            )));
        }

        // Step 7: crop
        let cropped =
            image::imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height)
                .to_image();
        let scale = ScaleFactors::from_crop(
            bounds.width,
            bounds.height,
            self.sheet_width,
            self.sheet_height,
        );
        debug!(
            markers = quads.len(),
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "sheet located"
        );

        Ok(LocatedSheet {
            image: cropped,
            bounds,
            scale,
            quads,
        })
    }

    fn marker_mask(&self, image: &RgbImage) -> GrayImage {
        if self.round_colours {
            self.mask.apply(&round_colours(image))
        } else {
            self.mask.apply(image)
        }
    }

    fn marker_edges(&self, mask: &GrayImage) -> GrayImage {
        let edges = canny(mask, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
        box_filter(&edges, EDGE_BLUR_RADIUS, EDGE_BLUR_RADIUS)
    }

    fn largest_contours(&self, edges: &GrayImage) -> Vec<Contour<i32>> {
        let mut outer: Vec<(f64, Contour<i32>)> = find_contours::<i32>(edges)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .map(|c| (polygon_area(&c.points), c))
            .collect();
        outer.sort_by(|a, b| b.0.total_cmp(&a.0));
        outer.truncate(self.marker_contours);
        outer.into_iter().map(|(_, c)| c).collect()
    }

    fn marker_quads(&self, contours: &[Contour<i32>]) -> Vec<MarkerQuad> {
        let mut quads = Vec::new();
        for contour in contours {
            let perimeter = arc_length(&contour.points, true);
            let polygon = approximate_closed_polygon(&contour.points, perimeter * self.poly_epsilon);
            match <[Point<i32>; 4]>::try_from(polygon) {
                Ok(quad) => quads.push(order_corners(quad)),
                Err(polygon) => {
                    debug!(vertices = polygon.len(), "discarding non-quadrilateral contour")
                }
            }
        }
        if quads.len() < contours.len() {
            warn!(
                kept = quads.len(),
                candidates = contours.len(),
                "some marker candidates were not quadrilaterals"
            );
        }
        quads
    }
}

/// Snap every channel to 0 or 255
pub fn round_colours(image: &RgbImage) -> RgbImage {
    let mut rounded = image.clone();
    for pixel in rounded.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = if *channel >= 128 { 255 } else { 0 };
        }
    }
    rounded
}

/// Order corners by ascending coordinate sum (top-left first, bottom-right last)
pub fn order_corners(mut quad: MarkerQuad) -> MarkerQuad {
    quad.sort_by_key(|p| p.x + p.y);
    quad
}

/// Axis-aligned box spanning all quad vertices, as a half-open pixel range
fn bounding_box(quads: &[MarkerQuad]) -> PixelRect {
    let points = quads.iter().flatten();
    let min_x = points.clone().map(|p| p.x).min().unwrap_or(0).max(0);
    let min_y = points.clone().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_x = points.clone().map(|p| p.x).max().unwrap_or(0).max(min_x);
    let max_y = points.map(|p| p.y).max().unwrap_or(0).max(min_y);
    PixelRect {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x) as u32,
        height: (max_y - min_y) as u32,
    }
}

/// Shoelace area of a closed polygon
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> usize {
    points
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| {
            let dx = (p.x - origin.x) as i64;
            let dy = (p.y - origin.y) as i64;
            dx * dx + dy * dy
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is split at two mutually distant points, which are vertices of
/// any convex outline, and each half is simplified as an open chain.
fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let anchor = farthest_from(points, points[0]);
    let ring: Vec<Point<i32>> = points[anchor..]
        .iter()
        .chain(&points[..anchor])
        .copied()
        .collect();
    let split = farthest_from(&ring, ring[0]);
    if split == 0 {
        return vec![ring[0]];
    }

    let mut polygon = approximate_polygon_dp(&ring[..=split], epsilon, false);
    let mut back: Vec<Point<i32>> = ring[split..].to_vec();
    back.push(ring[0]);
    let back = approximate_polygon_dp(&back, epsilon, false);

    polygon.pop();
    polygon.extend_from_slice(&back[..back.len() - 1]);
    polygon
}
