//! Region mask construction

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;

use crate::{point_in_polygon, Point, Polygon};

/// Mask value for pixels inside the region
pub const MASK_ON: u8 = 255;

/// Binary mask of the monitored region.
///
/// Pixels inside (or on the edge of) the polygon are `MASK_ON`, the rest 0.
/// Without a calibrated polygon the whole frame is selected.
pub fn region_mask(polygon: Option<&Polygon>, width: u32, height: u32) -> GrayImage {
    let Some(polygon) = polygon else {
        return GrayImage::from_pixel(width, height, Luma([MASK_ON]));
    };

    let corners = polygon.corners();
    let mut mask = GrayImage::new(width, height);

    if corners[0] == corners[corners.len() - 1] {
        // draw_polygon_mut rejects an explicitly closed outline
        fill_by_ray_casting(&mut mask, corners);
    } else {
        let outline: Vec<imageproc::point::Point<i32>> = corners
            .iter()
            .map(|p| imageproc::point::Point::new(p.x, p.y))
            .collect();
        draw_polygon_mut(&mut mask, &outline, Luma([MASK_ON]));
    }

    mask
}

fn fill_by_ray_casting(mask: &mut GrayImage, corners: &[Point]) {
    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        if point_in_polygon(Point::new(x as i32, y as i32), corners) {
            *pixel = Luma([MASK_ON]);
        }
    }
}
