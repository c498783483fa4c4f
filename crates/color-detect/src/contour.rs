//! Contour extraction and measurement

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point as PixelPoint;

use crate::object::BoundingBox;

/// Area and bounding box of one contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourMetrics {
    pub area: f64,
    pub bbox: BoundingBox,
}

impl ContourMetrics {
    /// Bounding box width / height
    pub fn aspect_ratio(&self) -> f64 {
        self.bbox.width as f64 / self.bbox.height as f64
    }

    /// Contour area / bounding box area
    pub fn extent(&self) -> f64 {
        self.area / self.bbox.area() as f64
    }
}

/// Outer borders of the top-level foreground components of `mask`.
///
/// Components nested inside another component's hole are not reported.
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<PixelPoint<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Area enclosed by the contour polygon (shoelace formula)
pub fn polygon_area(points: &[PixelPoint<i32>]) -> f64 {
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

/// Smallest box containing every contour pixel
pub fn bounding_box(points: &[PixelPoint<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Measure one contour
pub fn measure(points: &[PixelPoint<i32>]) -> Option<ContourMetrics> {
    Some(ContourMetrics {
        area: polygon_area(points),
        bbox: bounding_box(points)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    mask.put_pixel(xx, yy, Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn test_square_metrics() {
        let mask = filled(60, 60, &[(10, 10, 40, 40)]);
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);

        let metrics = measure(&contours[0]).unwrap();
        assert_eq!(metrics.bbox, BoundingBox { x: 10, y: 10, width: 40, height: 40 });
        // Border pixel centers enclose (w - 1) x (h - 1)
        assert_eq!(metrics.area, 39.0 * 39.0);
        assert!((metrics.aspect_ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_separate_components() {
        let mask = filled(100, 40, &[(5, 5, 20, 20), (60, 5, 30, 10)]);
        assert_eq!(external_contours(&mask).len(), 2);
    }

    #[test]
    fn test_hole_is_not_a_separate_object() {
        let mut mask = filled(50, 50, &[(5, 5, 40, 40)]);
        for y in 15..35 {
            for x in 15..35 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        assert_eq!(external_contours(&mask).len(), 1);
    }

    #[test]
    fn test_polygon_area_of_triangle() {
        let points = [
            PixelPoint::new(0, 0),
            PixelPoint::new(10, 0),
            PixelPoint::new(0, 10),
        ];
        assert_eq!(polygon_area(&points), 50.0);
        assert_eq!(polygon_area(&points[..2]), 0.0);
    }

    #[test]
    fn test_empty_contour_has_no_box() {
        assert!(measure(&[]).is_none());
    }
}
