//! Color object detector

use camera_capture::VideoFrame;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use region::{Polygon, Point};
use tracing::debug;

use crate::color::{build_color_classes, ColorClassSpec};
use crate::config::DetectorConfig;
use crate::contour::{external_contours, measure};
use crate::hsv::Hsv;
use crate::object::DetectedObject;
use crate::shape::ShapeFilter;
use crate::DetectError;

/// Detects objects of each configured color inside the region mask
pub struct ColorObjectDetector {
    classes: Vec<ColorClassSpec>,
    filter: ShapeFilter,
    /// Half-width of the square structuring element (7x7 -> 3)
    kernel_radius: u8,
}

impl ColorObjectDetector {
    /// Create a detector from configuration
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        let classes = build_color_classes(&config.colors)?;
        Self::with_classes(classes, ShapeFilter::from(config), config.kernel_size)
    }

    /// Create a detector from prepared color classes
    pub fn with_classes(
        classes: Vec<ColorClassSpec>,
        filter: ShapeFilter,
        kernel_size: u8,
    ) -> Result<Self, DetectError> {
        if kernel_size == 0 || kernel_size % 2 == 0 {
            return Err(DetectError::Config(format!(
                "kernel size must be odd, got {}",
                kernel_size
            )));
        }
        Ok(Self {
            classes,
            filter,
            kernel_radius: kernel_size / 2,
        })
    }

    pub fn classes(&self) -> &[ColorClassSpec] {
        &self.classes
    }

    /// Detect objects in one frame.
    ///
    /// `region` selects the pixels that may belong to an object. When a
    /// calibrated `polygon` is given, objects whose center falls outside it
    /// are dropped as well. Results are grouped by color class in class
    /// order; the same blob may be reported under two classes.
    pub fn detect(
        &self,
        frame: &VideoFrame,
        region: &GrayImage,
        polygon: Option<&Polygon>,
    ) -> Result<Vec<DetectedObject>, DetectError> {
        if frame.data.len() != frame.width as usize * frame.height as usize * 3 {
            return Err(DetectError::InvalidFrame);
        }
        if region.dimensions() != (frame.width, frame.height) {
            return Err(DetectError::MaskSize {
                mask_width: region.width(),
                mask_height: region.height(),
                frame_width: frame.width,
                frame_height: frame.height,
            });
        }

        let hsv: Vec<Hsv> = frame
            .data
            .chunks_exact(3)
            .map(|p| Hsv::from_rgb([p[0], p[1], p[2]]))
            .collect();

        let mut detected = Vec::new();
        for class in &self.classes {
            let mask = self.clean(&Self::class_mask(class, &hsv, region));
            let before = detected.len();

            for contour in external_contours(&mask) {
                if let Some(object) = self.evaluate_contour(class, &contour, polygon) {
                    detected.push(object);
                }
            }

            debug!(
                "Color {}: {} objects",
                class.name(),
                detected.len() - before
            );
        }

        Ok(detected)
    }

    fn class_mask(class: &ColorClassSpec, hsv: &[Hsv], region: &GrayImage) -> GrayImage {
        let width = region.width();
        GrayImage::from_fn(width, region.height(), |x, y| {
            let idx = (y * width + x) as usize;
            let in_region = region.get_pixel(x, y).0[0] != 0;
            Luma([if in_region && class.matches(hsv[idx]) { 255 } else { 0 }])
        })
    }

    /// Opening removes speckles, closing fills small gaps
    fn clean(&self, mask: &GrayImage) -> GrayImage {
        let opened = open(mask, Norm::LInf, self.kernel_radius);
        close(&opened, Norm::LInf, self.kernel_radius)
    }

    fn evaluate_contour(
        &self,
        class: &ColorClassSpec,
        contour: &[imageproc::point::Point<i32>],
        polygon: Option<&Polygon>,
    ) -> Option<DetectedObject> {
        let metrics = measure(contour)?;
        let aspect_ratio = metrics.aspect_ratio();
        let extent = metrics.extent();

        if let Err(rejection) = self.filter.check(metrics.area, aspect_ratio, extent) {
            debug!("{} contour rejected: {:?}", class.name(), rejection);
            return None;
        }

        let center: Point = metrics.bbox.center();
        if let Some(polygon) = polygon {
            if !polygon.contains(center) {
                debug!(
                    "{} object at ({}, {}) outside region",
                    class.name(),
                    center.x,
                    center.y
                );
                return None;
            }
        }

        Some(DetectedObject {
            color: class.name().to_string(),
            center,
            bbox: metrics.bbox,
            area: metrics.area,
            aspect_ratio,
            extent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hsv::HsvRange;
    use region::region_mask;

    const BLUE: [u8; 3] = [20, 40, 230];
    const RED: [u8; 3] = [230, 20, 20];
    const GRAY: [u8; 3] = [90, 90, 90];

    fn detector() -> ColorObjectDetector {
        ColorObjectDetector::new(&DetectorConfig::default()).unwrap()
    }

    fn square(x0: i32, y0: i32, x1: i32, y1: i32) -> Polygon {
        Polygon::new([
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn test_detects_blue_square() {
        let mut frame = VideoFrame::solid(200, 200, GRAY);
        frame.fill_rect(50, 60, 40, 40, BLUE);
        let region = region_mask(None, 200, 200);

        let objects = detector().detect(&frame, &region, None).unwrap();
        assert_eq!(objects.len(), 1);

        let obj = &objects[0];
        assert_eq!(obj.color, "blue");
        assert_eq!(obj.bbox.width, 40);
        assert_eq!(obj.bbox.height, 40);
        assert_eq!(obj.center, Point::new(70, 80));
        assert!(obj.area > 800.0);
        assert!(obj.extent > 0.9);
    }

    #[test]
    fn test_small_blob_is_ignored() {
        let mut frame = VideoFrame::solid(200, 200, GRAY);
        frame.fill_rect(50, 50, 20, 20, BLUE);
        let region = region_mask(None, 200, 200);

        assert!(detector().detect(&frame, &region, None).unwrap().is_empty());
    }

    #[test]
    fn test_thin_strip_is_ignored() {
        let mut frame = VideoFrame::solid(300, 100, GRAY);
        frame.fill_rect(10, 40, 200, 20, BLUE);
        let region = region_mask(None, 300, 100);

        assert!(detector().detect(&frame, &region, None).unwrap().is_empty());
    }

    #[test]
    fn test_speckle_noise_is_removed() {
        let mut frame = VideoFrame::solid(100, 100, GRAY);
        for i in 0..10 {
            frame.fill_rect(5 + i * 9, 5 + i * 9, 3, 3, BLUE);
        }
        let region = region_mask(None, 100, 100);

        assert!(detector().detect(&frame, &region, None).unwrap().is_empty());
    }

    #[test]
    fn test_wrapped_red_reported_once_as_red() {
        let mut frame = VideoFrame::solid(200, 200, GRAY);
        frame.fill_rect(20, 20, 40, 40, RED);
        // Magenta-leaning red from the high end of the hue scale
        frame.fill_rect(120, 120, 40, 40, [230, 20, 60]);
        let region = region_mask(None, 200, 200);

        let objects = detector().detect(&frame, &region, None).unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects.iter().all(|o| o.color == "red"));
    }

    #[test]
    fn test_object_outside_region_is_ignored() {
        let mut frame = VideoFrame::solid(300, 300, GRAY);
        frame.fill_rect(200, 200, 50, 50, BLUE);
        frame.fill_rect(40, 40, 50, 50, RED);
        let polygon = square(0, 0, 150, 150);
        let region = region_mask(Some(&polygon), 300, 300);

        let objects = detector().detect(&frame, &region, Some(&polygon)).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].color, "red");
    }

    #[test]
    fn test_classes_reported_in_configured_order() {
        let mut frame = VideoFrame::solid(300, 100, GRAY);
        frame.fill_rect(10, 10, 40, 40, BLUE);
        frame.fill_rect(200, 10, 40, 40, RED);
        let region = region_mask(None, 300, 100);

        let objects = detector().detect(&frame, &region, None).unwrap();
        let colors: Vec<&str> = objects.iter().map(|o| o.color.as_str()).collect();
        assert_eq!(colors, ["red", "blue"]);
    }

    #[test]
    fn test_overlapping_classes_are_not_deduplicated() {
        let wide = HsvRange::from_triples([90, 50, 50], [140, 255, 255]).unwrap();
        let narrow = HsvRange::from_triples([100, 50, 50], [130, 255, 255]).unwrap();
        let classes = vec![
            ColorClassSpec::single("cyan-blue", wide).unwrap(),
            ColorClassSpec::single("blue", narrow).unwrap(),
        ];
        let detector = ColorObjectDetector::with_classes(classes, ShapeFilter::default(), 7).unwrap();

        let mut frame = VideoFrame::solid(120, 120, GRAY);
        frame.fill_rect(30, 30, 40, 40, BLUE);
        let region = region_mask(None, 120, 120);

        assert_eq!(detector.detect(&frame, &region, None).unwrap().len(), 2);
    }

    #[test]
    fn test_mask_size_mismatch() {
        let frame = VideoFrame::solid(50, 50, GRAY);
        let region = region_mask(None, 40, 50);
        assert!(matches!(
            detector().detect(&frame, &region, None),
            Err(DetectError::MaskSize { .. })
        ));
    }

    #[test]
    fn test_even_kernel_is_rejected() {
        let config = DetectorConfig {
            kernel_size: 6,
            ..Default::default()
        };
        assert!(ColorObjectDetector::new(&config).is_err());
    }
}
