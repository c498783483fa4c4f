use camera_capture::VideoFrame;
use color_detect::{ColorObjectDetector, DetectorConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use region::{region_mask, RegionCalibrator};

fn bench_detect(c: &mut Criterion) {
    let detector = ColorObjectDetector::new(&DetectorConfig::default()).unwrap();
    let calibrator = RegionCalibrator::with_default_area(640, 360);
    let polygon = calibrator.polygon().unwrap();
    let region = region_mask(Some(&polygon), 640, 360);

    let mut frame = VideoFrame::solid(640, 360, [90, 90, 90]);
    frame.fill_rect(200, 120, 60, 40, [20, 40, 230]);
    frame.fill_rect(360, 150, 50, 50, [230, 20, 20]);

    c.bench_function("detect_640x360_two_objects", |b| {
        b.iter(|| {
            detector
                .detect(black_box(&frame), &region, Some(&polygon))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
