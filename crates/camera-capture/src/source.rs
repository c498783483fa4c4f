//! Frame sources

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::{CameraError, VideoFrame};

/// File extensions accepted by `ImageSequenceSource`
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "ppm"];

/// Anything that yields frames in a stable format and resolution
pub trait FrameSource {
    /// Next frame, or `Ok(None)` at end-of-stream
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;
}

/// Reads a directory of still images in lexical file-name order
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
    resolution: Option<(u32, u32)>,
}

impl ImageSequenceSource {
    /// Open a directory of frames
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CameraError::Open(format!(
                "no image frames in {}",
                dir.display()
            )));
        }

        info!("Opened image sequence {} ({} frames)", dir.display(), paths.len());
        Ok(Self::from_paths(paths))
    }

    /// Use an explicit list of frame files
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            position: 0,
            resolution: None,
        }
    }

    /// Number of frames not yet read
    pub fn remaining(&self) -> usize {
        self.paths.len() - self.position
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let sequence = self.position as u32;
        self.position += 1;

        let img = image::open(path)
            .map_err(|e| CameraError::Decode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgb8();

        let (width, height) = img.dimensions();
        match self.resolution {
            None => self.resolution = Some((width, height)),
            Some((expected_width, expected_height))
                if (expected_width, expected_height) != (width, height) =>
            {
                return Err(CameraError::ResolutionChanged {
                    expected_width,
                    expected_height,
                    width,
                    height,
                });
            }
            Some(_) => {}
        }

        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        debug!("Read frame {} from {}", sequence, path.display());
        Ok(Some(VideoFrame::from_rgb_image(img, timestamp_ns, sequence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "camera-capture-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_reads_frames_in_order_then_ends() {
        let dir = scratch_dir("order");
        RgbImage::from_pixel(4, 3, image::Rgb([0, 0, 255]))
            .save(dir.join("b.png"))
            .unwrap();
        RgbImage::from_pixel(4, 3, image::Rgb([255, 0, 0]))
            .save(dir.join("a.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::open(&dir).unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.get_pixel(0, 0), Some([255, 0, 0]));
        assert_eq!(first.sequence, 0);

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.get_pixel(0, 0), Some([0, 0, 255]));
        assert!(source.next_frame().unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rejects_resolution_change() {
        let dir = scratch_dir("resolution");
        RgbImage::new(4, 3).save(dir.join("0.png")).unwrap();
        RgbImage::new(5, 3).save(dir.join("1.png")).unwrap();

        let mut source = ImageSequenceSource::open(&dir).unwrap();
        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, CameraError::ResolutionChanged { width: 5, .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        assert!(ImageSequenceSource::open(&dir).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
