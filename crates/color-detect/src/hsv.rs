//! HSV color space (8-bit, hue halved to 0..=180)

use serde::{Deserialize, Serialize};

use crate::DetectError;

/// Largest hue value on the halved 8-bit scale
pub const HUE_MAX: u8 = 180;

/// 8-bit HSV pixel. Hue is degrees / 2 so it fits a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    /// Convert an RGB pixel
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let delta = max - min;

        let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

        let mut h = if delta == 0.0 {
            0.0
        } else if max == rf {
            60.0 * (gf - bf) / delta
        } else if max == gf {
            120.0 + 60.0 * (bf - rf) / delta
        } else {
            240.0 + 60.0 * (rf - gf) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }

        Self {
            h: (h / 2.0).round().min(HUE_MAX as f32) as u8,
            s: s.round() as u8,
            v: max as u8,
        }
    }
}

/// One inclusive corner of an HSV range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 3]", into = "[u8; 3]")]
pub struct HsvBound(Hsv);

impl HsvBound {
    pub fn new(h: u8, s: u8, v: u8) -> Result<Self, DetectError> {
        if h > HUE_MAX {
            return Err(DetectError::InvalidHsv(format!(
                "hue {} exceeds {}",
                h, HUE_MAX
            )));
        }
        Ok(Self(Hsv { h, s, v }))
    }

    pub fn hsv(&self) -> Hsv {
        self.0
    }
}

impl TryFrom<[u8; 3]> for HsvBound {
    type Error = DetectError;

    fn try_from([h, s, v]: [u8; 3]) -> Result<Self, Self::Error> {
        Self::new(h, s, v)
    }
}

impl From<HsvBound> for [u8; 3] {
    fn from(bound: HsvBound) -> Self {
        [bound.0.h, bound.0.s, bound.0.v]
    }
}

/// Inclusive HSV box, `lower <= upper` on every channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    lower: Hsv,
    upper: Hsv,
}

impl HsvRange {
    pub fn new(lower: HsvBound, upper: HsvBound) -> Result<Self, DetectError> {
        let (lo, hi) = (lower.hsv(), upper.hsv());
        if lo.h > hi.h || lo.s > hi.s || lo.v > hi.v {
            return Err(DetectError::InvalidHsv(format!(
                "lower {:?} exceeds upper {:?}",
                [lo.h, lo.s, lo.v],
                [hi.h, hi.s, hi.v]
            )));
        }
        Ok(Self { lower: lo, upper: hi })
    }

    /// Build from raw `[h, s, v]` triples
    pub fn from_triples(lower: [u8; 3], upper: [u8; 3]) -> Result<Self, DetectError> {
        Self::new(HsvBound::try_from(lower)?, HsvBound::try_from(upper)?)
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&hsv.h)
            && (self.lower.s..=self.upper.s).contains(&hsv.s)
            && (self.lower.v..=self.upper.v).contains(&hsv.v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(Hsv::from_rgb([255, 0, 0]), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(Hsv::from_rgb([0, 255, 0]).h, 60);
        assert_eq!(Hsv::from_rgb([0, 0, 255]).h, 120);
        assert_eq!(Hsv::from_rgb([255, 255, 0]).h, 30);
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let hsv = Hsv::from_rgb([90, 90, 90]);
        assert_eq!(hsv, Hsv { h: 0, s: 0, v: 90 });
    }

    #[test]
    fn test_magenta_red_wraps_high() {
        // Slightly blue-tinted red lands near the top of the hue scale
        let hsv = Hsv::from_rgb([255, 0, 40]);
        assert!(hsv.h >= 170);
    }

    #[test]
    fn test_bound_rejects_hue_over_max() {
        assert!(HsvBound::new(181, 0, 0).is_err());
        assert!(HsvBound::new(180, 255, 255).is_ok());
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(HsvRange::from_triples([30, 50, 50], [20, 255, 255]).is_err());
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = HsvRange::from_triples([100, 50, 50], [130, 255, 255]).unwrap();
        assert!(range.contains(Hsv { h: 100, s: 50, v: 50 }));
        assert!(range.contains(Hsv { h: 130, s: 255, v: 255 }));
        assert!(!range.contains(Hsv { h: 131, s: 200, v: 200 }));
        assert!(!range.contains(Hsv { h: 110, s: 49, v: 200 }));
    }
}
