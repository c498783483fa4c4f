//! Color class definitions

use crate::config::ColorRangeConfig;
use crate::hsv::{Hsv, HsvRange};
use crate::DetectError;

/// Most HSV ranges one class may combine (a hue wrap-around needs two)
pub const MAX_RANGES_PER_CLASS: usize = 2;

/// A named color made of one or two HSV ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorClassSpec {
    name: String,
    ranges: Vec<HsvRange>,
}

impl ColorClassSpec {
    pub fn new(name: impl Into<String>, ranges: Vec<HsvRange>) -> Result<Self, DetectError> {
        let name = name.into();
        let invalid = |reason: &str| DetectError::InvalidColorClass {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        if ranges.is_empty() {
            return Err(invalid("no HSV ranges"));
        }
        if ranges.len() > MAX_RANGES_PER_CLASS {
            return Err(invalid("more than two HSV ranges"));
        }

        Ok(Self { name, ranges })
    }

    /// Class with a single range
    pub fn single(name: impl Into<String>, range: HsvRange) -> Result<Self, DetectError> {
        Self::new(name, vec![range])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ranges(&self) -> &[HsvRange] {
        &self.ranges
    }

    /// Whether a pixel falls in any of the class's ranges
    pub fn matches(&self, hsv: Hsv) -> bool {
        self.ranges.iter().any(|r| r.contains(hsv))
    }
}

/// Turn configured ranges into color classes.
///
/// Entries with `merge_into` are secondary ranges: they produce no class of
/// their own and are OR-ed into the named class. Classes keep the order in
/// which their primary entries appear.
pub fn build_color_classes(
    entries: &[ColorRangeConfig],
) -> Result<Vec<ColorClassSpec>, DetectError> {
    let mut primaries: Vec<(String, Vec<HsvRange>)> = Vec::new();

    for entry in entries.iter().filter(|e| e.merge_into.is_none()) {
        if primaries.iter().any(|(name, _)| name == &entry.name) {
            return Err(DetectError::InvalidColorClass {
                name: entry.name.clone(),
                reason: "defined twice".to_string(),
            });
        }
        primaries.push((entry.name.clone(), vec![entry.range()?]));
    }

    for entry in entries {
        let Some(target) = &entry.merge_into else {
            continue;
        };
        let (_, ranges) = primaries
            .iter_mut()
            .find(|(name, _)| name == target)
            .ok_or_else(|| DetectError::InvalidColorClass {
                name: entry.name.clone(),
                reason: format!("merges into unknown class {:?}", target),
            })?;
        ranges.push(entry.range()?);
    }

    primaries
        .into_iter()
        .map(|(name, ranges)| ColorClassSpec::new(name, ranges))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;

    #[test]
    fn test_default_classes_merge_red() {
        let classes = build_color_classes(&DetectorConfig::default().colors).unwrap();
        let names: Vec<&str> = classes.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["red", "blue", "orange", "yellow"]);
        assert_eq!(classes[0].ranges().len(), 2);
    }

    #[test]
    fn test_wrapped_red_matches_both_ends() {
        let classes = build_color_classes(&DetectorConfig::default().colors).unwrap();
        let red = &classes[0];
        assert!(red.matches(Hsv { h: 3, s: 200, v: 200 }));
        assert!(red.matches(Hsv { h: 176, s: 200, v: 200 }));
        assert!(!red.matches(Hsv { h: 90, s: 200, v: 200 }));
    }

    #[test]
    fn test_unknown_merge_target_is_rejected() {
        let entries = vec![ColorRangeConfig {
            name: "red2".to_string(),
            lower: [170, 50, 50],
            upper: [180, 255, 255],
            merge_into: Some("crimson".to_string()),
        }];
        assert!(build_color_classes(&entries).is_err());
    }

    #[test]
    fn test_three_ranges_are_rejected() {
        let range = HsvRange::from_triples([0, 0, 0], [10, 255, 255]).unwrap();
        assert!(ColorClassSpec::new("red", vec![range; 3]).is_err());
        assert!(ColorClassSpec::new("", vec![range]).is_err());
    }

    #[test]
    fn test_duplicate_primary_is_rejected() {
        let blue = ColorRangeConfig::new("blue", [100, 50, 50], [130, 255, 255]);
        assert!(build_color_classes(&[blue.clone(), blue]).is_err());
    }
}
