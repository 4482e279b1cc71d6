// THEORY:
// The `pipeline` module is the top-level API of the detector. It strings the
// core modules together into the two-stage process and hides them behind
// `ConeDetector` (or the one-shot `detect_cones` function).
//
// Per frame:
// 1.  **Operating zone**: the top of the frame (sky, trees, grandstands) is cut
//     off. Everything below runs on the remaining zone.
// 2.  **Coarse stage**, per color family: threshold the zone against the base
//     color, extract regions, pick and inflate candidates, merge overlapping
//     candidates into clusters.
// 3.  **Fine stage**, per cluster: crop the zone and let the `ConeVerifier` decide.
// 4.  **Assembly**: cone boxes are moved back into full-frame coordinates and
//     concatenated in family order. Families never suppress each other.
//
// The detector keeps no state between frames. Every call is a pure function of
// the frame and the config, so one detector can be shared freely.

use crate::config::DetectorConfig;
use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::candidate_selector::select_candidates;
use crate::core_modules::cluster_merger::merge_clusters;
use crate::core_modules::cone_verifier::verify_crop;
use crate::core_modules::frame::HsvFrame;
use crate::core_modules::mask::color_mask;
use crate::core_modules::region_extractor::region_extractor::find_regions;
use crate::error::{DetectionError, Result};
use image::RgbImage;
use tracing::{debug, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::color_range::{ColorFamily, ColorId};

/// A verified cone in full-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub family: ColorFamily,
}

impl Detection {
    /// The color the detection is reported under (the cone's body color).
    pub fn tag(&self) -> ColorId {
        self.family.tag()
    }
}

/// The part of the frame the detector looks at.
#[derive(Debug, Clone)]
pub struct OperatingZone {
    pub frame: HsvFrame,
    /// Rows removed from the top; add it back to get full-frame coordinates.
    pub offset_y: i32,
}

/// Everything one color family produced, in full-frame coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyReport {
    pub family: ColorFamily,
    /// Inflated candidate boxes.
    pub candidates: Vec<BoundingBox>,
    /// Enclosing boxes of the clusters that passed the cluster filters.
    pub clusters: Vec<BoundingBox>,
    pub detections: Vec<Detection>,
}

/// Stage-by-stage outcome of a frame, for inspection and overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_width: u32,
    pub frame_height: u32,
    pub zone_offset: i32,
    pub families: Vec<FamilyReport>,
}

impl FrameReport {
    /// All detections, in family order.
    pub fn detections(&self) -> Vec<Detection> {
        self.families
            .iter()
            .flat_map(|family| family.detections.iter().copied())
            .collect()
    }
}

/// The main, top-level struct for the cone detector.
#[derive(Debug, Clone)]
pub struct ConeDetector {
    config: DetectorConfig,
}

impl ConeDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Cuts the top `operating_zone_top_fraction` of the frame away.
    pub fn operating_zone(&self, frame: &HsvFrame) -> Result<OperatingZone> {
        let offset_y = (frame.height() as f64 * self.config.operating_zone_top_fraction).floor() as i32;
        let window = BoundingBox::new(0, offset_y, frame.width() as i32, frame.height() as i32 - offset_y);
        let zone = frame.crop(&window).ok_or(DetectionError::EmptyFrame {
            width: frame.width(),
            height: 0,
        })?;
        Ok(OperatingZone {
            frame: zone,
            offset_y,
        })
    }

    /// Detects cones of every configured family.
    pub fn detect(&self, frame: &HsvFrame) -> Result<Vec<Detection>> {
        Ok(self.detect_with_trace(frame)?.detections())
    }

    /// Like `detect`, but keeps the intermediate boxes of every family.
    pub fn detect_with_trace(&self, frame: &HsvFrame) -> Result<FrameReport> {
        let zone = self.operating_zone(frame)?;
        let families: Vec<FamilyReport> = self
            .config
            .families
            .iter()
            .map(|&family| self.detect_family(&zone.frame, zone.offset_y, family))
            .collect();

        let report = FrameReport {
            frame_width: frame.width(),
            frame_height: frame.height(),
            zone_offset: zone.offset_y,
            families,
        };
        debug!(
            width = report.frame_width,
            height = report.frame_height,
            detections = report.families.iter().map(|f| f.detections.len()).sum::<usize>(),
            "frame processed"
        );
        Ok(report)
    }

    /// Runs both stages for one family over an operating zone whose top row
    /// sits at `offset_y` in the full frame.
    pub fn detect_family(&self, zone: &HsvFrame, offset_y: i32, family: ColorFamily) -> FamilyReport {
        let config = &self.config;

        // --- 1. Coarse stage ---
        let base_mask = color_mask(zone, &config.color_table.range(family.base));
        let regions = find_regions(&base_mask, config.connectivity);
        let candidates = select_candidates(&regions, zone.width(), zone.height(), config);
        let clusters = merge_clusters(&candidates, zone.width(), zone.height(), config);
        debug!(
            %family,
            regions = regions.len(),
            candidates = candidates.len(),
            clusters = clusters.len(),
            "coarse stage"
        );

        // --- 2. Fine stage ---
        let mut detections = Vec::new();
        for cluster in &clusters {
            let window = cluster.enclosing_box.clamp_to(zone.width(), zone.height());
            let Some(crop) = zone.crop(&window) else {
                warn!(%family, ?window, "cluster box fell outside the operating zone");
                continue;
            };
            if let Some(cone) = verify_crop(&crop, family, config) {
                detections.push(Detection {
                    bounding_box: cone.translate(window.x, window.y + offset_y),
                    family,
                });
            }
        }
        debug!(%family, detections = detections.len(), "fine stage");

        FamilyReport {
            family,
            candidates: candidates.iter().map(|b| b.translate(0, offset_y)).collect(),
            clusters: clusters
                .iter()
                .map(|c| c.enclosing_box.translate(0, offset_y))
                .collect(),
            detections,
        }
    }
}

/// One-shot detection on a decoded RGB image with default tunables.
pub fn detect_cones(image: &RgbImage, families: &[ColorFamily]) -> Result<Vec<Detection>> {
    let frame = HsvFrame::from_rgb_image(image)?;
    let detector = ConeDetector::new(DetectorConfig {
        families: families.to_vec(),
        ..DetectorConfig::default()
    })?;
    detector.detect(&frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gray_frame(width: u32, height: u32) -> HsvFrame {
        HsvFrame::from_rgb_image(&RgbImage::from_pixel(width, height, Rgb([128, 128, 128]))).unwrap()
    }

    #[test]
    fn operating_zone_drops_the_top_quarter() {
        let detector = ConeDetector::new(DetectorConfig::default()).unwrap();
        let zone = detector.operating_zone(&gray_frame(64, 48)).unwrap();
        assert_eq!(zone.offset_y, 12);
        assert_eq!((zone.frame.width(), zone.frame.height()), (64, 36));
    }

    #[test]
    fn operating_zone_can_be_disabled() {
        let detector = ConeDetector::new(DetectorConfig {
            operating_zone_top_fraction: 0.0,
            ..DetectorConfig::default()
        })
        .unwrap();
        let zone = detector.operating_zone(&gray_frame(10, 10)).unwrap();
        assert_eq!(zone.offset_y, 0);
        assert_eq!(zone.frame.height(), 10);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DetectorConfig {
            max_candidates: 0,
            ..DetectorConfig::default()
        };
        assert!(matches!(ConeDetector::new(config), Err(DetectionError::Config(_))));
    }

    #[test]
    fn uniform_frame_yields_an_empty_report() {
        let detector = ConeDetector::new(DetectorConfig::default()).unwrap();
        let report = detector.detect_with_trace(&gray_frame(80, 60)).unwrap();
        assert_eq!(report.zone_offset, 15);
        assert_eq!(report.families.len(), 3);
        for family in &report.families {
            assert!(family.candidates.is_empty());
            assert!(family.clusters.is_empty());
        }
        assert!(report.detections().is_empty());
    }

    #[test]
    fn detections_follow_family_order() {
        let yellow = Detection {
            bounding_box: BoundingBox::new(1, 1, 2, 2),
            family: ColorFamily::YELLOW,
        };
        let blue = Detection {
            bounding_box: BoundingBox::new(5, 5, 2, 2),
            family: ColorFamily::BLUE,
        };
        let report = FrameReport {
            frame_width: 10,
            frame_height: 10,
            zone_offset: 0,
            families: vec![
                FamilyReport {
                    family: ColorFamily::YELLOW,
                    candidates: Vec::new(),
                    clusters: Vec::new(),
                    detections: vec![yellow],
                },
                FamilyReport {
                    family: ColorFamily::BLUE,
                    candidates: Vec::new(),
                    clusters: Vec::new(),
                    detections: vec![blue],
                },
            ],
        };
        assert_eq!(report.detections(), vec![yellow, blue]);
        assert_eq!(report.detections()[1].tag(), ColorId::Blue);
    }
}
