// THEORY:
// The detector returns pure data. Drawing is a separate consumer that paints
// a `FrameReport` onto the frame it came from, so the intermediate stages can be
// inspected by eye. Three levels are available, each one including the
// previous: final detections, plus accepted clusters, plus inflated candidates.

use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::color_range::ColorId;
use crate::error::DetectionError;
use crate::pipeline::{Detection, FrameReport};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::str::FromStr;

const CANDIDATE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CLUSTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// How much of the report to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum OverlayLevel {
    #[default]
    Detections,
    Clusters,
    Candidates,
}

impl FromStr for OverlayLevel {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detections" => Ok(OverlayLevel::Detections),
            "clusters" => Ok(OverlayLevel::Clusters),
            "candidates" => Ok(OverlayLevel::Candidates),
            other => Err(DetectionError::Config(format!("unknown overlay level '{other}'"))),
        }
    }
}

/// Outline color for a detection of the given body color.
pub fn detection_color(tag: ColorId) -> Rgb<u8> {
    match tag {
        ColorId::Yellow => Rgb([255, 255, 0]),
        ColorId::Blue => Rgb([0, 128, 255]),
        ColorId::Orange => Rgb([255, 128, 0]),
        ColorId::Black => Rgb([0, 0, 0]),
        ColorId::White => Rgb([255, 255, 255]),
    }
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let visible = bbox.clamp_to(image.width(), image.height());
    if visible.is_empty() {
        return;
    }
    let rect = Rect::at(visible.x, visible.y).of_size(visible.width as u32, visible.height as u32);
    draw_hollow_rect_mut(image, rect, color);
}

pub fn draw_detections(image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
        draw_box(image, &detection.bounding_box, detection_color(detection.tag()));
    }
}

/// Draws the report up to `level`. Candidates go first so detections stay on top.
pub fn draw_report(image: &mut RgbImage, report: &FrameReport, level: OverlayLevel) {
    for family in &report.families {
        if level >= OverlayLevel::Candidates {
            for bbox in &family.candidates {
                draw_box(image, bbox, CANDIDATE_COLOR);
            }
        }
        if level >= OverlayLevel::Clusters {
            for bbox in &family.clusters {
                draw_box(image, bbox, CLUSTER_COLOR);
            }
        }
    }
    draw_detections(image, &report.detections());
}
