// THEORY:
// The `ConeVerifier` is the second, precise stage. It looks at one cluster crop
// at a time and decides whether it holds a single upright cone.
//
// Algorithm steps:
// 1.  **Masks**: threshold the crop against the family's base and strip colors.
// 2.  **Shadow suppression**: a dark strip color also matches the shadow the cone
//     casts on the ground. Shadows are flat, strips on a cone are not, so every
//     strip region (outer or hole border) whose height/width ratio is below
//     `shadow_max_aspect` has its bounding box wiped from the strip mask. Light
//     strip colors skip this step.
// 3.  **Combine and close**: OR the masks, then close them so the strip band no
//     longer splits the cone body in two.
// 4.  **Largest region**: only the region with the longest outline is examined
//     (first one wins a tie). A crop therefore yields at most one cone.
// 5.  **Shape test** on the convex hull of that outline (imageproc's Graham
//     scan):
//     - the vertical center is the mean of the topmost and bottommost y,
//     - hull points above the center form the tip, the others the base,
//     - the base must be at least `cone_min_aspect` times as tall as it is wide
//       (measured between the base's leftmost and rightmost points),
//     - every tip point must lie strictly between those two x positions.
//     A cone is narrow at the top and wide at the bottom, which is exactly what
//     a sideways rectangle or an inverted triangle fails.
//
// All boxes produced here are in crop coordinates.

use crate::config::DetectorConfig;
use crate::core_modules::bounding_box::{BoundingBox, Point};
use crate::core_modules::color_range::ColorFamily;
use crate::core_modules::frame::HsvFrame;
use crate::core_modules::mask::{color_mask, Mask, StructuringElement};
use crate::core_modules::region_extractor::region_extractor::find_regions;
use crate::core_modules::region_extractor::{Connectivity, Region, RegionKind};
use imageproc::geometry::convex_hull;
use tracing::trace;

/// Outcome of the shape test for one crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeVerdict {
    /// The combined mask had no foreground at all.
    NoRegion,
    /// The hull has fewer than three corners (a dot or a line).
    TooFewPoints,
    /// The base has no horizontal extent.
    ZeroWidthBase,
    /// Height over base width fell below the configured floor.
    TooWide { aspect: f64 },
    /// Some point of the upper half sticks out past the base.
    TipOutsideBase,
    /// A cone, with the hull's bounding box in crop coordinates.
    Cone(BoundingBox),
}

impl ShapeVerdict {
    pub fn cone_box(&self) -> Option<BoundingBox> {
        match self {
            ShapeVerdict::Cone(bbox) => Some(*bbox),
            _ => None,
        }
    }
}

/// Wipes flat strip regions (likely shadows) from `strip`. Returns how many were removed.
pub fn suppress_shadows(strip: &mut Mask, max_aspect: f64, connectivity: Connectivity) -> usize {
    let shadows: Vec<BoundingBox> = find_regions(strip, connectivity)
        .into_iter()
        .map(|region| region.bounding_box)
        .filter(|bbox| bbox.aspect_ratio().is_none_or(|aspect| aspect < max_aspect))
        .collect();

    for bbox in &shadows {
        strip.clear_box(bbox);
    }
    shadows.len()
}

/// Corner points of the convex hull of `points`. The input is deduplicated
/// first; imageproc's angular sort needs distinct points.
pub fn hull_corners(points: &[Point]) -> Vec<Point> {
    let mut unique = points.to_vec();
    unique.sort_unstable();
    unique.dedup();
    let input: Vec<imageproc::point::Point<i32>> = unique
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();
    convex_hull(input)
        .into_iter()
        .map(|p| Point::new(p.x, p.y))
        .collect()
}

/// Applies the cone shape test to a convex hull.
pub fn classify_hull(hull: &[Point], min_aspect: f64) -> ShapeVerdict {
    if hull.len() < 3 {
        return ShapeVerdict::TooFewPoints;
    }

    // --- 1. Vertical split ---
    let top = hull.iter().map(|p| p.y).min().unwrap_or_default();
    let bottom = hull.iter().map(|p| p.y).max().unwrap_or_default();
    let center = (top as f64 + bottom as f64) / 2.0;
    let (upper, lower): (Vec<Point>, Vec<Point>) =
        hull.iter().copied().partition(|p| (p.y as f64) < center);

    // --- 2. Base extent ---
    let (Some(left), Some(right)) = (
        lower.iter().map(|p| p.x).min(),
        lower.iter().map(|p| p.x).max(),
    ) else {
        return ShapeVerdict::ZeroWidthBase;
    };
    if right == left {
        return ShapeVerdict::ZeroWidthBase;
    }

    // --- 3. Proportions ---
    let aspect = (bottom - top) as f64 / (right - left) as f64;
    if aspect < min_aspect {
        return ShapeVerdict::TooWide { aspect };
    }

    // --- 4. Tip above the base ---
    if !upper.iter().all(|p| p.x > left && p.x < right) {
        return ShapeVerdict::TipOutsideBase;
    }

    match BoundingBox::from_points(hull) {
        Some(bbox) => ShapeVerdict::Cone(bbox),
        None => ShapeVerdict::TooFewPoints,
    }
}

/// Closes `mask`, keeps its largest region and runs the shape test on it.
pub fn inspect_mask(mask: &Mask, config: &DetectorConfig) -> ShapeVerdict {
    if mask.is_empty() {
        return ShapeVerdict::NoRegion;
    }

    let element = StructuringElement::from_config(&config.closing);
    let closed = mask.close(&element);
    let regions = find_regions(&closed, config.connectivity);

    let Some(largest) = largest_region(&regions) else {
        return ShapeVerdict::NoRegion;
    };
    let hull = hull_corners(&largest.outline);
    classify_hull(&hull, config.cone_min_aspect)
}

/// Region with the most outline points; the earliest one wins ties.
fn largest_region(regions: &[Region]) -> Option<&Region> {
    let mut best: Option<&Region> = None;
    for region in regions.iter().filter(|r| r.kind == RegionKind::Outer) {
        if best.is_none_or(|b| region.outline.len() > b.outline.len()) {
            best = Some(region);
        }
    }
    best
}

/// Runs the full verification on a cluster crop. Returns the cone box in crop
/// coordinates, if the crop holds a cone of `family`.
pub fn verify_crop(crop: &HsvFrame, family: ColorFamily, config: &DetectorConfig) -> Option<BoundingBox> {
    let base = color_mask(crop, &config.color_table.range(family.base));
    let mut strip = color_mask(crop, &config.color_table.range(family.strip));

    if family.strip.is_dark() {
        let removed = suppress_shadows(&mut strip, config.shadow_max_aspect, config.connectivity);
        if removed > 0 {
            trace!(%family, removed, "suppressed shadow regions");
        }
    }

    let verdict = inspect_mask(&base.union(&strip), config);
    trace!(%family, ?verdict, width = crop.width(), height = crop.height(), "verified crop");
    verdict.cone_box()
}
