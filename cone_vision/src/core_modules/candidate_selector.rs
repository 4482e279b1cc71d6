// THEORY:
// The `CandidateSelector` decides which color regions are worth a closer look.
// A single cone rarely shows up as a single region in a coarse color mask: the
// strip splits the body in two, and lighting breaks it further. The selector
// therefore keeps only the largest plausible fragments and grows each one into a
// box that should cover the whole cone.
//
// Steps:
// 1.  Rank regions by bounding-box area, largest first (ties keep scan order).
// 2.  Skip boxes covering `max_cone_area_fraction` of the frame or more; no cone
//     fragment is that large. Stop after `max_candidates` accepted boxes.
// 3.  Inflate: widen by `inflation_factor` around the center, and grow upward
//     by `(factor - 1) * upward_growth_ratio` times the height. The bottom edge
//     stays where it is: the fragment usually sits low on the cone and the
//     ground below it has nothing to add.
// 4.  Clamp to the frame.

use crate::config::DetectorConfig;
use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::region_extractor::Region;

/// Picks and inflates candidate boxes. Every returned box is non-empty and lies
/// inside `[0, frame_width) x [0, frame_height)`.
pub fn select_candidates(
    regions: &[Region],
    frame_width: u32,
    frame_height: u32,
    config: &DetectorConfig,
) -> Vec<BoundingBox> {
    let frame_area = frame_width as f64 * frame_height as f64;
    let area_ceiling = config.max_cone_area_fraction * frame_area;

    let mut ranked: Vec<&Region> = regions.iter().collect();
    ranked.sort_by(|a, b| b.bounding_box.area().cmp(&a.bounding_box.area()));

    ranked
        .into_iter()
        .map(|region| region.bounding_box)
        .filter(|bbox| (bbox.area() as f64) < area_ceiling)
        .take(config.max_candidates)
        .map(|bbox| {
            inflate(&bbox, config.inflation_factor, config.upward_growth_ratio)
                .clamp_to(frame_width, frame_height)
        })
        .filter(|bbox| !bbox.is_empty())
        .collect()
}

/// Grows `bbox` horizontally by `factor` (centered) and upward by
/// `height * (factor - 1) * upward_ratio`. The result may extend past the frame.
pub fn inflate(bbox: &BoundingBox, factor: f64, upward_ratio: f64) -> BoundingBox {
    let extra = factor - 1.0;
    let width = bbox.width as f64;
    let height = bbox.height as f64;

    let grow_left = (width * extra / 2.0).round() as i32;
    let grow_up = (height * extra * upward_ratio).round() as i32;

    BoundingBox::new(
        bbox.x - grow_left,
        bbox.y - grow_up,
        (width * factor).round() as i32,
        bbox.height + grow_up,
    )
}
