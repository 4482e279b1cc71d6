// THEORY:
// The `RegionExtractor` turns a binary `Mask` into a list of `Region`s: maximal
// groups of connected foreground pixels, each summarized by its traced outline
// and its axis-aligned bounding box.
//
// Algorithm steps:
// 1.  **Labelling**: `imageproc::region_labelling::connected_components` labels
//     the mask with the configured connectivity. Labels are collected in raster
//     order of their first pixel together with their pixel bounds.
// 2.  **Tracing**: each component is copied alone into a gray image padded by one
//     pixel on every side and handed to `imageproc::contours::find_contours`
//     (Suzuki-Abe border following). The first border is the component's outer
//     outline; every `BorderType::Hole` border after it rings a background hole
//     inside the component. Both lie on foreground pixels.
// 3.  **Boxes**: each region's bounding box is the box of its border points.
//
// Tracing one component at a time keeps four-connected labelling intact: the
// tracer itself always follows eight-connected borders, so two diagonal
// neighbours that were labelled apart are never merged into one outline.
//
// Outer regions come first in label order, holes after them in label order, so
// the output is fully determined by the mask. An empty mask yields an empty list.

use crate::core_modules::bounding_box::{BoundingBox, Point};
use crate::core_modules::mask::Mask;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::region_labelling::{self, connected_components};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pixel adjacency used to grow foreground regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Four,
    Eight,
}

impl From<Connectivity> for region_labelling::Connectivity {
    fn from(connectivity: Connectivity) -> Self {
        match connectivity {
            Connectivity::Four => region_labelling::Connectivity::Four,
            Connectivity::Eight => region_labelling::Connectivity::Eight,
        }
    }
}

/// Whether a region is a foreground blob or the border of a hole inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Outer,
    Hole,
}

impl From<BorderType> for RegionKind {
    fn from(border: BorderType) -> Self {
        match border {
            BorderType::Outer => RegionKind::Outer,
            BorderType::Hole => RegionKind::Hole,
        }
    }
}

/// A single connected region of a mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    /// Border pixels in tracing order. Consecutive points are 8-neighbours.
    pub outline: Vec<Point>,
    /// The box enclosing the outline.
    pub bounding_box: BoundingBox,
}

pub mod region_extractor {
    use super::*; // Make structs from parent module available.

    /// Pixel bounds of one labelled component, inclusive.
    struct ComponentBounds {
        label: u32,
        min_x: u32,
        min_y: u32,
        max_x: u32,
        max_y: u32,
    }

    /// Finds every connected foreground region, then every hole border.
    pub fn find_regions(mask: &Mask, connectivity: Connectivity) -> Vec<Region> {
        // --- 1. Labelling ---
        let labeled = connected_components(&mask.to_gray_image(), connectivity.into(), Luma([0u8]));

        let mut components: Vec<ComponentBounds> = Vec::new();
        let mut index_of: HashMap<u32, usize> = HashMap::new();
        for (x, y, label) in labeled.enumerate_pixels() {
            let label = label[0];
            if label == 0 {
                continue;
            }
            let index = *index_of.entry(label).or_insert_with(|| {
                components.push(ComponentBounds {
                    label,
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
                components.len() - 1
            });
            let bounds = &mut components[index];
            bounds.min_x = bounds.min_x.min(x);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }

        // --- 2. Tracing ---
        let mut outers = Vec::with_capacity(components.len());
        let mut holes = Vec::new();
        for bounds in &components {
            let local = GrayImage::from_fn(
                bounds.max_x - bounds.min_x + 3,
                bounds.max_y - bounds.min_y + 3,
                |lx, ly| {
                    let inside = lx >= 1
                        && ly >= 1
                        && lx - 1 + bounds.min_x <= bounds.max_x
                        && ly - 1 + bounds.min_y <= bounds.max_y;
                    let on = inside
                        && labeled.get_pixel(lx - 1 + bounds.min_x, ly - 1 + bounds.min_y)[0] == bounds.label;
                    Luma([if on { 255 } else { 0 }])
                },
            );

            // Local (1, 1) is the component's (min_x, min_y).
            let shift = Point::new(bounds.min_x as i32 - 1, bounds.min_y as i32 - 1);
            for contour in find_contours::<i32>(&local) {
                let region = build_region(contour.border_type.into(), &contour.points, shift);
                match region.kind {
                    RegionKind::Outer => outers.push(region),
                    RegionKind::Hole => holes.push(region),
                }
            }
        }

        outers.extend(holes);
        outers
    }

    // --- 3. Boxes ---
    fn build_region(kind: RegionKind, points: &[imageproc::point::Point<i32>], shift: Point) -> Region {
        let outline: Vec<Point> = points
            .iter()
            .map(|p| Point::new(p.x + shift.x, p.y + shift.y))
            .collect();
        let bounding_box = BoundingBox::from_points(&outline).unwrap_or_default();
        Region {
            kind,
            outline,
            bounding_box,
        }
    }
}
