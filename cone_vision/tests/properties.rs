use cone_vision::core_modules::candidate_selector::select_candidates;
use cone_vision::core_modules::cluster_merger::cluster_candidates;
use cone_vision::core_modules::cone_verifier::hull_corners;
use cone_vision::core_modules::hsv_pixel::HsvPixel;
use cone_vision::core_modules::mask::color_mask;
use cone_vision::core_modules::region_extractor::{Region, RegionKind};
use cone_vision::{BoundingBox, ColorRange, ConeDetector, DetectorConfig, HsvFrame, Point};
use proptest::prelude::*;

fn bbox_strategy() -> impl Strategy<Value = BoundingBox> {
    (0i32..200, 0i32..150, 1i32..60, 1i32..60).prop_map(|(x, y, w, h)| BoundingBox::new(x, y, w, h))
}

fn region(bbox: BoundingBox) -> Region {
    Region {
        kind: RegionKind::Outer,
        outline: Vec::new(),
        bounding_box: bbox,
    }
}

proptest! {
    #[test]
    fn test_color_mask_is_deterministic(
        bytes in prop::collection::vec(any::<u8>(), 8 * 6 * 3),
        hue in (0u8..180, 0u8..180),
        floor in (0u8..255, 0u8..255),
    ) {
        let frame = HsvFrame::from_rgb(&bytes, 8, 6).unwrap();
        let range = ColorRange::new(hue, (floor.0, 255), (floor.1, 255));
        let first = color_mask(&frame, &range);
        let second = color_mask(&frame, &range);
        prop_assert_eq!(&first, &second);
        for y in 0..6 {
            for x in 0..8 {
                prop_assert_eq!(first.get(x, y), range.contains(frame.pixel(x, y)));
            }
        }
    }

    #[test]
    fn test_wrapping_hue_is_a_union(hue in 0u8..180, min in 91u8..180, max in 0u8..90) {
        let range = ColorRange::new((min, max), (0, 255), (0, 255));
        let pixel = HsvPixel::new(hue, 128, 128);
        prop_assert_eq!(range.contains(pixel), hue >= min || hue <= max);
    }

    #[test]
    fn test_candidates_are_capped_and_inside_the_frame(
        boxes in prop::collection::vec(bbox_strategy(), 0..40),
        cap in 1usize..12,
        width in 50u32..320,
        height in 50u32..240,
    ) {
        let config = DetectorConfig { max_candidates: cap, ..DetectorConfig::default() };
        let regions: Vec<Region> = boxes.into_iter().map(region).collect();
        let candidates = select_candidates(&regions, width, height, &config);
        prop_assert!(candidates.len() <= cap);
        for candidate in &candidates {
            prop_assert!(candidate.fits_within(width, height), "{:?} outside {}x{}", candidate, width, height);
        }
    }

    #[test]
    fn test_clusters_do_not_depend_on_input_order(
        (boxes, shuffled) in prop::collection::vec(bbox_strategy(), 0..16)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let mut original: Vec<BoundingBox> =
            cluster_candidates(&boxes).into_iter().map(|c| c.enclosing_box).collect();
        let mut permuted: Vec<BoundingBox> =
            cluster_candidates(&shuffled).into_iter().map(|c| c.enclosing_box).collect();
        let key = |b: &BoundingBox| (b.x, b.y, b.width, b.height);
        original.sort_by_key(key);
        permuted.sort_by_key(key);
        prop_assert_eq!(original, permuted);
    }

    #[test]
    fn test_clusters_partition_the_candidates(boxes in prop::collection::vec(bbox_strategy(), 0..16)) {
        let clusters = cluster_candidates(&boxes);
        let mut members: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        members.sort_unstable();
        prop_assert_eq!(members, (0..boxes.len()).collect::<Vec<_>>());
        // Boxes in different clusters never overlap.
        for a in &clusters {
            for b in &clusters {
                if a.label == b.label {
                    continue;
                }
                for &i in &a.members {
                    for &j in &b.members {
                        prop_assert!(!boxes[i].intersects(&boxes[j]));
                    }
                }
            }
        }
    }

    #[test]
    fn test_hull_encloses_its_points(raw in prop::collection::vec((-50i32..50, -50i32..50), 3..40)) {
        let points: Vec<Point> = raw.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let hull = hull_corners(&points);
        for &p in &hull {
            prop_assert!(points.contains(&p));
        }
        let hull_box = BoundingBox::from_points(&hull).unwrap();
        prop_assert_eq!(Some(hull_box), BoundingBox::from_points(&points));
    }

    #[test]
    fn test_detections_lie_inside_the_frame(
        rects in prop::collection::vec((0u32..56, 0u32..40, 2u32..20, 2u32..30, 0usize..3), 0..4)
    ) {
        let palette = [[255u8, 210, 0], [0, 0, 255], [0, 0, 0]];
        let mut buffer = vec![128u8; 64 * 48 * 3];
        for (x0, y0, w, h, color) in rects {
            for y in y0..(y0 + h).min(48) {
                for x in x0..(x0 + w).min(64) {
                    let index = ((y * 64 + x) * 3) as usize;
                    buffer[index..index + 3].copy_from_slice(&palette[color]);
                }
            }
        }
        let frame = HsvFrame::from_rgb(&buffer, 64, 48).unwrap();
        let detector = ConeDetector::new(DetectorConfig::default()).unwrap();
        for detection in detector.detect(&frame).unwrap() {
            prop_assert!(detection.bounding_box.fits_within(64, 48));
            prop_assert!(detection.bounding_box.y >= 12);
        }
    }
}
