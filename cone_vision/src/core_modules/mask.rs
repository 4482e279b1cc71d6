// THEORY:
// A `Mask` is a binary image: `true` marks a foreground pixel. Masks are produced
// fresh by every threshold and morphology call and are never mutated in place by
// anyone but their owner, so stages can be reasoned about as pure functions.
//
// Two families of operations live here:
// 1.  **Color thresholding** (`color_mask`): a per-pixel `ColorRange` test over an
//     `HsvFrame`. Wrap-around hue handling is delegated to `ColorRange::contains`.
// 2.  **Morphology** (`Mask::close`): dilation followed by erosion with a small
//     structuring element, run by `imageproc::morphology::grayscale_close` on a
//     0/255 gray copy of the mask. Closing bridges gaps narrower than the element
//     and fills pinholes without growing the outer silhouette. imageproc ignores
//     pixels outside the image in both passes, so shapes touching the crop border
//     are not eaten away.

use crate::config::{MorphologyConfig, StructuringShape};
use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::color_range::ColorRange;
use crate::core_modules::frame::HsvFrame;
use image::{GrayImage, Luma};
use imageproc::morphology::{self, grayscale_close};

/// A 2-D grid of booleans, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let index = self.index(x, y);
        self.data[index] = value;
    }

    /// True when no pixel is foreground.
    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&on| on)
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&on| on).count()
    }

    /// Pixel-wise OR of two masks of identical size.
    pub fn union(&self, other: &Mask) -> Mask {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "mask union requires equal dimensions"
        );
        Mask {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| a || b).collect(),
        }
    }

    /// Switches off every pixel inside `bbox` (clamped to the mask).
    pub fn clear_box(&mut self, bbox: &BoundingBox) {
        let area = bbox.clamp_to(self.width, self.height);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set(x as u32, y as u32, false);
            }
        }
    }

    /// Foreground as 255, background as 0.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { u8::MAX } else { 0 }])
        })
    }

    /// Morphological closing: dilation followed by erosion.
    pub fn close(&self, element: &StructuringElement) -> Mask {
        if self.width == 0 || self.height == 0 {
            return self.clone();
        }
        let closed = grayscale_close(&self.to_gray_image(), &element.kernel());
        Mask {
            width: self.width,
            height: self.height,
            data: closed.pixels().map(|p| p[0] != 0).collect(),
        }
    }
}

/// Thresholds `frame` against `range`.
pub fn color_mask(frame: &HsvFrame, range: &ColorRange) -> Mask {
    Mask {
        width: frame.width(),
        height: frame.height(),
        data: frame.pixels().iter().map(|&pixel| range.contains(pixel)).collect(),
    }
}

/// A symmetric, centered kernel stored as the list of its "on" offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    radius: u32,
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    pub fn from_config(config: &MorphologyConfig) -> Self {
        match config.shape {
            StructuringShape::Rectangle => Self::rectangle(config.radius),
            StructuringShape::Cross => Self::cross(config.radius),
            StructuringShape::Ellipse => Self::ellipse(config.radius),
        }
    }

    pub fn rectangle(radius: u32) -> Self {
        let r = radius as i32;
        let offsets = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .collect();
        Self { radius, offsets }
    }

    pub fn cross(radius: u32) -> Self {
        let r = radius as i32;
        let mut offsets: Vec<(i32, i32)> = (-r..=r).map(|dx| (dx, 0)).collect();
        offsets.extend((-r..=r).filter(|&dy| dy != 0).map(|dy| (0, dy)));
        Self { radius, offsets }
    }

    /// Ellipse inscribed in the `(2r + 1)` square: each row spans
    /// `round(r * sqrt(1 - dy^2 / r^2))` columns either side of the center.
    pub fn ellipse(radius: u32) -> Self {
        let r = radius as i32;
        if r == 0 {
            return Self {
                radius,
                offsets: vec![(0, 0)],
            };
        }

        let r_f = r as f64;
        let mut offsets = Vec::new();
        for dy in -r..=r {
            let span = (r_f * (1.0 - (dy * dy) as f64 / (r_f * r_f)).sqrt()).round() as i32;
            offsets.extend((-span..=span).map(|dx| (dx, dy)));
        }
        Self { radius, offsets }
    }

    /// The element as an imageproc mask centered on `(radius, radius)`.
    /// `DetectorConfig::validate` keeps the radius within what imageproc accepts.
    fn kernel(&self) -> morphology::Mask {
        let side = 2 * self.radius + 1;
        let r = self.radius as i32;
        let mut image = GrayImage::new(side, side);
        for &(dx, dy) in &self.offsets {
            image.put_pixel((dx + r) as u32, (dy + r) as u32, Luma([u8::MAX]));
        }
        morphology::Mask::from_image(&image, self.radius as u8, self.radius as u8)
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::hsv_pixel::HsvPixel;
    use image::{Rgb, RgbImage};

    fn frame_from_hues(hues: &[u8]) -> HsvFrame {
        // Build RGB pixels whose HSV hue is exactly the requested value by going
        // through a single-row frame of pure, fully saturated colors.
        let image = RgbImage::from_fn(hues.len() as u32, 1, |x, _| {
            let degrees = hues[x as usize] as f32 * 2.0;
            Rgb(hue_to_rgb(degrees))
        });
        HsvFrame::from_rgb_image(&image).unwrap()
    }

    fn hue_to_rgb(degrees: f32) -> [u8; 3] {
        let sector = (degrees / 60.0).floor() as i32 % 6;
        let fraction = degrees / 60.0 - (degrees / 60.0).floor();
        let rising = (255.0 * fraction).round() as u8;
        let falling = 255 - rising;
        match sector {
            0 => [255, rising, 0],
            1 => [falling, 255, 0],
            2 => [0, 255, rising],
            3 => [0, falling, 255],
            4 => [rising, 0, 255],
            _ => [255, 0, falling],
        }
    }

    #[test]
    fn wrap_boundary_pixel_is_foreground() {
        let frame = frame_from_hues(&[0, 90]);
        assert_eq!(frame.pixel(0, 0).hue, 0);
        assert_eq!(frame.pixel(1, 0).hue, 90);

        let range = ColorRange::new((170, 10), (0, 255), (0, 255));
        let mask = color_mask(&frame, &range);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn color_mask_is_deterministic() {
        let frame = frame_from_hues(&[0, 15, 25, 60, 120, 175]);
        let range = ColorRange::new((20, 30), (100, 255), (100, 255));
        assert_eq!(color_mask(&frame, &range), color_mask(&frame, &range));
        let mask = color_mask(&frame, &range);
        assert_eq!(mask.count(), 1);
        assert!(mask.get(2, 0));
    }

    #[test]
    fn union_and_clear() {
        let a = Mask::from_fn(4, 4, |x, _| x == 0);
        let b = Mask::from_fn(4, 4, |_, y| y == 0);
        let mut both = a.union(&b);
        assert_eq!(both.count(), 7);
        both.clear_box(&BoundingBox::new(0, 0, 2, 2));
        assert_eq!(both.count(), 4);
        assert!(!Mask::new(3, 3).get(1, 1));
        assert!(Mask::new(3, 3).is_empty());
    }

    #[test]
    fn ellipse_matches_reference_kernel() {
        // 5x5 ellipse: a single pixel on the top and bottom rows, full rows in between.
        let element = StructuringElement::ellipse(2);
        assert_eq!(element.offsets().len(), 1 + 5 + 5 + 5 + 1);
        assert!(element.offsets().contains(&(0, -2)));
        assert!(!element.offsets().contains(&(1, -2)));
        assert!(element.offsets().contains(&(-2, -1)));
        assert_eq!(StructuringElement::ellipse(0).offsets(), &[(0, 0)]);
    }

    #[test]
    fn rectangle_and_cross_kernels() {
        assert_eq!(StructuringElement::rectangle(1).offsets().len(), 9);
        assert_eq!(StructuringElement::cross(2).offsets().len(), 9);
    }

    #[test]
    fn closing_bridges_a_narrow_gap() {
        // Two bars separated by a 3-pixel gap.
        let mask = Mask::from_fn(20, 9, |x, y| (2..=6).contains(&y) && x != 9 && x != 10 && x != 11);
        let closed = mask.close(&StructuringElement::ellipse(2));
        for x in 9..=11 {
            assert!(closed.get(x, 4), "gap column {x} not bridged");
        }
    }

    #[test]
    fn closing_fills_pinholes_without_growing() {
        let mut mask = Mask::from_fn(12, 12, |x, y| (3..9).contains(&x) && (3..9).contains(&y));
        mask.set(5, 5, false);
        let closed = mask.close(&StructuringElement::ellipse(2));
        assert!(closed.get(5, 5));
        assert!(!closed.get(2, 5));
        assert!(!closed.get(5, 9));
        assert_eq!(closed.count(), 36);
    }

    #[test]
    fn closing_keeps_shapes_on_the_border() {
        let mask = Mask::from_fn(10, 10, |x, _| x < 4);
        let closed = mask.close(&StructuringElement::ellipse(2));
        assert_eq!(closed, mask);
    }

    #[test]
    fn gray_copy_marks_foreground_as_white() {
        let mask = Mask::from_fn(3, 2, |x, y| x == y);
        let gray = mask.to_gray_image();
        assert_eq!(gray.get_pixel(1, 1)[0], 255);
        assert_eq!(gray.get_pixel(2, 0)[0], 0);
        assert_eq!(Mask::new(0, 4).close(&StructuringElement::ellipse(2)), Mask::new(0, 4));
    }

    #[test]
    fn hsv_pixels_round_trip_through_helper() {
        let frame = frame_from_hues(&[45]);
        assert_eq!(frame.pixel(0, 0), HsvPixel::new(45, 255, 255));
    }
}
