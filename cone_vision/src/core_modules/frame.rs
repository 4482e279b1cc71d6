// THEORY:
// The `HsvFrame` is the validated, color-converted image the detector works on.
// It is the only place where raw input is checked: once an `HsvFrame` exists it
// is guaranteed to have non-zero dimensions and exactly one `HsvPixel` per
// pixel, so the downstream stages never need to deal with malformed input.
//
// Acquisition collaborators hand over frames in different shapes (a raw RGBA
// buffer from a capture loop, a decoded `image` buffer from a file), so several
// constructors exist. They all convert to HSV once, up front; every mask the
// detector builds afterwards is a cheap per-pixel range test.
//
// Frames are also cropped: once to cut the operating zone out of the full frame
// and once per cluster box for verification. A crop is an owned copy, so it can
// be shared between worker tasks without lifetimes tying it to its parent.

use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::hsv_pixel::HsvPixel;
use crate::error::{DetectionError, Result};
use image::{DynamicImage, RgbImage};

const RGB_CHANNELS: usize = 3;
const RGBA_CHANNELS: usize = 4;

/// An image in 8-bit HSV, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsvFrame {
    width: u32,
    height: u32,
    pixels: Vec<HsvPixel>,
}

impl HsvFrame {
    /// Builds a frame from a packed RGB buffer (3 bytes per pixel).
    pub fn from_rgb(buffer: &[u8], width: u32, height: u32) -> Result<Self> {
        Self::from_packed(buffer, width, height, RGB_CHANNELS)
    }

    /// Builds a frame from a packed RGBA buffer (4 bytes per pixel). Alpha is ignored.
    pub fn from_rgba(buffer: &[u8], width: u32, height: u32) -> Result<Self> {
        Self::from_packed(buffer, width, height, RGBA_CHANNELS)
    }

    pub fn from_rgb_image(image: &RgbImage) -> Result<Self> {
        Self::from_rgb(image.as_raw(), image.width(), image.height())
    }

    /// Accepts any decoded image whose color model converts to RGB.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb_image(rgb),
            DynamicImage::ImageRgba8(rgba) => {
                Self::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            }
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => Err(DetectionError::UnsupportedLayout(format!(
                "{:?} carries no hue information",
                image.color()
            ))),
            other => Self::from_rgb_image(&other.to_rgb8()),
        }
    }

    fn from_packed(buffer: &[u8], width: u32, height: u32, channels: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DetectionError::EmptyFrame { width, height });
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| {
                DetectionError::UnsupportedLayout(format!("{width}x{height} frame is too large"))
            })?;
        if buffer.len() != expected {
            return Err(DetectionError::BufferSize {
                expected,
                actual: buffer.len(),
            });
        }

        let pixels = buffer.chunks_exact(channels).map(HsvPixel::from).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at (x, y). Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> HsvPixel {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn pixels(&self) -> &[HsvPixel] {
        &self.pixels
    }

    /// Copies the part of the frame covered by `bbox`. The box is clamped to the
    /// frame first; `None` when nothing is left.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<HsvFrame> {
        let area = bbox.clamp_to(self.width, self.height);
        if area.is_empty() {
            return None;
        }

        let (x0, y0) = (area.x as usize, area.y as usize);
        let (crop_width, crop_height) = (area.width as usize, area.height as usize);
        let mut pixels = Vec::with_capacity(crop_width * crop_height);
        for row in y0..y0 + crop_height {
            let start = row * self.width as usize + x0;
            pixels.extend_from_slice(&self.pixels[start..start + crop_width]);
        }

        Some(HsvFrame {
            width: crop_width as u32,
            height: crop_height as u32,
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbaImage};

    #[test]
    fn rejects_empty_dimensions() {
        let err = HsvFrame::from_rgb(&[], 0, 10).unwrap_err();
        assert_eq!(err, DetectionError::EmptyFrame { width: 0, height: 10 });
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let buffer = vec![0u8; 2 * 2 * 4 - 1];
        let err = HsvFrame::from_rgba(&buffer, 2, 2).unwrap_err();
        assert_eq!(err, DetectionError::BufferSize { expected: 16, actual: 15 });
    }

    #[test]
    fn converts_every_pixel() {
        let mut image = RgbImage::new(3, 2);
        image.put_pixel(2, 1, Rgb([0, 0, 255]));
        let frame = HsvFrame::from_rgb_image(&image).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixels().len(), 6);
        assert_eq!(frame.pixel(2, 1), HsvPixel::new(120, 255, 255));
        assert_eq!(frame.pixel(0, 0), HsvPixel::new(0, 0, 0));
    }

    #[test]
    fn rgba_and_rgb_agree() {
        let rgba = RgbaImage::from_pixel(4, 4, image::Rgba([255, 210, 0, 17]));
        let rgb = RgbImage::from_pixel(4, 4, Rgb([255, 210, 0]));
        let a = HsvFrame::from_dynamic_image(&DynamicImage::ImageRgba8(rgba)).unwrap();
        let b = HsvFrame::from_dynamic_image(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn grayscale_images_are_unsupported() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert!(matches!(
            HsvFrame::from_dynamic_image(&gray),
            Err(DetectionError::UnsupportedLayout(_))
        ));
    }

    #[test]
    fn crop_copies_the_requested_window() {
        let image = RgbImage::from_fn(10, 8, |x, y| Rgb([x as u8 * 20, y as u8 * 20, 0]));
        let frame = HsvFrame::from_rgb_image(&image).unwrap();
        let crop = frame.crop(&BoundingBox::new(2, 3, 4, 2)).unwrap();
        assert_eq!((crop.width(), crop.height()), (4, 2));
        assert_eq!(crop.pixel(0, 0), frame.pixel(2, 3));
        assert_eq!(crop.pixel(3, 1), frame.pixel(5, 4));
    }

    #[test]
    fn crop_clamps_and_rejects_empty() {
        let frame = HsvFrame::from_rgb_image(&RgbImage::new(10, 10)).unwrap();
        let crop = frame.crop(&BoundingBox::new(-5, 8, 8, 10)).unwrap();
        assert_eq!((crop.width(), crop.height()), (3, 2));
        assert!(frame.crop(&BoundingBox::new(20, 20, 5, 5)).is_none());
    }
}
