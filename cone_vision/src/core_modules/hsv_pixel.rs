// THEORY (HSV Pixel):
// The `HsvPixel` is the most fundamental unit of the detector. It is a "dumb" data
// container for a single pixel expressed in a cylindrical color space, plus the
// conversion from the RGB bytes handed over by the acquisition side.
//
// The byte layout follows the 8-bit HSV convention used by most camera tooling:
// - hue:        [0, 180), i.e. degrees halved so a full turn fits in one byte.
//               Hue is circular: 179 and 0 are neighbors.
// - saturation: [0, 255], chroma relative to value.
// - value:      [0, 255], the maximum of the three RGB channels.
//
// Key principles:
// 1) Single-pixel scope: the conversion never reads neighbors.
// 2) Gray pixels (zero chroma) get hue 0 and saturation 0, so any range that
//    requires saturation rejects them regardless of hue.

use image::Rgb;

pub type Hue = u8;
pub type Saturation = u8;
pub type Value = u8;

/// Number of distinct hue steps in one full turn of the color wheel.
pub const HUE_PERIOD: u16 = 180;

/// A single pixel in 8-bit HSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HsvPixel {
    /// Hue in half-degrees, [0, 180).
    pub hue: Hue,
    /// Saturation, [0, 255].
    pub saturation: Saturation,
    /// Value (brightness), [0, 255].
    pub value: Value,
}

impl HsvPixel {
    pub fn new(hue: Hue, saturation: Saturation, value: Value) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Converts an RGB triple into 8-bit HSV.
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        let max = red.max(green).max(blue);
        let min = red.min(green).min(blue);
        let chroma = (max - min) as f32;

        if max == 0 || chroma == 0.0 {
            return Self::new(0, 0, max);
        }

        let saturation = (chroma * 255.0 / max as f32).round() as u8;

        let (r, g, b) = (red as f32, green as f32, blue as f32);
        let mut degrees = if max == red {
            60.0 * (g - b) / chroma
        } else if max == green {
            120.0 + 60.0 * (b - r) / chroma
        } else {
            240.0 + 60.0 * (r - g) / chroma
        };
        if degrees < 0.0 {
            degrees += 360.0;
        }

        // Halve into the byte range; 359.x degrees rounds up to a full turn, i.e. 0.
        let hue = ((degrees / 2.0).round() as u16 % HUE_PERIOD) as u8;

        Self::new(hue, saturation, max)
    }
}

impl From<Rgb<u8>> for HsvPixel {
    fn from(pixel: Rgb<u8>) -> Self {
        let [red, green, blue] = pixel.0;
        HsvPixel::from_rgb(red, green, blue)
    }
}

impl From<&[u8]> for HsvPixel {
    /// Reads the first three bytes as R, G, B. Extra bytes (alpha) are ignored.
    fn from(bytes: &[u8]) -> Self {
        HsvPixel::from_rgb(bytes[0], bytes[1], bytes[2])
    }
}
