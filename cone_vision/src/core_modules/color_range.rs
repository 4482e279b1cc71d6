// THEORY:
// A `ColorRange` is the box in HSV space a pixel must fall into to count as a given
// marker color. Saturation and value are linear, so their tests are ordinary
// inclusive ranges. Hue is circular: a range whose `hue_min` is larger than its
// `hue_max` wraps through zero (reds and oranges sit on both sides of the seam).
// Such a range is evaluated as the union of two ordinary ranges,
// `[hue_min, top]` and `[0, hue_max]`, which never overlap.
//
// The five presets (yellow, blue, orange, black, white) and the three
// base/strip pairings the track uses are static data. They are bundled in a
// `ColorTable` that can be overridden through the config like any other tunable.

use crate::core_modules::hsv_pixel::HsvPixel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive HSV bounds for one marker color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorRange {
    pub hue_min: u8,
    pub hue_max: u8,
    pub saturation_min: u8,
    pub saturation_max: u8,
    pub value_min: u8,
    pub value_max: u8,
}

impl ColorRange {
    pub const fn new(
        hue: (u8, u8),
        saturation: (u8, u8),
        value: (u8, u8),
    ) -> Self {
        Self {
            hue_min: hue.0,
            hue_max: hue.1,
            saturation_min: saturation.0,
            saturation_max: saturation.1,
            value_min: value.0,
            value_max: value.1,
        }
    }

    /// True when the hue interval crosses the 0 seam of the color wheel.
    pub fn wraps_hue(&self) -> bool {
        self.hue_min > self.hue_max
    }

    pub fn contains(&self, pixel: HsvPixel) -> bool {
        let linear_channels = in_range(pixel.saturation, self.saturation_min, self.saturation_max)
            && in_range(pixel.value, self.value_min, self.value_max);
        if !linear_channels {
            return false;
        }

        if self.wraps_hue() {
            in_range(pixel.hue, self.hue_min, u8::MAX) || in_range(pixel.hue, 0, self.hue_max)
        } else {
            in_range(pixel.hue, self.hue_min, self.hue_max)
        }
    }
}

#[inline]
fn in_range(channel: u8, min: u8, max: u8) -> bool {
    channel >= min && channel <= max
}

/// Identifies one of the preset marker colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorId {
    Yellow,
    Blue,
    Orange,
    Black,
    White,
}

impl ColorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorId::Yellow => "yellow",
            ColorId::Blue => "blue",
            ColorId::Orange => "orange",
            ColorId::Black => "black",
            ColorId::White => "white",
        }
    }

    /// Dark strip colors pick up shadows and need shadow suppression.
    pub fn is_dark(&self) -> bool {
        matches!(self, ColorId::Black)
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The HSV range for every preset color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTable {
    pub yellow: ColorRange,
    pub blue: ColorRange,
    pub orange: ColorRange,
    pub black: ColorRange,
    pub white: ColorRange,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            yellow: ColorRange::new((20, 30), (100, 255), (100, 255)),
            blue: ColorRange::new((85, 128), (70, 255), (21, 255)),
            orange: ColorRange::new((167, 8), (40, 255), (137, 255)),
            black: ColorRange::new((0, 180), (0, 255), (0, 50)),
            white: ColorRange::new((0, 180), (0, 116), (190, 255)),
        }
    }
}

impl ColorTable {
    pub fn range(&self, color: ColorId) -> ColorRange {
        match color {
            ColorId::Yellow => self.yellow,
            ColorId::Blue => self.blue,
            ColorId::Orange => self.orange,
            ColorId::Black => self.black,
            ColorId::White => self.white,
        }
    }
}

/// A cone type: its body color and the color of the band painted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorFamily {
    pub base: ColorId,
    pub strip: ColorId,
}

impl ColorFamily {
    pub const YELLOW: ColorFamily = ColorFamily {
        base: ColorId::Yellow,
        strip: ColorId::Black,
    };
    pub const BLUE: ColorFamily = ColorFamily {
        base: ColorId::Blue,
        strip: ColorId::White,
    };
    pub const ORANGE: ColorFamily = ColorFamily {
        base: ColorId::Orange,
        strip: ColorId::White,
    };

    /// The three cone types found on a track, in processing order.
    pub fn defaults() -> Vec<ColorFamily> {
        vec![Self::YELLOW, Self::BLUE, Self::ORANGE]
    }

    /// The tag reported with detections of this family.
    pub fn tag(&self) -> ColorId {
        self.base
    }
}

impl fmt::Display for ColorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.strip)
    }
}
