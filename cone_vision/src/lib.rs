// THEORY:
// This file is the main entry point for the `cone_vision` library crate.
// It defines the public API exposed to consumers (the `visual_tester` harness,
// or a vehicle's perception node).
//
// The primary export is the `ConeDetector` (and its concurrent twin,
// `ParallelConeDetector`) together with `DetectorConfig`, `Detection` and
// `FrameReport`. The stages themselves live in `core_modules` and are public
// for testing and experimentation, but a consumer only needs the pipeline.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod overlay;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{DetectorConfig, MorphologyConfig, StructuringShape};
pub use core_modules::bounding_box::{BoundingBox, Point};
pub use core_modules::color_range::{ColorFamily, ColorId, ColorRange, ColorTable};
pub use core_modules::frame::HsvFrame;
pub use error::{DetectionError, Result};
pub use parallel_pipeline::ParallelConeDetector;
pub use pipeline::{ConeDetector, Detection, FamilyReport, FrameReport, detect_cones};
