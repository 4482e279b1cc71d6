pub mod bounding_box;
pub mod candidate_selector;
pub mod cluster_merger;
pub mod color_range;
pub mod cone_verifier;
pub mod frame;
pub mod hsv_pixel;
pub mod mask;
pub mod region_extractor;
