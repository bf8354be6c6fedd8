//! The two item transforms the scheduler runs: pose export (image to JSON)
//! and frame rendering (JSON to image).

pub mod export;
pub mod pose;
pub mod render;

pub use export::{CommandEstimator, PoseEstimator, PoseExportTransform};
pub use pose::{Keypoint, Pose, Position};
pub use render::{FrameFormat, FrameRenderTransform, RenderSettings};
