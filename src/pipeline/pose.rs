use serde::{Deserialize, Serialize};

/// Number of keypoints in the pose model's output.
pub const KEYPOINT_COUNT: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One labeled 2-D point with a confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub part: String,
    pub score: f64,
    pub position: Position,
}

/// A detected pose: an overall confidence score plus labeled keypoints.
///
/// Mirrors the JSON the export pipeline writes and the render pipeline
/// reads, so the two can be chained through the filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub score: f64,
    pub keypoints: Vec<Keypoint>,
}
