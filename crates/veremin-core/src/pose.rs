//! Pose input: keypoints, poses, and the limb chain sampled into the grid

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Joints traced across the body, in chain order
pub const LIMB_SEQUENCE: [&str; 6] = [
    "leftWrist",
    "leftElbow",
    "leftShoulder",
    "rightShoulder",
    "rightElbow",
    "rightWrist",
];

/// A named joint with a position in source-image pixels and a confidence score.
///
/// Deserializes from either the flat `{part, x, y, score}` shape or the nested
/// `{part, position: {x, y}, score}` shape; `name` is accepted for `part`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKeypoint")]
pub struct Keypoint {
    pub part: String,
    pub position: Point,
    pub score: f64,
}

#[derive(Deserialize)]
struct RawKeypoint {
    #[serde(alias = "name")]
    part: String,
    x: Option<f64>,
    y: Option<f64>,
    position: Option<Point>,
    #[serde(default)]
    score: f64,
}

impl TryFrom<RawKeypoint> for Keypoint {
    type Error = String;

    fn try_from(raw: RawKeypoint) -> Result<Self, Self::Error> {
        let position = match (raw.position, raw.x, raw.y) {
            (Some(p), _, _) => p,
            (None, Some(x), Some(y)) => Point::new(x, y),
            _ => return Err(format!("keypoint {} has no position", raw.part)),
        };
        Ok(Self {
            part: raw.part,
            position,
            score: raw.score,
        })
    }
}

impl Keypoint {
    pub fn new(part: &str, x: f64, y: f64, score: f64) -> Self {
        Self {
            part: part.to_string(),
            position: Point::new(x, y),
            score,
        }
    }
}

fn default_pose_score() -> f64 {
    1.0
}

/// One pose estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Overall pose confidence
    #[serde(default = "default_pose_score")]
    pub score: f64,
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { score: 1.0, keypoints }
    }

    /// First keypoint with the given part name
    pub fn keypoint(&self, part: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.part == part)
    }
}

/// Joint positions along [`LIMB_SEQUENCE`], skipping absent joints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimbChain {
    points: Vec<Point>,
}

impl LimbChain {
    /// Extract the chain in canonical order. A joint counts as present when it
    /// is listed, scores at least `min_score`, and has finite coordinates.
    pub fn from_pose(pose: &Pose, min_score: f64) -> Self {
        let points = LIMB_SEQUENCE
            .iter()
            .filter_map(|part| pose.keypoint(part))
            .filter(|k| k.score >= min_score && k.position.is_finite())
            .map(|k| k.position)
            .collect();
        Self { points }
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// Consecutive joint pairs
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}
