//! Continuous control: wrist positions mapped straight to pitch and volume
//!
//! The video frame is split into two play zones. The right wrist's height in
//! the right zone picks the pitch; the left wrist's horizontal reach in the
//! left zone sets the volume.

use crate::config::ContinuousConfig;
use crate::pose::{Keypoint, Pose};
use crate::sink::ContinuousNote;

/// Normalized wrist position; 0 means outside the zone
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZonePosition {
    pub vertical: f64,
    pub horizontal: f64,
}

/// Both wrists, normalized
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WristPositions {
    pub left: ZonePosition,
    pub right: ZonePosition,
}

/// Where `value` sits between `low` (0) and `high` (1)
pub fn percentage(value: f64, low: f64, high: f64) -> f64 {
    let value = if value.is_nan() { 0.0 } else { value };
    let low = if low.is_nan() { 0.0 } else { low };
    let high = if high.is_nan() { value + 1.0 } else { high };
    if high == low {
        return 0.0;
    }
    (value - low) / (high - low)
}

#[derive(Debug, Clone)]
pub struct ContinuousController {
    config: ContinuousConfig,
}

impl ContinuousController {
    pub fn new(config: ContinuousConfig) -> Self {
        Self { config }
    }

    /// Top edge of the vertical note range
    fn top_offset(&self) -> f64 {
        let zone_height = self.config.zone_height();
        zone_height - zone_height * self.config.notes_range_scale + self.config.zone_offset
    }

    fn notes_offset(&self) -> f64 {
        (self.config.zone_height() - self.top_offset()) * self.config.notes_range_offset
    }

    pub fn normalize(&self, left_wrist: &Keypoint, right_wrist: &Keypoint) -> WristPositions {
        let cfg = &self.config;
        let left = left_wrist.position;
        let right = right_wrist.position;

        let left_edge = cfg.zone_offset;
        let split = cfg.zone_width();
        let right_edge = cfg.video_width - cfg.zone_offset;
        let zone_height = cfg.zone_height();
        let notes_offset = self.notes_offset();
        let top_edge = self.top_offset() + notes_offset;
        let bottom_edge = zone_height + notes_offset;
        let in_band = |y: f64| y <= zone_height && y >= cfg.zone_offset;

        let mut positions = WristPositions::default();
        if right.x >= split && right.x <= right_edge {
            positions.right.horizontal = percentage(right.x, split, right_edge);
        }
        if in_band(right.y) {
            positions.right.vertical = percentage(right.y, bottom_edge, top_edge);
        }
        if left.x >= left_edge && left.x <= split {
            positions.left.horizontal = percentage(left.x, split / 1.5, left_edge) * 0.9;
        }
        if in_band(left.y) {
            positions.left.vertical = percentage(left.y, zone_height, cfg.zone_offset);
        }
        positions
    }

    /// Map a pose to a control update; silence unless both wrists are
    /// confidently inside their zones
    pub fn process(&self, pose: Option<&Pose>) -> ContinuousNote {
        let Some(pose) = pose else {
            return ContinuousNote::silence();
        };
        let min = self.config.min_part_confidence;
        let (Some(left), Some(right)) = (pose.keypoint("leftWrist"), pose.keypoint("rightWrist")) else {
            return ContinuousNote::silence();
        };
        if left.score <= min || right.score <= min {
            return ContinuousNote::silence();
        }

        let position = self.normalize(left, right);
        if position.right.vertical > 0.0 && position.left.horizontal > 0.0 {
            return ContinuousNote {
                vertical: position.right.vertical,
                horizontal: position.left.horizontal,
                duration_ms: self.config.note_duration_ms,
                chord_intervals: self.config.chord_intervals.clone(),
            };
        }
        ContinuousNote::silence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(left: (f64, f64), right: (f64, f64), score: f64) -> Pose {
        Pose::new(vec![
            Keypoint::new("leftWrist", left.0, left.1, score),
            Keypoint::new("rightWrist", right.0, right.1, score),
        ])
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(5.0, 0.0, 10.0), 0.5);
        assert_eq!(percentage(2.0, 10.0, 0.0), 0.8);
        assert_eq!(percentage(3.0, 3.0, 3.0), 0.0);
        assert_eq!(percentage(f64::NAN, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_plays_inside_zones() {
        let controller = ContinuousController::new(ContinuousConfig::default());
        // zones: split at x=150, vertical band 10..210
        let note = controller.process(Some(&pose((40.0, 100.0), (200.0, 60.0), 0.9)));

        assert!(!note.is_silence());
        // right wrist: (60 - 210) / (10 - 210)
        assert!((note.vertical - 0.75).abs() < 1e-12);
        // left wrist: (40 - 100) / (10 - 100) * 0.9
        assert!((note.horizontal - 0.6).abs() < 1e-12);
        assert_eq!(note.duration_ms, 300);
    }

    #[test]
    fn test_silence_outside_zones() {
        let controller = ContinuousController::new(ContinuousConfig::default());
        // right wrist below the band
        assert!(controller.process(Some(&pose((40.0, 100.0), (200.0, 250.0), 0.9))).is_silence());
        // left wrist past the horizontal sweet spot reads negative
        assert!(controller.process(Some(&pose((140.0, 100.0), (200.0, 60.0), 0.9))).is_silence());
    }

    #[test]
    fn test_silence_on_low_confidence_or_no_pose() {
        let controller = ContinuousController::new(ContinuousConfig::default());
        assert!(controller.process(Some(&pose((40.0, 100.0), (200.0, 60.0), 0.1))).is_silence());
        assert!(controller.process(None).is_silence());
        assert!(controller.process(Some(&Pose::new(vec![]))).is_silence());
    }

    #[test]
    fn test_range_scale_narrows_pitch_band() {
        let config = ContinuousConfig {
            notes_range_scale: 0.5,
            chord_intervals: vec![0, 3, 7],
            ..Default::default()
        };
        let controller = ContinuousController::new(config);
        // top edge moves down to 210 - 105 + 10 = 115
        let note = controller.process(Some(&pose((40.0, 100.0), (200.0, 115.0), 0.9)));
        assert!((note.vertical - 1.0).abs() < 1e-12);
        assert_eq!(note.chord_intervals, vec![0, 3, 7]);
    }
}
