//! Motion sampler: rasterizes the limb chain into a fresh notes grid

use std::sync::Arc;

use crate::config::{SequencerConfig, Timing};
use crate::geometry::{segment_hits_cell, Rect};
use crate::grid::NotesGrid;
use crate::pose::{LimbChain, Pose};

/// Light every cell whose edges any chain segment crosses.
///
/// The canvas is split into `steps` columns and `gamut` rows. Zero-length
/// segments are skipped; chains shorter than two joints light nothing.
pub fn rasterize(chain: &LimbChain, steps: usize, gamut: usize, width: f64, height: f64) -> NotesGrid {
    let mut grid = NotesGrid::empty(steps, gamut);
    if chain.len() < 2 || steps == 0 || gamut == 0 {
        return grid;
    }

    let note_width = width / steps as f64;
    let note_height = height / gamut as f64;
    let segments: Vec<_> = chain.segments().filter(|(a, b)| a != b).collect();

    for column in 0..steps {
        let x = column as f64 * note_width;
        for row in 0..gamut {
            let cell = Rect::new(x, row as f64 * note_height, note_width, note_height);
            if segments.iter().any(|(a, b)| segment_hits_cell(*a, *b, &cell)) {
                grid.set(column, row, true);
            }
        }
    }
    grid
}

/// Sole writer of the notes grid and the active flag
#[derive(Debug)]
pub struct MotionSampler {
    steps: usize,
    gamut: usize,
    canvas_width: f64,
    canvas_height: f64,
    min_pose_confidence: f64,
    min_part_confidence: f64,
    grid: Arc<NotesGrid>,
    active: bool,
}

impl MotionSampler {
    pub fn new(config: &SequencerConfig, timing: &Timing) -> Self {
        Self {
            steps: timing.steps,
            gamut: config.gamut,
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            min_pose_confidence: config.min_pose_confidence,
            min_part_confidence: config.min_part_confidence,
            grid: Arc::new(NotesGrid::empty(timing.steps, config.gamut)),
            active: false,
        }
    }

    /// Resample from the latest pose.
    ///
    /// With a usable pose the grid is rebuilt and swapped in whole. Without one
    /// (absent, or scoring under the pose threshold) the sampler goes inactive
    /// and the previous grid stays in place.
    pub fn sample(&mut self, pose: Option<&Pose>) -> Arc<NotesGrid> {
        let pose = pose.filter(|p| p.score >= self.min_pose_confidence);
        let Some(pose) = pose else {
            self.active = false;
            return self.grid.clone();
        };

        self.active = true;
        let chain = LimbChain::from_pose(pose, self.min_part_confidence);
        let grid = rasterize(&chain, self.steps, self.gamut, self.canvas_width, self.canvas_height);
        self.grid = Arc::new(grid);
        self.grid.clone()
    }

    pub fn grid(&self) -> &Arc<NotesGrid> {
        &self.grid
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::pose::Keypoint;

    fn sampler(width: f64, height: f64, steps: usize) -> MotionSampler {
        let config = SequencerConfig {
            canvas_width: width,
            canvas_height: height,
            ..Default::default()
        };
        let timing = Timing {
            step_secs: 0.5,
            loop_secs: 0.5 * steps as f64,
            steps,
            sample_interval_secs: 0.125,
            poll_interval_secs: 0.01,
            pose_timeout_secs: 1.0,
        };
        MotionSampler::new(&config, &timing)
    }

    fn wrists_pose() -> Pose {
        Pose::new(vec![
            Keypoint::new("leftWrist", 10.0, 10.0, 0.9),
            Keypoint::new("rightWrist", 90.0, 10.0, 0.9),
        ])
    }

    #[test]
    fn test_short_chains_are_silent() {
        for points in [vec![], vec![Point::new(50.0, 50.0)]] {
            let grid = rasterize(&LimbChain::from_points(points), 8, 10, 100.0, 100.0);
            assert!(grid.is_silent());
            assert_eq!(grid.steps(), 8);
            assert_eq!(grid.gamut(), 10);
        }
    }

    #[test]
    fn test_segment_on_canvas_top_lights_first_row() {
        let chain = LimbChain::from_points(vec![Point::new(10.0, 0.0), Point::new(90.0, 0.0)]);
        let grid = rasterize(&chain, 8, 10, 100.0, 100.0);
        for column in 0..8 {
            assert!(grid.is_on(column, 0), "column {column}");
            assert!(!grid.is_on(column, 1), "column {column}");
        }
        assert_eq!(grid.active_count(), 8);
    }

    #[test]
    fn test_zero_length_segment_is_skipped() {
        let same = Point::new(33.0, 47.0);
        let grid = rasterize(&LimbChain::from_points(vec![same, same]), 8, 10, 100.0, 100.0);
        assert!(grid.is_silent());
    }

    #[test]
    fn test_wrists_light_top_row() {
        let mut sampler = sampler(100.0, 100.0, 8);
        let grid = sampler.sample(Some(&wrists_pose()));

        assert!(sampler.is_active());
        for column in 0..8 {
            assert!(grid.is_on(column, 0), "column {column}");
            for row in 1..10 {
                assert!(!grid.is_on(column, row), "column {column} row {row}");
            }
        }
    }

    #[test]
    fn test_diagonal_is_connected_staircase() {
        let chain = LimbChain::from_points(vec![Point::new(0.0, 0.0), Point::new(100.0, 100.0)]);
        let grid = rasterize(&chain, 8, 10, 100.0, 100.0);

        let mut previous: Option<(usize, usize)> = None;
        for column in 0..8 {
            let rows: Vec<usize> = (0..10).filter(|&r| grid.is_on(column, r)).collect();
            assert!(!rows.is_empty(), "gap at column {column}");
            let (lo, hi) = (rows[0], rows[rows.len() - 1]);
            assert_eq!(hi - lo + 1, rows.len(), "rows not contiguous at column {column}");
            if let Some((prev_lo, prev_hi)) = previous {
                assert!(lo >= prev_lo, "staircase went up at column {column}");
                assert!(lo <= prev_hi + 1, "gap between columns at {column}");
            }
            previous = Some((lo, hi));
        }
        assert!(grid.is_on(0, 0));
        assert!(grid.is_on(7, 9));
    }

    #[test]
    fn test_same_pose_same_grid() {
        let mut sampler = sampler(100.0, 100.0, 8);
        let pose = Pose::new(vec![
            Keypoint::new("leftWrist", 12.0, 80.0, 0.9),
            Keypoint::new("leftElbow", 30.0, 55.0, 0.9),
            Keypoint::new("leftShoulder", 40.0, 30.0, 0.9),
            Keypoint::new("rightShoulder", 60.0, 30.0, 0.9),
            Keypoint::new("rightElbow", 72.0, 50.0, 0.9),
            Keypoint::new("rightWrist", 95.0, 20.0, 0.9),
        ]);
        let first = sampler.sample(Some(&pose));
        let second = sampler.sample(Some(&pose));
        assert_eq!(*first, *second);
        assert!(!first.is_silent());
    }

    #[test]
    fn test_lost_pose_keeps_grid() {
        let mut sampler = sampler(100.0, 100.0, 8);
        let lit = sampler.sample(Some(&wrists_pose()));

        let kept = sampler.sample(None);
        assert!(!sampler.is_active());
        assert_eq!(*kept, *lit);

        let mut weak = wrists_pose();
        weak.score = 0.05;
        sampler.sample(Some(&weak));
        assert!(!sampler.is_active());
        assert_eq!(**sampler.grid(), *lit);
    }

    #[test]
    fn test_empty_pose_clears_grid() {
        let mut sampler = sampler(100.0, 100.0, 8);
        sampler.sample(Some(&wrists_pose()));
        let grid = sampler.sample(Some(&Pose::new(vec![])));
        assert!(sampler.is_active());
        assert!(grid.is_silent());
    }
}
