//! Notes grid and notes-played ledger, both `steps x gamut`

use serde::{Deserialize, Serialize};

/// On/off cells for one loop: columns are steps, rows are pitches (row 0 on top)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesGrid {
    steps: usize,
    gamut: usize,
    cells: Vec<bool>,
}

impl NotesGrid {
    /// All cells off
    pub fn empty(steps: usize, gamut: usize) -> Self {
        Self {
            steps,
            gamut,
            cells: vec![false; steps * gamut],
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn gamut(&self) -> usize {
        self.gamut
    }

    pub fn is_on(&self, column: usize, row: usize) -> bool {
        column < self.steps && row < self.gamut && self.cells[column * self.gamut + row]
    }

    pub fn set(&mut self, column: usize, row: usize, on: bool) {
        if column < self.steps && row < self.gamut {
            self.cells[column * self.gamut + row] = on;
        }
    }

    /// Rows of one column, or `None` past the last step
    pub fn column(&self, column: usize) -> Option<&[bool]> {
        if column >= self.steps {
            return None;
        }
        let start = column * self.gamut;
        Some(&self.cells[start..start + self.gamut])
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&on| on).count()
    }

    pub fn is_silent(&self) -> bool {
        !self.cells.contains(&true)
    }

}

/// Last trigger time per cell, for visualizers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesPlayedLedger {
    steps: usize,
    gamut: usize,
    times: Vec<Option<f64>>,
}

impl NotesPlayedLedger {
    pub fn new(steps: usize, gamut: usize) -> Self {
        Self {
            steps,
            gamut,
            times: vec![None; steps * gamut],
        }
    }

    pub fn record(&mut self, column: usize, row: usize, at: f64) {
        if column < self.steps && row < self.gamut {
            self.times[column * self.gamut + row] = Some(at);
        }
    }

    pub fn last_played(&self, column: usize, row: usize) -> Option<f64> {
        if column < self.steps && row < self.gamut {
            return self.times[column * self.gamut + row];
        }
        None
    }

    /// Fade value in 0..=1: 1 at the trigger time, falling linearly to 0 after
    /// `fade_secs`. Cells never played or not yet sounding read 0.
    pub fn intensity(&self, column: usize, row: usize, now: f64, fade_secs: f64) -> f64 {
        let Some(at) = self.last_played(column, row) else {
            return 0.0;
        };
        let age = now - at;
        if age < 0.0 || fade_secs <= 0.0 {
            return 0.0;
        }
        (1.0 - age / fade_secs).max(0.0)
    }

    pub fn clear(&mut self) {
        self.times.fill(None);
    }
}
