//! Tempo and musical duration conversion

use serde::{Deserialize, Serialize};

/// Musical note values used for step and loop lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteValue {
    Measure,
    Whole,
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Length in quarter notes (a measure depends on the time signature)
    fn quarters(&self, tempo: &Tempo) -> f64 {
        match self {
            Self::Measure => tempo.beats_per_measure as f64,
            Self::Whole => 4.0,
            Self::Half => 2.0,
            Self::Quarter => 1.0,
            Self::Eighth => 0.5,
            Self::Sixteenth => 0.25,
        }
    }

    pub fn to_secs(&self, tempo: &Tempo) -> f64 {
        self.quarters(tempo) * tempo.quarter_secs()
    }
}

/// Tempo and meter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tempo {
    /// Tempo in BPM (quarter notes per minute)
    pub bpm: f64,
    /// Time signature numerator, in quarter notes
    pub beats_per_measure: u8,
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_measure: 4,
        }
    }
}

impl Tempo {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            ..Default::default()
        }
    }

    /// Seconds per quarter note
    pub fn quarter_secs(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Seconds per measure
    pub fn measure_secs(&self) -> f64 {
        NoteValue::Measure.to_secs(self)
    }

    pub fn is_valid(&self) -> bool {
        self.bpm.is_finite() && self.bpm > 0.0 && self.beats_per_measure > 0
    }
}
