//! Session configuration and validation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VereminError};
use crate::pitch::{deserialize_note, PitchLadder, DEFAULT_ROOT, DEFAULT_SCALE};
use crate::tempo::{NoteValue, Tempo};

/// Which playback path consumes the pose stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Poses are sampled into the notes grid and looped by the scheduler
    #[default]
    Sequencer,
    /// Wrist positions drive pitch and volume directly
    Continuous,
}

/// Grid sequencer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Length of one grid column
    pub step: NoteValue,
    /// Loop length in measures
    pub loop_measures: u32,
    /// Scale steps between adjacent pitch rows (repeating)
    pub scale: Vec<u8>,
    /// Pitch of the bottom row
    #[serde(deserialize_with = "deserialize_note")]
    pub root_note: u8,
    /// Number of pitch rows
    pub gamut: usize,
    /// Upper bound of the forward-only trigger jitter
    pub humanize_secs: f64,
    /// Source image width in pixels
    pub canvas_width: f64,
    /// Source image height in pixels
    pub canvas_height: f64,
    /// Lookahead polling interval
    pub scheduler_poll_ms: u64,
    /// Poses scoring below this are treated as absent
    pub min_pose_confidence: f64,
    /// Joints scoring below this are dropped from the limb chain
    pub min_part_confidence: f64,
    /// A pose older than this counts as lost tracking
    pub pose_timeout_ms: u64,
    /// Fixed seed for the humanize jitter
    pub seed: Option<u64>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            step: NoteValue::Quarter,
            loop_measures: 2,
            scale: DEFAULT_SCALE.to_vec(),
            root_note: DEFAULT_ROOT,
            gamut: 10,
            humanize_secs: 0.025,
            canvas_width: 300.0,
            canvas_height: 300.0,
            scheduler_poll_ms: 10,
            min_pose_confidence: 0.1,
            min_part_confidence: 0.1,
            pose_timeout_ms: 1000,
            seed: None,
        }
    }
}

/// Continuous-control settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousConfig {
    pub video_width: f64,
    pub video_height: f64,
    /// Margin around the play zones
    pub zone_offset: f64,
    /// Zone split as a fraction of the video width
    pub zone_width_ratio: f64,
    /// Zone height as a fraction of the video height
    pub zone_height_ratio: f64,
    /// Vertical range scale (1.0 = the whole zone)
    pub notes_range_scale: f64,
    /// Vertical range offset, 0..1 of the remaining zone
    pub notes_range_offset: f64,
    pub note_duration_ms: u64,
    /// Semitone intervals voiced on top of each note
    pub chord_intervals: Vec<i8>,
    /// Both wrists must score strictly above this
    pub min_part_confidence: f64,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            video_width: 300.0,
            video_height: 300.0,
            zone_offset: 10.0,
            zone_width_ratio: 0.5,
            zone_height_ratio: 0.7,
            notes_range_scale: 1.0,
            notes_range_offset: 0.0,
            note_duration_ms: 300,
            chord_intervals: Vec::new(),
            min_part_confidence: 0.1,
        }
    }
}

impl ContinuousConfig {
    pub fn zone_width(&self) -> f64 {
        self.video_width * self.zone_width_ratio
    }

    pub fn zone_height(&self) -> f64 {
        self.video_height * self.zone_height_ratio
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VereminConfig {
    pub mode: PlaybackMode,
    pub tempo: Tempo,
    pub sequencer: SequencerConfig,
    pub continuous: ContinuousConfig,
}

/// Durations derived from a validated config, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub step_secs: f64,
    pub loop_secs: f64,
    /// Grid columns per loop
    pub steps: usize,
    /// Sampler cadence (a quarter step)
    pub sample_interval_secs: f64,
    /// Scheduler lookahead polling interval
    pub poll_interval_secs: f64,
    /// Age at which the latest pose stops counting
    pub pose_timeout_secs: f64,
}

fn invalid(msg: impl Into<String>) -> VereminError {
    VereminError::InvalidConfig(msg.into())
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

impl VereminConfig {
    /// Validate every field and derive the loop timing
    pub fn validate(&self) -> Result<Timing> {
        if !self.tempo.is_valid() {
            return Err(invalid(format!(
                "tempo must have positive bpm and beats per measure, got {} bpm / {}",
                self.tempo.bpm, self.tempo.beats_per_measure
            )));
        }

        let seq = &self.sequencer;
        let step_secs = seq.step.to_secs(&self.tempo);
        if !(step_secs.is_finite() && step_secs > 0.0) {
            return Err(invalid(format!("step duration must be positive, got {step_secs}")));
        }
        if Duration::try_from_secs_f64(seq.loop_measures as f64 * self.tempo.measure_secs()).is_err() {
            return Err(invalid(format!("tempo of {} bpm is too slow to time", self.tempo.bpm)));
        }
        if seq.loop_measures == 0 {
            return Err(invalid("loop must span at least one measure"));
        }

        let loop_secs = seq.loop_measures as f64 * self.tempo.measure_secs();
        let ratio = loop_secs / step_secs;
        let steps = ratio.round();
        if steps < 1.0 || (ratio - steps).abs() > 1e-9 {
            return Err(invalid(format!(
                "loop of {loop_secs}s is not a whole number of {step_secs}s steps"
            )));
        }

        if seq.gamut == 0 {
            return Err(invalid("gamut must have at least one row"));
        }
        if seq.scale.is_empty() {
            return Err(invalid("scale must not be empty"));
        }
        if PitchLadder::new(seq.root_note, &seq.scale, seq.gamut).is_none() {
            return Err(invalid(format!(
                "{} rows from root {} exceed the MIDI range",
                seq.gamut, seq.root_note
            )));
        }
        if !(seq.humanize_secs.is_finite() && seq.humanize_secs >= 0.0) {
            return Err(invalid(format!("humanize must be non-negative, got {}", seq.humanize_secs)));
        }
        if seq.humanize_secs >= step_secs / 2.0 {
            return Err(invalid(format!(
                "humanize of {}s must stay below half a step ({}s)",
                seq.humanize_secs,
                step_secs / 2.0
            )));
        }
        if !(seq.canvas_width > 0.0 && seq.canvas_height > 0.0) {
            return Err(invalid(format!(
                "canvas must be positive, got {}x{}",
                seq.canvas_width, seq.canvas_height
            )));
        }
        if seq.scheduler_poll_ms == 0 {
            return Err(invalid("scheduler poll interval must be positive"));
        }
        if seq.pose_timeout_ms == 0 {
            return Err(invalid("pose timeout must be positive"));
        }
        check_unit("min_pose_confidence", seq.min_pose_confidence)?;
        check_unit("min_part_confidence", seq.min_part_confidence)?;

        let cont = &self.continuous;
        if !(cont.video_width > 0.0 && cont.video_height > 0.0) {
            return Err(invalid("continuous video size must be positive"));
        }
        if !(cont.zone_width() > 0.0 && cont.zone_height() > cont.zone_offset) {
            return Err(invalid("continuous play zones are empty"));
        }
        if !(cont.notes_range_scale.is_finite() && cont.notes_range_scale > 0.0) {
            return Err(invalid("notes_range_scale must be positive"));
        }
        check_unit("notes_range_offset", cont.notes_range_offset)?;
        check_unit("continuous min_part_confidence", cont.min_part_confidence)?;

        Ok(Timing {
            step_secs,
            loop_secs,
            steps: steps as usize,
            sample_interval_secs: step_secs / 4.0,
            poll_interval_secs: seq.scheduler_poll_ms as f64 / 1000.0,
            pose_timeout_secs: seq.pose_timeout_ms as f64 / 1000.0,
        })
    }
}
