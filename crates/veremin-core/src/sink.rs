//! Outputs handed to the external sound engine

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VereminError};

/// A grid note with its absolute trigger time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNote {
    /// MIDI pitch
    pub pitch: u8,
    pub frequency: f64,
    pub column: usize,
    pub row: usize,
    /// Clock time, in seconds
    pub at: f64,
}

/// A continuous-control update; `vertical` maps to pitch, `horizontal` to volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousNote {
    pub vertical: f64,
    pub horizontal: f64,
    pub duration_ms: u64,
    pub chord_intervals: Vec<i8>,
}

impl ContinuousNote {
    pub fn silence() -> Self {
        Self {
            vertical: 0.0,
            horizontal: 0.0,
            duration_ms: 0,
            chord_intervals: Vec::new(),
        }
    }

    pub fn is_silence(&self) -> bool {
        self.vertical == 0.0 && self.horizontal == 0.0
    }
}

/// Fire-and-forget note triggers. `at` may already be at or slightly behind now.
pub trait NoteSink: Send {
    fn trigger_note(&mut self, note: &ScheduledNote) -> Result<()>;
}

/// Continuous-control output
pub trait ControlSink: Send {
    fn play_note(&mut self, note: &ContinuousNote) -> Result<()>;
}

/// Everything sent to a sink, in arrival order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputEvent {
    Trigger(ScheduledNote),
    Control(ContinuousNote),
}

/// Collects output in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<OutputEvent>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call fail after recording
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut f) = self.fail.lock() {
            *f = fail;
        }
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn triggers(&self) -> Vec<ScheduledNote> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Trigger(n) => Some(n),
                OutputEvent::Control(_) => None,
            })
            .collect()
    }

    pub fn controls(&self) -> Vec<ContinuousNote> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Control(n) => Some(n),
                OutputEvent::Trigger(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut e) = self.events.lock() {
            e.clear();
        }
    }

    fn push(&self, event: OutputEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| VereminError::Sink("recording buffer poisoned".into()))?
            .push(event);
        if self.fail.lock().map(|f| *f).unwrap_or(false) {
            return Err(VereminError::Sink("recording sink set to fail".into()));
        }
        Ok(())
    }
}

impl NoteSink for RecordingSink {
    fn trigger_note(&mut self, note: &ScheduledNote) -> Result<()> {
        self.push(OutputEvent::Trigger(*note))
    }
}

impl ControlSink for RecordingSink {
    fn play_note(&mut self, note: &ContinuousNote) -> Result<()> {
        self.push(OutputEvent::Control(note.clone()))
    }
}
