//! veremin-core: Motion sampling and loop scheduling for the pose sequencer

pub mod clock;
mod config;
pub mod continuous;
mod error;
pub mod geometry;
pub mod grid;
pub mod pitch;
pub mod pose;
pub mod sampler;
pub mod scheduler;
pub mod sink;
mod tempo;

pub use clock::{CancellationToken, Clock, ManualClock, MonotonicClock};
pub use config::{ContinuousConfig, PlaybackMode, SequencerConfig, Timing, VereminConfig};
pub use continuous::{ContinuousController, WristPositions, ZonePosition};
pub use error::{Result, VereminError};
pub use geometry::{Point, Rect};
pub use grid::{NotesGrid, NotesPlayedLedger};
pub use pitch::{midi_to_frequency, parse_note_name, PitchLadder};
pub use pose::{Keypoint, LimbChain, Pose, LIMB_SEQUENCE};
pub use sampler::{rasterize, MotionSampler};
pub use scheduler::{LoopScheduler, PlaybackClock, TickReport};
pub use sink::{ContinuousNote, ControlSink, NoteSink, OutputEvent, RecordingSink, ScheduledNote};
pub use tempo::{NoteValue, Tempo};
