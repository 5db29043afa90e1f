//! Lookahead loop scheduler
//!
//! Polled on a short fixed interval. Each poll schedules every step boundary
//! that falls within one step of now, reading the grid column under the loop
//! cursor and handing its notes to the sink with swing and humanize applied.

use crate::clock::{CancellationToken, Clock};
use crate::config::{SequencerConfig, Timing};
use crate::error::{Result, VereminError};
use crate::grid::{NotesGrid, NotesPlayedLedger};
use crate::pitch::{midi_to_frequency, PitchLadder};
use crate::sink::{NoteSink, ScheduledNote};

/// Scheduler clock state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PlaybackClock {
    /// Not yet started; the first tick starts the loop one step ahead
    #[default]
    Priming,
    Running {
        /// Clock time of loop position zero
        start_time: f64,
        /// Next step boundary to schedule
        next_play: f64,
    },
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Step boundaries scheduled
    pub steps: usize,
    /// Notes handed to the sink
    pub triggered: usize,
    /// Notes withheld because tracking was inactive
    pub suppressed: usize,
    /// Notes the sink rejected
    pub failed: usize,
    pub last_error: Option<String>,
}

/// Sole writer of the notes-played ledger and the playback clock
pub struct LoopScheduler {
    step_secs: f64,
    loop_secs: f64,
    steps: usize,
    humanize_secs: f64,
    ladder: PitchLadder,
    rng: fastrand::Rng,
    clock: PlaybackClock,
    ledger: NotesPlayedLedger,
}

impl LoopScheduler {
    pub fn new(config: &SequencerConfig, timing: &Timing) -> Result<Self> {
        let ladder = PitchLadder::new(config.root_note, &config.scale, config.gamut).ok_or_else(|| {
            VereminError::InvalidConfig(format!(
                "{} rows from root {} exceed the MIDI range",
                config.gamut, config.root_note
            ))
        })?;
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        Ok(Self {
            step_secs: timing.step_secs,
            loop_secs: timing.loop_secs,
            steps: timing.steps,
            humanize_secs: config.humanize_secs,
            ladder,
            rng,
            clock: PlaybackClock::Priming,
            ledger: NotesPlayedLedger::new(timing.steps, config.gamut),
        })
    }

    pub fn state(&self) -> PlaybackClock {
        self.clock
    }

    pub fn ledger(&self) -> &NotesPlayedLedger {
        &self.ledger
    }

    pub fn ladder(&self) -> &PitchLadder {
        &self.ladder
    }

    /// Back to priming; the next tick restarts the loop
    pub fn reset(&mut self) {
        self.clock = PlaybackClock::Priming;
    }

    /// Grid column under the loop cursor at `now`, `None` while priming
    pub fn column_at(&self, now: f64) -> Option<usize> {
        let PlaybackClock::Running { start_time, .. } = self.clock else {
            return None;
        };
        let played_for = now - start_time;
        let loops_gone = (played_for / self.loop_secs).floor();
        let fraction = (played_for - loops_gone * self.loop_secs) / self.loop_secs;
        let column = (fraction * self.steps as f64).floor().max(0.0) as usize;
        Some(column.min(self.steps.saturating_sub(1)))
    }

    /// Notes of one column in scan order (highest row index first)
    fn plan_column(&self, grid: &NotesGrid, column: usize) -> Vec<(u8, usize)> {
        let Some(cells) = grid.column(column) else {
            return Vec::new();
        };
        self.ladder
            .scan()
            .filter(|&(row, _)| cells.get(row).copied().unwrap_or(false))
            .map(|(row, pitch)| (pitch, row))
            .collect()
    }

    /// Schedule every step boundary within one step of now.
    ///
    /// Even-numbered notes of a column land on the boundary, odd-numbered ones
    /// half a step later, each pushed forward by up to `humanize_secs`. Notes
    /// only reach the sink while `active`; the ledger is written either way.
    ///
    /// After a stall every missed boundary is scheduled in one burst, each
    /// reading the column under the cursor now, so that column's notes repeat
    /// at past timestamps until `next_play` catches up.
    pub fn tick(
        &mut self,
        clock: &dyn Clock,
        grid: &NotesGrid,
        active: bool,
        sink: &mut dyn NoteSink,
        cancel: &CancellationToken,
    ) -> TickReport {
        let mut report = TickReport::default();

        let (start_time, mut next_play) = match self.clock {
            PlaybackClock::Priming => {
                let start = clock.now() + self.step_secs;
                (start, start)
            }
            PlaybackClock::Running { start_time, next_play } => (start_time, next_play),
        };
        self.clock = PlaybackClock::Running { start_time, next_play };

        while !cancel.is_cancelled() && next_play - clock.now() < self.step_secs {
            let Some(column) = self.column_at(clock.now()) else {
                break;
            };

            for (i, (pitch, row)) in self.plan_column(grid, column).into_iter().enumerate() {
                let base = if i % 2 == 0 {
                    next_play
                } else {
                    next_play + self.step_secs / 2.0
                };
                let note = ScheduledNote {
                    pitch,
                    frequency: midi_to_frequency(pitch),
                    column,
                    row,
                    at: base + self.humanize_secs * self.rng.f64(),
                };

                if active {
                    match sink.trigger_note(&note) {
                        Ok(()) => report.triggered += 1,
                        Err(e) => {
                            report.failed += 1;
                            report.last_error = Some(e.to_string());
                        }
                    }
                } else {
                    report.suppressed += 1;
                }
                self.ledger.record(column, row, note.at);
            }

            next_play += self.step_secs;
            self.clock = PlaybackClock::Running { start_time, next_play };
            report.steps += 1;
        }

        report
    }
}
