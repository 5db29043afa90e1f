//! Session: routes the latest pose to the selected playback path
//!
//! In sequencer mode the sampler rebuilds the grid on its own cadence and the
//! scheduler loops over it. In continuous mode every pose goes straight to
//! the continuous controller.

use std::sync::Arc;

use tracing::{debug, info, warn};
use veremin_core::{
    CancellationToken, Clock, ContinuousController, ContinuousNote, ControlSink, LoopScheduler,
    MotionSampler, NoteSink, NotesGrid, NotesPlayedLedger, PlaybackClock, PlaybackMode, Pose,
    Result, TickReport, Timing, VereminConfig,
};

/// Point-in-time copy of the state shared between the loops
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub mode: PlaybackMode,
    pub active: bool,
    pub grid: Arc<NotesGrid>,
    pub ledger: NotesPlayedLedger,
    pub clock: PlaybackClock,
}

pub struct Session {
    mode: PlaybackMode,
    timing: Timing,
    clock: Arc<dyn Clock>,
    sampler: MotionSampler,
    scheduler: LoopScheduler,
    controller: ContinuousController,
    notes: Box<dyn NoteSink>,
    controls: Box<dyn ControlSink>,
    /// Latest pose and the clock time it arrived
    latest_pose: Option<(Pose, f64)>,
    controls_silent: bool,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(
        config: &VereminConfig,
        clock: Arc<dyn Clock>,
        notes: Box<dyn NoteSink>,
        controls: Box<dyn ControlSink>,
    ) -> Result<Self> {
        let timing = config.validate()?;
        let sampler = MotionSampler::new(&config.sequencer, &timing);
        let scheduler = LoopScheduler::new(&config.sequencer, &timing)?;
        let controller = ContinuousController::new(config.continuous.clone());

        info!(
            mode = ?config.mode,
            steps = timing.steps,
            step_secs = timing.step_secs,
            loop_secs = timing.loop_secs,
            "Session created"
        );

        Ok(Self {
            mode: config.mode,
            timing,
            clock,
            sampler,
            scheduler,
            controller,
            notes,
            controls,
            latest_pose: None,
            controls_silent: true,
            cancel: CancellationToken::new(),
        })
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn grid(&self) -> &Arc<NotesGrid> {
        self.sampler.grid()
    }

    pub fn ledger(&self) -> &NotesPlayedLedger {
        self.scheduler.ledger()
    }

    pub fn is_active(&self) -> bool {
        self.sampler.is_active()
    }

    pub fn playback_clock(&self) -> PlaybackClock {
        self.scheduler.state()
    }

    /// Switch playback paths. Re-entering sequencer mode restarts the loop.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        if mode == self.mode {
            return;
        }
        info!(from = ?self.mode, to = ?mode, "Playback mode changed");
        self.mode = mode;
        match mode {
            PlaybackMode::Sequencer => {
                self.release_controls();
                self.scheduler.reset();
            }
            PlaybackMode::Continuous => {}
        }
    }

    /// Record the latest pose (`None` when nobody is tracked)
    pub fn on_pose(&mut self, pose: Option<Pose>) {
        if self.cancel.is_cancelled() {
            return;
        }
        if self.mode == PlaybackMode::Continuous {
            let note = self.controller.process(pose.as_ref());
            self.send_control(&note);
        }
        let now = self.clock.now();
        self.latest_pose = pose.map(|p| (p, now));
    }

    /// One sampler pass over the latest fresh pose
    pub fn sample_tick(&mut self) {
        if self.cancel.is_cancelled() || self.mode != PlaybackMode::Sequencer {
            return;
        }

        let now = self.clock.now();
        let timeout = self.timing.pose_timeout_secs;
        let pose = self
            .latest_pose
            .as_ref()
            .filter(|(_, at)| now - at <= timeout)
            .map(|(pose, _)| pose);

        let was_active = self.sampler.is_active();
        let grid = self.sampler.sample(pose);
        let active = self.sampler.is_active();

        if active != was_active {
            if active {
                info!(cells = grid.active_count(), "Tracking acquired");
            } else {
                info!("Tracking lost, holding last grid");
            }
        }
    }

    /// One scheduler poll
    pub fn schedule_tick(&mut self) -> TickReport {
        if self.mode != PlaybackMode::Sequencer {
            return TickReport::default();
        }

        let grid = self.sampler.grid().clone();
        let report = self.scheduler.tick(
            self.clock.as_ref(),
            &grid,
            self.sampler.is_active(),
            self.notes.as_mut(),
            &self.cancel,
        );

        if report.failed > 0 {
            warn!(
                failed = report.failed,
                error = report.last_error.as_deref().unwrap_or_default(),
                "Note sink rejected triggers"
            );
        }
        if report.steps > 0 {
            debug!(
                steps = report.steps,
                triggered = report.triggered,
                suppressed = report.suppressed,
                "Scheduled steps"
            );
        }
        report
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            active: self.sampler.is_active(),
            grid: self.sampler.grid().clone(),
            ledger: self.scheduler.ledger().clone(),
            clock: self.scheduler.state(),
        }
    }

    /// Silence the continuous voice if it is sounding
    pub fn release_controls(&mut self) {
        self.send_control(&ContinuousNote::silence());
    }

    /// Forward a control update; repeated silences are sent once
    fn send_control(&mut self, note: &ContinuousNote) {
        let silent = note.is_silence();
        if silent && self.controls_silent {
            return;
        }
        self.controls_silent = silent;
        if let Err(e) = self.controls.play_note(note) {
            warn!(error = %e, "Control sink rejected update");
        }
    }
}
