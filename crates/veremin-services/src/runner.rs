//! Background session runner
//!
//! One thread drives both periodic loops: the sampler at a quarter step and
//! the scheduler at its polling interval. Poses arrive over a channel and
//! are handed to the session between ticks. Readers get a snapshot that is
//! republished after every tick.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, TryFromFloatSecsError};

use crossbeam_channel::{bounded, never, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info};
use veremin_core::{CancellationToken, Pose};

use crate::session::{Session, SessionSnapshot};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn session thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Runner not running")]
    NotRunning,
    #[error("Session thread panicked")]
    Panicked,
    #[error("Tick interval out of range: {0}")]
    Interval(#[from] TryFromFloatSecsError),
}

/// A fixed-interval task that skips missed ticks instead of bursting
struct PeriodicTask {
    interval: Duration,
    next_due: Instant,
}

impl PeriodicTask {
    fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, next_due: now }
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    fn reschedule(&mut self, now: Instant) {
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
    }
}

pub struct SessionRunner;

impl SessionRunner {
    /// Move the session onto its own thread, fed by `poses`
    pub fn spawn(session: Session, poses: Receiver<Option<Pose>>) -> Result<RunnerHandle, RunnerError> {
        let timing = *session.timing();
        let sample_every = Duration::try_from_secs_f64(timing.sample_interval_secs)?;
        let poll_every = Duration::try_from_secs_f64(timing.poll_interval_secs)?;
        let cancel = session.cancellation_token();
        let shared = Arc::new(Mutex::new(session.snapshot()));
        let (wake_tx, wake_rx) = bounded::<()>(1);

        let thread_cancel = cancel.clone();
        let thread_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("veremin-session".into())
            .spawn(move || {
                Self::run_loop(session, poses, wake_rx, sample_every, poll_every, thread_cancel, thread_shared)
            })?;

        info!("Session runner started");
        Ok(RunnerHandle {
            cancel,
            wake: wake_tx,
            shared,
            thread: Some(thread),
        })
    }

    fn run_loop(
        mut session: Session,
        poses: Receiver<Option<Pose>>,
        wake: Receiver<()>,
        sample_every: Duration,
        poll_every: Duration,
        cancel: CancellationToken,
        shared: Arc<Mutex<SessionSnapshot>>,
    ) -> Session {
        let start = Instant::now();
        let mut sampler = PeriodicTask::new(sample_every, start);
        let mut scheduler = PeriodicTask::new(poll_every, start);
        let mut poses = poses;

        while !cancel.is_cancelled() {
            let now = Instant::now();
            let mut ticked = false;
            if sampler.is_due(now) {
                session.sample_tick();
                sampler.reschedule(now);
                ticked = true;
            }
            if scheduler.is_due(now) {
                session.schedule_tick();
                scheduler.reschedule(now);
                ticked = true;
            }
            if ticked {
                if let Ok(mut snapshot) = shared.lock() {
                    *snapshot = session.snapshot();
                }
            }

            let remaining = sampler
                .next_due
                .min(scheduler.next_due)
                .saturating_duration_since(Instant::now());
            let mut closed = false;

            crossbeam_channel::select! {
                recv(poses) -> msg => {
                    match msg {
                        Ok(pose) => session.on_pose(pose),
                        Err(_) => closed = true,
                    }
                }
                recv(wake) -> _ => {}
                default(remaining) => {}
            }

            if closed {
                info!("Pose stream closed");
                session.on_pose(None);
                poses = never();
            }
        }

        session.release_controls();
        if let Ok(mut snapshot) = shared.lock() {
            *snapshot = session.snapshot();
        }
        debug!("Session loop exited");
        session
    }
}

/// Owner of the running session thread
pub struct RunnerHandle {
    cancel: CancellationToken,
    wake: Sender<()>,
    shared: Arc<Mutex<SessionSnapshot>>,
    thread: Option<JoinHandle<Session>>,
}

impl RunnerHandle {
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Latest published session state
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.shared.lock().ok().map(|s| s.clone())
    }

    /// Cancel both loops, wait for the thread, and hand the session back
    pub fn stop(&mut self) -> Result<Session, RunnerError> {
        let thread = self.thread.take().ok_or(RunnerError::NotRunning)?;
        self.cancel.cancel();
        let _ = self.wake.try_send(());

        let session = thread.join().map_err(|_| RunnerError::Panicked)?;
        info!("Session runner stopped");
        Ok(session)
    }
}

impl Drop for RunnerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
