//! Output sinks: a channel bridge to a sound engine and a log-only sink

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::info;
use veremin_core::{
    ContinuousNote, ControlSink, NoteSink, OutputEvent, Result, ScheduledNote, VereminError,
};

/// Pushes output events onto a bounded channel without blocking.
/// A full or closed channel is reported as a sink error.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<OutputEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<OutputEvent>) -> Self {
        Self { tx }
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<OutputEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self::new(tx), rx)
    }

    fn push(&self, event: OutputEvent) -> Result<()> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => VereminError::Sink("output channel full".into()),
            TrySendError::Disconnected(_) => VereminError::Sink("output channel closed".into()),
        })
    }
}

impl NoteSink for ChannelSink {
    fn trigger_note(&mut self, note: &ScheduledNote) -> Result<()> {
        self.push(OutputEvent::Trigger(*note))
    }
}

impl ControlSink for ChannelSink {
    fn play_note(&mut self, note: &ContinuousNote) -> Result<()> {
        self.push(OutputEvent::Control(note.clone()))
    }
}

/// Logs every note; for running without a sound engine attached
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NoteSink for TracingSink {
    fn trigger_note(&mut self, note: &ScheduledNote) -> Result<()> {
        info!(
            pitch = note.pitch,
            column = note.column,
            row = note.row,
            at = note.at,
            "Note"
        );
        Ok(())
    }
}

impl ControlSink for TracingSink {
    fn play_note(&mut self, note: &ContinuousNote) -> Result<()> {
        info!(
            vertical = note.vertical,
            horizontal = note.horizontal,
            duration_ms = note.duration_ms,
            "Control"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note() -> ScheduledNote {
        ScheduledNote {
            pitch: 40,
            frequency: 82.4,
            column: 0,
            row: 9,
            at: 1.0,
        }
    }

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (mut sink, rx) = ChannelSink::bounded(4);
        sink.trigger_note(&note()).unwrap();
        sink.play_note(&ContinuousNote::silence()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), OutputEvent::Trigger(note()));
        assert_eq!(rx.try_recv().unwrap(), OutputEvent::Control(ContinuousNote::silence()));
    }

    #[test]
    fn test_channel_sink_reports_full_and_closed() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        sink.trigger_note(&note()).unwrap();
        assert!(sink.trigger_note(&note()).is_err());

        drop(rx);
        assert!(sink.play_note(&ContinuousNote::silence()).is_err());
    }

    #[test]
    fn test_tracing_sink_accepts_everything() {
        let mut sink = TracingSink;
        assert!(sink.trigger_note(&note()).is_ok());
        assert!(sink.play_note(&ContinuousNote::silence()).is_ok());
    }
}
