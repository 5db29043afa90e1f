//! veremin: pose-driven loop sequencer
//!
//! Reads pose frames as JSON lines on stdin and writes note events as JSON
//! lines on stdout. Logs go to stderr.
//!
//! Frames are consumed as they arrive, so a recorded pose file should be
//! paced by its producer. When input ends the session keeps playing for
//! `--linger SECS` (default 0) before stopping; the last pose still expires
//! after `pose_timeout_ms`.

mod config;

use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::Receiver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use veremin_core::{ControlSink, MonotonicClock, NoteSink, OutputEvent};
use veremin_services::{spawn_pose_reader, ChannelSink, Session, SessionRunner, TracingSink};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    print_config: bool,
    log_notes: bool,
    linger: Duration,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--print-config" => parsed.print_config = true,
            "--log-notes" => parsed.log_notes = true,
            "--linger" => {
                let value = args.next().ok_or_else(|| anyhow!("--linger needs a value in seconds"))?;
                let secs: f64 = value.parse().with_context(|| format!("invalid --linger value {value}"))?;
                parsed.linger = Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("invalid --linger value {value}"))?;
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}"),
            path => {
                if parsed.config.is_some() {
                    bail!("only one config path may be given");
                }
                parsed.config = Some(PathBuf::from(path));
            }
        }
    }
    Ok(parsed)
}

fn write_events(events: Receiver<OutputEvent>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in events {
        serde_json::to_writer(&mut out, &event)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("veremin=debug".parse()?))
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.print_config {
        print!("{}", config::default_config_toml()?);
        return Ok(());
    }

    let config = config::load_config(args.config.as_deref())?;
    tracing::info!(mode = ?config.mode, "Starting veremin");

    let (sink, events) = ChannelSink::bounded(1024);
    let (notes, controls): (Box<dyn NoteSink>, Box<dyn ControlSink>) = if args.log_notes {
        drop(sink);
        (Box::new(TracingSink), Box::new(TracingSink))
    } else {
        (Box::new(sink.clone()), Box::new(sink))
    };
    let session = Session::new(&config, Arc::new(MonotonicClock::new()), notes, controls)?;

    let (pose_tx, pose_rx) = crossbeam_channel::bounded(64);
    let reader_tx = pose_tx.clone();
    let mut runner = SessionRunner::spawn(session, pose_rx)?;
    let writer = thread::Builder::new()
        .name("veremin-output".into())
        .spawn(move || write_events(events))?;
    let reader = spawn_pose_reader(BufReader::new(io::stdin()), reader_tx)?;

    let frames = reader.join().map_err(|_| anyhow!("pose reader panicked"))?;
    tracing::info!(frames, linger_secs = args.linger.as_secs_f64(), "Pose input ended");
    thread::sleep(args.linger);
    drop(pose_tx);

    let session = runner.stop()?;
    tracing::info!(lit_cells = session.grid().active_count(), "Session finished");
    drop(session);

    writer.join().map_err(|_| anyhow!("output writer panicked"))??;
    Ok(())
}
