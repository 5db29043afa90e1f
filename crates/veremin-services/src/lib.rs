//! veremin-services: Session coordination, background runner, and I/O plumbing

pub mod pose_stream;
pub mod runner;
pub mod session;
pub mod sinks;

pub use pose_stream::{parse_pose_line, spawn_pose_reader, PoseStreamError};
pub use runner::{RunnerError, RunnerHandle, SessionRunner};
pub use session::{Session, SessionSnapshot};
pub use sinks::{ChannelSink, TracingSink};
