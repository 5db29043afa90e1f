//! JSON-lines pose intake
//!
//! Each line is one frame: a pose object, an array of poses (the first one
//! is used), or `null` when nobody is tracked.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use veremin_core::Pose;

#[derive(Debug, Error)]
pub enum PoseStreamError {
    #[error("Invalid pose frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PoseFrame {
    Many(Vec<Pose>),
    One(Option<Pose>),
}

/// Parse one frame; `Ok(None)` means no pose this frame
pub fn parse_pose_line(line: &str) -> Result<Option<Pose>, PoseStreamError> {
    let frame: PoseFrame = serde_json::from_str(line.trim())?;
    Ok(match frame {
        PoseFrame::Many(poses) => poses.into_iter().next(),
        PoseFrame::One(pose) => pose,
    })
}

/// Forward frames from `reader` until EOF or until the receiver goes away.
///
/// Blank lines are skipped and malformed lines are logged and dropped. The
/// thread returns how many frames it forwarded; dropping `tx` on exit closes
/// the stream for the receiver.
pub fn spawn_pose_reader<R>(reader: R, tx: Sender<Option<Pose>>) -> io::Result<JoinHandle<usize>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new().name("veremin-poses".into()).spawn(move || {
        let mut forwarded = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Pose input failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_pose_line(&line) {
                Ok(pose) => {
                    if tx.send(pose).is_err() {
                        break;
                    }
                    forwarded += 1;
                }
                Err(e) => warn!(line = index + 1, error = %e, "Skipping pose frame"),
            }
        }
        debug!(forwarded, "Pose reader finished");
        forwarded
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_single_pose() {
        let pose = parse_pose_line(
            r#"{"score":0.8,"keypoints":[{"part":"leftWrist","position":{"x":10,"y":20},"score":0.9}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(pose.score, 0.8);
        let wrist = pose.keypoint("leftWrist").unwrap();
        assert_eq!((wrist.position.x, wrist.position.y), (10.0, 20.0));
    }

    #[test]
    fn test_parse_null_and_empty_array() {
        assert!(parse_pose_line("null").unwrap().is_none());
        assert!(parse_pose_line(" [] ").unwrap().is_none());
    }

    #[test]
    fn test_parse_array_takes_first() {
        let pose = parse_pose_line(
            r#"[{"keypoints":[{"part":"nose","x":1,"y":2,"score":0.5}]},{"keypoints":[]}]"#,
        )
        .unwrap()
        .unwrap();
        assert!(pose.keypoint("nose").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_pose_line("{not json").is_err());
        assert!(parse_pose_line("42").is_err());
    }

    #[test]
    fn test_reader_skips_bad_lines() {
        let input = concat!(
            r#"{"keypoints":[]}"#,
            "\n\n",
            "garbage\n",
            "null\n",
        );
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn_pose_reader(Cursor::new(input), tx).unwrap();

        assert_eq!(handle.join().unwrap(), 2);
        let frames: Vec<Option<Pose>> = rx.iter().collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_some());
        assert!(frames[1].is_none());
    }
}
