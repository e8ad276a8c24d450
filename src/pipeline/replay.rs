use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{HandFrame, HandObservation},
};

const MAX_SLEEP: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Milliseconds since the start of the recording.
    pub timestamp_ms: u64,
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

impl RecordedFrame {
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.timestamp_ms)
    }

    pub fn to_hand_frame(&self, origin: Instant) -> HandFrame {
        HandFrame::new(origin + self.offset(), self.hands.clone())
    }
}

/// Reads a JSON-lines recording. Blank lines are skipped.
pub fn read_recording(path: &Path) -> Result<Vec<RecordedFrame>> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str(&line).map_err(|source| Error::Recording {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        frames.push(frame);
    }
    log::info!("loaded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

/// Handle to a thread feeding recorded frames in real time. Dropping it
/// stops the thread.
#[derive(Debug)]
pub struct ReplayStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ReplayStream {
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReplayStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Plays `frames` into `frame_tx`, pacing each by its timestamp. Frames the
/// consumer has no room for are dropped, as a live camera would.
pub fn start_replay_stream(frames: Vec<RecordedFrame>, frame_tx: Sender<HandFrame>) -> ReplayStream {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let origin = Instant::now();
        let first = frames.first().map_or(Duration::ZERO, RecordedFrame::offset);
        let mut dropped = 0usize;

        for recorded in &frames {
            let due = origin + recorded.offset().saturating_sub(first);
            loop {
                if stop_flag.load(Ordering::Relaxed) {
                    return;
                }
                let now = Instant::now();
                if now >= due {
                    break;
                }
                thread::sleep((due - now).min(MAX_SLEEP));
            }

            match frame_tx.try_send(HandFrame::new(Instant::now(), recorded.hands.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => dropped += 1,
                Err(TrySendError::Disconnected(_)) => {
                    log::info!("replay consumer gone, stopping");
                    return;
                }
            }
        }

        if dropped > 0 {
            log::warn!("replay dropped {dropped} frames while the consumer was busy");
        }
    });

    ReplayStream {
        stop,
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Shape, hand};
    use crate::types::Handedness::Right;
    use std::io::Write;

    fn recording(lines: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn frame_json(timestamp_ms: u64) -> String {
        let frame = RecordedFrame {
            timestamp_ms,
            hands: vec![hand(Shape::OPEN, Right)],
        };
        serde_json::to_string(&frame).unwrap()
    }

    #[test]
    fn reads_frames_and_skips_blank_lines() {
        let file = recording(&[frame_json(0), String::new(), frame_json(33)]);
        let frames = read_recording(file.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].timestamp_ms, 33);
        assert_eq!(frames[0].hands[0].landmarks.len(), 21);
    }

    #[test]
    fn minimal_entries_use_defaults() {
        let file = recording(&[
            r#"{"timestamp_ms": 5}"#.to_string(),
            r#"{"timestamp_ms": 6, "hands": [{"landmarks": [{"x": 0.1, "y": 0.2}]}]}"#.to_string(),
        ]);
        let frames = read_recording(file.path()).unwrap();
        assert!(frames[0].hands.is_empty());
        let hand = &frames[1].hands[0];
        assert_eq!(hand.confidence, 1.0);
        assert_eq!(hand.landmarks[0].z, 0.0);
        assert!(!hand.is_complete());
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let file = recording(&[frame_json(0), "{not json".to_string()]);
        match read_recording(file.path()) {
            Err(Error::Recording { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_recording(&dir.path().join("absent.jsonl"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn replay_delivers_every_frame_in_order() {
        let frames: Vec<_> = (0..5)
            .map(|i| RecordedFrame {
                timestamp_ms: i * 5,
                hands: Vec::new(),
            })
            .collect();
        let (tx, rx) = crossbeam_channel::unbounded();
        let stream = start_replay_stream(frames, tx);
        stream.wait();

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received.len(), 5);
        assert!(received.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(received[4].timestamp - received[0].timestamp >= Duration::from_millis(20));
    }

    #[test]
    fn stopping_cuts_a_long_replay_short() {
        let frames = vec![
            RecordedFrame {
                timestamp_ms: 0,
                hands: Vec::new(),
            },
            RecordedFrame {
                timestamp_ms: 60_000,
                hands: Vec::new(),
            },
        ];
        let (tx, rx) = crossbeam_channel::unbounded();
        let stream = start_replay_stream(frames, tx);
        let started = Instant::now();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        stream.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(rx.try_recv().is_err());
    }
}
