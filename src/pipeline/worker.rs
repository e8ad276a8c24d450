use std::{
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::{
    config::GestureConfig,
    session::{GestureSession, GestureSink},
    types::{GestureCandidate, HandFrame, MotionEvent, Point2},
};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Gesture(GestureCandidate),
    /// Viewport coordinates.
    Cursor(Point2),
    Motion(MotionEvent),
}

const IDLE_POLL: Duration = Duration::from_millis(33);

struct ChannelSink<'a> {
    tx: &'a Sender<SessionEvent>,
    disconnected: bool,
}

impl ChannelSink<'_> {
    fn send(&mut self, event: SessionEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("event queue full, dropping {event:?}");
            }
            Err(TrySendError::Disconnected(_)) => self.disconnected = true,
        }
    }
}

impl GestureSink for ChannelSink<'_> {
    fn on_gesture(&mut self, gesture: &GestureCandidate) {
        self.send(SessionEvent::Gesture(*gesture));
    }

    fn on_cursor(&mut self, x: f32, y: f32) {
        self.send(SessionEvent::Cursor(Point2::new(x, y)));
    }

    fn on_motion(&mut self, event: MotionEvent) {
        self.send(SessionEvent::Motion(event));
    }
}

pub(crate) fn run_worker_loop(
    mut session: GestureSession,
    frame_rx: Receiver<HandFrame>,
    event_tx: Sender<SessionEvent>,
) {
    loop {
        let mut sink = ChannelSink {
            tx: &event_tx,
            disconnected: false,
        };
        match recv_latest_frame(&frame_rx, IDLE_POLL) {
            Ok(frame) => {
                session.process_frame_with(&frame, &mut sink);
            }
            Err(RecvTimeoutError::Timeout) => {
                session.poll_with(Instant::now(), &mut sink);
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if sink.disconnected {
            log::info!("event receiver gone, stopping session worker");
            break;
        }
    }

    session.stop();
    let metrics = session.metrics();
    log::info!(
        "session worker finished: {} detections, {} false positives, avg latency {:?}",
        metrics.total_detections,
        metrics.false_positives,
        metrics.average_latency
    );
}

/// Waits up to `idle` for a frame, then skips ahead to the newest one queued.
pub(crate) fn recv_latest_frame(
    frame_rx: &Receiver<HandFrame>,
    idle: Duration,
) -> Result<HandFrame, RecvTimeoutError> {
    let mut frame = frame_rx.recv_timeout(idle)?;
    let mut skipped = 0usize;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
        skipped += 1;
    }
    if skipped > 0 {
        log::warn!("session worker behind, dropped {skipped} stale frames");
    }
    Ok(frame)
}

/// Spawns a thread that owns a [`GestureSession`] built from `config`.
///
/// The thread exits once `frame_rx` disconnects or nobody listens on
/// `event_tx` any more.
pub fn start_session_worker(
    config: GestureConfig,
    viewport: Option<(f32, f32)>,
    frame_rx: Receiver<HandFrame>,
    event_tx: Sender<SessionEvent>,
) -> thread::JoinHandle<()> {
    log::info!("starting session worker in {} mode", config.mode.name());
    let mut session = GestureSession::new(config);
    if let Some((width, height)) = viewport {
        session.set_viewport(width, height);
    }
    thread::spawn(move || run_worker_loop(session, frame_rx, event_tx))
}
