use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::{
    config::{ContextMode, GestureConfig},
    cursor::{CursorSmoother, map_to_viewport},
    debounce::{DebounceSettings, Debouncer},
    geometry::{palm_center, stability_point, to_pixels},
    gesture::{GestureClassifier, MotionTracker},
    types::{
        CursorSample, GestureCandidate, GestureKind, HandFrame, HandObservation, INDEX_TIP,
        MotionEvent, Point2,
    },
};

const LATENCY_WINDOW: usize = 100;

pub trait GestureSink {
    fn on_gesture(&mut self, _gesture: &GestureCandidate) {}

    /// Cursor position in viewport coordinates, once per frame while a
    /// cursor-driving gesture is held.
    fn on_cursor(&mut self, _x: f32, _y: f32) {}

    fn on_motion(&mut self, _event: MotionEvent) {}
}

impl GestureSink for () {}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutcome {
    /// Raw top candidate before debouncing, after gating.
    pub candidate: Option<GestureCandidate>,
    pub confirmed: Option<GestureCandidate>,
    pub motion: Option<MotionEvent>,
    pub cursor: Option<CursorSample>,
    pub viewport_cursor: Option<Point2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricsSnapshot {
    pub total_detections: u64,
    pub false_positives: u64,
    pub average_latency: Duration,
    pub current_gesture: Option<GestureCandidate>,
    pub detection_enabled: bool,
    pub mode: ContextMode,
}

#[derive(Clone, Debug, Default)]
struct SessionMetrics {
    detections: u64,
    false_positives: u64,
    latencies: VecDeque<Duration>,
    current: Option<GestureCandidate>,
}

impl SessionMetrics {
    fn record(&mut self, gesture: GestureCandidate, latency: Duration) {
        self.detections += 1;
        self.current = Some(gesture);
        self.latencies.push_back(latency);
        while self.latencies.len() > LATENCY_WINDOW {
            self.latencies.pop_front();
        }
    }

    fn average_latency(&self) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        self.latencies.iter().sum::<Duration>() / self.latencies.len() as u32
    }
}

pub struct GestureSession {
    config: GestureConfig,
    classifier: GestureClassifier,
    motion: MotionTracker,
    debouncer: Debouncer,
    cursor: CursorSmoother,
    previous_anchor: Option<Point2>,
    viewport: (f32, f32),
    enabled: bool,
    metrics: SessionMetrics,
}

impl Default for GestureSession {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureSession {
    pub fn new(config: GestureConfig) -> Self {
        let viewport = (config.reference_width, config.reference_height);
        Self {
            classifier: GestureClassifier::new(config.clone()),
            debouncer: Debouncer::new(DebounceSettings::from(&config)),
            motion: MotionTracker::new(),
            cursor: CursorSmoother::new(),
            previous_anchor: None,
            viewport,
            enabled: true,
            metrics: SessionMetrics::default(),
            config,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.debouncer.set_settings(DebounceSettings::from(&config));
        self.classifier.set_config(config.clone());
        self.config = config;
    }

    pub fn set_mode(&mut self, mode: ContextMode) {
        let mut config = self.config.clone();
        config.apply_mode(mode);
        log::info!(
            "gesture mode {} (threshold {:.2}, dwell {}ms, cooldown {}ms)",
            mode.name(),
            config.confidence_threshold,
            config.dwell_time_ms,
            config.cooldown_ms
        );
        self.set_config(config);
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Flips detection on or off. Turning it off drops all temporal state.
    pub fn toggle_detection(&mut self) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.reset_tracking();
        }
        log::info!("gesture detection {}", if self.enabled { "enabled" } else { "disabled" });
        self.enabled
    }

    /// Ends the session: every debounce, cursor and motion state is cleared
    /// so a restart begins idle.
    pub fn stop(&mut self) {
        self.reset_tracking();
        self.debouncer.clear();
        self.metrics.current = None;
    }

    pub fn report_false_positive(&mut self) {
        self.metrics.false_positives += 1;
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_detections: self.metrics.detections,
            false_positives: self.metrics.false_positives,
            average_latency: self.metrics.average_latency(),
            current_gesture: self.metrics.current,
            detection_enabled: self.enabled,
            mode: self.config.mode,
        }
    }

    fn reset_tracking(&mut self) {
        self.debouncer.abort();
        self.cursor.reset();
        self.motion.reset();
        self.previous_anchor = None;
    }

    pub fn process_frame_with<S: GestureSink + ?Sized>(
        &mut self,
        frame: &HandFrame,
        sink: &mut S,
    ) -> FrameOutcome {
        let outcome = self.process_frame(frame);
        if let Some(event) = outcome.motion {
            sink.on_motion(event);
        }
        if let Some(point) = outcome.viewport_cursor {
            sink.on_cursor(point.x, point.y);
        }
        if let Some(gesture) = &outcome.confirmed {
            sink.on_gesture(gesture);
        }
        outcome
    }

    pub fn process_frame(&mut self, frame: &HandFrame) -> FrameOutcome {
        let started = Instant::now();
        let mut outcome = FrameOutcome::default();
        if !self.enabled {
            return outcome;
        }

        let hands: Vec<HandObservation> = frame
            .hands
            .iter()
            .filter(|hand| {
                hand.is_complete() && hand.confidence >= self.config.min_detection_confidence
            })
            .cloned()
            .collect();
        let Some(primary) = hands.first() else {
            self.reset_tracking();
            return outcome;
        };

        outcome.motion = self.motion.update(&hands, &self.classifier);

        let Some(steady) = self.steadiness_in_zone(primary) else {
            self.debouncer.abort();
            self.cursor.reset();
            return outcome;
        };

        let candidate = self.classifier.classify(&hands);
        outcome.candidate = candidate;

        if let Some(raw) = candidate.and_then(|c| cursor_source(c.kind, &hands, &self.config)) {
            let depth = primary.landmarks[INDEX_TIP].z;
            let sample = self.cursor.update(raw, depth, frame.timestamp);
            let reference = (self.config.reference_width, self.config.reference_height);
            outcome.viewport_cursor = Some(map_to_viewport(sample.position, reference, self.viewport));
            outcome.cursor = Some(sample);
        }

        // A moving hand still drives the cursor but earns no debounce credit.
        if !steady {
            self.debouncer.abort();
            return outcome;
        }

        if let Some(kind) = self.debouncer.update(candidate.map(|c| c.kind), frame.timestamp) {
            outcome.confirmed = Some(self.confirm(kind, candidate, started));
        }

        outcome
    }

    /// Re-checks the held gesture's dwell and cooldown when no new frame has
    /// arrived.
    pub fn poll(&mut self, now: Instant) -> Option<GestureCandidate> {
        if !self.enabled {
            return None;
        }
        let started = Instant::now();
        let kind = self.debouncer.poll(now)?;
        Some(self.confirm(kind, None, started))
    }

    pub fn poll_with<S: GestureSink + ?Sized>(
        &mut self,
        now: Instant,
        sink: &mut S,
    ) -> Option<GestureCandidate> {
        let confirmed = self.poll(now);
        if let Some(gesture) = &confirmed {
            sink.on_gesture(gesture);
        }
        confirmed
    }

    fn confirm(
        &mut self,
        kind: GestureKind,
        candidate: Option<GestureCandidate>,
        started: Instant,
    ) -> GestureCandidate {
        let confirmed = candidate
            .filter(|c| c.kind == kind)
            .unwrap_or_else(|| GestureCandidate::new(kind, kind.prior_confidence()));
        self.metrics.record(confirmed, started.elapsed());
        log::debug!("confirmed {}", confirmed.display_text());
        confirmed
    }

    /// `None` when the primary hand is outside the active zone, otherwise
    /// whether it moved less than the stability threshold since last frame.
    fn steadiness_in_zone(&mut self, hand: &HandObservation) -> Option<bool> {
        let center = palm_center(hand)?;
        if !self.config.active_zone.contains(center.x, center.y) {
            self.previous_anchor = None;
            return None;
        }

        let current = stability_point(hand)?;
        let steady = self.previous_anchor.is_none_or(|prev| {
            (current.x - prev.x).hypot(current.y - prev.y) <= self.config.stability_threshold
        });
        self.previous_anchor = Some(current);
        Some(steady)
    }
}

fn cursor_source(kind: GestureKind, hands: &[HandObservation], config: &GestureConfig) -> Option<Point2> {
    let (w, h) = (config.reference_width, config.reference_height);
    match (kind, hands) {
        (GestureKind::Point, [hand, ..]) => Some(to_pixels(hand.landmarks[INDEX_TIP], w, h)),
        (GestureKind::Grab, [a, b]) => {
            let pa = to_pixels(a.landmarks[INDEX_TIP], w, h);
            let pb = to_pixels(b.landmarks[INDEX_TIP], w, h);
            Some(Point2::new((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Shape, hand, shifted};
    use crate::types::Handedness::{Left, Right};

    #[derive(Default)]
    struct Recorder {
        gestures: Vec<GestureKind>,
        cursor: Vec<(f32, f32)>,
        motion: Vec<MotionEvent>,
    }

    impl GestureSink for Recorder {
        fn on_gesture(&mut self, gesture: &GestureCandidate) {
            self.gestures.push(gesture.kind);
        }

        fn on_cursor(&mut self, x: f32, y: f32) {
            self.cursor.push((x, y));
        }

        fn on_motion(&mut self, event: MotionEvent) {
            self.motion.push(event);
        }
    }

    fn at(t0: Instant, frame: u64) -> Instant {
        t0 + Duration::from_millis(frame * 33)
    }

    #[test]
    fn open_palm_confirms_once_after_stability_and_dwell() {
        let mut session = GestureSession::default();
        let t0 = Instant::now();
        let mut confirmed_frames = Vec::new();
        for frame in 0..20 {
            let input = HandFrame::new(at(t0, frame), vec![hand(Shape::OPEN, Right)]);
            let outcome = session.process_frame(&input);
            assert_eq!(outcome.candidate.map(|c| c.kind), Some(GestureKind::OpenPalm));
            if let Some(confirmed) = outcome.confirmed {
                assert_eq!(confirmed.kind, GestureKind::OpenPalm);
                confirmed_frames.push(frame);
            }
        }
        // Stability reached on the third frame (66ms), dwell ends at 366ms,
        // so the first frame to confirm is the one at 396ms.
        assert_eq!(confirmed_frames, vec![12]);
        assert_eq!(session.metrics().total_detections, 1);
    }

    #[test]
    fn zone_exit_right_before_dwell_blocks_confirmation() {
        let mut session = GestureSession::default();
        let t0 = Instant::now();
        for frame in 0..11 {
            let input = HandFrame::new(at(t0, frame), vec![hand(Shape::OPEN, Right)]);
            assert_eq!(session.process_frame(&input).confirmed, None);
        }
        let outside = shifted(hand(Shape::OPEN, Right), 0.4, 0.0);
        let outcome = session.process_frame(&HandFrame::new(at(t0, 11), vec![outside]));
        assert_eq!(outcome.confirmed, None);
        assert_eq!(session.debouncer.stable_frames(GestureKind::OpenPalm), 0);

        let back = HandFrame::new(at(t0, 12), vec![hand(Shape::OPEN, Right)]);
        assert_eq!(session.process_frame(&back).confirmed, None);
        assert_eq!(session.debouncer.stable_frames(GestureKind::OpenPalm), 1);
    }

    #[test]
    fn no_hand_resets_progress() {
        let mut session = GestureSession::default();
        let t0 = Instant::now();
        for frame in 0..5 {
            session.process_frame(&HandFrame::new(at(t0, frame), vec![hand(Shape::OPEN, Right)]));
        }
        let outcome = session.process_frame(&HandFrame::empty(at(t0, 5)));
        assert_eq!(outcome, FrameOutcome::default());
        assert_eq!(session.debouncer.stable_frames(GestureKind::OpenPalm), 0);
    }

    #[test]
    fn jumpy_hand_is_not_stable() {
        let mut session = GestureSession::default();
        let t0 = Instant::now();
        for frame in 0..4 {
            let dx = if frame % 2 == 0 { 0.0 } else { 0.08 };
            let input = HandFrame::new(at(t0, frame), vec![shifted(hand(Shape::OPEN, Right), dx, 0.0)]);
            session.process_frame(&input);
        }
        assert_eq!(session.debouncer.stable_frames(GestureKind::OpenPalm), 0);
    }

    #[test]
    fn fast_pointing_hand_keeps_the_cursor_moving() {
        let mut session = GestureSession::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        for frame in 0..5u64 {
            // 0.06 of the frame width every 33ms is well above 500px/s.
            let dx = 0.06 * frame as f32;
            let input = HandFrame::new(at(t0, frame), vec![shifted(hand(Shape::POINT, Right), dx, 0.0)]);
            let outcome = session.process_frame_with(&input, &mut sink);
            assert_eq!(outcome.candidate.map(|c| c.kind), Some(GestureKind::Point));
            assert!(outcome.cursor.is_some(), "no cursor on frame {frame}");
            assert_eq!(outcome.confirmed, None);
        }
        assert_eq!(sink.cursor.len(), 5);
        assert!(sink.cursor.windows(2).all(|w| w[1].0 > w[0].0));
        assert_eq!(session.debouncer.stable_frames(GestureKind::Point), 0);
    }

    #[test]
    fn poll_confirms_a_held_gesture_without_new_frames() {
        let mut session = GestureSession::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        for frame in 0..3 {
            let input = HandFrame::new(at(t0, frame), vec![hand(Shape::OPEN, Right)]);
            assert_eq!(session.process_frame(&input).confirmed, None);
        }
        assert_eq!(session.poll_with(t0 + Duration::from_millis(200), &mut sink), None);
        let confirmed = session.poll_with(t0 + Duration::from_millis(400), &mut sink);
        assert_eq!(confirmed.map(|c| c.kind), Some(GestureKind::OpenPalm));
        assert_eq!(sink.gestures, vec![GestureKind::OpenPalm]);
        assert_eq!(session.metrics().total_detections, 1);
        assert_eq!(session.poll(t0 + Duration::from_millis(500)), None);
    }

    #[test]
    fn low_confidence_hands_are_ignored() {
        let mut session = GestureSession::default();
        let mut weak = hand(Shape::OPEN, Right);
        weak.confidence = 0.3;
        let outcome = session.process_frame(&HandFrame::new(Instant::now(), vec![weak]));
        assert_eq!(outcome.candidate, None);
    }

    #[test]
    fn point_drives_cursor_every_frame() {
        let mut session = GestureSession::default();
        session.set_viewport(1280.0, 960.0);
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        for frame in 0..5 {
            let input = HandFrame::new(at(t0, frame), vec![hand(Shape::POINT, Right)]);
            session.process_frame_with(&input, &mut sink);
        }
        assert_eq!(sink.cursor.len(), 5);
        let (x, y) = sink.cursor[0];
        // Index tip at (0.42, 0.37) doubled from the 640x480 reference.
        assert!((x - 0.42 * 1280.0).abs() < 1e-2);
        assert!((y - 0.37 * 960.0).abs() < 1e-2);
    }

    #[test]
    fn grab_combines_both_hands_and_centres_cursor() {
        let mut session = GestureSession::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        for frame in 0..15 {
            let input = HandFrame::new(
                at(t0, frame),
                vec![hand(Shape::OPEN, Right), hand(Shape::OPEN, Left)],
            );
            let outcome = session.process_frame_with(&input, &mut sink);
            assert_eq!(outcome.candidate.map(|c| c.kind), Some(GestureKind::Grab));
        }
        assert_eq!(sink.gestures, vec![GestureKind::Grab]);
        let (x, _) = sink.cursor[0];
        assert!((x - 320.0).abs() < 1e-2);
    }

    #[test]
    fn one_qualifying_hand_falls_back_to_single_hand() {
        let mut session = GestureSession::default();
        let input = HandFrame::new(
            Instant::now(),
            vec![hand(Shape::OPEN, Right), hand(Shape::FIST, Left)],
        );
        let outcome = session.process_frame(&input);
        assert_eq!(outcome.candidate.map(|c| c.kind), Some(GestureKind::OpenPalm));
    }

    #[test]
    fn scroll_motion_reaches_sink() {
        let mut session = GestureSession::default();
        let mut sink = Recorder::default();
        let t0 = Instant::now();
        for (frame, dy) in [0.0, 0.03, 0.06].into_iter().enumerate() {
            let input = HandFrame::new(
                at(t0, frame as u64),
                vec![shifted(hand(Shape::FOUR, Right), 0.0, dy)],
            );
            session.process_frame_with(&input, &mut sink);
        }
        assert_eq!(
            sink.motion,
            vec![
                MotionEvent::Scroll(crate::types::ScrollDirection::Down),
                MotionEvent::Scroll(crate::types::ScrollDirection::Down),
            ]
        );
    }

    #[test]
    fn disabled_detection_produces_nothing() {
        let mut session = GestureSession::default();
        assert!(!session.toggle_detection());
        let outcome = session.process_frame(&HandFrame::new(Instant::now(), vec![hand(Shape::OPEN, Right)]));
        assert_eq!(outcome, FrameOutcome::default());
        assert!(session.toggle_detection());
        assert!(session.metrics().detection_enabled);
    }

    #[test]
    fn stop_clears_cooldown_and_cursor() {
        let mut session = GestureSession::default();
        let t0 = Instant::now();
        let mut confirmations = 0;
        for frame in 0..13 {
            let input = HandFrame::new(at(t0, frame), vec![hand(Shape::OPEN, Right)]);
            confirmations += usize::from(session.process_frame(&input).confirmed.is_some());
        }
        assert_eq!(confirmations, 1);

        session.stop();
        assert!(!session.cursor.is_active());
        for frame in 13..26 {
            let input = HandFrame::new(at(t0, frame), vec![hand(Shape::OPEN, Right)]);
            confirmations += usize::from(session.process_frame(&input).confirmed.is_some());
        }
        assert_eq!(confirmations, 2);
    }

    #[test]
    fn irl_mode_ignores_point() {
        let mut session = GestureSession::default();
        session.set_mode(ContextMode::IrlStreaming);
        let outcome = session.process_frame(&HandFrame::new(Instant::now(), vec![hand(Shape::POINT, Right)]));
        assert_eq!(outcome.candidate, None);
        assert_eq!(session.metrics().mode, ContextMode::IrlStreaming);
    }

    #[test]
    fn false_positive_reports_are_counted() {
        let mut session = GestureSession::default();
        session.report_false_positive();
        session.report_false_positive();
        assert_eq!(session.metrics().false_positives, 2);
        assert_eq!(session.metrics().average_latency, Duration::ZERO);
    }
}
