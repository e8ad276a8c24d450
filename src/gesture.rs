use crate::{
    config::GestureConfig,
    geometry::{distance3, finger_states, pixel_angle, pixel_distance},
    types::{
        FingerState, GestureCandidate, GestureKind, HandObservation, INDEX_TIP, MIDDLE_TIP,
        MotionEvent, PINKY_TIP, ScrollDirection, THUMB_MCP, THUMB_TIP, WRIST, ZoomDirection,
    },
};

#[derive(Clone, Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Best candidate for the hands of one frame.
    ///
    /// Exactly two hands are first tried as a two-hand gesture; when the pair
    /// does not qualify the first hand is classified on its own.
    pub fn classify(&self, hands: &[HandObservation]) -> Option<GestureCandidate> {
        if let [first, second] = hands {
            if let Some(candidate) = self.classify_pair(first, second) {
                return Some(candidate);
            }
        }
        hands.first().and_then(|hand| self.classify_hand(hand))
    }

    /// Evaluates every single-hand predicate and keeps the most confident
    /// match at or above the threshold. On an exact tie the gesture listed
    /// first in [`GestureKind::SINGLE_HAND`] wins.
    pub fn classify_hand(&self, hand: &HandObservation) -> Option<GestureCandidate> {
        let shape = HandShape::measure(hand, &self.config)?;

        let mut best: Option<GestureCandidate> = None;
        for kind in GestureKind::SINGLE_HAND {
            if !self.accepts(kind) || !shape.matches(kind, &self.config) {
                continue;
            }
            let confidence = kind.prior_confidence();
            if best.is_none_or(|current| confidence > current.confidence) {
                best = Some(GestureCandidate::new(kind, confidence));
            }
        }
        best
    }

    pub fn classify_pair(
        &self,
        first: &HandObservation,
        second: &HandObservation,
    ) -> Option<GestureCandidate> {
        let a = HandShape::measure(first, &self.config)?;
        let b = HandShape::measure(second, &self.config)?;

        if a.is_open_palm(&self.config) && b.is_open_palm(&self.config) {
            if self.accepts(GestureKind::Grab) {
                return Some(GestureCandidate::new(
                    GestureKind::Grab,
                    GestureKind::Grab.prior_confidence(),
                ));
            }
        } else if a.is_zoom_shape() && b.is_zoom_shape() && self.accepts(GestureKind::Zoom) {
            return Some(GestureCandidate::new(
                GestureKind::Zoom,
                GestureKind::Zoom.prior_confidence(),
            ));
        }
        None
    }

    fn accepts(&self, kind: GestureKind) -> bool {
        self.config.is_allowed(kind) && kind.prior_confidence() >= self.config.confidence_threshold
    }
}

#[derive(Clone, Copy, Debug)]
struct HandShape {
    fingers: [FingerState; 5],
    thumb_index_px: f32,
    index_middle_px: f32,
    thumb_wrist_index_deg: f32,
    tip_span: f32,
    thumb_slope: f32,
}

impl HandShape {
    fn measure(hand: &HandObservation, config: &GestureConfig) -> Option<Self> {
        if !hand.is_complete() {
            return None;
        }
        let lm = &hand.landmarks;
        let (w, h) = (config.reference_width, config.reference_height);
        Some(Self {
            fingers: finger_states(hand, config),
            thumb_index_px: pixel_distance(lm[THUMB_TIP], lm[INDEX_TIP], w, h),
            index_middle_px: pixel_distance(lm[INDEX_TIP], lm[MIDDLE_TIP], w, h),
            thumb_wrist_index_deg: pixel_angle(lm[THUMB_TIP], lm[WRIST], lm[INDEX_TIP], w, h),
            tip_span: distance3(lm[INDEX_TIP], lm[PINKY_TIP]),
            thumb_slope: (lm[THUMB_TIP].y - lm[THUMB_MCP].y).abs(),
        })
    }

    fn extended(&self, finger: usize) -> bool {
        self.fingers[finger] == FingerState::Extended
    }

    fn folded(&self, finger: usize) -> bool {
        self.fingers[finger] == FingerState::Folded
    }

    fn lower_three_extended(&self) -> bool {
        self.extended(2) && self.extended(3) && self.extended(4)
    }

    fn lower_three_folded(&self) -> bool {
        self.folded(2) && self.folded(3) && self.folded(4)
    }

    fn is_open_palm(&self, config: &GestureConfig) -> bool {
        self.fingers.iter().all(|f| *f == FingerState::Extended)
            && self.tip_span > config.open_palm_min_span
    }

    fn is_two_finger_shape(&self) -> bool {
        self.extended(1) && self.extended(2) && self.folded(3) && self.folded(4) && !self.extended(0)
    }

    /// Thumb and index out, the rest curled. Both hands holding it is zoom.
    fn is_zoom_shape(&self) -> bool {
        self.extended(0) && self.extended(1) && self.lower_three_folded()
    }

    fn is_scroll_shape(&self) -> bool {
        self.folded(0) && self.extended(1) && self.lower_three_extended()
    }

    fn matches(&self, kind: GestureKind, config: &GestureConfig) -> bool {
        match kind {
            GestureKind::OpenPalm => self.is_open_palm(config),
            GestureKind::Point => {
                self.extended(1) && self.lower_three_folded() && !self.extended(0)
            }
            GestureKind::LShape => {
                let [lo, hi] = config.l_shape_angle;
                self.is_zoom_shape()
                    && (lo..=hi).contains(&self.thumb_wrist_index_deg)
            }
            GestureKind::OkSign => {
                self.thumb_index_px < config.ok_distance_px && self.lower_three_extended()
            }
            GestureKind::Pinch => {
                self.thumb_index_px < config.pinch_distance_px && self.lower_three_folded()
            }
            GestureKind::TwoFingers => {
                self.is_two_finger_shape() && self.index_middle_px > config.finger_join_px
            }
            GestureKind::Click => {
                self.is_two_finger_shape() && self.index_middle_px < config.finger_join_px
            }
            GestureKind::ThreeFingers => {
                self.extended(1)
                    && self.extended(2)
                    && self.extended(3)
                    && self.folded(4)
                    && !self.extended(0)
            }
            GestureKind::ThumbOut => {
                self.extended(0)
                    && self.folded(1)
                    && self.lower_three_folded()
                    && self.thumb_slope < config.thumb_horizontal_tolerance
            }
            GestureKind::Zoom | GestureKind::Grab => false,
        }
    }
}

/// Frame-to-frame direction tracking for the continuous gestures: two-hand
/// zoom and single-hand scroll.
///
/// A step is reported once the tracked distance has moved more than
/// `motion_step_px` from the last reference, which then moves to the new
/// value. There is no hysteresis band, so jitter right at the step size can
/// alternate between directions.
#[derive(Clone, Debug, Default)]
pub struct MotionTracker {
    zoom_reference: Option<f32>,
    scroll_anchor: Option<f32>,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.zoom_reference = None;
        self.scroll_anchor = None;
    }

    pub fn update(
        &mut self,
        hands: &[HandObservation],
        classifier: &GestureClassifier,
    ) -> Option<MotionEvent> {
        let config = classifier.config();
        let (w, h) = (config.reference_width, config.reference_height);
        let step = config.motion_step_px;

        match hands {
            [first, second] => {
                self.scroll_anchor = None;
                let zooming = classifier
                    .classify_pair(first, second)
                    .is_some_and(|c| c.kind == GestureKind::Zoom);
                if !zooming {
                    self.zoom_reference = None;
                    return None;
                }

                let distance =
                    pixel_distance(first.landmarks[INDEX_TIP], second.landmarks[INDEX_TIP], w, h);
                let Some(reference) = self.zoom_reference else {
                    self.zoom_reference = Some(distance);
                    return None;
                };
                let delta = distance - reference;
                if delta.abs() <= step {
                    return None;
                }
                self.zoom_reference = Some(distance);
                let direction = if delta > 0.0 {
                    ZoomDirection::In
                } else {
                    ZoomDirection::Out
                };
                Some(MotionEvent::Zoom(direction))
            }
            [hand] => {
                self.zoom_reference = None;
                let scrolling = config.allowed_gestures.is_none()
                    && HandShape::measure(hand, config).is_some_and(|s| s.is_scroll_shape());
                if !scrolling {
                    self.scroll_anchor = None;
                    return None;
                }

                let y = hand.landmarks[INDEX_TIP].y * h;
                let Some(anchor) = self.scroll_anchor else {
                    self.scroll_anchor = Some(y);
                    return None;
                };
                let delta = y - anchor;
                if delta.abs() <= step {
                    return None;
                }
                self.scroll_anchor = Some(y);
                let direction = if delta > 0.0 {
                    ScrollDirection::Down
                } else {
                    ScrollDirection::Up
                };
                Some(MotionEvent::Scroll(direction))
            }
            _ => {
                self.reset();
                None
            }
        }
    }
}
