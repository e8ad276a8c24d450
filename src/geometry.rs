use crate::{
    config::GestureConfig,
    types::{
        FingerState, HandObservation, INDEX_MCP, INDEX_PIP, INDEX_TIP, Landmark, MIDDLE_MCP,
        MIDDLE_PIP, MIDDLE_TIP, PINKY_MCP, PINKY_PIP, PINKY_TIP, Point2, RING_MCP, RING_PIP,
        RING_TIP, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// `(tip, pip, mcp)` landmark indices. For the thumb the IP joint stands
    /// in for the PIP.
    pub fn joints(&self) -> (usize, usize, usize) {
        match self {
            Finger::Thumb => (THUMB_TIP, THUMB_IP, THUMB_MCP),
            Finger::Index => (INDEX_TIP, INDEX_PIP, INDEX_MCP),
            Finger::Middle => (MIDDLE_TIP, MIDDLE_PIP, MIDDLE_MCP),
            Finger::Ring => (RING_TIP, RING_PIP, RING_MCP),
            Finger::Pinky => (PINKY_TIP, PINKY_PIP, PINKY_MCP),
        }
    }
}

fn sub(a: Landmark, b: Landmark) -> [f32; 3] {
    [a.x - b.x, a.y - b.y, a.z - b.z]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn length(v: [f32; 3]) -> f32 {
    dot(v, v).sqrt()
}

/// Angle at `b` between the rays `b->a` and `b->c`, in degrees.
///
/// Returns 180 when either ray is degenerate.
pub fn angle_between(a: Landmark, b: Landmark, c: Landmark) -> f32 {
    angle_of(sub(a, b), sub(c, b))
}

/// Like [`angle_between`] but measured on the image plane after scaling the
/// normalized coordinates to `width` x `height` pixels.
pub fn pixel_angle(a: Landmark, b: Landmark, c: Landmark, width: f32, height: f32) -> f32 {
    let v1 = [(a.x - b.x) * width, (a.y - b.y) * height, 0.0];
    let v2 = [(c.x - b.x) * width, (c.y - b.y) * height, 0.0];
    angle_of(v1, v2)
}

fn angle_of(v1: [f32; 3], v2: [f32; 3]) -> f32 {
    let denom = length(v1) * length(v2);
    if denom <= f32::EPSILON {
        return 180.0;
    }
    let cos = (dot(v1, v2) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

pub fn distance3(a: Landmark, b: Landmark) -> f32 {
    length(sub(a, b))
}

pub fn pixel_distance(a: Landmark, b: Landmark, width: f32, height: f32) -> f32 {
    ((a.x - b.x) * width).hypot((a.y - b.y) * height)
}

pub fn to_pixels(p: Landmark, width: f32, height: f32) -> Point2 {
    Point2::new(p.x * width, p.y * height)
}

pub fn palm_center(hand: &HandObservation) -> Option<Point2> {
    let wrist = hand.landmark(WRIST)?;
    let middle = hand.landmark(MIDDLE_MCP)?;
    Some(Point2::new((wrist.x + middle.x) / 2.0, (wrist.y + middle.y) / 2.0))
}

pub fn stability_point(hand: &HandObservation) -> Option<Point2> {
    hand.landmark(MIDDLE_MCP).map(|p| Point2::new(p.x, p.y))
}

/// Straight vs. bent, read from image-y ordering of the joints (x for the
/// thumb). Anything between the two bands is `HalfBent`.
pub fn finger_state(hand: &HandObservation, finger: Finger, config: &GestureConfig) -> FingerState {
    if !hand.is_complete() {
        return FingerState::HalfBent;
    }
    let (tip_idx, pip_idx, mcp_idx) = finger.joints();
    let tip = hand.landmarks[tip_idx];
    let pip = hand.landmarks[pip_idx];
    let mcp = hand.landmarks[mcp_idx];

    if finger == Finger::Thumb {
        let outward = (tip.x - pip.x) * hand.handedness.thumb_outward_sign();
        return if outward > config.thumb_margin {
            FingerState::Extended
        } else if outward <= 0.0 {
            FingerState::Folded
        } else {
            FingerState::HalfBent
        };
    }

    if tip.y < pip.y - config.extension_margin && pip.y < mcp.y - config.pip_margin {
        FingerState::Extended
    } else if tip.y >= pip.y {
        FingerState::Folded
    } else {
        FingerState::HalfBent
    }
}

pub fn finger_states(hand: &HandObservation, config: &GestureConfig) -> [FingerState; 5] {
    Finger::ALL.map(|finger| finger_state(hand, finger, config))
}

pub fn is_finger_extended(hand: &HandObservation, finger: Finger, config: &GestureConfig) -> bool {
    finger_state(hand, finger, config) == FingerState::Extended
}

pub fn is_finger_bent(hand: &HandObservation, finger: Finger, config: &GestureConfig) -> bool {
    finger_state(hand, finger, config) == FingerState::Folded
}
