use std::{fmt, time::Instant};

use serde::{Deserialize, Serialize};

pub const NUM_LANDMARKS: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_TIP: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Handedness {
    /// Sign of the outward thumb direction along image x.
    ///
    /// The landmark source reports handedness for a mirrored selfie view, so a
    /// right hand's thumb points towards smaller x. Unlabelled hands are
    /// treated as right hands.
    pub fn thumb_outward_sign(&self) -> f32 {
        match self {
            Handedness::Left => 1.0,
            Handedness::Right | Handedness::Unknown => -1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub handedness: Handedness,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl HandObservation {
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
            confidence: 1.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= NUM_LANDMARKS
    }

    pub fn landmark(&self, idx: usize) -> Option<Landmark> {
        self.landmarks.get(idx).copied()
    }
}

#[derive(Clone, Debug)]
pub struct HandFrame {
    pub timestamp: Instant,
    pub hands: Vec<HandObservation>,
}

impl HandFrame {
    pub fn new(timestamp: Instant, hands: Vec<HandObservation>) -> Self {
        Self { timestamp, hands }
    }

    pub fn empty(timestamp: Instant) -> Self {
        Self {
            timestamp,
            hands: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FingerState {
    Extended,
    HalfBent,
    Folded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureKind {
    OpenPalm,
    Point,
    LShape,
    OkSign,
    Pinch,
    TwoFingers,
    Click,
    ThreeFingers,
    ThumbOut,
    Zoom,
    Grab,
}

impl GestureKind {
    pub const SINGLE_HAND: [GestureKind; 9] = [
        GestureKind::OpenPalm,
        GestureKind::Point,
        GestureKind::LShape,
        GestureKind::OkSign,
        GestureKind::Pinch,
        GestureKind::TwoFingers,
        GestureKind::Click,
        GestureKind::ThreeFingers,
        GestureKind::ThumbOut,
    ];

    pub fn prior_confidence(&self) -> f32 {
        match self {
            GestureKind::OpenPalm => 0.98,
            GestureKind::Point => 0.92,
            GestureKind::LShape => 0.88,
            GestureKind::OkSign => 0.87,
            GestureKind::Pinch => 0.83,
            GestureKind::TwoFingers => 0.78,
            GestureKind::Click => 0.86,
            GestureKind::ThreeFingers => 0.73,
            GestureKind::ThumbOut => 0.75,
            GestureKind::Zoom => 0.92,
            GestureKind::Grab => 0.95,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GestureKind::OpenPalm => "OPEN_PALM",
            GestureKind::Point => "POINT",
            GestureKind::LShape => "L_SHAPE",
            GestureKind::OkSign => "OK_SIGN",
            GestureKind::Pinch => "PINCH",
            GestureKind::TwoFingers => "TWO_FINGERS",
            GestureKind::Click => "CLICK",
            GestureKind::ThreeFingers => "THREE_FINGERS",
            GestureKind::ThumbOut => "THUMB_OUT",
            GestureKind::Zoom => "ZOOM",
            GestureKind::Grab => "GRAB",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GestureKind::OpenPalm => "Open Palm",
            GestureKind::Point => "Point",
            GestureKind::LShape => "L-Shape",
            GestureKind::OkSign => "OK Sign",
            GestureKind::Pinch => "Pinch",
            GestureKind::TwoFingers => "Two Fingers",
            GestureKind::Click => "Click",
            GestureKind::ThreeFingers => "Three Fingers",
            GestureKind::ThumbOut => "Thumb Out",
            GestureKind::Zoom => "Zoom",
            GestureKind::Grab => "Grab",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GestureKind::OpenPalm => "✋ ",
            GestureKind::Point => "👉 ",
            GestureKind::LShape => "🔲 ",
            GestureKind::OkSign => "👌 ",
            GestureKind::Pinch => "🤏 ",
            GestureKind::TwoFingers => "✌️ ",
            GestureKind::Click => "👆 ",
            GestureKind::ThreeFingers => "🖖 ",
            GestureKind::ThumbOut => "👍 ",
            GestureKind::Zoom => "🔍 ",
            GestureKind::Grab => "🖐️ ",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureCandidate {
    pub kind: GestureKind,
    pub confidence: f32,
}

impl GestureCandidate {
    pub fn new(kind: GestureKind, confidence: f32) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn display_text(&self) -> String {
        format!(
            "{}{} ({:.0}%)",
            self.kind.emoji(),
            self.kind.display_name(),
            self.confidence * 100.0
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionEvent {
    Zoom(ZoomDirection),
    Scroll(ScrollDirection),
}

impl MotionEvent {
    pub fn label(&self) -> &'static str {
        match self {
            MotionEvent::Zoom(ZoomDirection::In) => "Zoom In",
            MotionEvent::Zoom(ZoomDirection::Out) => "Zoom Out",
            MotionEvent::Scroll(ScrollDirection::Up) => "Scroll Up",
            MotionEvent::Scroll(ScrollDirection::Down) => "Scroll Down",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorSample {
    pub position: Point2,
    pub velocity: Point2,
    pub predicted: Point2,
    pub depth: f32,
}
