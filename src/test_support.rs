use crate::types::{HandObservation, Handedness, Landmark, NUM_LANDMARKS};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Shape(pub [bool; 5]);

impl Shape {
    pub const OPEN: Shape = Shape([true; 5]);
    pub const FIST: Shape = Shape([false; 5]);
    pub const POINT: Shape = Shape([false, true, false, false, false]);
    pub const L_SHAPE: Shape = Shape([true, true, false, false, false]);
    pub const TWO: Shape = Shape([false, true, true, false, false]);
    pub const THREE: Shape = Shape([false, true, true, true, false]);
    pub const THUMB_OUT: Shape = Shape([true, false, false, false, false]);
    pub const FOUR: Shape = Shape([false, true, true, true, true]);
    pub const OK_BASE: Shape = Shape([false, false, true, true, true]);
}

const FINGER_BASE_X: [f32; 4] = [0.44, 0.49, 0.54, 0.59];
const FINGER_TIP_X: [f32; 4] = [0.42, 0.49, 0.56, 0.63];
const MCP_Y: f32 = 0.55;

/// A right hand, palm towards the camera, centred in the frame. Left hands
/// are the horizontal mirror image.
pub(crate) fn hand(shape: Shape, handedness: Handedness) -> HandObservation {
    let mut points = vec![Landmark::default(); NUM_LANDMARKS];
    points[0] = Landmark::new(0.50, 0.70, 0.0);

    let thumb: [(f32, f32); 4] = if shape.0[0] {
        [(0.45, 0.67), (0.40, 0.63), (0.34, 0.64), (0.28, 0.66)]
    } else {
        [(0.45, 0.67), (0.42, 0.63), (0.42, 0.60), (0.47, 0.60)]
    };
    for (i, (x, y)) in thumb.into_iter().enumerate() {
        points[1 + i] = Landmark::new(x, y, -0.01);
    }

    for finger in 0..4 {
        let base = 5 + finger * 4;
        let mcp_x = FINGER_BASE_X[finger];
        points[base] = Landmark::new(mcp_x, MCP_Y, 0.0);
        let joints: [(f32, f32); 3] = if shape.0[finger + 1] {
            let tip_x = FINGER_TIP_X[finger];
            let lerp = |t: f32| mcp_x + (tip_x - mcp_x) * t;
            [(lerp(0.45), 0.47), (lerp(0.75), 0.42), (tip_x, 0.37)]
        } else {
            [(mcp_x, 0.50), (mcp_x, 0.53), (mcp_x, 0.56)]
        };
        for (j, (x, y)) in joints.into_iter().enumerate() {
            points[base + 1 + j] = Landmark::new(x, y, -0.02);
        }
    }

    let mut observation = HandObservation::new(points, Handedness::Right);
    if handedness == Handedness::Left {
        for p in &mut observation.landmarks {
            p.x = 1.0 - p.x;
        }
    }
    observation.handedness = handedness;
    observation
}

pub(crate) fn pinching(mut hand: HandObservation) -> HandObservation {
    let mirror = hand.handedness == Handedness::Left;
    let x = |v: f32| if mirror { 1.0 - v } else { v };
    hand.landmarks[4] = Landmark::new(x(0.44), 0.52, -0.03);
    hand.landmarks[8] = Landmark::new(x(0.45), 0.52, -0.03);
    hand
}

pub(crate) fn shifted(mut hand: HandObservation, dx: f32, dy: f32) -> HandObservation {
    for p in &mut hand.landmarks {
        p.x += dx;
        p.y += dy;
    }
    hand
}
