use std::time::Instant;

use crate::types::{CursorSample, Point2};

const FAST_SPEED: f32 = 500.0;
const SLOW_SPEED: f32 = 50.0;
const PREDICTION_DT: f32 = 0.033;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KalmanFilter {
    estimate: f32,
    error_covariance: f32,
    process_noise: f32,
    measurement_noise: f32,
}

impl KalmanFilter {
    pub fn new(initial: f32, process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            estimate: initial,
            error_covariance: 1.0,
            process_noise,
            measurement_noise,
        }
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    pub fn error_covariance(&self) -> f32 {
        self.error_covariance
    }

    /// Predict, then correct towards `measurement`. `speed` is in px/s.
    pub fn filter(&mut self, measurement: f32, speed: f32) -> f32 {
        let noise = if speed > FAST_SPEED {
            self.measurement_noise * 0.5
        } else if speed < SLOW_SPEED {
            self.measurement_noise * 1.5
        } else {
            self.measurement_noise
        };

        self.error_covariance += self.process_noise;
        let gain = self.error_covariance / (self.error_covariance + noise);
        self.estimate += gain * (measurement - self.estimate);
        self.error_covariance *= 1.0 - gain;
        self.estimate
    }

    pub fn reset(&mut self, value: f32) {
        self.estimate = value;
        self.error_covariance = 1.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisEstimate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct MultiAxisKalman {
    x: KalmanFilter,
    y: KalmanFilter,
    z: KalmanFilter,
    vx: KalmanFilter,
    vy: KalmanFilter,
}

impl Default for MultiAxisKalman {
    fn default() -> Self {
        Self {
            x: KalmanFilter::new(0.0, 0.1, 0.8),
            y: KalmanFilter::new(0.0, 0.1, 0.8),
            z: KalmanFilter::new(0.0, 0.1, 0.8),
            vx: KalmanFilter::new(0.0, 0.05, 0.6),
            vy: KalmanFilter::new(0.0, 0.05, 0.6),
        }
    }
}

impl MultiAxisKalman {
    pub fn filter(&mut self, measured: AxisEstimate) -> AxisEstimate {
        let speed = measured.vx.hypot(measured.vy);
        AxisEstimate {
            x: self.x.filter(measured.x, speed),
            y: self.y.filter(measured.y, speed),
            z: self.z.filter(measured.z, speed),
            vx: self.vx.filter(measured.vx, speed),
            vy: self.vy.filter(measured.vy, speed),
        }
    }

    pub fn reset_to(&mut self, value: AxisEstimate) {
        self.x.reset(value.x);
        self.y.reset(value.y);
        self.z.reset(value.z);
        self.vx.reset(value.vx);
        self.vy.reset(value.vy);
    }
}

#[derive(Clone, Copy, Debug)]
struct Motion {
    time: Instant,
    raw: Point2,
    velocity: Point2,
    acceleration: Point2,
}

#[derive(Clone, Debug, Default)]
pub struct CursorSmoother {
    filters: MultiAxisKalman,
    position: Option<Point2>,
    last: Option<Motion>,
}

impl CursorSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.position.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, raw: Point2, depth: f32, now: Instant) -> CursorSample {
        let (velocity, acceleration) = match self.last {
            Some(prev) => {
                let dt = now.saturating_duration_since(prev.time).as_secs_f32();
                if dt > 0.0 {
                    let v = Point2::new((raw.x - prev.raw.x) / dt, (raw.y - prev.raw.y) / dt);
                    let a = Point2::new(
                        (v.x - prev.velocity.x) / dt,
                        (v.y - prev.velocity.y) / dt,
                    );
                    (v, a)
                } else {
                    (prev.velocity, prev.acceleration)
                }
            }
            None => (Point2::default(), Point2::default()),
        };
        self.last = Some(Motion {
            time: now,
            raw,
            velocity,
            acceleration,
        });

        let measured = AxisEstimate {
            x: raw.x,
            y: raw.y,
            z: depth,
            vx: velocity.x,
            vy: velocity.y,
        };

        let Some(previous) = self.position else {
            self.filters.reset_to(measured);
            self.position = Some(raw);
            return CursorSample {
                position: raw,
                velocity,
                predicted: raw,
                depth,
            };
        };

        let filtered = self.filters.filter(measured);
        let speed = velocity.x.hypot(velocity.y);
        let divisor = if speed > FAST_SPEED {
            2.0
        } else if speed < SLOW_SPEED {
            4.0
        } else {
            3.0
        };
        let position = Point2::new(
            previous.x + (filtered.x - previous.x) / divisor,
            previous.y + (filtered.y - previous.y) / divisor,
        );
        self.position = Some(position);

        CursorSample {
            position,
            velocity: Point2::new(filtered.vx, filtered.vy),
            predicted: predict(position, velocity, acceleration),
            depth: filtered.z,
        }
    }
}

/// Constant-acceleration look-ahead about two frames out.
pub fn predict(position: Point2, velocity: Point2, acceleration: Point2) -> Point2 {
    let dt = PREDICTION_DT;
    let ahead = |p: f32, v: f32, a: f32| p + v * dt * 2.0 + 0.5 * a * dt * dt * 4.0;
    Point2::new(
        ahead(position.x, velocity.x, acceleration.x),
        ahead(position.y, velocity.y, acceleration.y),
    )
}

pub fn map_to_viewport(point: Point2, reference: (f32, f32), viewport: (f32, f32)) -> Point2 {
    let (rw, rh) = reference;
    let (vw, vh) = viewport;
    if rw <= 0.0 || rh <= 0.0 {
        return point;
    }
    Point2::new(point.x / rw * vw, point.y / rh * vh)
}
