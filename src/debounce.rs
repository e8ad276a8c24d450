//! Promotes raw per-frame candidates to confirmed gestures.
//!
//! A gesture is confirmed once it has been the top candidate for
//! `stability_frames` consecutive frames, then held for the dwell time, and
//! only if its cooldown since the previous confirmation has run out.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::{config::GestureConfig, types::GestureKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceSettings {
    pub stability_frames: u32,
    pub dwell_time: Duration,
    pub cooldown: Duration,
}

impl From<&GestureConfig> for DebounceSettings {
    fn from(config: &GestureConfig) -> Self {
        Self {
            stability_frames: config.stability_frames.max(1),
            dwell_time: config.dwell_time(),
            cooldown: config.cooldown(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Counting(u32),
    Dwelling,
    Cooldown,
}

#[derive(Clone, Copy, Debug, Default)]
struct GestureTimers {
    stable_frames: u32,
    dwell_start: Option<Instant>,
    last_confirmed: Option<Instant>,
}

impl GestureTimers {
    fn clear_progress(&mut self) {
        self.stable_frames = 0;
        self.dwell_start = None;
    }
}

#[derive(Clone, Debug)]
pub struct Debouncer {
    settings: DebounceSettings,
    timers: HashMap<GestureKind, GestureTimers>,
    in_progress: Option<GestureKind>,
}

impl Debouncer {
    pub fn new(settings: DebounceSettings) -> Self {
        Self {
            settings,
            timers: HashMap::new(),
            in_progress: None,
        }
    }

    pub fn settings(&self) -> DebounceSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: DebounceSettings) {
        self.settings = settings;
    }

    /// Feeds one frame's top candidate. Returns the gesture if this frame
    /// confirms it.
    pub fn update(&mut self, candidate: Option<GestureKind>, now: Instant) -> Option<GestureKind> {
        let Some(kind) = candidate else {
            self.abort();
            return None;
        };

        for (other, timers) in self.timers.iter_mut() {
            if *other != kind {
                timers.clear_progress();
            }
        }
        self.in_progress = Some(kind);

        let timers = self.timers.entry(kind).or_default();
        timers.stable_frames = timers.stable_frames.saturating_add(1);
        self.try_confirm(kind, now)
    }

    /// Re-checks the in-progress gesture's dwell and cooldown without
    /// counting a new frame.
    pub fn poll(&mut self, now: Instant) -> Option<GestureKind> {
        let kind = self.in_progress?;
        self.try_confirm(kind, now)
    }

    fn try_confirm(&mut self, kind: GestureKind, now: Instant) -> Option<GestureKind> {
        let settings = self.settings;
        let timers = self.timers.get_mut(&kind)?;
        if timers.stable_frames < settings.stability_frames {
            return None;
        }

        let dwell_start = *timers.dwell_start.get_or_insert(now);
        if now.saturating_duration_since(dwell_start) < settings.dwell_time {
            return None;
        }
        if let Some(last) = timers.last_confirmed {
            if now.saturating_duration_since(last) < settings.cooldown {
                return None;
            }
        }

        timers.last_confirmed = Some(now);
        timers.dwell_start = None;
        log::debug!("gesture {kind} confirmed after {} frames", timers.stable_frames);
        Some(kind)
    }

    /// Drops every in-progress gesture. Cooldown history is kept.
    pub fn abort(&mut self) {
        if let Some(kind) = self.in_progress.take() {
            log::debug!("gesture {kind} aborted");
        }
        for timers in self.timers.values_mut() {
            timers.clear_progress();
        }
    }

    pub fn clear(&mut self) {
        self.in_progress = None;
        self.timers.clear();
    }

    pub fn stable_frames(&self, kind: GestureKind) -> u32 {
        self.timers.get(&kind).map_or(0, |t| t.stable_frames)
    }

    pub fn phase(&self, kind: GestureKind, now: Instant) -> DebouncePhase {
        let Some(timers) = self.timers.get(&kind) else {
            return DebouncePhase::Idle;
        };
        if timers.dwell_start.is_some() {
            return DebouncePhase::Dwelling;
        }
        if timers.stable_frames > 0 && timers.stable_frames < self.settings.stability_frames {
            return DebouncePhase::Counting(timers.stable_frames);
        }
        match timers.last_confirmed {
            Some(last) if now.saturating_duration_since(last) < self.settings.cooldown => {
                DebouncePhase::Cooldown
            }
            _ if timers.stable_frames > 0 => DebouncePhase::Counting(timers.stable_frames),
            _ => DebouncePhase::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: GestureKind = GestureKind::OpenPalm;
    const POINT: GestureKind = GestureKind::Point;

    fn debouncer() -> Debouncer {
        Debouncer::new(DebounceSettings::from(&GestureConfig::default()))
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn stability_frames_then_dwell_confirms_once() {
        let mut d = debouncer();
        let t0 = Instant::now();
        assert_eq!(d.update(Some(OPEN), t0), None);
        assert_eq!(d.update(Some(OPEN), t0 + ms(33)), None);
        assert_eq!(d.update(Some(OPEN), t0 + ms(66)), None);
        assert_eq!(d.phase(OPEN, t0 + ms(66)), DebouncePhase::Dwelling);

        assert_eq!(d.poll(t0 + ms(366)), Some(OPEN));
        assert_eq!(d.poll(t0 + ms(400)), None);
        assert_eq!(d.poll(t0 + ms(800)), None);
    }

    #[test]
    fn one_frame_short_never_confirms() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.update(Some(OPEN), t0);
        d.update(Some(OPEN), t0 + ms(33));
        assert_eq!(d.phase(OPEN, t0 + ms(33)), DebouncePhase::Counting(2));
        assert_eq!(d.poll(t0 + ms(1_000)), None);
        assert_eq!(d.poll(t0 + ms(5_000)), None);
    }

    #[test]
    fn cooldown_suppresses_second_sequence() {
        let mut d = debouncer();
        let t0 = Instant::now();
        let mut confirmations = 0;
        let mut t = t0;
        for _ in 0..2 {
            for _ in 0..15 {
                if d.update(Some(OPEN), t).is_some() {
                    confirmations += 1;
                }
                t += ms(33);
            }
            d.update(None, t);
            t += ms(33);
        }
        assert!(t - t0 < ms(2_000));
        assert_eq!(confirmations, 1);
    }

    #[test]
    fn held_gesture_repeats_after_cooldown() {
        let mut d = debouncer();
        let t0 = Instant::now();
        let mut confirmed_at = Vec::new();
        for frame in 0..100u64 {
            let now = t0 + ms(frame * 33);
            if d.update(Some(OPEN), now).is_some() {
                confirmed_at.push(frame * 33);
            }
        }
        assert_eq!(confirmed_at.len(), 2);
        assert!(confirmed_at[1] - confirmed_at[0] >= 2_000);
    }

    #[test]
    fn switching_gesture_resets_the_other() {
        let mut d = debouncer();
        let t0 = Instant::now();
        d.update(Some(OPEN), t0);
        d.update(Some(OPEN), t0 + ms(33));
        d.update(Some(OPEN), t0 + ms(66));
        d.update(Some(POINT), t0 + ms(99));
        assert_eq!(d.stable_frames(OPEN), 0);
        assert_eq!(d.stable_frames(POINT), 1);
        assert_eq!(d.phase(OPEN, t0 + ms(99)), DebouncePhase::Idle);

        // Coming back starts from scratch.
        assert_eq!(d.update(Some(OPEN), t0 + ms(400)), None);
        assert_eq!(d.stable_frames(OPEN), 1);
    }

    #[test]
    fn abort_keeps_cooldown_but_clear_forgets_it() {
        let mut d = debouncer();
        let t0 = Instant::now();
        for i in 0..3 {
            d.update(Some(OPEN), t0 + ms(i * 33));
        }
        assert_eq!(d.poll(t0 + ms(400)), Some(OPEN));

        d.abort();
        assert_eq!(d.phase(OPEN, t0 + ms(500)), DebouncePhase::Cooldown);

        d.clear();
        assert_eq!(d.phase(OPEN, t0 + ms(500)), DebouncePhase::Idle);
        for i in 0..3 {
            d.update(Some(OPEN), t0 + ms(500 + i * 33));
        }
        assert_eq!(d.poll(t0 + ms(900)), Some(OPEN));
    }
}
