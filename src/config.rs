use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::GestureKind,
};

/// Named presets. Each one is plain data: switching mode builds a fresh
/// [`GestureConfig`] rather than mutating a shared one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextMode {
    #[default]
    Normal,
    Gaming,
    IrlStreaming,
    JustChatting,
}

impl ContextMode {
    pub const ALL: [ContextMode; 4] = [
        ContextMode::Normal,
        ContextMode::Gaming,
        ContextMode::IrlStreaming,
        ContextMode::JustChatting,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContextMode::Normal => "NORMAL",
            ContextMode::Gaming => "GAMING",
            ContextMode::IrlStreaming => "IRL_STREAMING",
            ContextMode::JustChatting => "JUST_CHATTING",
        }
    }

    pub fn profile(&self) -> ModeProfile {
        match self {
            ContextMode::Normal | ContextMode::JustChatting => ModeProfile {
                confidence_threshold: 0.85,
                dwell_time_ms: 300,
                cooldown_ms: 2_000,
                stability_threshold: 0.05,
                allowed_gestures: None,
            },
            ContextMode::Gaming => ModeProfile {
                confidence_threshold: 0.92,
                dwell_time_ms: 400,
                cooldown_ms: 3_000,
                stability_threshold: 0.03,
                allowed_gestures: None,
            },
            ContextMode::IrlStreaming => ModeProfile {
                confidence_threshold: 0.90,
                dwell_time_ms: 500,
                cooldown_ms: 4_000,
                stability_threshold: 0.04,
                allowed_gestures: Some(&[GestureKind::OpenPalm, GestureKind::OkSign]),
            },
        }
    }
}

impl std::str::FromStr for ContextMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        ContextMode::ALL
            .into_iter()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| Error::Config(format!("unknown context mode `{s}`")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeProfile {
    pub confidence_threshold: f32,
    pub dwell_time_ms: u64,
    pub cooldown_ms: u64,
    pub stability_threshold: f32,
    pub allowed_gestures: Option<&'static [GestureKind]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveZone {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for ActiveZone {
    fn default() -> Self {
        Self {
            x_min: 0.2,
            x_max: 0.8,
            y_min: 0.2,
            y_max: 0.8,
        }
    }
}

impl ActiveZone {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub mode: ContextMode,
    pub confidence_threshold: f32,
    pub min_detection_confidence: f32,
    pub dwell_time_ms: u64,
    pub cooldown_ms: u64,
    pub stability_frames: u32,
    /// Max normalized movement of the hand between frames to count as steady.
    pub stability_threshold: f32,
    pub active_zone: ActiveZone,
    pub reference_width: f32,
    pub reference_height: f32,
    pub pinch_distance_px: f32,
    pub ok_distance_px: f32,
    /// Index and middle tips closer than this count as joined.
    pub finger_join_px: f32,
    pub extension_margin: f32,
    pub pip_margin: f32,
    pub thumb_margin: f32,
    pub open_palm_min_span: f32,
    pub thumb_horizontal_tolerance: f32,
    pub l_shape_angle: [f32; 2],
    pub motion_step_px: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_gestures: Option<Vec<GestureKind>>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self::for_mode(ContextMode::Normal)
    }
}

impl GestureConfig {
    pub fn for_mode(mode: ContextMode) -> Self {
        let profile = mode.profile();
        Self {
            mode,
            confidence_threshold: profile.confidence_threshold,
            min_detection_confidence: 0.7,
            dwell_time_ms: profile.dwell_time_ms,
            cooldown_ms: profile.cooldown_ms,
            stability_frames: 3,
            stability_threshold: profile.stability_threshold,
            active_zone: ActiveZone::default(),
            reference_width: 640.0,
            reference_height: 480.0,
            pinch_distance_px: 25.0,
            ok_distance_px: 30.0,
            finger_join_px: 40.0,
            extension_margin: 0.02,
            pip_margin: 0.01,
            thumb_margin: 0.02,
            open_palm_min_span: 0.15,
            thumb_horizontal_tolerance: 0.05,
            l_shape_angle: [60.0, 120.0],
            motion_step_px: 10.0,
            allowed_gestures: profile.allowed_gestures.map(<[GestureKind]>::to_vec),
        }
    }

    pub fn apply_mode(&mut self, mode: ContextMode) {
        let profile = mode.profile();
        self.mode = mode;
        self.confidence_threshold = profile.confidence_threshold;
        self.dwell_time_ms = profile.dwell_time_ms;
        self.cooldown_ms = profile.cooldown_ms;
        self.stability_threshold = profile.stability_threshold;
        self.allowed_gestures = profile.allowed_gestures.map(<[GestureKind]>::to_vec);
    }

    pub fn dwell_time(&self) -> Duration {
        Duration::from_millis(self.dwell_time_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn is_allowed(&self, kind: GestureKind) -> bool {
        self.allowed_gestures
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&kind))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(Error::Config(format!(
                "min_detection_confidence must be in [0, 1], got {}",
                self.min_detection_confidence
            )));
        }
        if self.stability_frames == 0 {
            return Err(Error::Config("stability_frames must be > 0".to_string()));
        }
        let zone = &self.active_zone;
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(in_unit(zone.x_min) && in_unit(zone.x_max) && in_unit(zone.y_min) && in_unit(zone.y_max))
            || zone.x_min >= zone.x_max
            || zone.y_min >= zone.y_max
        {
            return Err(Error::Config(format!(
                "active_zone must be a non-empty rectangle inside [0, 1], got {zone:?}"
            )));
        }
        if self.reference_width <= 0.0 || self.reference_height <= 0.0 {
            return Err(Error::Config(format!(
                "reference resolution must be positive, got {}x{}",
                self.reference_width, self.reference_height
            )));
        }
        let [lo, hi] = self.l_shape_angle;
        if !(0.0..=180.0).contains(&lo) || !(0.0..=180.0).contains(&hi) || lo >= hi {
            return Err(Error::Config(format!(
                "l_shape_angle must be an increasing range inside [0, 180], got [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    /// Parses a TOML document. `mode` picks the base preset and every other
    /// key overrides it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with_mode(content, None)
    }

    /// Like [`GestureConfig::from_toml_str`], but `mode`, when given, replaces
    /// the document's own `mode` as the base preset. The document's other
    /// keys still override that preset.
    pub fn from_toml_str_with_mode(content: &str, mode: Option<ContextMode>) -> Result<Self> {
        let mut overrides: toml::Table =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let file_mode = match overrides.remove("mode") {
            Some(value) => value
                .try_into::<ContextMode>()
                .map_err(|e| Error::Config(e.to_string()))?,
            None => ContextMode::Normal,
        };
        let mode = mode.unwrap_or(file_mode);

        let base = toml::Value::try_from(Self::for_mode(mode))
            .map_err(|e| Error::Config(e.to_string()))?;
        let toml::Value::Table(mut merged) = base else {
            return Err(Error::Config("preset did not serialize to a table".to_string()));
        };
        merge_tables(&mut merged, overrides);

        let config: Self = toml::Value::Table(merged)
            .try_into()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_mode(path, None)
    }

    pub fn load_with_mode(path: &Path, mode: Option<ContextMode>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str_with_mode(&content, mode)?;
        log::info!(
            "loaded gesture config from {} (mode {})",
            path.display(),
            config.mode.name()
        );
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
