//! Project file format.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cadence_core::FilterType;
use serde::{Deserialize, Serialize};

use crate::animated::AnimatedValue;
use crate::error::ConfigError;

/// A timeline: output format plus the tracks placed on it.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
///
/// [[tracks]]
/// name = "voice"
/// source = "voice.wav"
/// start = 1.5          # timeline seconds
/// offset = 0.25        # source seconds skipped
/// duration = 4.0       # optional, defaults to the rest of the source
/// gain = 90.0
/// speed = 110.0        # or time_stretch = 110.0 to keep the pitch
///
/// [tracks.delay]
/// delay_ms = 250.0
/// feedback = 30.0
///
/// [[tracks.equalizer]]
/// type = "high_pass"
/// frequency = 80.0
///
/// [[tracks.effects]]
/// type = "pan"
/// [tracks.effects.params]
/// pan = -30.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Output channels (1 or 2).
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Tracks in mixing order.
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_channels() -> u16 {
    2
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            tracks: Vec::new(),
        }
    }
}

impl ProjectConfig {
    /// Load a project from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a project from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize the project to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the project to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Add a track.
    #[must_use]
    pub fn with_track(mut self, track: TrackConfig) -> Self {
        self.tracks.push(track);
        self
    }
}

/// One clip on the timeline and the processing applied to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackConfig {
    /// Display name; defaults to the source path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Audio file, relative to the project file.
    pub source: PathBuf,

    /// Timeline position of the clip start, in seconds.
    #[serde(default)]
    pub start: f64,

    /// Source material skipped before the clip start, in seconds.
    #[serde(default)]
    pub offset: f64,

    /// Clip length in seconds. Defaults to the rest of the source at the
    /// track's base speed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Muted tracks are not compiled.
    #[serde(default)]
    pub muted: bool,

    /// Gain in percent.
    #[serde(default = "default_gain")]
    pub gain: AnimatedValue,

    /// Playback speed in percent; changes pitch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<AnimatedValue>,

    /// Pitch-preserving speed in percent (25-400).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_stretch: Option<f32>,

    /// Feedback delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayConfig>,

    /// Equalizer bands, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equalizer: Vec<BandConfig>,

    /// Plugin effects, applied in order after the delay.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectConfig>,
}

fn default_gain() -> AnimatedValue {
    AnimatedValue::Constant(100.0)
}

impl TrackConfig {
    /// Create a track playing `source` from the timeline start.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            source: source.into(),
            start: 0.0,
            offset: 0.0,
            duration: None,
            muted: false,
            gain: default_gain(),
            speed: None,
            time_stretch: None,
            delay: None,
            equalizer: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Name shown in logs and dumps.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.source.display().to_string())
    }

    /// Set the timeline start in seconds.
    #[must_use]
    pub fn with_start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    /// Set the clip length in seconds.
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Add an effect.
    #[must_use]
    pub fn with_effect(mut self, effect: EffectConfig) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Feedback delay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelayConfig {
    /// Delay time in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: AnimatedValue,
    /// Feedback in percent.
    #[serde(default = "default_feedback")]
    pub feedback: AnimatedValue,
    /// Dry level in percent.
    #[serde(default = "default_dry")]
    pub dry: AnimatedValue,
    /// Wet level in percent.
    #[serde(default = "default_wet")]
    pub wet: AnimatedValue,
}

fn default_delay_ms() -> AnimatedValue {
    AnimatedValue::Constant(200.0)
}

fn default_feedback() -> AnimatedValue {
    AnimatedValue::Constant(50.0)
}

fn default_dry() -> AnimatedValue {
    AnimatedValue::Constant(60.0)
}

fn default_wet() -> AnimatedValue {
    AnimatedValue::Constant(40.0)
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            feedback: default_feedback(),
            dry: default_dry(),
            wet: default_wet(),
        }
    }
}

/// Equalizer band shapes as spelled in project files.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BandType {
    /// Bell.
    #[default]
    Peak,
    /// Low shelf.
    LowShelf,
    /// High shelf.
    HighShelf,
    /// Low-pass.
    LowPass,
    /// High-pass.
    HighPass,
    /// Band-pass.
    BandPass,
    /// Notch.
    Notch,
}

impl From<BandType> for FilterType {
    fn from(band: BandType) -> Self {
        match band {
            BandType::Peak => FilterType::Peak,
            BandType::LowShelf => FilterType::LowShelf,
            BandType::HighShelf => FilterType::HighShelf,
            BandType::LowPass => FilterType::LowPass,
            BandType::HighPass => FilterType::HighPass,
            BandType::BandPass => FilterType::BandPass,
            BandType::Notch => FilterType::Notch,
        }
    }
}

/// One equalizer band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BandConfig {
    /// Band shape.
    #[serde(rename = "type", default)]
    pub band_type: BandType,
    /// Center or corner frequency in Hz.
    pub frequency: AnimatedValue,
    /// Gain in dB (ignored by pass and notch shapes).
    #[serde(default)]
    pub gain: AnimatedValue,
    /// Quality factor.
    #[serde(default = "default_q")]
    pub q: AnimatedValue,
}

fn default_q() -> AnimatedValue {
    AnimatedValue::Constant(core::f32::consts::FRAC_1_SQRT_2)
}

/// Configuration for a plugin effect on a track.
///
/// Effects can be bypassed by prefixing the type with `!` (e.g., `!pan`).
///
/// # Example
///
/// ```rust
/// use cadence_config::EffectConfig;
///
/// let config = EffectConfig::new("!delay").with_param("delay_ms", 120.0);
/// assert_eq!(config.effect_type, "delay");
/// assert!(config.bypassed);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectConfig {
    /// Effect type name (`delay`, `pan`).
    #[serde(rename = "type")]
    pub effect_type: String,

    /// Whether the effect is bypassed.
    #[serde(default)]
    pub bypassed: bool,

    /// Effect parameters.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl EffectConfig {
    /// Create a new effect configuration.
    ///
    /// If the type starts with `!`, the effect will be marked as bypassed.
    pub fn new(effect_type: impl Into<String>) -> Self {
        let type_str = effect_type.into();
        let (effect_type, bypassed) = match type_str.strip_prefix('!') {
            Some(stripped) => (stripped.to_string(), true),
            None => (type_str, false),
        };
        Self {
            effect_type,
            bypassed,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: f32) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a parameter value.
    pub fn get_param(&self, key: &str) -> Option<f32> {
        self.params.get(key).copied()
    }

    /// Effect type without a bypass prefix.
    pub fn kind(&self) -> &str {
        self.effect_type.strip_prefix('!').unwrap_or(&self.effect_type)
    }

    /// Returns true if bypassed by flag or by a `!` prefix in the file.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed || self.effect_type.starts_with('!')
    }
}
