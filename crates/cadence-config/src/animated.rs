//! Animatable numbers in project files.

use std::sync::Arc;

use cadence_core::{Easing, KeyFrame, KeyFrameAnimation, Property, Time};
use serde::{Deserialize, Serialize};

/// A parameter that is either a plain number or a keyframed curve.
///
/// Keyframe times are seconds from the start of the track's clip.
///
/// # TOML Format
///
/// ```toml
/// gain = 80.0
///
/// [tracks.speed]
/// value = 100.0
/// keyframes = [
///     { time = 0.0, value = 100.0 },
///     { time = 2.0, value = 150.0, easing = "smooth" },
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnimatedValue {
    /// Fixed value.
    Constant(f32),
    /// Curve with a fallback value.
    Animated {
        /// Value used where the curve has no keyframes.
        value: f32,
        /// Control points, any order.
        #[serde(default)]
        keyframes: Vec<KeyFrameConfig>,
    },
}

/// One control point of an [`AnimatedValue`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct KeyFrameConfig {
    /// Seconds from the start of the clip.
    pub time: f64,
    /// Value at `time`.
    pub value: f32,
    /// Curve used to arrive at this keyframe.
    #[serde(default)]
    pub easing: EasingConfig,
}

/// Easing names accepted in project files.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EasingConfig {
    /// Straight line.
    #[default]
    Linear,
    /// Step at the keyframe.
    Hold,
    /// Smoothstep.
    Smooth,
}

impl From<EasingConfig> for Easing {
    fn from(easing: EasingConfig) -> Self {
        match easing {
            EasingConfig::Linear => Easing::Linear,
            EasingConfig::Hold => Easing::Hold,
            EasingConfig::Smooth => Easing::Smooth,
        }
    }
}

impl AnimatedValue {
    /// The value used when no curve applies.
    pub fn base_value(&self) -> f32 {
        match self {
            AnimatedValue::Constant(value) | AnimatedValue::Animated { value, .. } => *value,
        }
    }

    /// Returns true if keyframes are present.
    pub fn is_animated(&self) -> bool {
        matches!(self, AnimatedValue::Animated { keyframes, .. } if !keyframes.is_empty())
    }

    /// Every number this value can produce: the base value and each keyframe
    /// value.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        let keyframes = match self {
            AnimatedValue::Constant(_) => &[][..],
            AnimatedValue::Animated { keyframes, .. } => keyframes.as_slice(),
        };
        std::iter::once(self.base_value()).chain(keyframes.iter().map(|k| k.value))
    }

    /// Keyframe times in seconds.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        let keyframes = match self {
            AnimatedValue::Constant(_) => &[][..],
            AnimatedValue::Animated { keyframes, .. } => keyframes.as_slice(),
        };
        keyframes.iter().map(|k| k.time)
    }

    /// Converts to a graph [`Property`].
    pub fn to_property(&self) -> Property {
        match self {
            AnimatedValue::Constant(value) => Property::constant(*value),
            AnimatedValue::Animated { value, keyframes } if keyframes.is_empty() => Property::constant(*value),
            AnimatedValue::Animated { value, keyframes } => {
                let keyframes = keyframes
                    .iter()
                    .map(|k| KeyFrame::new(Time::from_secs_f64(k.time), k.value).with_easing(k.easing.into()))
                    .collect();
                Property::animated(*value, Arc::new(KeyFrameAnimation::new(keyframes)))
            }
        }
    }
}

impl From<f32> for AnimatedValue {
    fn from(value: f32) -> Self {
        AnimatedValue::Constant(value)
    }
}

impl Default for AnimatedValue {
    fn default() -> Self {
        AnimatedValue::Constant(0.0)
    }
}
