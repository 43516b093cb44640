//! Animatable parameters and the sampler that evaluates them.
//!
//! Every numeric node parameter is a [`Property`]: a current value plus an
//! optional shared [`KeyFrameAnimation`]. Nodes never evaluate animations
//! themselves; they ask the [`AnimationSampler`] carried by the
//! [`ProcessContext`](crate::ProcessContext) for one value per output sample.
//!
//! [`KeyFrameSampler`] is the stock sampler. Hosts with their own animation
//! model implement [`AnimationSampler`] instead.

use std::sync::Arc;

use crate::time::{Time, TimeRange};

/// Interpolation curve used to reach a keyframe from the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Straight line between the two values.
    #[default]
    Linear,
    /// Keep the previous value until this keyframe is reached.
    Hold,
    /// Smoothstep (`3t² - 2t³`), zero slope at both ends.
    Smooth,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` onto the eased progress.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Hold => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Easing::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// One control point of a [`KeyFrameAnimation`].
///
/// `easing` shapes the segment that *ends* at this keyframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyFrame {
    /// Position on the animation's time axis.
    pub time: Time,
    /// Value reached at `time`.
    pub value: f32,
    /// Curve used to arrive at this keyframe.
    pub easing: Easing,
}

impl KeyFrame {
    /// Creates a linearly eased keyframe.
    pub fn new(time: Time, value: f32) -> Self {
        Self {
            time,
            value,
            easing: Easing::Linear,
        }
    }

    /// Sets the easing of the segment arriving at this keyframe.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// A value curve defined by time-ordered keyframes.
///
/// Before the first keyframe the curve holds the first value; after the last
/// it holds the last value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyFrameAnimation {
    keyframes: Vec<KeyFrame>,
}

impl KeyFrameAnimation {
    /// Creates an animation. Keyframes are sorted by time; keyframes sharing a
    /// time keep their given order.
    pub fn new(mut keyframes: Vec<KeyFrame>) -> Self {
        keyframes.sort_by_key(|k| k.time);
        Self { keyframes }
    }

    /// Keyframes in time order.
    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    /// Returns true if there are no keyframes.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Evaluates the curve at `time`. `None` if there are no keyframes.
    pub fn value_at(&self, time: Time) -> Option<f32> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }
        // First keyframe strictly after `time`; exists because time < last.time.
        let next = self.keyframes.partition_point(|k| k.time <= time);
        let from = self.keyframes[next - 1];
        let to = self.keyframes[next];
        Some(interpolate(&from, &to, time))
    }
}

/// Value on the segment `from -> to` at `time`, with `to.easing` applied.
pub(crate) fn interpolate(from: &KeyFrame, to: &KeyFrame, time: Time) -> f32 {
    let span = (to.time - from.time).as_secs_f64();
    if span <= 0.0 {
        return to.value;
    }
    let progress = (time - from.time).as_secs_f64() / span;
    let eased = to.easing.apply(progress);
    (f64::from(from.value) + (f64::from(to.value) - f64::from(from.value)) * eased) as f32
}

/// A numeric node parameter: a current value plus an optional animation.
///
/// Animations are shared by reference so several graph builds (or several
/// nodes) can point at the same curve; the speed integrator uses that
/// identity to keep its cache across calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Property {
    value: f32,
    animation: Option<Arc<KeyFrameAnimation>>,
}

impl Property {
    /// Creates an unanimated property.
    pub fn constant(value: f32) -> Self {
        Self {
            value,
            animation: None,
        }
    }

    /// Creates an animated property with `value` as its fallback.
    pub fn animated(value: f32, animation: Arc<KeyFrameAnimation>) -> Self {
        Self {
            value,
            animation: Some(animation),
        }
    }

    /// Current (unanimated) value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Sets the current value.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// The attached animation, if any.
    pub fn animation(&self) -> Option<&Arc<KeyFrameAnimation>> {
        self.animation.as_ref()
    }

    /// Attaches or detaches an animation.
    pub fn set_animation(&mut self, animation: Option<Arc<KeyFrameAnimation>>) {
        self.animation = animation;
    }
}

impl From<f32> for Property {
    fn from(value: f32) -> Self {
        Self::constant(value)
    }
}

/// Evaluates animated properties for the graph.
///
/// Sample `i` of a request corresponds to time
/// `range.start() + i / sample_rate`.
pub trait AnimationSampler {
    /// Returns true if `property` currently varies over time.
    fn is_animated(&self, property: &Property) -> bool;

    /// Fills `dest` with one value of `property` per sample, starting at
    /// `range.start()`.
    fn sample_buffer(&self, property: &Property, range: TimeRange, sample_rate: u32, dest: &mut [f32]);

    /// Value of `property` at a single instant.
    fn sample_at(&self, property: &Property, time: Time) -> f32 {
        let mut value = [0.0];
        self.sample_buffer(property, TimeRange::new(time, Time::ZERO), 1, &mut value);
        value[0]
    }
}

/// Stock [`AnimationSampler`] over [`KeyFrameAnimation`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyFrameSampler;

impl AnimationSampler for KeyFrameSampler {
    fn is_animated(&self, property: &Property) -> bool {
        property.animation().is_some_and(|a| !a.is_empty())
    }

    fn sample_buffer(&self, property: &Property, range: TimeRange, sample_rate: u32, dest: &mut [f32]) {
        let Some(animation) = property.animation().filter(|a| !a.is_empty()) else {
            dest.fill(property.value());
            return;
        };
        let start = range.start();
        for (i, value) in dest.iter_mut().enumerate() {
            let t = start + Time::from_frames(i as i64, sample_rate);
            *value = animation.value_at(t).unwrap_or(property.value());
        }
    }
}
