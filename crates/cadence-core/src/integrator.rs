//! Output-time to source-time mapping for variable playback speed.
//!
//! Playing at speed `s(t)` consumes source material at `s(t)` seconds per
//! output second, so the source position reached at output time `t` is
//!
//! ```text
//! S(t) = ∫₀ᵗ clamp(s(τ)) dτ
//! ```
//!
//! [`SpeedIntegrator`] caches the running integral at every keyframe
//! boundary, built in a single forward pass, so a lookup only integrates the
//! partial segment containing `t`. The cache is rebuilt when the property
//! points at a different animation instance.

use std::sync::Arc;

use crate::animation::{Easing, KeyFrame, KeyFrameAnimation, Property, interpolate};
use crate::time::Time;

/// Slowest playback speed (1 %).
pub const MIN_SPEED: f64 = 0.01;
/// Fastest playback speed (10 000 %).
pub const MAX_SPEED: f64 = 100.0;

/// Simpson subintervals per keyframe segment (even).
const SIMPSON_STEPS: usize = 32;

/// Clamps a linear speed factor to `[MIN_SPEED, MAX_SPEED]`. NaN maps to 1.
#[inline]
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() { 1.0 } else { speed.clamp(MIN_SPEED, MAX_SPEED) }
}

/// Speed factor for a property value on the 0–100 percent scale.
#[inline]
pub fn speed_from_percent(percent: f32) -> f64 {
    clamp_speed(f64::from(percent) / 100.0)
}

/// Cached integral of a speed property over output time.
#[derive(Debug, Clone, Default)]
pub struct SpeedIntegrator {
    animation: Option<Arc<KeyFrameAnimation>>,
    /// Integral from the first keyframe to each keyframe, in seconds.
    cumulative: Vec<f64>,
    /// Integral from the first keyframe to time zero.
    origin: f64,
}

impl SpeedIntegrator {
    /// Creates an empty integrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source time reached at output `time` for a speed `property` given in
    /// percent.
    ///
    /// Without an animation this is `time * speed`. Negative times integrate
    /// backward from zero. The result saturates at the limits of [`Time`].
    pub fn source_time(&mut self, property: &Property, time: Time) -> Time {
        let Some(animation) = property.animation().filter(|a| !a.is_empty()) else {
            return time.mul_f64(speed_from_percent(property.value()));
        };
        self.ensure_cache(animation);
        let keyframes = animation.keyframes();
        let seconds = integral_to(keyframes, &self.cumulative, time) - self.origin;
        Time::from_secs_f64(seconds)
    }

    /// Drops the cache.
    pub fn clear(&mut self) {
        self.animation = None;
        self.cumulative.clear();
        self.origin = 0.0;
    }

    fn ensure_cache(&mut self, animation: &Arc<KeyFrameAnimation>) {
        if self.animation.as_ref().is_some_and(|a| Arc::ptr_eq(a, animation)) {
            return;
        }
        let keyframes = animation.keyframes();
        self.cumulative.clear();
        let mut total = 0.0;
        self.cumulative.push(total);
        for pair in keyframes.windows(2) {
            total += segment_integral(&pair[0], &pair[1], pair[0].time, pair[1].time);
            self.cumulative.push(total);
        }
        self.origin = integral_to(keyframes, &self.cumulative, Time::ZERO);
        self.animation = Some(Arc::clone(animation));
    }
}

/// Integral from the first keyframe to `time` (negative before it).
fn integral_to(keyframes: &[KeyFrame], cumulative: &[f64], time: Time) -> f64 {
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return 0.0;
    };
    if time <= first.time {
        return (time - first.time).as_secs_f64() * speed_from_percent(first.value);
    }
    let last_index = keyframes.len() - 1;
    if time >= last.time {
        return cumulative[last_index] + (time - last.time).as_secs_f64() * speed_from_percent(last.value);
    }
    let next = keyframes.partition_point(|k| k.time <= time);
    let from = &keyframes[next - 1];
    let to = &keyframes[next];
    cumulative[next - 1] + segment_integral(from, to, from.time, time)
}

/// Integral of the clamped speed over `[a, b]` inside the segment `from -> to`.
fn segment_integral(from: &KeyFrame, to: &KeyFrame, a: Time, b: Time) -> f64 {
    let width = (b - a).as_secs_f64();
    if width <= 0.0 {
        return 0.0;
    }
    if to.easing == Easing::Hold || from.value == to.value {
        return width * speed_from_percent(from.value);
    }
    // Composite Simpson; the clamp makes the integrand piecewise smooth.
    let step = width / SIMPSON_STEPS as f64;
    let speed_at = |k: usize| {
        let t = a + Time::from_secs_f64(step * k as f64);
        speed_from_percent(interpolate(from, to, t))
    };
    let mut sum = speed_at(0) + speed_at(SIMPSON_STEPS);
    for k in 1..SIMPSON_STEPS {
        sum += if k % 2 == 1 { 4.0 } else { 2.0 } * speed_at(k);
    }
    sum * step / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animated(keyframes: Vec<KeyFrame>) -> Property {
        Property::animated(100.0, Arc::new(KeyFrameAnimation::new(keyframes)))
    }

    fn close(a: Time, b: Time) -> bool {
        (a - b).as_nanos().abs() < 1_000
    }

    #[test]
    fn test_static_speed_multiplies() {
        let mut integrator = SpeedIntegrator::new();
        let prop = Property::constant(200.0);
        assert_eq!(integrator.source_time(&prop, Time::from_secs(3)), Time::from_secs(6));
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut integrator = SpeedIntegrator::new();
        let fast = Property::constant(1.0e9);
        assert_eq!(integrator.source_time(&fast, Time::from_secs(1)), Time::from_secs(100));
        let stopped = Property::constant(0.0);
        assert_eq!(integrator.source_time(&stopped, Time::from_secs(1)), Time::from_millis(10));
    }

    #[test]
    fn test_linear_ramp_integrates_exactly() {
        let mut integrator = SpeedIntegrator::new();
        let prop = animated(vec![
            KeyFrame::new(Time::ZERO, 100.0),
            KeyFrame::new(Time::from_secs(1), 300.0),
        ]);
        // ∫₀¹ (1 + 2t) dt = 2, then 3 s/s afterwards.
        assert!(close(integrator.source_time(&prop, Time::from_secs(1)), Time::from_secs(2)));
        assert!(close(integrator.source_time(&prop, Time::from_secs(2)), Time::from_secs(5)));
        assert!(close(integrator.source_time(&prop, Time::from_millis(500)), Time::from_millis(750)));
    }

    #[test]
    fn test_negative_time_integrates_backward() {
        let mut integrator = SpeedIntegrator::new();
        let prop = animated(vec![
            KeyFrame::new(Time::from_secs(1), 50.0),
            KeyFrame::new(Time::from_secs(2), 50.0),
        ]);
        assert!(close(integrator.source_time(&prop, Time::from_secs(-2)), Time::from_secs(-1)));
        assert!(close(integrator.source_time(&prop, Time::ZERO), Time::ZERO));
    }

    #[test]
    fn test_hold_segments_use_previous_value() {
        let mut integrator = SpeedIntegrator::new();
        let prop = animated(vec![
            KeyFrame::new(Time::ZERO, 100.0),
            KeyFrame::new(Time::from_secs(1), 400.0).with_easing(Easing::Hold),
        ]);
        assert!(close(integrator.source_time(&prop, Time::from_secs(1)), Time::from_secs(1)));
        assert!(close(integrator.source_time(&prop, Time::from_secs(2)), Time::from_secs(5)));
    }

    #[test]
    fn test_mapping_is_monotonic() {
        let mut integrator = SpeedIntegrator::new();
        let prop = animated(vec![
            KeyFrame::new(Time::ZERO, 20.0),
            KeyFrame::new(Time::from_millis(300), 800.0).with_easing(Easing::Smooth),
            KeyFrame::new(Time::from_millis(900), 1.0),
            KeyFrame::new(Time::from_secs(2), 150.0),
        ]);
        let mut previous = integrator.source_time(&prop, Time::from_millis(-100));
        for ms in (0..3000).step_by(7) {
            let current = integrator.source_time(&prop, Time::from_millis(ms));
            assert!(current > previous, "not monotonic at {ms} ms");
            previous = current;
        }
    }

    #[test]
    fn test_cache_follows_animation_identity() {
        let mut integrator = SpeedIntegrator::new();
        let slow = animated(vec![KeyFrame::new(Time::ZERO, 50.0)]);
        let fast = animated(vec![KeyFrame::new(Time::ZERO, 200.0)]);
        assert!(close(integrator.source_time(&slow, Time::from_secs(2)), Time::from_secs(1)));
        assert!(close(integrator.source_time(&fast, Time::from_secs(2)), Time::from_secs(4)));
    }

    #[test]
    fn test_extreme_times_saturate() {
        let mut integrator = SpeedIntegrator::new();
        let prop = Property::constant(10_000.0);
        assert_eq!(integrator.source_time(&prop, Time::MAX), Time::MAX);
        assert_eq!(integrator.source_time(&prop, Time::MIN), Time::MIN);
    }
}
