//! Sample-level math shared by the graph nodes and the composer.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Block Operations
//!
//! All block operations work on one channel slice at a time:
//!
//! | Function | Effect |
//! |----------|--------|
//! | [`apply_gain`] | `x *= g` |
//! | [`add_with_gain`] | `dst += src * g` |
//! | [`multiply_buffers`] | `dst *= src`, sample by sample |
//! | [`apply_limiter`] | Compress everything above a threshold by a ratio |
//! | [`apply_soft_clipper`] | tanh knee above a threshold |
//! | [`normalize`] | Scale so the peak hits a target level |
//! | [`fade_in`] / [`fade_out`] | Linear ramps at the edges |
//!
//! # Measurement
//!
//! - [`peak`] - Largest absolute sample
//! - [`rms`] - Root mean square level

use libm::{expf, logf, sqrtf, tanhf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use cadence_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs are floored at 1e-10 (-200 dB).
///
/// # Example
/// ```rust
/// use cadence_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Flush denormal values to zero.
///
/// Feedback paths (delay lines, IIR filters) decay toward zero indefinitely;
/// values below 1e-20 are replaced with zero before they reach the subnormal
/// range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert milliseconds to samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Multiplies every sample by `gain`.
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    for sample in buffer {
        *sample *= gain;
    }
}

/// Accumulates `input * gain` into `output`.
///
/// Only the common prefix of the two slices is touched.
pub fn add_with_gain(input: &[f32], output: &mut [f32], gain: f32) {
    for (out, &x) in output.iter_mut().zip(input) {
        *out += x * gain;
    }
}

/// Multiplies `output` by `input` sample by sample (per-sample gain curves).
pub fn multiply_buffers(input: &[f32], output: &mut [f32]) {
    for (out, &g) in output.iter_mut().zip(input) {
        *out *= g;
    }
}

/// Largest absolute sample value.
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0_f32, |acc, &x| acc.max(x.abs()))
}

/// Root mean square of `buffer`. Zero for an empty slice.
pub fn rms(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }
    let sum: f32 = buffer.iter().map(|x| x * x).sum();
    sqrtf(sum / buffer.len() as f32)
}

/// Hard-knee limiter: the part of each sample's magnitude above `threshold`
/// is divided by `ratio`.
pub fn apply_limiter(buffer: &mut [f32], threshold: f32, ratio: f32) {
    let ratio = ratio.max(1.0);
    for sample in buffer {
        let abs = sample.abs();
        if abs > threshold {
            let limited = threshold + (abs - threshold) / ratio;
            *sample = limited.copysign(*sample);
        }
    }
}

/// Soft clipper: magnitudes above `threshold` are bent toward 1.0 with a tanh
/// curve, so the output never exceeds ±1.
pub fn apply_soft_clipper(buffer: &mut [f32], threshold: f32) {
    let threshold = threshold.clamp(0.0, 0.999);
    let knee = 1.0 - threshold;
    for sample in buffer {
        let abs = sample.abs();
        if abs > threshold {
            let clipped = threshold + knee * tanhf((abs - threshold) / knee);
            *sample = clipped.copysign(*sample);
        }
    }
}

/// Scales `buffer` so its peak equals `target`. Silent buffers are left as-is.
pub fn normalize(buffer: &mut [f32], target: f32) {
    let p = peak(buffer);
    if p > 0.0 && p != target {
        apply_gain(buffer, target / p);
    }
}

/// Linear fade from silence over the first `length` samples.
pub fn fade_in(buffer: &mut [f32], length: usize) {
    let length = length.min(buffer.len());
    for (i, sample) in buffer[..length].iter_mut().enumerate() {
        *sample *= i as f32 / length as f32;
    }
}

/// Linear fade to silence over the last `length` samples.
pub fn fade_out(buffer: &mut [f32], length: usize) {
    let length = length.min(buffer.len());
    let start = buffer.len() - length;
    for (i, sample) in buffer[start..].iter_mut().enumerate() {
        *sample *= 1.0 - i as f32 / length as f32;
    }
}
