//! Constant-power stereo panning as a legacy PCM effect.

use cadence_core::{BoxError, SoundEffect, SoundProcessor, TimeRange};

/// Left and right gains for `pan` in `[-100, 100]`.
///
/// Uses the -3 dB sine/cosine law: both sides sit at `1/sqrt(2)` in the
/// center and `left^2 + right^2 == 1` everywhere. Out-of-range values are
/// clamped and NaN is treated as center.
///
/// # Example
///
/// ```rust
/// use cadence_effects::pan_gains;
///
/// let (left, right) = pan_gains(-100.0);
/// assert_eq!((left, right), (1.0, 0.0));
/// ```
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = if pan.is_nan() { 0.0 } else { pan.clamp(-100.0, 100.0) };
    let angle = (pan / 100.0 + 1.0) * core::f32::consts::FRAC_PI_4;
    let (sin, cos) = libm::sincosf(angle);
    if pan <= -100.0 {
        (1.0, 0.0)
    } else if pan >= 100.0 {
        (0.0, 1.0)
    } else {
        (cos, sin)
    }
}

/// Positions the signal between left and right.
///
/// Runs on interleaved stereo frames through
/// [`EffectNode`](cadence_core::EffectNode); the node folds mono input to
/// two identical channels first.
#[derive(Debug, Clone, Copy)]
pub struct PanEffect {
    pan: f32,
    enabled: bool,
}

impl PanEffect {
    /// Creates a pan effect. `pan` runs from -100 (left) to 100 (right).
    pub fn new(pan: f32) -> Self {
        Self { pan, enabled: true }
    }

    /// Enables or bypasses the effect.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Pan position as given.
    pub fn pan(&self) -> f32 {
        self.pan
    }
}

impl SoundEffect for PanEffect {
    fn name(&self) -> &str {
        "pan"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn create_processor(&self) -> Box<dyn SoundProcessor> {
        let (left, right) = pan_gains(self.pan);
        Box::new(PanProcessor { left, right })
    }
}

struct PanProcessor {
    left: f32,
    right: f32,
}

impl SoundProcessor for PanProcessor {
    fn process(&mut self, frames: &mut [[f32; 2]], _range: TimeRange, _sample_rate: u32) -> Result<(), BoxError> {
        for frame in frames {
            frame[0] *= self.left;
            frame[1] *= self.right;
        }
        Ok(())
    }
}
