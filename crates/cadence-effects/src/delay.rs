//! Feedback delay effect for [`GraphEffectNode`](cadence_core::GraphEffectNode).

use cadence_core::{
    AudioBuffer, AudioEffect, AudioEffectProcessor, BoxError, DelayParams, FeedbackDelay, MAX_DELAY_MS,
    ProcessContext, TimeRange,
};

/// Feedback delay with fixed parameters.
///
/// Same signal path as [`DelayNode`](cadence_core::DelayNode), packaged as a
/// native plugin so it can sit in a track's effect list. Parameters are
/// clamped when set.
///
/// ## Parameters
///
/// | Parameter | Range | Default |
/// |-----------|-------|---------|
/// | Delay time | 0–5000 ms | 200 |
/// | Feedback | 0–100 % | 50 |
/// | Dry | ≥ 0 % | 60 |
/// | Wet | ≥ 0 % | 40 |
///
/// # Example
///
/// ```rust
/// use cadence_effects::DelayEffect;
///
/// let echo = DelayEffect::new().with_delay_ms(375.0).with_feedback(30.0);
/// assert_eq!(echo.params().delay_ms, 375.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayEffect {
    params: DelayParams,
    enabled: bool,
}

impl DelayEffect {
    /// Creates a delay with default parameters.
    pub fn new() -> Self {
        Self {
            params: DelayParams::default(),
            enabled: true,
        }
    }

    /// Creates a delay from `params`, clamping each field.
    pub fn from_params(params: DelayParams) -> Self {
        Self::new()
            .with_delay_ms(params.delay_ms)
            .with_feedback(params.feedback)
            .with_dry(params.dry)
            .with_wet(params.wet)
    }

    /// Sets the delay time in milliseconds.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: f32) -> Self {
        self.params.delay_ms = clamp_or(delay_ms, 0.0, MAX_DELAY_MS, self.params.delay_ms);
        self
    }

    /// Sets the feedback in percent.
    #[must_use]
    pub fn with_feedback(mut self, feedback: f32) -> Self {
        self.params.feedback = clamp_or(feedback, 0.0, 100.0, self.params.feedback);
        self
    }

    /// Sets the dry level in percent.
    #[must_use]
    pub fn with_dry(mut self, dry: f32) -> Self {
        self.params.dry = clamp_or(dry, 0.0, f32::MAX, self.params.dry);
        self
    }

    /// Sets the wet level in percent.
    #[must_use]
    pub fn with_wet(mut self, wet: f32) -> Self {
        self.params.wet = clamp_or(wet, 0.0, f32::MAX, self.params.wet);
        self
    }

    /// Enables or bypasses the effect.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Current parameters.
    pub fn params(&self) -> DelayParams {
        self.params
    }
}

impl Default for DelayEffect {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-finite values keep `fallback`.
fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() { value.clamp(min, max) } else { fallback }
}

impl AudioEffect for DelayEffect {
    fn name(&self) -> &str {
        "delay"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn create_processor(&self) -> Box<dyn AudioEffectProcessor> {
        Box::new(DelayProcessor {
            params: self.params,
            sample_rate: 0,
            engine: None,
        })
    }
}

struct DelayProcessor {
    params: DelayParams,
    sample_rate: u32,
    engine: Option<FeedbackDelay>,
}

impl AudioEffectProcessor for DelayProcessor {
    fn prepare(&mut self, _range: TimeRange, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    fn process(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        _context: &ProcessContext<'_>,
    ) -> Result<(), BoxError> {
        let channels = input.channel_count();
        let rate = if self.sample_rate == 0 { input.sample_rate() } else { self.sample_rate };
        if !self.engine.as_ref().is_some_and(|e| e.matches(channels, rate)) {
            self.engine = Some(FeedbackDelay::new(channels, rate));
        }
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        for ch in 0..channels {
            let samples = output.channel_mut(ch);
            samples.copy_from_slice(input.channel(ch));
            engine.process_block(ch, samples, self.params);
        }
        Ok(())
    }

    fn reset(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
    }
}
