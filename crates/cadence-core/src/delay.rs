//! Circular-buffer delay lines and the feedback delay used by
//! [`DelayNode`](crate::graph::DelayNode) and the delay effect.
//!
//! # Types
//!
//! - [`DelayLine`] - Single-channel integer-delay circular buffer
//! - [`FeedbackDelay`] - One line per channel plus the dry/wet/feedback loop
//! - [`DelayParams`] - Per-sample parameters in user units (ms and percent)
//!
//! Every line holds [`MAX_DELAY_MS`] of audio; requested delays are clamped to
//! `[0, capacity - 1]` samples.

use crate::math::flush_denormal;

/// Longest supported delay time in milliseconds.
pub const MAX_DELAY_MS: f32 = 5000.0;

/// Single-channel delay line with integer sample delays.
///
/// Reads happen before the write of the current sample: after `n` writes,
/// `read(d)` returns the sample written `d` writes ago.
///
/// # Example
///
/// ```rust
/// use cadence_core::DelayLine;
///
/// let mut line = DelayLine::new(8);
/// line.write(1.0);
/// line.write(0.0);
/// assert_eq!(line.read(2), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Creates a delay line able to hold `capacity` samples (`capacity - 1`
    /// samples of delay).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Delay size must be > 0");
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Creates a delay line holding `max_seconds` of audio at `sample_rate`.
    pub fn from_time(sample_rate: u32, max_seconds: f32) -> Self {
        let max_samples = libm::ceilf(sample_rate as f32 * max_seconds) as usize + 1;
        Self::new(max_samples)
    }

    /// Returns the sample written `delay` writes ago. `delay` is clamped to
    /// `[1, capacity]`; a delay of 0 is treated as 1.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Clears the line (sets all samples to 0).
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Number of samples the line stores.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Largest usable delay in samples.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }
}

/// Delay parameters for one sample, in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    /// Delay time in milliseconds, clamped to `[0, 5000]`.
    pub delay_ms: f32,
    /// Feedback in percent, clamped to `[0, 100]`.
    pub feedback: f32,
    /// Dry level in percent.
    pub dry: f32,
    /// Wet level in percent.
    pub wet: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            delay_ms: 200.0,
            feedback: 50.0,
            dry: 60.0,
            wet: 40.0,
        }
    }
}

/// Multi-channel feedback delay.
///
/// Per sample and channel:
///
/// ```text
/// delayed = line.read(d)          (d = 0 means delayed = input)
/// line.write(input + delayed * feedback)
/// output  = input * dry + delayed * wet
/// ```
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    lines: Vec<DelayLine>,
    sample_rate: u32,
}

impl FeedbackDelay {
    /// Allocates one [`MAX_DELAY_MS`] line per channel.
    pub fn new(channel_count: usize, sample_rate: u32) -> Self {
        Self {
            lines: (0..channel_count)
                .map(|_| DelayLine::from_time(sample_rate, MAX_DELAY_MS / 1000.0))
                .collect(),
            sample_rate,
        }
    }

    /// Sample rate the lines were sized for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if this engine already matches the given format.
    pub fn matches(&self, channel_count: usize, sample_rate: u32) -> bool {
        self.lines.len() == channel_count && self.sample_rate == sample_rate
    }

    /// Clears every line.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    /// Delay in whole samples for `delay_ms`, clamped to the line capacity.
    pub fn delay_samples(&self, delay_ms: f32) -> usize {
        let max = self.lines.first().map_or(0, DelayLine::max_delay);
        let ms = if delay_ms.is_finite() { delay_ms.clamp(0.0, MAX_DELAY_MS) } else { 0.0 };
        let samples = libm::roundf(ms * self.sample_rate as f32 / 1000.0) as usize;
        samples.min(max)
    }

    /// Processes one sample of `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channel_count()`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32, delay: usize, feedback: f32, dry: f32, wet: f32) -> f32 {
        let line = &mut self.lines[channel];
        let delayed = if delay == 0 { input } else { line.read(delay) };
        line.write(flush_denormal(input + delayed * feedback));
        input * dry + delayed * wet
    }

    /// Processes a block of one channel with constant parameters.
    pub fn process_block(&mut self, channel: usize, samples: &mut [f32], params: DelayParams) {
        let delay = self.delay_samples(params.delay_ms);
        let (feedback, dry, wet) = normalized(params);
        for sample in samples {
            *sample = self.process_sample(channel, *sample, delay, feedback, dry, wet);
        }
    }

    /// Processes one sample of `channel` with parameters in user units.
    #[inline]
    pub fn process_with(&mut self, channel: usize, input: f32, params: DelayParams) -> f32 {
        let delay = self.delay_samples(params.delay_ms);
        let (feedback, dry, wet) = normalized(params);
        self.process_sample(channel, input, delay, feedback, dry, wet)
    }
}

/// Feedback, dry and wet as linear factors.
fn normalized(params: DelayParams) -> (f32, f32, f32) {
    (
        params.feedback.clamp(0.0, 100.0) / 100.0,
        params.dry.max(0.0) / 100.0,
        params.wet.max(0.0) / 100.0,
    )
}
