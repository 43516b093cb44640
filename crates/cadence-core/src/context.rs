//! The unit of demand passed down the graph.

use core::fmt;

use crate::animation::AnimationSampler;
use crate::time::{Time, TimeRange};

/// What a node is asked to produce: a time range at a sample rate.
///
/// Nodes derive sub-contexts for their inputs with
/// [`with_time_range`](Self::with_time_range) and
/// [`with_sample_rate`](Self::with_sample_rate); the top-level request stays
/// available as [`original_time_range`](Self::original_time_range).
#[derive(Clone, Copy)]
pub struct ProcessContext<'a> {
    time_range: TimeRange,
    sample_rate: u32,
    original_time_range: TimeRange,
    sampler: &'a dyn AnimationSampler,
}

impl<'a> ProcessContext<'a> {
    /// Creates a top-level context.
    pub fn new(time_range: TimeRange, sample_rate: u32, sampler: &'a dyn AnimationSampler) -> Self {
        Self {
            time_range,
            sample_rate,
            original_time_range: time_range,
            sampler,
        }
    }

    /// The range to produce.
    #[inline]
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Output sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The range of the top-level request this context was derived from.
    #[inline]
    pub fn original_time_range(&self) -> TimeRange {
        self.original_time_range
    }

    /// Sampler for animated properties.
    #[inline]
    pub fn sampler(&self) -> &'a dyn AnimationSampler {
        self.sampler
    }

    /// Number of frames a node must return for this context.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.time_range.sample_count(self.sample_rate)
    }

    /// First output frame index on this context's time axis.
    #[inline]
    pub fn start_frame(&self) -> i64 {
        self.time_range.start_frame(self.sample_rate)
    }

    /// Same request with a different range.
    pub fn with_time_range(&self, time_range: TimeRange) -> Self {
        Self { time_range, ..*self }
    }

    /// Same request at a different sample rate.
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..*self
        }
    }

    /// Source range consumed when this range is played at a constant
    /// `speed`: both start and duration scale by `speed`.
    pub fn scaled_time_range(&self, speed: f64) -> TimeRange {
        TimeRange::new(
            self.time_range.start().mul_f64(speed),
            self.time_range.duration().mul_f64(speed).max(Time::ZERO),
        )
    }
}

impl fmt::Debug for ProcessContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("time_range", &self.time_range)
            .field("sample_rate", &self.sample_rate)
            .field("original_time_range", &self.original_time_range)
            .finish_non_exhaustive()
    }
}
