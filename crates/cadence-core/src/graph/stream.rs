//! Input read cursor shared by the clock-warping nodes.
//!
//! Resample, speed and time-stretch nodes consume their input at a
//! different pace than they produce output, and their DSP needs lookahead.
//! Instead of re-requesting overlapping input ranges on every call, they keep
//! an [`InputCursor`]: the next input frame to fetch. Consecutive calls pick
//! up exactly where the previous one stopped, so no input frame is pulled
//! twice while the output stream continues.

use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::time::TimeRange;

use super::error::GraphError;
use super::node::BoxedNode;

/// Next input frame to fetch, on the input's own frame grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InputCursor {
    next_frame: i64,
    sample_rate: u32,
}

impl InputCursor {
    pub(crate) fn new(next_frame: i64, sample_rate: u32) -> Self {
        Self {
            next_frame,
            sample_rate,
        }
    }

    /// Pulls the next `frames` input frames and advances the cursor.
    ///
    /// The returned buffer always has exactly `frames` frames; a short or
    /// long input is padded with silence or truncated.
    pub(crate) fn fetch(
        &mut self,
        node: &'static str,
        input: &mut BoxedNode,
        context: &ProcessContext<'_>,
        frames: usize,
    ) -> Result<AudioBuffer, GraphError> {
        let buffer = self.fetch_raw(input, context, frames)?;
        if buffer.sample_rate() != self.sample_rate {
            return Err(GraphError::format_mismatch(
                node,
                format!(
                    "input switched from {} Hz to {} Hz mid-stream",
                    self.sample_rate,
                    buffer.sample_rate()
                ),
            ));
        }
        Ok(buffer)
    }

    /// Like [`fetch`](Self::fetch), but returns whatever rate the input
    /// produced. Callers that adapt to the input rate check it themselves.
    pub(crate) fn fetch_raw(
        &mut self,
        input: &mut BoxedNode,
        context: &ProcessContext<'_>,
        frames: usize,
    ) -> Result<AudioBuffer, GraphError> {
        let range = TimeRange::from_frames(self.next_frame, frames, self.sample_rate);
        let child = context.with_time_range(range).with_sample_rate(self.sample_rate);
        let buffer = input.process(&child)?;
        self.next_frame = self.next_frame.saturating_add(frames as i64);
        Ok(fit(buffer, frames))
    }

    /// Pulls the `frames` input frames just before the cursor without
    /// moving it. Used to fill filter history after a seek.
    pub(crate) fn fetch_lead(
        &self,
        input: &mut BoxedNode,
        context: &ProcessContext<'_>,
        frames: usize,
    ) -> Result<AudioBuffer, GraphError> {
        let mut lead = Self::new(self.next_frame.saturating_sub(frames as i64), self.sample_rate);
        lead.fetch_raw(input, context, frames)
    }
}

/// Returns `buffer` with exactly `frames` frames.
pub(crate) fn fit(buffer: AudioBuffer, frames: usize) -> AudioBuffer {
    if buffer.sample_count() == frames {
        return buffer;
    }
    let mut out = AudioBuffer::new(buffer.channel_count(), buffer.sample_rate(), frames);
    out.copy_from(&buffer, 0, 0, frames);
    out
}

/// Splits a fractional input position into the first frame to fetch and
/// the phase inside it.
pub(crate) fn split_position(position: f64) -> (i64, f64) {
    if !position.is_finite() {
        return (0, 0.0);
    }
    let floor = position.floor();
    let frame = floor.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
    (frame, position - floor)
}
