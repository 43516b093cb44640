//! Plugin effect interfaces hosted by the graph's effect nodes.
//!
//! Two generations of plugin contract are supported:
//!
//! - [`AudioEffect`] / [`AudioEffectProcessor`]: native, operates directly on
//!   [`AudioBuffer`]s and sees the full [`ProcessContext`]. Hosted by
//!   [`GraphEffectNode`](crate::graph::GraphEffectNode).
//! - [`SoundEffect`] / [`SoundProcessor`]: legacy, operates in place on
//!   interleaved stereo frames. Hosted by
//!   [`EffectNode`](crate::graph::EffectNode), which does the conversion.
//!
//! Effects are shared descriptions (`Arc<dyn ...>`); processors hold the
//! per-node DSP state and are created lazily by the hosting node.
//!
//! ## Design Decisions
//!
//! - **Fallible processing**: processors return `Result`; the hosting node
//!   wraps failures with the effect's name and the node kind and aborts the
//!   render. Nothing is swallowed.
//! - **Preparation**: processors learn the upcoming range and rate through
//!   `prepare` before each call whose range or rate differs from the last.

use crate::buffer::AudioBuffer;
use crate::context::ProcessContext;
use crate::source::BoxError;
use crate::time::TimeRange;

/// Native graph effect description.
///
/// # Example
///
/// ```rust
/// use cadence_core::{AudioBuffer, AudioEffect, AudioEffectProcessor, BoxError, ProcessContext, TimeRange};
///
/// struct Invert;
/// struct InvertProcessor;
///
/// impl AudioEffect for Invert {
///     fn name(&self) -> &str { "invert" }
///     fn create_processor(&self) -> Box<dyn AudioEffectProcessor> { Box::new(InvertProcessor) }
/// }
///
/// impl AudioEffectProcessor for InvertProcessor {
///     fn prepare(&mut self, _range: TimeRange, _sample_rate: u32) {}
///
///     fn process(
///         &mut self,
///         input: &AudioBuffer,
///         output: &mut AudioBuffer,
///         _context: &ProcessContext<'_>,
///     ) -> Result<(), BoxError> {
///         for ch in 0..input.channel_count() {
///             for (o, i) in output.channel_mut(ch).iter_mut().zip(input.channel(ch)) {
///                 *o = -i;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait AudioEffect: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Disabled effects are bypassed by the hosting node.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Creates a fresh processor with cleared state.
    fn create_processor(&self) -> Box<dyn AudioEffectProcessor>;
}

/// Stateful processor created by an [`AudioEffect`].
pub trait AudioEffectProcessor: Send {
    /// Called before processing whenever the range or sample rate differs
    /// from the previous call.
    fn prepare(&mut self, range: TimeRange, sample_rate: u32);

    /// Processes `input` into `output`. `output` has the same format as
    /// `input` and is silent on entry.
    fn process(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
        context: &ProcessContext<'_>,
    ) -> Result<(), BoxError>;

    /// Clears internal state (seek).
    fn reset(&mut self) {}
}

/// Legacy PCM effect description.
pub trait SoundEffect: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Disabled effects are bypassed by the hosting node.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Creates a fresh processor with cleared state.
    fn create_processor(&self) -> Box<dyn SoundProcessor>;
}

/// Stateful processor created by a [`SoundEffect`].
pub trait SoundProcessor: Send {
    /// Processes interleaved stereo frames in place. `range` is the time span
    /// the frames cover.
    fn process(&mut self, frames: &mut [[f32; 2]], range: TimeRange, sample_rate: u32) -> Result<(), BoxError>;
}

/// Interleaves the first two channels of `buffer` into stereo frames. Mono
/// is duplicated to both sides.
pub fn to_stereo_frames(buffer: &AudioBuffer) -> Vec<[f32; 2]> {
    match buffer.channel_count() {
        0 => vec![[0.0; 2]; buffer.sample_count()],
        1 => buffer.channel(0).iter().map(|&s| [s, s]).collect(),
        _ => buffer
            .channel(0)
            .iter()
            .zip(buffer.channel(1))
            .map(|(&l, &r)| [l, r])
            .collect(),
    }
}

/// Builds a stereo buffer from interleaved frames.
pub fn from_stereo_frames(frames: &[[f32; 2]], sample_rate: u32) -> AudioBuffer {
    let left = frames.iter().map(|f| f[0]).collect();
    let right = frames.iter().map(|f| f[1]).collect();
    AudioBuffer::from_channels(vec![left, right], sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_frames_round_trip() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.1, 0.2], vec![-0.1, -0.2]], 48000);
        let frames = to_stereo_frames(&buffer);
        assert_eq!(frames, vec![[0.1, -0.1], [0.2, -0.2]]);
        assert_eq!(from_stereo_frames(&frames, 48000), buffer);
    }

    #[test]
    fn test_mono_is_duplicated() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.5]], 48000);
        assert_eq!(to_stereo_frames(&buffer), vec![[0.5, 0.5]]);
    }
}
