//! Concrete [`AudioNode`](super::AudioNode) implementations.
//!
//! | Node | Inputs | State |
//! |------|--------|-------|
//! | [`SourceNode`] | 0 | none |
//! | [`ClipNode`] | 1 | none |
//! | [`ShiftNode`] | 1 | none |
//! | [`MixerNode`] | 1+ | none |
//! | [`GainNode`] | 1 | none |
//! | [`DelayNode`] | 1 | delay lines, seek reset |
//! | [`EqualizerNode`] | 1 | biquad history, seek reset |
//! | [`ResampleNode`] | 1 | resampler stream |
//! | [`SpeedNode`] | 1 | resampler stream, speed integral |
//! | [`TimeStretchNode`] | 1 | WSOLA stream |
//! | [`EffectNode`] / [`GraphEffectNode`] | 1 | plugin processor |

mod clip;
mod delay;
mod effect;
mod equalizer;
mod gain;
mod mixer;
mod resample;
mod shift;
mod source;
mod speed;
mod time_stretch;

pub use clip::ClipNode;
pub use delay::DelayNode;
pub use effect::{EffectNode, GraphEffectNode};
pub use equalizer::{EqualizerBand, EqualizerNode};
pub use gain::GainNode;
pub use mixer::MixerNode;
pub use resample::ResampleNode;
pub use shift::ShiftNode;
pub use source::SourceNode;
pub use speed::SpeedNode;
pub use time_stretch::{MAX_STRETCH_PERCENT, MIN_STRETCH_PERCENT, TimeStretchNode};
